//! Environment report for troubleshooting a recalculation setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Serialize, Serializer};
use sheet_recalc_libreoffice::{EntryPointState, LibreOfficeEngine, Platform};

use crate::scanner::{self, WorkbookSummary};
use crate::strategy::{DiagnosticOutcome, DualModeRunner, Recalc};

#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub path: PathBuf,
    pub exists: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configured: Option<PathBuf>,
    pub candidates: Vec<CandidateReport>,
    pub resolved: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<PathBuf>,
    /// `missing`, `stale` or `installed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub exists: bool,
}

/// Pass/fail wrapper used for checks that may error.
///
/// Serializes as the value's own fields plus `"ok": true`, or as
/// `{"ok": false, "error": ...}`.
#[derive(Debug, Clone)]
pub enum Check<T> {
    Passed(T),
    Failed(String),
}

impl<T> Check<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Check::Passed(_))
    }
}

impl<T: Serialize> Serialize for Check<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Passed<'a, T> {
            ok: bool,
            #[serde(flatten)]
            value: &'a T,
        }

        #[derive(Serialize)]
        struct Failed<'a> {
            ok: bool,
            error: &'a str,
        }

        match self {
            Check::Passed(value) => Passed { ok: true, value }.serialize(serializer),
            Check::Failed(error) => Failed { ok: false, error }.serialize(serializer),
        }
    }
}

/// Everything `sheet-recalc diagnose` prints.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub platform: &'static str,
    pub engine: EngineReport,
    pub profile: ProfileReport,
    pub document: DocumentReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workbook: Option<Check<WorkbookSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recalc: Option<DiagnosticOutcome>,
}

impl EnvironmentReport {
    /// The document was found and recalculation produced a scan report.
    pub fn succeeded(&self) -> bool {
        self.document.exists && self.recalc.as_ref().is_some_and(DiagnosticOutcome::is_scan)
    }
}

/// Check the engine and profile, inspect `document`, then recalculate it
/// through `runner`. Stops after the document check if it is missing.
pub async fn diagnose<R: Recalc>(
    engine: &LibreOfficeEngine,
    runner: &DualModeRunner<R>,
    document: &Path,
    timeout: Duration,
) -> EnvironmentReport {
    let locator = engine.locator();
    let engine_report = EngineReport {
        configured: locator.explicit().map(Path::to_path_buf),
        candidates: locator
            .survey()
            .into_iter()
            .map(|c| CandidateReport {
                path: c.path,
                exists: c.exists,
            })
            .collect(),
        resolved: engine.locate(),
    };

    let profile = match engine.profile() {
        Ok(profile) => ProfileReport {
            config_dir: Some(profile.config_dir().to_path_buf()),
            entry_point: Some(profile.entry_point().to_path_buf()),
            state: Some(state_name(profile.entry_point_state())),
            error: None,
        },
        Err(e) => ProfileReport {
            config_dir: None,
            entry_point: None,
            state: None,
            error: Some(e.to_string()),
        },
    };

    let mut report = EnvironmentReport {
        platform: Platform::current().as_str(),
        engine: engine_report,
        profile,
        document: DocumentReport {
            path: document.to_path_buf(),
            exists: document.exists(),
        },
        workbook: None,
        recalc: None,
    };
    if !report.document.exists {
        tracing::warn!("Document {} not found", document.display());
        return report;
    }

    report.workbook = Some(match scanner::inspect(document) {
        Ok(summary) => Check::Passed(summary),
        Err(e) => Check::Failed(e.to_string()),
    });
    report.recalc = Some(runner.run(document, timeout).await);
    report
}

fn state_name(state: EntryPointState) -> &'static str {
    match state {
        EntryPointState::Missing => "missing",
        EntryPointState::Stale => "stale",
        EntryPointState::Installed => "installed",
    }
}
