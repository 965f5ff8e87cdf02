//! Run a recalculation in-process, falling back to a child process.
//!
//! The embedded attempt runs the pipeline on a spawned task. If it panics,
//! overruns its deadline or is disabled, the same request is handed to an
//! external command (by default this executable's `recalc` subcommand) and
//! its stdout is decoded as a [`Report`]. Both paths end in one
//! [`DiagnosticOutcome`].

use std::any::Any;
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sheet_recalc_libreoffice::{run_bounded, Invocation};
use tokio::process::Command;

use crate::error::RecalcError;
use crate::orchestrator::Recalculator;
use crate::report::Report;

/// Extra time granted on top of the recalculation timeout before an attempt
/// is abandoned.
pub const DEFAULT_SLACK: Duration = Duration::from_secs(15);

/// Something that can recalculate a document in-process.
pub trait Recalc: Send + Sync + 'static {
    fn recalc(&self, document: PathBuf, timeout: Duration) -> impl Future<Output = Report> + Send;
}

impl Recalc for Recalculator {
    fn recalc(&self, document: PathBuf, timeout: Duration) -> impl Future<Output = Report> + Send {
        async move { Recalculator::recalc(self, &document, timeout).await }
    }
}

/// Which attempts to make.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModePreference {
    /// Embedded first, external on failure.
    #[default]
    Auto,
    /// Embedded only.
    Embedded,
    /// External only.
    External,
}

/// Where the reported outcome came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Embedded,
    External,
}

/// Program and leading arguments of the external attempt. The document path
/// and the timeout in seconds are appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `<current executable> recalc`
    pub fn recalc_subcommand() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?).arg("recalc"))
    }

    fn to_command(&self, document: &Path, timeout: Duration) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(document)
            .arg(timeout.as_secs().to_string());
        cmd
    }
}

#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub preference: ModePreference,
    /// If None, [`ExternalCommand::recalc_subcommand`] is used.
    pub external_command: Option<ExternalCommand>,
    /// Default: 15 seconds.
    pub slack: Duration,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            preference: ModePreference::Auto,
            external_command: None,
            slack: DEFAULT_SLACK,
        }
    }
}

/// Raw capture of the external process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunCapture {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returncode: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunCapture {
    fn failed(error: String) -> Self {
        Self {
            ok: false,
            returncode: None,
            stdout: String::new(),
            stderr: String::new(),
            error: Some(error),
        }
    }
}

/// The report, or why none could be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Result(Report),
    Error(String),
}

/// What a [`DualModeRunner`] did and what came of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticOutcome {
    /// A report (of either kind) was obtained.
    pub ok: bool,
    pub mode: ExecutionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inprocess_error: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunCapture>,
}

impl DiagnosticOutcome {
    pub fn report(&self) -> Option<&Report> {
        match &self.outcome {
            Outcome::Result(report) => Some(report),
            Outcome::Error(_) => None,
        }
    }

    /// A scan report was produced, whichever way.
    pub fn is_scan(&self) -> bool {
        self.report().and_then(Report::as_scan).is_some()
    }
}

/// Runs a [`Recalc`] in-process with an external fallback.
pub struct DualModeRunner<R> {
    embedded: Arc<R>,
    config: StrategyConfig,
}

impl<R: Recalc> DualModeRunner<R> {
    pub fn new(embedded: R, config: StrategyConfig) -> Self {
        Self {
            embedded: Arc::new(embedded),
            config,
        }
    }

    pub async fn run(&self, document: &Path, timeout: Duration) -> DiagnosticOutcome {
        let inprocess_error = match self.config.preference {
            ModePreference::External => "embedded execution disabled".to_string(),
            ModePreference::Auto | ModePreference::Embedded => {
                match self.run_embedded(document, timeout).await {
                    Ok(report) => {
                        return DiagnosticOutcome {
                            ok: true,
                            mode: ExecutionMode::Embedded,
                            inprocess_error: None,
                            outcome: Outcome::Result(report),
                            run: None,
                        }
                    }
                    Err(e) => e,
                }
            }
        };

        if self.config.preference == ModePreference::Embedded {
            return DiagnosticOutcome {
                ok: false,
                mode: ExecutionMode::Embedded,
                inprocess_error: None,
                outcome: Outcome::Error(inprocess_error),
                run: None,
            };
        }

        tracing::info!("Falling back to external recalculation: {inprocess_error}");
        let (outcome, run) = self.run_external(document, timeout).await;
        DiagnosticOutcome {
            ok: matches!(outcome, Outcome::Result(_)),
            mode: ExecutionMode::External,
            inprocess_error: Some(inprocess_error),
            outcome,
            run,
        }
    }

    async fn run_embedded(&self, document: &Path, timeout: Duration) -> Result<Report, String> {
        let embedded = Arc::clone(&self.embedded);
        let owned = document.to_path_buf();
        let mut task = tokio::spawn(async move { embedded.recalc(owned, timeout).await });

        let bound = timeout.saturating_add(self.config.slack);
        match tokio::time::timeout(bound, &mut task).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(join)) if join.is_panic() => Err(format!(
                "embedded recalculation panicked: {}",
                panic_message(join.into_panic())
            )),
            Ok(Err(join)) => Err(format!("embedded recalculation aborted: {join}")),
            Err(_) => {
                task.abort();
                Err(format!(
                    "embedded recalculation did not finish within {} seconds",
                    bound.as_secs()
                ))
            }
        }
    }

    async fn run_external(
        &self,
        document: &Path,
        timeout: Duration,
    ) -> (Outcome, Option<RunCapture>) {
        let command = match &self.config.external_command {
            Some(command) => command.clone(),
            None => match ExternalCommand::recalc_subcommand() {
                Ok(command) => command,
                Err(e) => {
                    return (
                        Outcome::Error(format!("cannot determine current executable: {e}")),
                        None,
                    )
                }
            },
        };

        let bound = timeout.saturating_add(self.config.slack);
        let invocation = match run_bounded(command.to_command(document, timeout), bound).await {
            Ok(invocation) => invocation,
            Err(e) => {
                let message = format!("failed to launch {}: {e}", command.program.display());
                return (Outcome::Error(message.clone()), Some(RunCapture::failed(message)));
            }
        };

        match invocation {
            Invocation::Completed(output) => {
                let capture = RunCapture {
                    ok: output.success(),
                    returncode: output.status.code(),
                    stdout: output.stdout.trim().to_string(),
                    stderr: output.stderr.trim().to_string(),
                    error: None,
                };
                let outcome = match serde_json::from_str::<Report>(&capture.stdout) {
                    Ok(report) => Outcome::Result(report),
                    Err(e) => Outcome::Error(RecalcError::ReportDecodeFailed(e).to_string()),
                };
                (outcome, Some(capture))
            }
            Invocation::NotFound => {
                let message = format!("{} not found", command.program.display());
                (Outcome::Error(message.clone()), Some(RunCapture::failed(message)))
            }
            Invocation::TimedOut => {
                let message = format!("timed out after {} seconds", bound.as_secs());
                (Outcome::Error(message.clone()), Some(RunCapture::failed(message)))
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
