//! The recalculate-then-scan pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sheet_recalc_libreoffice::{classify, EngineConfig, LibreOfficeEngine};

use crate::error::{RecalcError, Result};
use crate::report::{Report, ScanReport};
use crate::scanner;

/// Default bound on a single engine run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Recalculates documents with LibreOffice and scans the result.
#[derive(Debug, Clone, Default)]
pub struct Recalculator {
    engine: LibreOfficeEngine,
}

impl Recalculator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: LibreOfficeEngine::new(config),
        }
    }

    pub fn engine(&self) -> &LibreOfficeEngine {
        &self.engine
    }

    /// Recalculate `path` in place and scan it, stopping at the first failure.
    pub async fn try_recalc(&self, path: &Path, timeout: Duration) -> Result<ScanReport> {
        if !path.exists() {
            return Err(RecalcError::DocumentNotFound(path.to_path_buf()));
        }
        let document = absolute(path);

        let soffice = self.engine.locate();
        let provisioned = self
            .engine
            .provision(&soffice)
            .await
            .map_err(RecalcError::ProvisioningFailed)?;
        tracing::debug!(action = ?provisioned.action, "Macro provisioning done");

        let invocation = self.engine.invoke(&soffice, &document, timeout).await?;
        classify(invocation, timeout)?;

        let report = scanner::scan(&document)?;
        tracing::info!(
            total_errors = report.total_errors,
            total_formulas = report.total_formulas,
            "Recalculated {}",
            document.display()
        );
        Ok(report)
    }

    /// Like [`try_recalc`](Self::try_recalc), with failures folded into the report.
    pub async fn recalc(&self, path: &Path, timeout: Duration) -> Report {
        match self.try_recalc(path, timeout).await {
            Ok(report) => Report::Scan(report),
            Err(err) => {
                tracing::warn!("Recalculation of {} failed: {err}", path.display());
                Report::from(err)
            }
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
