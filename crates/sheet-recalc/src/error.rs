//! Error types for the recalculation pipeline

use std::path::PathBuf;

use sheet_recalc_libreoffice::EngineError;
use sheet_recalc_xlsx::XlsxError;
use thiserror::Error;

/// Result type for recalculation
pub type Result<T> = std::result::Result<T, RecalcError>;

/// Why a recalculation did not produce a scan report.
///
/// The display text of each variant is what ends up in an
/// [`ErrorReport`](crate::ErrorReport).
#[derive(Debug, Error)]
pub enum RecalcError {
    #[error("File {} does not exist", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("LibreOffice not found. Please install LibreOffice from https://www.libreoffice.org/")]
    EngineNotFound,

    #[error("Failed to setup LibreOffice macro")]
    ProvisioningFailed(#[source] EngineError),

    #[error("LibreOffice macro not configured properly")]
    MacroNotConfigured,

    #[error("Recalculation timed out after {0} seconds")]
    Timeout(u64),

    /// Captured stderr of the failed run, verbatim.
    #[error("{0}")]
    EngineExecutionFailed(String),

    /// The recalculated document could not be read back.
    #[error("{0}")]
    ScanReadFailed(#[from] XlsxError),

    #[error("Could not decode recalculation report: {0}")]
    ReportDecodeFailed(#[from] serde_json::Error),
}

impl From<EngineError> for RecalcError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound => RecalcError::EngineNotFound,
            EngineError::Timeout(secs) => RecalcError::Timeout(secs),
            EngineError::MacroNotConfigured => RecalcError::MacroNotConfigured,
            EngineError::ExecutionFailed(stderr) => RecalcError::EngineExecutionFailed(stderr),
            EngineError::SpawnFailed(e) => RecalcError::EngineExecutionFailed(e.to_string()),
            err @ (EngineError::Provisioning(_) | EngineError::NoConfigDir) => {
                RecalcError::ProvisioningFailed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_keep_their_messages() {
        let cases = [
            (
                EngineError::NotFound,
                "LibreOffice not found. Please install LibreOffice from https://www.libreoffice.org/",
            ),
            (EngineError::Timeout(5), "Recalculation timed out after 5 seconds"),
            (
                EngineError::MacroNotConfigured,
                "LibreOffice macro not configured properly",
            ),
            (EngineError::ExecutionFailed("boom\n".into()), "boom\n"),
            (EngineError::NoConfigDir, "Failed to setup LibreOffice macro"),
        ];
        for (engine_err, expected) in cases {
            assert_eq!(RecalcError::from(engine_err).to_string(), expected);
        }
    }

    #[test]
    fn test_missing_document_message_uses_given_path() {
        let err = RecalcError::DocumentNotFound(PathBuf::from("missing.xlsx"));
        assert_eq!(err.to_string(), "File missing.xlsx does not exist");
    }
}
