//! Error types for driving LibreOffice.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("LibreOffice not found. Please install LibreOffice from https://www.libreoffice.org/")]
    NotFound,

    #[error("Recalculation timed out after {0} seconds")]
    Timeout(u64),

    #[error("LibreOffice macro not configured properly")]
    MacroNotConfigured,

    /// Non-zero exit; carries the captured stderr.
    #[error("{0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn LibreOffice: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Failed to setup LibreOffice macro: {0}")]
    Provisioning(#[source] std::io::Error),

    #[error("Could not determine the user configuration directory")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, EngineError>;
