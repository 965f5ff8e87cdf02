//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur while reading a workbook
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },

    /// Invalid file format
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Malformed cell reference
    #[error("Invalid cell reference: {0}")]
    InvalidAddress(String),

    /// Sheet index past the end of the workbook
    #[error("Sheet index {0} out of range")]
    SheetOutOfRange(usize),
}

impl XlsxError {
    pub(crate) fn xml(part: &str, source: quick_xml::Error) -> Self {
        Self::Xml {
            part: part.to_string(),
            source,
        }
    }
}
