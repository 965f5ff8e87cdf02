//! Report types produced by a recalculation run.
//!
//! The JSON shape is stable: a successful scan serializes as
//!
//! ```json
//! {
//!   "status": "errors_found",
//!   "total_errors": 1,
//!   "error_summary": { "#DIV/0!": { "count": 1, "locations": ["Sheet1!B2"] } },
//!   "total_formulas": 4
//! }
//! ```
//!
//! and a failure as `{"error": "<message>"}`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sheet_recalc_xlsx::CellAddress;

use crate::error::RecalcError;

/// Maximum number of locations listed per error kind. Counts are not capped.
pub const LOCATION_CAP: usize = 20;

/// A computed-error sentinel. Declaration order is detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "#VALUE!")]
    Value,
    #[serde(rename = "#DIV/0!")]
    DivZero,
    #[serde(rename = "#REF!")]
    Ref,
    #[serde(rename = "#NAME?")]
    Name,
    #[serde(rename = "#NULL!")]
    Null,
    #[serde(rename = "#NUM!")]
    Num,
    #[serde(rename = "#N/A")]
    NotAvailable,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Value,
        ErrorKind::DivZero,
        ErrorKind::Ref,
        ErrorKind::Name,
        ErrorKind::Null,
        ErrorKind::Num,
        ErrorKind::NotAvailable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Value => "#VALUE!",
            ErrorKind::DivZero => "#DIV/0!",
            ErrorKind::Ref => "#REF!",
            ErrorKind::Name => "#NAME?",
            ErrorKind::Null => "#NULL!",
            ErrorKind::Num => "#NUM!",
            ErrorKind::NotAvailable => "#N/A",
        }
    }

    /// The first sentinel contained anywhere in `text`.
    ///
    /// Matching is by substring, so `"Error: #REF! in B3"` is a `#REF!` cell.
    pub fn find_in(text: &str) -> Option<ErrorKind> {
        Self::ALL.into_iter().find(|kind| text.contains(kind.as_str()))
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cell on a named sheet, written `Sheet!B2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
    pub sheet: String,
    pub cell: CellAddress,
}

impl ErrorLocation {
    pub fn new(sheet: impl Into<String>, cell: CellAddress) -> Self {
        Self {
            sheet: sheet.into(),
            cell,
        }
    }

    /// Parse `Sheet!B2`. The sheet name may itself contain `!`.
    pub fn parse(s: &str) -> Option<Self> {
        let (sheet, cell) = s.rsplit_once('!')?;
        let cell = CellAddress::parse(cell).ok()?;
        Some(Self::new(sheet, cell))
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.sheet, self.cell)
    }
}

impl Serialize for ErrorLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ErrorLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ErrorLocation::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid cell location: {s}")))
    }
}

/// Occurrences of one error kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBucket {
    pub count: usize,
    /// The first [`LOCATION_CAP`] locations in scan order.
    pub locations: Vec<ErrorLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Success,
    ErrorsFound,
}

/// Result of scanning a recalculated workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub status: ScanStatus,
    pub total_errors: usize,
    /// Only kinds that occurred, in sentinel order.
    pub error_summary: BTreeMap<ErrorKind, ErrorBucket>,
    pub total_formulas: usize,
}

/// A failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: String,
}

impl From<RecalcError> for ErrorReport {
    fn from(err: RecalcError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Either a scan report or an error, as printed by `sheet-recalc recalc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Report {
    Scan(ScanReport),
    Error(ErrorReport),
}

impl Report {
    pub fn as_scan(&self) -> Option<&ScanReport> {
        match self {
            Report::Scan(scan) => Some(scan),
            Report::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Report::Scan(_) => None,
            Report::Error(e) => Some(&e.error),
        }
    }
}

impl From<ScanReport> for Report {
    fn from(scan: ScanReport) -> Self {
        Report::Scan(scan)
    }
}

impl From<RecalcError> for Report {
    fn from(err: RecalcError) -> Self {
        Report::Error(err.into())
    }
}

/// Accumulates error occurrences while scanning.
#[derive(Debug, Default)]
pub struct ErrorTally {
    buckets: BTreeMap<ErrorKind, ErrorBucket>,
    total: usize,
}

impl ErrorTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: ErrorKind, location: ErrorLocation) {
        let bucket = self.buckets.entry(kind).or_default();
        bucket.count += 1;
        if bucket.locations.len() < LOCATION_CAP {
            bucket.locations.push(location);
        }
        self.total += 1;
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn into_report(self, total_formulas: usize) -> ScanReport {
        let status = if self.total == 0 {
            ScanStatus::Success
        } else {
            ScanStatus::ErrorsFound
        };
        ScanReport {
            status,
            total_errors: self.total,
            error_summary: self.buckets,
            total_formulas,
        }
    }
}
