//! # sheet-recalc
//!
//! Recalculate every formula in a spreadsheet with headless LibreOffice, then
//! scan the saved workbook for error values (`#DIV/0!`, `#REF!`, ...) and
//! count its formulas.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use sheet_recalc::{EngineConfig, Recalculator, Report, DEFAULT_TIMEOUT};
//!
//! # async fn example() {
//! let recalc = Recalculator::new(EngineConfig::default());
//! match recalc.recalc(Path::new("model.xlsx"), DEFAULT_TIMEOUT).await {
//!     Report::Scan(scan) => println!("{} errors", scan.total_errors),
//!     Report::Error(e) => eprintln!("{}", e.error),
//! }
//! # }
//! ```
//!
//! [`DualModeRunner`] wraps the same pipeline with a child-process fallback,
//! and [`diagnostics::diagnose`] reports on the whole environment.

pub mod diagnostics;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod scanner;
pub mod strategy;

pub use error::{RecalcError, Result};
pub use orchestrator::{Recalculator, DEFAULT_TIMEOUT};
pub use report::{
    ErrorBucket, ErrorKind, ErrorLocation, ErrorReport, ErrorTally, Report, ScanReport,
    ScanStatus, LOCATION_CAP,
};
pub use scanner::{inspect, scan, WorkbookSummary};
pub use strategy::{
    DiagnosticOutcome, DualModeRunner, ExecutionMode, ExternalCommand, ModePreference, Outcome,
    Recalc, RunCapture, StrategyConfig,
};

pub use sheet_recalc_libreoffice::EngineConfig;
