//! Headless LibreOffice recalculation.
//!
//! LibreOffice is driven as a short-lived child process: a StarBasic macro
//! that recalculates, saves and closes the active document is installed into
//! the user's profile once, then `soffice --headless` is pointed at that macro
//! and the target document.
//!
//! # Architecture
//!
//! ```text
//! LibreOfficeEngine
//!     ├── EngineLocator   (which soffice)
//!     ├── EngineProfile   (where Module1.xba lives, ensure it is installed)
//!     └── invoker         (soffice --headless --norestore <macro-url> <doc>)
//!           └── process::run_bounded (spawn, capture, kill on timeout)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use sheet_recalc_libreoffice::{EngineConfig, LibreOfficeEngine};
//!
//! # async fn example() -> sheet_recalc_libreoffice::error::Result<()> {
//! let engine = LibreOfficeEngine::new(EngineConfig::default());
//! engine
//!     .recalculate(Path::new("/tmp/book.xlsx"), Duration::from_secs(30))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod invoker;
pub mod locator;
pub mod process;
pub mod profile;

pub use engine::{EngineConfig, LibreOfficeEngine};
pub use error::EngineError;
pub use invoker::{classify, stderr_indicates_missing_macro};
pub use locator::{Candidate, EngineLocator, Platform};
pub use process::{run_bounded, Invocation, ProcessOutput};
pub use profile::{
    EngineProfile, EntryPointState, MacroLocator, ProvisionAction, Provisioned,
};
