//! # sheet-recalc-xlsx
//!
//! A minimal XLSX cell reader for verifying workbooks after recalculation.
//!
//! A document is opened in one of two [`ReadMode`]s: `Values` surfaces the
//! results cached by the last calculation, `Formulas` surfaces formula text.
//! Nothing beyond cell content is decoded (no styles, comments, or charts).
//!
//! ```rust,no_run
//! use sheet_recalc_xlsx::{ReadMode, XlsxDocument};
//!
//! # fn example() -> sheet_recalc_xlsx::XlsxResult<()> {
//! let mut doc = XlsxDocument::open("book.xlsx", ReadMode::Values)?;
//! for sheet in doc.sheets() {
//!     let sheet = sheet?;
//!     for cell in sheet.cells() {
//!         println!("{}!{} = {:?}", sheet.name(), cell.address, cell.value);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod error;
pub mod reader;

#[cfg(feature = "test-fixtures")]
pub mod fixture;

pub use address::CellAddress;
pub use error::{XlsxError, XlsxResult};
pub use reader::{Cell, CellValue, ReadMode, Sheet, Sheets, XlsxDocument};
