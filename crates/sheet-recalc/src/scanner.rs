//! Walks every cell of a workbook looking for error values and formulas.

use std::path::Path;

use serde::Serialize;
use sheet_recalc_xlsx::{CellValue, ReadMode, XlsxDocument, XlsxResult};

use crate::report::{ErrorKind, ErrorLocation, ErrorTally, ScanReport};

/// Scan a (recalculated) workbook.
///
/// Two passes over separate handles: cached values are checked for error
/// sentinels, then formula text is counted. Each handle is closed before its
/// pass returns.
pub fn scan(path: &Path) -> XlsxResult<ScanReport> {
    let tally = tally_errors(path)?;
    let total_formulas = count_formulas(path)?;
    tracing::debug!(
        errors = tally.total(),
        formulas = total_formulas,
        "Scanned {}",
        path.display()
    );
    Ok(tally.into_report(total_formulas))
}

fn tally_errors(path: &Path) -> XlsxResult<ErrorTally> {
    let mut doc = XlsxDocument::open(path, ReadMode::Values)?;
    let mut tally = ErrorTally::new();

    for sheet in doc.sheets() {
        let sheet = sheet?;
        for cell in sheet.cells() {
            let Some(kind) = cell.value.as_text().and_then(ErrorKind::find_in) else {
                continue;
            };
            tally.record(kind, ErrorLocation::new(sheet.name(), cell.address));
        }
    }
    Ok(tally)
}

fn count_formulas(path: &Path) -> XlsxResult<usize> {
    let mut doc = XlsxDocument::open(path, ReadMode::Formulas)?;
    let mut count = 0;
    for sheet in doc.sheets() {
        count += sheet?
            .cells()
            .iter()
            .filter(|c| is_formula_text(&c.value))
            .count();
    }
    Ok(count)
}

/// Text starting with `=`. Literal strings such as `"=x"` count too.
fn is_formula_text(value: &CellValue) -> bool {
    value.as_text().is_some_and(|t| t.starts_with('='))
}

/// Shape of a workbook, read without recalculating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkbookSummary {
    pub sheets: Vec<String>,
    pub total_formulas: usize,
}

/// Sheet names and formula count of the workbook at `path`.
pub fn inspect(path: &Path) -> XlsxResult<WorkbookSummary> {
    let sheets = {
        let doc = XlsxDocument::open(path, ReadMode::Formulas)?;
        doc.sheet_names().map(str::to_string).collect()
    };
    Ok(WorkbookSummary {
        sheets,
        total_formulas: count_formulas(path)?,
    })
}
