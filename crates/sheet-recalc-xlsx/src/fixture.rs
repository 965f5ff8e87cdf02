//! Small in-memory workbook builder for tests.
//!
//! Only enough of SpreadsheetML is emitted for the reader in this crate (and
//! for LibreOffice) to open the result: no styles, no themes.

use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;

use crate::error::XlsxResult;

/// Cached result stored alongside a formula.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Number(f64),
    Text(String),
    Error(String),
}

#[derive(Debug, Clone)]
enum FixtureCell {
    Number(f64),
    SharedText(usize),
    InlineText(String),
    Error(String),
    Formula {
        text: String,
        cached: Option<CachedValue>,
    },
}

/// One worksheet of an [`XlsxFixture`].
#[derive(Debug, Default)]
pub struct FixtureSheet {
    name: String,
    cells: Vec<(String, FixtureCell)>,
    strings: Vec<String>,
}

impl FixtureSheet {
    pub fn number(&mut self, cell: &str, value: f64) -> &mut Self {
        self.cells.push((cell.to_string(), FixtureCell::Number(value)));
        self
    }

    /// A string stored in the shared strings table.
    pub fn text(&mut self, cell: &str, value: &str) -> &mut Self {
        self.strings.push(value.to_string());
        let idx = self.strings.len() - 1;
        self.cells.push((cell.to_string(), FixtureCell::SharedText(idx)));
        self
    }

    /// A string stored inline in the worksheet.
    pub fn inline_text(&mut self, cell: &str, value: &str) -> &mut Self {
        self.cells
            .push((cell.to_string(), FixtureCell::InlineText(value.to_string())));
        self
    }

    /// A literal error value (`t="e"`) without a formula.
    pub fn error(&mut self, cell: &str, value: &str) -> &mut Self {
        self.cells
            .push((cell.to_string(), FixtureCell::Error(value.to_string())));
        self
    }

    /// A formula without a cached result, as written by most generators.
    pub fn formula(&mut self, cell: &str, text: &str) -> &mut Self {
        self.formula_with(cell, text, None)
    }

    pub fn formula_with(
        &mut self,
        cell: &str,
        text: &str,
        cached: Option<CachedValue>,
    ) -> &mut Self {
        self.cells.push((
            cell.to_string(),
            FixtureCell::Formula {
                text: text.trim_start_matches('=').to_string(),
                cached,
            },
        ));
        self
    }
}

/// Builds a minimal `.xlsx` package.
#[derive(Debug, Default)]
pub struct XlsxFixture {
    sheets: Vec<FixtureSheet>,
}

impl XlsxFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet and populate it with `build`.
    pub fn sheet(mut self, name: &str, build: impl FnOnce(&mut FixtureSheet)) -> Self {
        let mut sheet = FixtureSheet {
            name: name.to_string(),
            ..FixtureSheet::default()
        };
        build(&mut sheet);
        self.sheets.push(sheet);
        self
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> XlsxResult<Vec<u8>> {
        let mut buf = Vec::new();
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = SimpleFileOptions::default();

        // Shared strings are pooled across sheets; remember each sheet's offset.
        let mut shared = Vec::new();
        let mut offsets = Vec::new();
        for sheet in &self.sheets {
            offsets.push(shared.len());
            shared.extend(sheet.strings.iter().cloned());
        }

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(self.content_types().as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#)?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(self.workbook_xml().as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(self.workbook_rels().as_bytes())?;

        zip.start_file("xl/sharedStrings.xml", options)?;
        zip.write_all(shared_strings_xml(&shared).as_bytes())?;

        for (idx, sheet) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", idx + 1), options)?;
            zip.write_all(worksheet_xml(sheet, offsets[idx]).as_bytes())?;
        }

        zip.finish()?;
        Ok(buf)
    }

    fn content_types(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
        );
        for idx in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{idx}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
        );
        for (idx, sheet) in self.sheets.iter().enumerate() {
            let n = idx + 1;
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
                escape(&sheet.name)
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for n in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
            ));
        }
        let shared_id = self.sheets.len() + 1;
        xml.push_str(&format!(
            r#"<Relationship Id="rId{shared_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#
        ));
        xml.push_str("</Relationships>");
        xml
    }
}

fn shared_strings_xml(strings: &[String]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for s in strings {
        xml.push_str(&format!("<si><t>{}</t></si>", escape(s)));
    }
    xml.push_str("</sst>");
    xml
}

fn worksheet_xml(sheet: &FixtureSheet, string_offset: usize) -> String {
    use crate::address::CellAddress;

    // Cells must appear in row-major order, grouped under their <row>.
    let mut cells: Vec<(CellAddress, &FixtureCell)> = sheet
        .cells
        .iter()
        .filter_map(|(r, c)| CellAddress::parse(r).ok().map(|a| (a, c)))
        .collect();
    cells.sort_by_key(|(a, _)| *a);

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    let mut open_row: Option<u32> = None;
    for (addr, cell) in cells {
        if open_row != Some(addr.row) {
            if open_row.is_some() {
                xml.push_str("</row>");
            }
            xml.push_str(&format!(r#"<row r="{}">"#, addr.row + 1));
            open_row = Some(addr.row);
        }
        xml.push_str(&cell_xml(&addr.to_string(), cell, string_offset));
    }
    if open_row.is_some() {
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn cell_xml(r: &str, cell: &FixtureCell, string_offset: usize) -> String {
    match cell {
        FixtureCell::Number(n) => format!(r#"<c r="{r}"><v>{n}</v></c>"#),
        FixtureCell::SharedText(idx) => {
            format!(r#"<c r="{r}" t="s"><v>{}</v></c>"#, idx + string_offset)
        }
        FixtureCell::InlineText(s) => {
            format!(r#"<c r="{r}" t="inlineStr"><is><t>{}</t></is></c>"#, escape(s))
        }
        FixtureCell::Error(e) => format!(r#"<c r="{r}" t="e"><v>{}</v></c>"#, escape(e)),
        FixtureCell::Formula { text, cached } => {
            let f = escape(text);
            match cached {
                None => format!(r#"<c r="{r}"><f>{f}</f></c>"#),
                Some(CachedValue::Number(n)) => format!(r#"<c r="{r}"><f>{f}</f><v>{n}</v></c>"#),
                Some(CachedValue::Text(s)) => {
                    format!(r#"<c r="{r}" t="str"><f>{f}</f><v>{}</v></c>"#, escape(s))
                }
                Some(CachedValue::Error(e)) => {
                    format!(r#"<c r="{r}" t="e"><f>{f}</f><v>{}</v></c>"#, escape(e))
                }
            }
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
