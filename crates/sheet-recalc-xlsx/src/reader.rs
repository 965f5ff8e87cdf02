//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::address::CellAddress;
use crate::error::{XlsxError, XlsxResult};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// How formula cells are surfaced when reading a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Formula cells yield the value cached by the last calculation.
    Values,
    /// Formula cells yield their formula text, introduced by `=`.
    Formulas,
}

/// The content of a populated cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Text(String),
    /// A cached error value such as `#DIV/0!`
    Error(String),
    /// An ISO 8601 date stored with `t="d"`
    Date(String),
    /// Formula text including the leading `=` (formula mode only)
    Formula(String),
    /// Master cell of an array formula (formula mode only). Not textual.
    ArrayFormula(String),
}

impl CellValue {
    /// The cell content as text, for the variants that are textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) | CellValue::Error(s) | CellValue::Formula(s) => Some(s),
            CellValue::Number(_)
            | CellValue::Bool(_)
            | CellValue::Date(_)
            | CellValue::ArrayFormula(_) => None,
        }
    }
}

/// A populated cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub address: CellAddress,
    pub value: CellValue,
}

/// All populated cells of one worksheet, in row-major order.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    cells: Vec<Cell>,
}

impl Sheet {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    part: String,
}

/// An open XLSX package.
///
/// The package stays open for the lifetime of the value; dropping it
/// releases the underlying file.
pub struct XlsxDocument<R> {
    archive: zip::ZipArchive<R>,
    mode: ReadMode,
    shared_strings: Vec<String>,
    sheets: Vec<SheetEntry>,
}

impl XlsxDocument<BufReader<File>> {
    /// Open a workbook from a file path
    pub fn open<P: AsRef<Path>>(path: P, mode: ReadMode) -> XlsxResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file), mode)
    }
}

impl<R: Read + Seek> XlsxDocument<R> {
    /// Open a workbook from a reader
    pub fn from_reader(reader: R, mode: ReadMode) -> XlsxResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = read_shared_strings(&mut archive)?;
        let declared = read_workbook_sheets(&mut archive)?;
        let targets = read_worksheet_targets(&mut archive)?;

        // Chartsheets and dangling ids have no worksheet target.
        let sheets: Vec<SheetEntry> = declared
            .into_iter()
            .filter_map(|(name, r_id)| {
                targets
                    .get(&r_id)
                    .map(|part| SheetEntry { name, part: part.clone() })
            })
            .collect();

        tracing::debug!(
            sheets = sheets.len(),
            shared_strings = shared_strings.len(),
            ?mode,
            "Opened workbook"
        );

        Ok(Self {
            archive,
            mode,
            shared_strings,
            sheets,
        })
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    /// Read every populated cell of the sheet at `index`.
    pub fn read_sheet(&mut self, index: usize) -> XlsxResult<Sheet> {
        let entry = self
            .sheets
            .get(index)
            .cloned()
            .ok_or(XlsxError::SheetOutOfRange(index))?;

        let file = self
            .archive
            .by_name(&entry.part)
            .map_err(|_| XlsxError::MissingPart(entry.part.clone()))?;

        let mut cells = SheetParser::new(&entry.part, self.mode, &self.shared_strings)
            .parse(BufReader::new(file))?;
        cells.sort_by_key(|c| c.address);

        Ok(Sheet {
            name: entry.name,
            cells,
        })
    }

    /// Iterate over all sheets in workbook order.
    pub fn sheets(&mut self) -> Sheets<'_, R> {
        Sheets {
            document: self,
            next: 0,
        }
    }
}

/// Iterator returned by [`XlsxDocument::sheets`].
pub struct Sheets<'a, R> {
    document: &'a mut XlsxDocument<R>,
    next: usize,
}

impl<R: Read + Seek> Iterator for Sheets<'_, R> {
    type Item = XlsxResult<Sheet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.document.sheet_count() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.document.read_sheet(index))
    }
}

/// Decode Excel's `_xHHHH_` escape sequences (`_x000d_` is CR, `_x005f_` an underscore).
fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push('_');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

// Text is not trimmed: `xml:space="preserve"` runs keep their spaces.
fn xml_reader<B: std::io::BufRead>(source: B) -> Reader<B> {
    Reader::from_reader(source)
}

/// Read the shared strings table
fn read_shared_strings<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<Vec<String>> {
    let mut strings = Vec::new();

    let file = match archive.by_name(SHARED_STRINGS_PART) {
        Ok(f) => f,
        Err(_) => return Ok(strings), // No shared strings is valid
    };

    let mut reader = xml_reader(BufReader::new(file));
    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(decode_excel_escapes(&current));
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_t => {
                if let Ok(text) = e.unescape() {
                    current.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::xml(SHARED_STRINGS_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Read workbook.xml to get sheet names and relationship ids, in order
fn read_workbook_sheets<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> XlsxResult<Vec<(String, String)>> {
    let file = archive
        .by_name(WORKBOOK_PART)
        .map_err(|_| XlsxError::MissingPart(WORKBOOK_PART.into()))?;

    let mut reader = xml_reader(BufReader::new(file));
    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                if let (Some(name), Some(r_id)) = (attr_value(&e, b"name"), attr_value(&e, b"id"))
                {
                    sheets.push((name, r_id));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::xml(WORKBOOK_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Read workbook.xml.rels to map relationship ids to worksheet parts
fn read_worksheet_targets<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> XlsxResult<HashMap<String, String>> {
    let file = archive
        .by_name(WORKBOOK_RELS_PART)
        .map_err(|_| XlsxError::MissingPart(WORKBOOK_RELS_PART.into()))?;

    let mut reader = xml_reader(BufReader::new(file));
    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr_value(&e, b"Id");
                let target = attr_value(&e, b"Target");
                let rel_type = attr_value(&e, b"Type");
                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    if rel_type.ends_with("/worksheet") {
                        rels.insert(id, resolve_part(&target));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::xml(WORKBOOK_RELS_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Resolve a relationship target against the `xl/` folder.
fn resolve_part(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = vec!["xl"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Cell being accumulated between `<c>` and `</c>`.
#[derive(Default)]
struct PendingCell {
    address: Option<CellAddress>,
    kind: Option<String>,
    value: Option<String>,
    inline: Option<String>,
    has_formula: bool,
    is_array: bool,
    formula: String,
    shared_index: Option<String>,
}

struct SheetParser<'a> {
    part: &'a str,
    mode: ReadMode,
    shared_strings: &'a [String],
    shared_formulas: HashMap<String, String>,
}

impl<'a> SheetParser<'a> {
    fn new(part: &'a str, mode: ReadMode, shared_strings: &'a [String]) -> Self {
        Self {
            part,
            mode,
            shared_strings,
            shared_formulas: HashMap::new(),
        }
    }

    fn parse<B: std::io::BufRead>(mut self, source: B) -> XlsxResult<Vec<Cell>> {
        let mut reader = xml_reader(source);
        let mut buf = Vec::new();
        let mut cells = Vec::new();

        let mut row: Option<u32> = None;
        let mut next_col: u16 = 0;
        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;
        let mut in_formula = false;
        let mut in_inline = false;
        let mut in_inline_text = false;
        let mut in_phonetic = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"row" => {
                        row = Some(Self::row_index(&e, row));
                        next_col = 0;
                    }
                    b"c" => {
                        let pending = self.start_cell(&e, row, next_col)?;
                        if let Some(addr) = pending.address {
                            next_col = addr.col.saturating_add(1);
                        }
                        cell = Some(pending);
                    }
                    b"v" if cell.is_some() => in_value = true,
                    b"f" => {
                        if let Some(pending) = cell.as_mut() {
                            Self::start_formula(pending, &e);
                            in_formula = true;
                        }
                    }
                    b"is" if cell.is_some() => in_inline = true,
                    b"rPh" if in_inline => in_phonetic = true,
                    b"t" if in_inline && !in_phonetic => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"row" => {
                        row = Some(Self::row_index(&e, row));
                        next_col = 0;
                    }
                    b"c" => {
                        // Valueless cell, possibly only carrying a style.
                        let pending = self.start_cell(&e, row, next_col)?;
                        if let Some(addr) = pending.address {
                            next_col = addr.col.saturating_add(1);
                        }
                    }
                    b"f" => {
                        if let Some(pending) = cell.as_mut() {
                            Self::start_formula(pending, &e);
                        }
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            if let Some(done) = self.finish_cell(pending)? {
                                cells.push(done);
                            }
                        }
                        in_value = false;
                        in_formula = false;
                        in_inline = false;
                    }
                    b"v" => in_value = false,
                    b"f" => {
                        in_formula = false;
                        if let Some(pending) = cell.as_ref() {
                            self.remember_shared_master(pending);
                        }
                    }
                    b"is" => in_inline = false,
                    b"rPh" => in_phonetic = false,
                    b"t" => in_inline_text = false,
                    b"sheetData" => break,
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if let Some(pending) = cell.as_mut() {
                        let text = e
                            .unescape()
                            .map_err(|err| XlsxError::xml(self.part, err))?;
                        if in_value {
                            pending.value.get_or_insert_with(String::new).push_str(&text);
                        } else if in_formula {
                            pending.formula.push_str(&text);
                        } else if in_inline_text {
                            pending.inline.get_or_insert_with(String::new).push_str(&text);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::xml(self.part, e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(cells)
    }

    /// The 0-based index of a `<row>`; rows without `r` follow the previous one.
    fn row_index(e: &BytesStart<'_>, previous: Option<u32>) -> u32 {
        attr_value(e, b"r")
            .and_then(|r| r.parse::<u32>().ok())
            .map(|r| r.saturating_sub(1))
            .unwrap_or_else(|| previous.map_or(0, |p| p.saturating_add(1)))
    }

    fn start_cell(
        &self,
        e: &BytesStart<'_>,
        row: Option<u32>,
        next_col: u16,
    ) -> XlsxResult<PendingCell> {
        let address = match attr_value(e, b"r") {
            Some(r) => CellAddress::parse(&r)?,
            None => CellAddress::new(row.unwrap_or(0), next_col),
        };
        Ok(PendingCell {
            address: Some(address),
            kind: attr_value(e, b"t"),
            ..PendingCell::default()
        })
    }

    fn start_formula(pending: &mut PendingCell, e: &BytesStart<'_>) {
        pending.has_formula = true;
        match attr_value(e, b"t").as_deref() {
            Some("shared") => pending.shared_index = attr_value(e, b"si"),
            Some("array") => pending.is_array = true,
            _ => {}
        }
    }

    fn remember_shared_master(&mut self, pending: &PendingCell) {
        if let Some(si) = &pending.shared_index {
            if !pending.formula.is_empty() {
                self.shared_formulas
                    .insert(si.clone(), pending.formula.clone());
            }
        }
    }

    fn finish_cell(&self, pending: PendingCell) -> XlsxResult<Option<Cell>> {
        let Some(address) = pending.address else {
            return Ok(None);
        };

        if pending.has_formula && self.mode == ReadMode::Formulas {
            // Dependents of a shared formula carry the master's text unshifted.
            let text = match (&pending.shared_index, pending.formula.is_empty()) {
                (Some(si), true) => self
                    .shared_formulas
                    .get(si)
                    .cloned()
                    .unwrap_or_default(),
                _ => pending.formula.clone(),
            };
            let text = if text.starts_with('=') {
                text
            } else {
                format!("={text}")
            };
            let value = if pending.is_array {
                CellValue::ArrayFormula(text)
            } else {
                CellValue::Formula(text)
            };
            return Ok(Some(Cell { address, value }));
        }

        let value = self.resolve_value(&pending)?;
        Ok(value.map(|value| Cell { address, value }))
    }

    fn resolve_value(&self, pending: &PendingCell) -> XlsxResult<Option<CellValue>> {
        if pending.kind.as_deref() == Some("inlineStr") {
            let text = pending.inline.as_deref().or(pending.value.as_deref());
            return Ok(text.map(|t| CellValue::Text(decode_excel_escapes(t))));
        }

        let Some(raw) = pending.value.as_deref() else {
            return Ok(None);
        };

        let value = match pending.kind.as_deref() {
            Some("s") => {
                let idx: usize = raw.trim().parse().map_err(|_| {
                    XlsxError::InvalidFormat(format!("Invalid shared string index: {raw}"))
                })?;
                let s = self.shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::InvalidFormat(format!("Shared string index {idx} out of bounds"))
                })?;
                CellValue::Text(s.clone())
            }
            Some("b") => CellValue::Bool(raw == "1" || raw.eq_ignore_ascii_case("true")),
            Some("e") => CellValue::Error(raw.to_string()),
            Some("str") => CellValue::Text(decode_excel_escapes(raw)),
            Some("d") => CellValue::Date(raw.to_string()),
            None | Some("n") => match raw.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::Text(raw.to_string()),
            },
            Some(_) => CellValue::Text(raw.to_string()),
        };

        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("hello_x000d_world"), "hello\rworld");
        assert_eq!(decode_excel_escapes("col1_x0009_col2"), "col1\tcol2");
        assert_eq!(decode_excel_escapes("under_x005f_score"), "under_score");
        assert_eq!(decode_excel_escapes("_x000D__x000A_"), "\r\n");
        assert_eq!(decode_excel_escapes("plain text"), "plain text");
    }

    #[test]
    fn test_decode_excel_escapes_partial_sequence() {
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("_x000d"), "_x000d");
        assert_eq!(decode_excel_escapes("a_xzzzz_b"), "a_xzzzz_b");
    }

    #[test]
    fn test_resolve_part() {
        assert_eq!(resolve_part("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_part("/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
        assert_eq!(resolve_part("./worksheets/../worksheets/s.xml"), "xl/worksheets/s.xml");
    }

    fn parse_sheet(xml: &str, mode: ReadMode, shared: &[String]) -> Vec<Cell> {
        SheetParser::new("sheet.xml", mode, shared)
            .parse(xml.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_formula_cell_in_each_mode() {
        let xml = r#"<worksheet><sheetData><row r="2"><c r="D2"><f>B2*C2</f><v>99</v></c><c r="E2" t="e"><f>1/0</f><v>#DIV/0!</v></c></row></sheetData></worksheet>"#;

        let values = parse_sheet(xml, ReadMode::Values, &[]);
        assert_eq!(values[0].value, CellValue::Number(99.0));
        assert_eq!(values[1].value, CellValue::Error("#DIV/0!".into()));

        let formulas = parse_sheet(xml, ReadMode::Formulas, &[]);
        assert_eq!(formulas[0].value, CellValue::Formula("=B2*C2".into()));
        assert_eq!(formulas[1].value, CellValue::Formula("=1/0".into()));
    }

    #[test]
    fn test_formula_without_cached_value_is_skipped_in_value_mode() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1"><f>NOW()</f></c></row></sheetData></worksheet>"#;
        assert!(parse_sheet(xml, ReadMode::Values, &[]).is_empty());
        assert_eq!(parse_sheet(xml, ReadMode::Formulas, &[]).len(), 1);
    }

    #[test]
    fn test_shared_formula_dependents() {
        let xml = r#"<worksheet><sheetData>
            <row r="2"><c r="D2"><f t="shared" ref="D2:D4" si="0">B2*C2</f><v>1</v></c></row>
            <row r="3"><c r="D3"><f t="shared" si="0"/><v>2</v></c></row>
            <row r="4"><c r="D4"><f t="shared" si="0"/><v>3</v></c></row>
        </sheetData></worksheet>"#;

        let cells = parse_sheet(xml, ReadMode::Formulas, &[]);
        assert_eq!(cells.len(), 3);
        assert!(cells.iter().all(|c| c.value == CellValue::Formula("=B2*C2".into())));
    }

    #[test]
    fn test_array_formula_master_is_not_text() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="C1"><f t="array" ref="C1:C2">A1:A2*B1:B2</f><v>6</v></c></row><row r="2"><c r="C2"><v>12</v></c></row></sheetData></worksheet>"#;

        let cells = parse_sheet(xml, ReadMode::Formulas, &[]);
        assert_eq!(cells[0].value, CellValue::ArrayFormula("=A1:A2*B1:B2".into()));
        assert_eq!(cells[0].value.as_text(), None);
        assert_eq!(cells[1].value, CellValue::Number(12.0));

        let cells = parse_sheet(xml, ReadMode::Values, &[]);
        assert_eq!(cells[0].value, CellValue::Number(6.0));
    }

    #[test]
    fn test_row_after_last_numbered_row() {
        let xml = r#"<worksheet><sheetData><row r="4294967295"><c><v>1</v></c></row><row><c><v>2</v></c></row><row><c><v>3</v></c></row></sheetData></worksheet>"#;
        let cells = parse_sheet(xml, ReadMode::Values, &[]);
        let rows: Vec<u32> = cells.iter().map(|c| c.address.row).collect();
        assert_eq!(rows, vec![u32::MAX - 1, u32::MAX, u32::MAX]);
        assert_eq!(cells[2].address.to_string(), "A4294967296");
    }

    #[test]
    fn test_cells_without_reference_follow_position() {
        let xml = r#"<worksheet><sheetData><row><c t="inlineStr"><is><t>a</t></is></c><c><v>2</v></c></row><row><c><v>3</v></c></row></sheetData></worksheet>"#;
        let cells = parse_sheet(xml, ReadMode::Values, &[]);
        let refs: Vec<String> = cells.iter().map(|c| c.address.to_string()).collect();
        assert_eq!(refs, vec!["A1", "B1", "A2"]);
    }

    #[test]
    fn test_shared_and_inline_strings() {
        let shared = vec!["zero".to_string(), "#REF! here".to_string()];
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>1</v></c><c r="B1" t="inlineStr"><is><r><t>rich </t></r><r><t>text</t></r></is></c><c r="C1" t="b"><v>1</v></c></row></sheetData></worksheet>"#;
        let cells = parse_sheet(xml, ReadMode::Values, &shared);
        assert_eq!(cells[0].value, CellValue::Text("#REF! here".into()));
        assert_eq!(cells[1].value, CellValue::Text("rich text".into()));
        assert_eq!(cells[2].value, CellValue::Bool(true));
    }

    #[test]
    fn test_shared_string_index_out_of_bounds() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>7</v></c></row></sheetData></worksheet>"#;
        let result = SheetParser::new("sheet.xml", ReadMode::Values, &[]).parse(xml.as_bytes());
        assert!(matches!(result, Err(XlsxError::InvalidFormat(_))));
    }
}
