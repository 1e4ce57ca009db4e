//! XLSX reader

mod shared;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use model_audit_core::{CellAddress, CellContent, CellError, CellTable, Workbook};
use shared::{with_equals, SharedFormulas};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '_' {
            result.push(c);
            continue;
        }

        let mut hex_chars = String::new();
        let mut is_escape = false;

        if chars.peek() == Some(&'x') {
            chars.next();

            for _ in 0..4 {
                match chars.peek() {
                    Some(&ch) if ch.is_ascii_hexdigit() => {
                        hex_chars.push(ch);
                        chars.next();
                    }
                    _ => break,
                }
            }

            if hex_chars.len() == 4 && chars.peek() == Some(&'_') {
                chars.next();
                if let Some(decoded) =
                    u32::from_str_radix(&hex_chars, 16).ok().and_then(char::from_u32)
                {
                    result.push(decoded);
                    is_escape = true;
                }
            }

            if !is_escape {
                result.push('_');
                result.push('x');
                result.push_str(&hex_chars);
            }
        } else {
            result.push('_');
        }
    }

    result
}

/// The two tables read from one worksheet part
struct SheetTables {
    values: CellTable,
    formulas: CellTable,
}

/// Attributes and content of the `<c>` element being read
#[derive(Default)]
struct PendingCell {
    address: Option<CellAddress>,
    cell_type: Option<String>,
    value: Option<String>,
    formula: Option<String>,
    formula_type: Option<String>,
    shared_index: Option<u32>,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a workbook from a reader.
    ///
    /// Container-level problems (not a zip, missing workbook part) are
    /// errors. A worksheet that cannot be read is logged, recorded in
    /// [`Workbook::skipped_sheets`] and left out.
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let sheet_info = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::new();

        for (name, r_id) in &sheet_info {
            let Some(path) = sheet_paths.get(r_id) else {
                log::warn!("Skipping sheet '{}': no worksheet relationship {}", name, r_id);
                workbook.record_skipped(name, format!("no worksheet relationship {}", r_id));
                continue;
            };

            let tables = match Self::read_worksheet(&mut archive, path, &shared_strings) {
                Ok(tables) => tables,
                Err(e) => {
                    log::warn!("Skipping sheet '{}': {}", name, e);
                    workbook.record_skipped(name, e.to_string());
                    continue;
                }
            };

            if let Err(e) = workbook.add_sheet(name.as_str(), tables.values, tables.formulas) {
                log::warn!("Skipping sheet '{}': {}", name, e);
                workbook.record_skipped(name, e.to_string());
            }
        }

        log::debug!(
            "Read {} sheet(s), skipped {}",
            workbook.sheet_count(),
            workbook.skipped_sheets().len()
        );

        Ok(workbook)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current_string = String::new();
        let mut in_si = false;
        let mut in_t = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                    }
                    b"t" if in_si => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current_string));
                        current_string.clear();
                        in_si = false;
                    }
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let Ok(text) = e.unescape() {
                        current_string.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Read workbook.xml to get sheet names and rIds, in workbook order
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let name = attr_value(&e, b"name");
                    let r_id = attr_value(&e, b"r:id");
                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        sheets.push((name, r_id));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to get sheet file paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");

                    // Only worksheet relationships; chartsheets carry no cells
                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read one worksheet part into a value table and a formula table
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        shared_strings: &[String],
    ) -> XlsxResult<SheetTables> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut tables = SheetTables {
            values: CellTable::new(),
            formulas: CellTable::new(),
        };
        let mut shared = SharedFormulas::default();

        let mut cell = PendingCell::default();
        let mut in_cell = false;
        let mut in_value = false;
        let mut in_formula = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;

        // Position of the last cell, for cells written without an `r`
        let mut row_cursor: u32 = 0;
        let mut next_col: u16 = 0;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => {
                        row_cursor = attr_value(&e, b"r")
                            .and_then(|r| r.parse::<u32>().ok())
                            .map_or(row_cursor, |r| r.saturating_sub(1));
                        next_col = 0;
                    }
                    b"c" => {
                        in_cell = true;
                        cell = Self::start_cell(&e, row_cursor, next_col)?;
                    }
                    b"v" if in_cell => in_value = true,
                    b"f" if in_cell => {
                        in_formula = true;
                        Self::read_formula_attrs(&e, &mut cell);
                    }
                    b"is" if in_cell => in_inline_str = true,
                    b"t" if in_inline_str => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"f" if in_cell => Self::read_formula_attrs(&e, &mut cell),
                    b"c" => {
                        // Formatting-only cell; it still advances the cursor
                        let blank = Self::start_cell(&e, row_cursor, next_col)?;
                        if let Some(addr) = blank.address {
                            row_cursor = addr.row;
                            next_col = addr.col.saturating_add(1);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if in_value || in_formula || in_inline_text {
                        let text = e.unescape()?;
                        let target = if in_formula {
                            &mut cell.formula
                        } else {
                            &mut cell.value
                        };
                        target.get_or_insert_with(String::new).push_str(&text);
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        in_cell = false;
                        if let Some(addr) = cell.address {
                            row_cursor = addr.row;
                            next_col = addr.col.saturating_add(1);
                        }
                        Self::process_cell(
                            &mut tables,
                            std::mem::take(&mut cell),
                            shared_strings,
                            &mut shared,
                        )?;
                    }
                    b"v" => in_value = false,
                    b"f" => in_formula = false,
                    b"is" => in_inline_str = false,
                    b"t" => in_inline_text = false,
                    b"row" => row_cursor = row_cursor.saturating_add(1),
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(tables)
    }

    fn start_cell(e: &BytesStart, row_cursor: u32, next_col: u16) -> XlsxResult<PendingCell> {
        let address = match attr_value(e, b"r") {
            Some(r) => CellAddress::parse(&r).map_err(|err| {
                XlsxError::Parse(format!("Invalid cell reference '{}': {}", r, err))
            })?,
            None => CellAddress::new(row_cursor, next_col),
        };

        Ok(PendingCell {
            address: Some(address),
            cell_type: attr_value(e, b"t"),
            ..PendingCell::default()
        })
    }

    fn read_formula_attrs(e: &BytesStart, cell: &mut PendingCell) {
        cell.formula_type = attr_value(e, b"t");
        cell.shared_index = attr_value(e, b"si").and_then(|si| si.parse::<u32>().ok());
    }

    /// Place a finished cell into both tables
    fn process_cell(
        tables: &mut SheetTables,
        cell: PendingCell,
        shared_strings: &[String],
        shared: &mut SharedFormulas,
    ) -> XlsxResult<()> {
        let Some(addr) = cell.address else {
            return Ok(());
        };
        let (row, col) = (addr.row, addr.col);
        let cell_type = cell.cell_type.as_deref();

        let is_shared = cell.formula_type.as_deref() == Some("shared");
        let formula_text = cell.formula.as_deref().filter(|f| !f.trim().is_empty());

        let formula = match (formula_text, is_shared, cell.shared_index) {
            (Some(text), true, Some(si)) => {
                shared.insert_anchor(si, text, row, col);
                Some(with_equals(text))
            }
            (Some(text), _, _) => Some(with_equals(text)),
            (None, true, Some(si)) => {
                let expanded = shared.expand(si, row, col);
                if expanded.is_none() {
                    log::warn!(
                        "Shared formula group {} has no usable anchor for {}",
                        si,
                        addr.to_a1_string()
                    );
                }
                expanded
            }
            _ => None,
        };

        let value = match cell.value.as_deref() {
            Some(raw) => Self::typed_value(raw, cell_type, shared_strings, formula.is_some())?,
            None => CellContent::Blank,
        };

        let formula_content = match formula {
            Some(text) => CellContent::Formula(text),
            None => value.clone(),
        };

        tables.values.set(row as usize, col as usize, value)?;
        tables
            .formulas
            .set(row as usize, col as usize, formula_content)?;
        Ok(())
    }

    /// Interpret the `<v>` (or inline string) text by the cell's `t` attribute.
    ///
    /// Cached results of formulas are read leniently: a bad shared string
    /// index there leaves the cell blank instead of failing the sheet.
    fn typed_value(
        raw: &str,
        cell_type: Option<&str>,
        shared_strings: &[String],
        cached: bool,
    ) -> XlsxResult<CellContent> {
        let content = match cell_type {
            Some("s") => {
                let string = raw
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| shared_strings.get(idx));
                match string {
                    Some(s) => CellContent::Text(s.clone()),
                    None if cached => CellContent::Blank,
                    None => {
                        return Err(XlsxError::Parse(format!(
                            "Invalid shared string index: {}",
                            raw
                        )))
                    }
                }
            }

            Some("b") => CellContent::Boolean(raw.trim() == "1" || raw.eq_ignore_ascii_case("true")),

            Some("e") => CellError::parse(raw.trim())
                .map(CellContent::Error)
                .unwrap_or_else(|| CellContent::Text(raw.to_string())),

            Some("inlineStr") | Some("str") => CellContent::Text(decode_excel_escapes(raw)),

            None | Some("n") => match raw.trim().parse::<f64>() {
                Ok(n) => CellContent::Number(n),
                Err(_) => CellContent::Text(raw.to_string()),
            },

            // Dates stored as ISO text (t="d") and anything unknown
            Some(_) => CellContent::Text(raw.to_string()),
        };
        Ok(content)
    }
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("hello_x000d_world"), "hello\rworld");
        assert_eq!(
            decode_excel_escapes("line1_x000D__x000A_line2"),
            "line1\r\nline2"
        );
        assert_eq!(decode_excel_escapes("under_x005f_score"), "under_score");
        assert_eq!(decode_excel_escapes("plain text"), "plain text");
    }

    #[test]
    fn test_decode_excel_escapes_partial_sequence() {
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("_x000d"), "_x000d");
        assert_eq!(decode_excel_escapes("a_b"), "a_b");
    }

    #[test]
    fn test_typed_value() {
        let strings = vec!["Revenue".to_string()];
        assert_eq!(
            XlsxReader::typed_value("0", Some("s"), &strings, false).unwrap(),
            CellContent::text("Revenue")
        );
        assert_eq!(
            XlsxReader::typed_value("#DIV/0!", Some("e"), &strings, false).unwrap(),
            CellContent::Error(CellError::Div0)
        );
        assert_eq!(
            XlsxReader::typed_value("1", Some("b"), &strings, false).unwrap(),
            CellContent::Boolean(true)
        );
        assert_eq!(
            XlsxReader::typed_value("2.5", None, &strings, false).unwrap(),
            CellContent::Number(2.5)
        );
        assert!(XlsxReader::typed_value("9", Some("s"), &strings, false).is_err());
        assert_eq!(
            XlsxReader::typed_value("9", Some("s"), &strings, true).unwrap(),
            CellContent::Blank
        );
    }

    #[test]
    fn test_read_empty_xlsx() {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut zip = zip::ZipWriter::new(cursor);
            let options = zip::write::SimpleFileOptions::default();

            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#).unwrap();

            zip.start_file("xl/workbook.xml", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#).unwrap();

            zip.start_file("xl/_rels/workbook.xml.rels", options)
                .unwrap();
            zip.write_all(br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#).unwrap();

            zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData></sheetData></worksheet>"#).unwrap();

            zip.finish().unwrap();
        }

        let workbook = XlsxReader::read(Cursor::new(buf)).unwrap();

        assert_eq!(workbook.sheet_count(), 1);
        let sheet = workbook.worksheet(0).unwrap();
        assert_eq!(sheet.name(), "Sheet1");
        assert_eq!(sheet.dimensions(), (0, 0));
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            XlsxReader::read(Cursor::new(b"plain text".to_vec())),
            Err(XlsxError::Zip(_))
        ));
    }
}
