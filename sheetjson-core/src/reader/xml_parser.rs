//! XML parsing utilities for extracting metadata from XLSX packages
//!
//! calamine gives us cell values and formulas but not the physical layout
//! (which `<row>`/`<c>` elements exist) nor the number format of every
//! cell, so those are read straight from the package parts here.

use crate::error::DocumentError;
use crate::resolver::number_format::builtin_format_code;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;
use zip::result::ZipError;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PART: &str = "xl/styles.xml";

/// A physically present `<row>` element and its `<c>` children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowEntry {
    /// 0-based row index
    pub index: u32,
    pub cells: Vec<CellEntry>,
}

/// A physically present `<c>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEntry {
    /// 0-based column index
    pub col: u32,
    /// Index into `cellXfs`, when the cell carries an `s` attribute
    pub style: Option<usize>,
    /// Whether the cell holds an `<f>` child
    pub has_formula: bool,
}

/// Read the value of an attribute by its local name
fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .map(|attr| match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        })
}

fn xml_error(part: &str, err: impl std::fmt::Display) -> DocumentError {
    DocumentError::Xml {
        part: part.to_string(),
        message: err.to_string(),
    }
}

/// Read a package part to a string, `None` when the part is absent
fn read_part(
    archive: &mut ZipArchive<impl Read + Seek>,
    part: &str,
) -> Result<Option<String>, DocumentError> {
    let mut file = match archive.by_name(part) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(Some(content))
}

fn xml_reader(content: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    reader
}

/// Check whether the workbook uses the 1904 date system
pub fn is_date1904(archive: &mut ZipArchive<impl Read + Seek>) -> Result<bool, DocumentError> {
    let Some(content) = read_part(archive, WORKBOOK_PART)? else {
        return Ok(false);
    };
    let mut reader = xml_reader(&content);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"workbookPr" {
                    return Ok(attr_value(&e, b"date1904")
                        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                        .unwrap_or(false));
                }
                // workbookPr precedes <sheets>; nothing useful after it
                if e.local_name().as_ref() == b"sheets" {
                    return Ok(false);
                }
            }
            Ok(Event::Eof) => return Ok(false),
            Err(e) => return Err(xml_error(WORKBOOK_PART, e)),
            _ => {}
        }
    }
}

/// Map every sheet name to the package path of its part, in workbook order
pub fn sheet_paths(
    archive: &mut ZipArchive<impl Read + Seek>,
) -> Result<Vec<(String, String)>, DocumentError> {
    // Mapping relationships. Link rId with paths
    let mut rels: HashMap<String, String> = HashMap::new();
    if let Some(content) = read_part(archive, WORKBOOK_RELS_PART)? {
        let mut reader = xml_reader(&content);
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    if e.local_name().as_ref() == b"Relationship" {
                        if let (Some(id), Some(target)) =
                            (attr_value(&e, b"Id"), attr_value(&e, b"Target"))
                        {
                            rels.insert(id, resolve_target(&target));
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(xml_error(WORKBOOK_RELS_PART, e)),
                _ => {}
            }
        }
    }

    let mut sheets = Vec::new();
    let Some(content) = read_part(archive, WORKBOOK_PART)? else {
        return Ok(sheets);
    };
    let mut reader = xml_reader(&content);

    let mut in_sheets = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"sheets" => in_sheets = true,
                b"sheet" if in_sheets => {
                    let name = attr_value(&e, b"name").unwrap_or_default();
                    // r:id is namespaced; its local name is "id"
                    let path = attr_value(&e, b"id").and_then(|id| rels.get(&id).cloned());
                    if let Some(path) = path {
                        sheets.push((name, path));
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"sheets" {
                    in_sheets = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(WORKBOOK_PART, e)),
            _ => {}
        }
    }

    Ok(sheets)
}

/// Relationship targets are relative to `xl/` unless they start with `/`
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}

/// Parse `xl/styles.xml` into the number format code of every `cellXfs` entry
///
/// The returned vector is indexed by the `s` attribute of a cell.
pub fn parse_styles(
    archive: &mut ZipArchive<impl Read + Seek>,
) -> Result<Vec<String>, DocumentError> {
    let Some(content) = read_part(archive, STYLES_PART)? else {
        return Ok(Vec::new());
    };
    let mut reader = xml_reader(&content);

    let mut num_fmts: HashMap<u32, String> = HashMap::new();
    let mut xf_format_ids = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let id = attr_value(&e, b"numFmtId").and_then(|v| v.parse::<u32>().ok());
                    let code = attr_value(&e, b"formatCode");
                    if let (Some(id), Some(code)) = (id, code) {
                        if !code.is_empty() {
                            num_fmts.insert(id, code);
                        }
                    }
                }
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let id = attr_value(&e, b"numFmtId")
                        .and_then(|v| v.parse::<u32>().ok())
                        .unwrap_or(0);
                    xf_format_ids.push(id);
                }
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"cellXfs" {
                    in_cell_xfs = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(STYLES_PART, e)),
            _ => {}
        }
    }

    // Custom numFmts may follow cellXfs in hand-written packages, so look
    // codes up only once the whole part is read.
    Ok(xf_format_ids
        .into_iter()
        .map(|id| {
            num_fmts
                .get(&id)
                .cloned()
                .or_else(|| builtin_format_code(id).map(str::to_string))
                .unwrap_or_else(|| "General".to_string())
        })
        .collect())
}

/// Take the physical inventory of a worksheet part: every `<row>` and `<c>`
///
/// Returns `None` when the part does not exist in the package.
pub fn read_cell_inventory(
    archive: &mut ZipArchive<impl Read + Seek>,
    sheet_path: &str,
) -> Result<Option<Vec<RowEntry>>, DocumentError> {
    let Some(content) = read_part(archive, sheet_path)? else {
        return Ok(None);
    };
    let mut reader = xml_reader(&content);

    let mut rows: Vec<RowEntry> = Vec::new();
    let mut in_sheet_data = false;
    let mut in_cell = false;

    loop {
        let event = reader.read_event();
        let is_empty = matches!(event, Ok(Event::Empty(_)));
        match event {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"sheetData" => in_sheet_data = !is_empty,
                b"row" if in_sheet_data => {
                    // Rows without `r` follow the previous one
                    let index = attr_value(&e, b"r")
                        .and_then(|v| v.parse::<u32>().ok())
                        .map(|r| r.saturating_sub(1))
                        .unwrap_or_else(|| rows.last().map(|r| r.index + 1).unwrap_or(0));
                    rows.push(RowEntry {
                        index,
                        cells: Vec::new(),
                    });
                }
                b"c" if in_sheet_data => {
                    if let Some(row) = rows.last_mut() {
                        // Cells without `r` follow the previous one
                        let col = attr_value(&e, b"r")
                            .and_then(|r| parse_cell_ref(&r))
                            .map(|(_, col)| col)
                            .unwrap_or_else(|| row.cells.last().map(|c| c.col + 1).unwrap_or(0));
                        let style = attr_value(&e, b"s").and_then(|v| v.parse::<usize>().ok());
                        row.cells.push(CellEntry {
                            col,
                            style,
                            has_formula: false,
                        });
                        in_cell = !is_empty;
                    }
                }
                b"f" if in_cell => {
                    if let Some(cell) = rows.last_mut().and_then(|r| r.cells.last_mut()) {
                        cell.has_formula = true;
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"c" => in_cell = false,
                b"sheetData" => in_sheet_data = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(sheet_path, e)),
            _ => {}
        }
    }

    Ok(Some(rows))
}

/// Parse a cell reference like "A1" into (row, col) as 0-based indices
fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let mut col = 0u32;
    let mut row_str = String::new();

    for ch in cell_ref.chars() {
        if ch.is_ascii_alphabetic() {
            col = col * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        } else if ch.is_ascii_digit() {
            row_str.push(ch);
        } else if ch != '$' {
            return None;
        }
    }

    if row_str.is_empty() || col == 0 {
        return None;
    }

    let row = row_str.parse::<u32>().ok()?;

    // Convert to 0-based
    Some((row.saturating_sub(1), col - 1))
}
