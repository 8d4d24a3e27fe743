//! Excel/ODS document reader using calamine
//!
//! Values and formulas come from calamine. For `.xlsx`/`.xlsm` packages the
//! number formats, the date system and the physical row/cell layout are read
//! from the package parts by [`xml_parser`].

use crate::error::DocumentError;
use crate::resolver::dates::{datetime_to_serial, parse_iso_datetime};
use crate::resolver::number_format::is_date_format;
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto_from_rs};
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, warn};
use zip::ZipArchive;

pub mod workbook;
pub mod xml_parser;

pub use workbook::{Cell, CellValue, DateSystem, Evaluated, Formula, Row, Sheet, Workbook};

/// Format given to date-time values whose style does not already format them as dates
const SYNTHETIC_DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

type DocumentBytes = Cursor<Arc<[u8]>>;

/// Access to the sheets, rows and cells of an opened document
pub trait SpreadsheetReader {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Read one sheet with its physically present rows and cells
    fn read_sheet(&mut self, name: &str) -> Result<Sheet, DocumentError>;

    fn date_system(&self) -> DateSystem;
}

/// Metadata read straight from an `.xlsx`/`.xlsm` package
struct XlsxPackage {
    archive: ZipArchive<DocumentBytes>,
    /// Number format code per `cellXfs` index
    styles: Vec<String>,
    /// Sheet name to worksheet part path
    sheet_paths: HashMap<String, String>,
    date_system: DateSystem,
}

impl XlsxPackage {
    /// Open the package metadata, `None` when the document is not an OOXML workbook
    fn open(bytes: &Arc<[u8]>) -> Result<Option<Self>, DocumentError> {
        if !bytes.starts_with(b"PK") {
            return Ok(None);
        }
        let mut archive = ZipArchive::new(Cursor::new(Arc::clone(bytes)))?;
        // ODS and XLSB are zip containers too but carry no xl/workbook.xml
        if !archive.file_names().any(|name| name == "xl/workbook.xml") {
            return Ok(None);
        }

        let date_system = if xml_parser::is_date1904(&mut archive)? {
            DateSystem::V1904
        } else {
            DateSystem::V1900
        };
        let styles = xml_parser::parse_styles(&mut archive)?;
        let sheet_paths = xml_parser::sheet_paths(&mut archive)?.into_iter().collect();

        Ok(Some(Self {
            archive,
            styles,
            sheet_paths,
            date_system,
        }))
    }
}

/// [`SpreadsheetReader`] over an in-memory document of any format calamine opens
pub struct CalamineReader {
    workbook: Sheets<DocumentBytes>,
    package: Option<XlsxPackage>,
}

impl CalamineReader {
    /// Open a document from its raw bytes
    pub fn open(bytes: Vec<u8>) -> Result<Self, DocumentError> {
        let bytes: Arc<[u8]> = bytes.into();
        let workbook = open_workbook_auto_from_rs(Cursor::new(Arc::clone(&bytes)))?;
        let package = XlsxPackage::open(&bytes)?;
        debug!(
            size = bytes.len(),
            package_metadata = package.is_some(),
            "opened spreadsheet document"
        );
        Ok(Self { workbook, package })
    }
}

impl SpreadsheetReader for CalamineReader {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Sheet, DocumentError> {
        let range = self
            .workbook
            .worksheet_range(name)
            .map_err(|e| DocumentError::Sheet {
                sheet: name.to_string(),
                message: e.to_string(),
            })?;

        let formulas = match self.workbook.worksheet_formula(name) {
            Ok(formulas) => Some(formulas),
            Err(e) => {
                warn!(sheet = name, error = %e, "cannot read formulas, formula text unavailable");
                None
            }
        };

        let date_system = self.date_system();
        if let Some(package) = self.package.as_mut() {
            if let Some(path) = package.sheet_paths.get(name).cloned() {
                if let Some(inventory) = xml_parser::read_cell_inventory(&mut package.archive, &path)? {
                    return Ok(sheet_from_inventory(
                        name,
                        inventory,
                        &package.styles,
                        &range,
                        formulas.as_ref(),
                        date_system,
                    ));
                }
            }
            warn!(sheet = name, "worksheet part not found in package, using cell values only");
        }

        Ok(sheet_from_range(name, &range, formulas.as_ref(), date_system))
    }

    fn date_system(&self) -> DateSystem {
        self.package
            .as_ref()
            .map(|p| p.date_system)
            .unwrap_or_default()
    }
}

/// Open a document and read every sheet, in workbook order
pub fn read_workbook(bytes: Vec<u8>) -> Result<Workbook, DocumentError> {
    let mut reader = CalamineReader::open(bytes)?;
    read_all_sheets(&mut reader)
}

/// Read every sheet a reader offers, in workbook order
pub fn read_all_sheets(reader: &mut impl SpreadsheetReader) -> Result<Workbook, DocumentError> {
    let sheets = reader
        .sheet_names()
        .iter()
        .map(|name| reader.read_sheet(name))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Workbook {
        sheets,
        date_system: reader.date_system(),
    })
}

/// Build a sheet from the physical `<row>`/`<c>` layout of an xlsx part
fn sheet_from_inventory(
    name: &str,
    inventory: Vec<xml_parser::RowEntry>,
    styles: &[String],
    range: &Range<Data>,
    formulas: Option<&Range<String>>,
    system: DateSystem,
) -> Sheet {
    let rows = inventory
        .into_iter()
        .map(|entry| {
            let row = entry.index;
            let cells = entry
                .cells
                .into_iter()
                .map(|c| {
                    let data = range.get_value((row, c.col));
                    let (value, implied) = if c.has_formula {
                        let formula = CellValue::Formula(Formula {
                            text: formula_text(formulas, row, c.col),
                            cached: data.and_then(|d| evaluated(d, system)),
                        });
                        (formula, data.and_then(|d| cell_value(d, system).1))
                    } else {
                        data.map_or((CellValue::None, None), |d| cell_value(d, system))
                    };
                    Cell {
                        row,
                        col: c.col,
                        value,
                        num_fmt: cell_format(styles.get(c.style.unwrap_or(0)), implied),
                    }
                })
                .collect();
            Row { index: row, cells }
        })
        .collect();

    Sheet {
        name: name.to_string(),
        rows,
    }
}

/// Style format of a cell, unless the value itself is a date and the style
/// would not render it as one
fn cell_format(style: Option<&String>, implied: Option<&'static str>) -> Option<String> {
    match implied {
        Some(format) if !style.is_some_and(|code| is_date_format(code)) => Some(format.to_string()),
        _ => style.cloned(),
    }
}

/// Build a sheet from the non-empty cells calamine reports
fn sheet_from_range(
    name: &str,
    range: &Range<Data>,
    formulas: Option<&Range<String>>,
    system: DateSystem,
) -> Sheet {
    let mut grid: BTreeMap<u32, BTreeMap<u32, Cell>> = BTreeMap::new();

    let (row0, col0) = range.start().unwrap_or((0, 0));
    for (r, c, data) in range.cells() {
        if matches!(data, Data::Empty) {
            continue;
        }
        let (row, col) = (row0 + r as u32, col0 + c as u32);
        let (value, num_fmt) = cell_value(data, system);
        grid.entry(row).or_default().insert(
            col,
            Cell {
                row,
                col,
                value,
                num_fmt: num_fmt.map(str::to_string),
            },
        );
    }

    if let Some(formulas) = formulas {
        let (row0, col0) = formulas.start().unwrap_or((0, 0));
        for (r, c, text) in formulas.cells() {
            if text.is_empty() {
                continue;
            }
            let (row, col) = (row0 + r as u32, col0 + c as u32);
            let cached = range.get_value((row, col)).and_then(|d| evaluated(d, system));
            let num_fmt = match range.get_value((row, col)) {
                Some(Data::DateTime(_)) => Some(SYNTHETIC_DATE_FORMAT.to_string()),
                _ => None,
            };
            grid.entry(row).or_default().insert(
                col,
                Cell {
                    row,
                    col,
                    value: CellValue::Formula(Formula {
                        text: Some(text.clone()),
                        cached,
                    }),
                    num_fmt,
                },
            );
        }
    }

    let rows = grid
        .into_iter()
        .map(|(index, cells)| Row {
            index,
            cells: cells.into_values().collect(),
        })
        .collect();

    Sheet {
        name: name.to_string(),
        rows,
    }
}

fn formula_text(formulas: Option<&Range<String>>, row: u32, col: u32) -> Option<String> {
    formulas?
        .get_value((row, col))
        .filter(|text| !text.is_empty())
        .cloned()
}

/// Map a calamine value to a raw cell value, plus the format implied by its kind
fn cell_value(data: &Data, system: DateSystem) -> (CellValue, Option<&'static str>) {
    match data {
        Data::Int(i) => (CellValue::Number(*i as f64), None),
        Data::Float(f) => (CellValue::Number(*f), None),
        Data::String(s) => (CellValue::Text(s.clone()), None),
        Data::Bool(b) => (CellValue::Boolean(*b), None),
        Data::Error(e) => (CellValue::Error(e.to_string()), None),
        Data::Empty => (CellValue::Blank, None),
        Data::DateTime(dt) => (CellValue::Number(dt.as_f64()), Some(SYNTHETIC_DATE_FORMAT)),
        Data::DateTimeIso(s) => match iso_serial(s, system) {
            Some(serial) => (CellValue::Number(serial), Some(SYNTHETIC_DATE_FORMAT)),
            None => (CellValue::Text(s.clone()), None),
        },
        Data::DurationIso(s) => (CellValue::Other(s.clone()), None),
    }
}

/// Map a calamine value to the cached result of a formula
fn evaluated(data: &Data, system: DateSystem) -> Option<Evaluated> {
    match data {
        Data::Int(i) => Some(Evaluated::Number(*i as f64)),
        Data::Float(f) => Some(Evaluated::Number(*f)),
        Data::String(s) => Some(Evaluated::Text(s.clone())),
        Data::Bool(b) => Some(Evaluated::Boolean(*b)),
        Data::Error(e) => Some(Evaluated::Error(e.to_string())),
        Data::Empty => None,
        Data::DateTime(dt) => Some(Evaluated::Number(dt.as_f64())),
        Data::DateTimeIso(s) => Some(
            iso_serial(s, system)
                .map(Evaluated::Number)
                .unwrap_or_else(|| Evaluated::Other(s.clone())),
        ),
        Data::DurationIso(s) => Some(Evaluated::Other(s.clone())),
    }
}

fn iso_serial(text: &str, system: DateSystem) -> Option<f64> {
    parse_iso_datetime(text).and_then(|dt| datetime_to_serial(dt, system))
}
