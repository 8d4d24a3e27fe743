//! Workbook data structures

/// Date system a workbook stores its serial numbers in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateSystem {
    /// Serial 1 is 1900-01-01 (includes the fictitious 1900-02-29)
    #[default]
    V1900,
    /// Serial 0 is 1904-01-01
    V1904,
}

/// Represents a complete workbook
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    pub date_system: DateSystem,
}

/// Represents a worksheet
///
/// Rows hold only the physically present rows, in ascending row order.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

/// A physically present row
#[derive(Debug, Clone, Default)]
pub struct Row {
    /// 0-based row index
    pub index: u32,
    pub cells: Vec<Cell>,
}

/// Represents a single cell
#[derive(Debug, Clone)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
    /// Number format code applied to the cell (e.g. "0.00", "mm-dd-yy")
    pub num_fmt: Option<String>,
}

/// Raw cell content as declared by the document
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// The cell is referenced but the reader has no content recorded for it
    None,
    /// The cell exists (usually only to carry a style) but holds no value
    Blank,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(String),
    Formula(Formula),
    /// Content the reader could not map to any of the kinds above
    Other(String),
}

impl CellValue {
    /// Name of the raw type, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::None => "none",
            CellValue::Blank => "blank",
            CellValue::Number(_) => "numeric",
            CellValue::Text(_) => "string",
            CellValue::Boolean(_) => "boolean",
            CellValue::Error(_) => "error",
            CellValue::Formula(_) => "formula",
            CellValue::Other(_) => "other",
        }
    }
}

/// A formula cell: the expression plus whatever result the document cached for it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Formula {
    /// Formula text without the leading `=`, when the reader could extract it
    pub text: Option<String>,
    /// Result last computed by the application that saved the document
    pub cached: Option<Evaluated>,
}

/// Result of evaluating a formula
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(String),
    /// Any result kind outside number/text/boolean/error
    Other(String),
}

impl Evaluated {
    /// Name of the result type, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Evaluated::Number(_) => "numeric",
            Evaluated::Text(_) => "string",
            Evaluated::Boolean(_) => "boolean",
            Evaluated::Error(_) => "error",
            Evaluated::Other(_) => "other",
        }
    }
}
