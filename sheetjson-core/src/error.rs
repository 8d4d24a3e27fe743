//! Error types for workbook conversion

use thiserror::Error;

/// Errors that abort a whole conversion
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("failed to read spreadsheet document: {0}")]
    DocumentParse(#[from] DocumentError),

    #[error("failed to serialize workbook: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// The input could not be turned into document bytes
#[derive(Error, Debug)]
pub enum InputError {
    #[error("the spreadsheet data passed is either missing or empty")]
    Empty,

    #[error("the spreadsheet data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// The document bytes could not be read as a spreadsheet
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error(transparent)]
    Calamine(#[from] calamine::Error),

    #[error("cannot read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single formula cell could not be evaluated
///
/// Never aborts a conversion: the cell degrades to `unknown`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot evaluate formula at row {row}, column {col}: {reason}")]
pub struct CellEvaluationAnomaly {
    pub row: u32,
    pub col: u32,
    pub reason: String,
}

/// Configuration could not be loaded or is inconsistent
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid UTC offset '{value}' in {scope} (expected \"Z\", \"+HH:MM\" or \"+HHMM\")")]
    InvalidOffset { value: String, scope: String },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
