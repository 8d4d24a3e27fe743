//! sheetjson-core: converts spreadsheet documents into typed JSON cell trees
//!
//! A document arrives as base64 text (or raw bytes), is read sheet by sheet
//! through calamine, and every physically present cell is reduced to a
//! normalized value plus one semantic type.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod output;
pub mod reader;
pub mod resolver;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

pub use config::ConverterConfig;
pub use error::{CellEvaluationAnomaly, ConvertError, DocumentError, InputError, Result};
pub use evaluator::{CachedResultEvaluator, FormulaEvaluator};
pub use output::{ResolvedCell, RowResult, SheetResult, WorkbookResult};
pub use reader::{SpreadsheetReader, Workbook};
pub use resolver::{CellResolver, SemanticType};

use reader::{DateSystem, Sheet};
use resolver::dates::DateRenderer;

/// Main converter interface
pub struct Converter {
    config: ConverterConfig,
    evaluator: Box<dyn FormulaEvaluator>,
}

impl Converter {
    /// Create a new converter with default configuration
    pub fn new() -> Self {
        Self::with_config(ConverterConfig::default())
    }

    /// Create a new converter with custom configuration
    pub fn with_config(config: ConverterConfig) -> Self {
        Self {
            config,
            evaluator: Box::new(CachedResultEvaluator),
        }
    }

    /// Replace the formula evaluator
    pub fn with_evaluator(mut self, evaluator: impl FormulaEvaluator + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert a base64-encoded document into the JSON document
    pub fn convert_base64(&self, input: &str) -> Result<String> {
        let bytes = decode_base64(input)?;
        self.convert_bytes(bytes)
    }

    /// Convert raw document bytes into the JSON document
    pub fn convert_bytes(&self, bytes: Vec<u8>) -> Result<String> {
        let result = self.convert_to_result(bytes)?;
        Ok(result.to_json(self.config.output.pretty)?)
    }

    /// Convert raw document bytes into the result tree
    pub fn convert_to_result(&self, bytes: Vec<u8>) -> Result<WorkbookResult> {
        if bytes.is_empty() {
            return Err(InputError::Empty.into());
        }
        let started = Instant::now();

        // The document handle is dropped inside read_workbook
        let workbook = reader::read_workbook(bytes)?;
        let result = self.resolve_workbook(&workbook)?;

        info!(
            sheets = result.num_sheets(),
            cells = result.num_cells(),
            parallel = self.config.parallel_sheets,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "converted workbook"
        );
        Ok(result)
    }

    /// Resolve every cell of an already read workbook
    pub fn resolve_workbook(&self, workbook: &Workbook) -> Result<WorkbookResult> {
        let system = workbook.date_system;
        debug!(sheets = workbook.sheets.len(), date_system = ?system, "resolving workbook");

        let sheets = if self.config.parallel_sheets {
            workbook
                .sheets
                .par_iter()
                .map(|sheet| self.resolve_sheet(sheet, system))
                .collect::<Result<Vec<_>>>()?
        } else {
            workbook
                .sheets
                .iter()
                .map(|sheet| self.resolve_sheet(sheet, system))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(WorkbookResult::new(sheets))
    }

    fn resolve_sheet(&self, sheet: &Sheet, system: DateSystem) -> Result<SheetResult> {
        let offset = self.config.offset_for(&sheet.name)?;
        let resolver = CellResolver::new(
            self.evaluator.as_ref(),
            DateRenderer::new(system, offset),
            &sheet.name,
        );

        let rows = sheet
            .rows
            .iter()
            .map(|row| {
                let cells = row
                    .cells
                    .iter()
                    .map(|cell| ResolvedCell::new(cell.col, resolver.resolve(cell)))
                    .collect();
                RowResult::new(row.index, cells)
            })
            .collect();

        Ok(SheetResult::new(sheet.name.as_str(), rows))
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a base64-encoded document with the default configuration
pub fn convert_base64(input: &str) -> Result<String> {
    Converter::new().convert_base64(input)
}

/// Decode base64 text, ignoring embedded whitespace and line breaks
///
/// Missing or blank input is rejected before any decoding happens.
pub fn decode_base64(input: &str) -> std::result::Result<Vec<u8>, InputError> {
    if input.trim().is_empty() {
        return Err(InputError::Empty);
    }
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    if bytes.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_is_rejected_before_decoding() {
        assert!(matches!(decode_base64(""), Err(InputError::Empty)));
        assert!(matches!(decode_base64("  \n\t"), Err(InputError::Empty)));
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(decode_base64("not base64!"), Err(InputError::Base64(_))));
    }

    #[test]
    fn test_wrapped_base64_is_accepted() {
        assert_eq!(decode_base64("aGVs\nbG8=\n").unwrap(), b"hello");
    }

    #[test]
    fn test_convert_errors_are_typed() {
        assert!(matches!(
            convert_base64(""),
            Err(ConvertError::InvalidInput(InputError::Empty))
        ));
        assert!(matches!(
            convert_base64("aGVsbG8="),
            Err(ConvertError::DocumentParse(_))
        ));
        assert!(matches!(
            Converter::new().convert_bytes(Vec::new()),
            Err(ConvertError::InvalidInput(InputError::Empty))
        ));
    }
}
