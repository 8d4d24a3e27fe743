//! Cell type resolution and value normalization
//!
//! Every cell is reduced to a normalized text value and one [`SemanticType`].
//! Formula cells are evaluated first and their result goes through the same
//! dispatch as a plain cell of that kind.

pub mod dates;
pub mod number_format;

use crate::evaluator::FormulaEvaluator;
use crate::reader::{Cell, CellValue, Evaluated, Formula};
use dates::DateRenderer;
use number_format::{format_general, format_number, is_date_format};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Output type of a resolved cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    String,
    Integer,
    Decimal,
    Date,
    Boolean,
    Null,
    Error,
    Unknown,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::String => "string",
            SemanticType::Integer => "integer",
            SemanticType::Decimal => "decimal",
            SemanticType::Date => "date",
            SemanticType::Boolean => "boolean",
            SemanticType::Null => "null",
            SemanticType::Error => "error",
            SemanticType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized value and type of a single cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub value: Option<String>,
    pub kind: SemanticType,
}

impl Resolved {
    fn new(value: impl Into<String>, kind: SemanticType) -> Self {
        Self {
            value: Some(value.into()),
            kind,
        }
    }

    fn null() -> Self {
        Self {
            value: None,
            kind: SemanticType::Null,
        }
    }
}

/// Resolves the cells of one sheet
pub struct CellResolver<'a, E: FormulaEvaluator + ?Sized> {
    evaluator: &'a E,
    dates: DateRenderer,
    sheet: &'a str,
}

impl<'a, E: FormulaEvaluator + ?Sized> CellResolver<'a, E> {
    pub fn new(evaluator: &'a E, dates: DateRenderer, sheet: &'a str) -> Self {
        Self {
            evaluator,
            dates,
            sheet,
        }
    }

    /// Resolve a cell into its normalized value and semantic type
    pub fn resolve(&self, cell: &Cell) -> Resolved {
        let resolved = match &cell.value {
            CellValue::Formula(formula) => self.resolve_formula(cell, formula),
            value => self.resolve_value(value, cell.num_fmt.as_deref()),
        };

        debug!(
            sheet = self.sheet,
            row = cell.row,
            col = cell.col,
            raw_type = cell.value.type_name(),
            value = ?resolved.value,
            kind = %resolved.kind,
            "resolved cell"
        );
        resolved
    }

    fn resolve_value(&self, value: &CellValue, num_fmt: Option<&str>) -> Resolved {
        match value {
            CellValue::Number(number) => self.resolve_numeric(*number, num_fmt),
            CellValue::Text(text) => Resolved::new(text.as_str(), SemanticType::String),
            CellValue::Boolean(b) => Resolved::new(b.to_string(), SemanticType::Boolean),
            CellValue::Blank | CellValue::None => Resolved::null(),
            CellValue::Error(code) => Resolved::new(code.as_str(), SemanticType::Error),
            CellValue::Other(text) => Resolved::new(text.as_str(), SemanticType::Unknown),
            // Evaluated results never map back to a formula
            CellValue::Formula(formula) => Resolved {
                value: formula.text.clone(),
                kind: SemanticType::Unknown,
            },
        }
    }

    fn resolve_formula(&self, cell: &Cell, formula: &Formula) -> Resolved {
        match self.evaluator.evaluate(cell, formula) {
            Ok(result) => {
                debug!(
                    sheet = self.sheet,
                    row = cell.row,
                    col = cell.col,
                    formula = formula.text.as_deref().unwrap_or_default(),
                    result_type = result.type_name(),
                    "evaluated formula"
                );
                let value = match result {
                    Evaluated::Number(n) => CellValue::Number(n),
                    Evaluated::Text(s) => CellValue::Text(s),
                    Evaluated::Boolean(b) => CellValue::Boolean(b),
                    Evaluated::Error(e) => CellValue::Error(e),
                    Evaluated::Other(s) => CellValue::Other(s),
                };
                self.resolve_value(&value, cell.num_fmt.as_deref())
            }
            Err(anomaly) => {
                warn!(sheet = self.sheet, %anomaly, "formula cell degraded to unknown");
                Resolved {
                    value: formula.text.clone(),
                    kind: SemanticType::Unknown,
                }
            }
        }
    }

    /// Shared numeric routine for plain and formula-evaluated numbers
    fn resolve_numeric(&self, number: f64, num_fmt: Option<&str>) -> Resolved {
        let code = num_fmt.unwrap_or("General");

        let text = if is_date_format(code) {
            if let Some(date) = self.dates.render(number) {
                return Resolved::new(date, SemanticType::Date);
            }
            debug!(
                sheet = self.sheet,
                serial = number,
                format = code,
                "serial is not a valid date, rendering as a number"
            );
            format_general(number)
        } else {
            format_number(number, code)
        };

        let kind = if is_integer_text(&text) {
            SemanticType::Integer
        } else {
            SemanticType::Decimal
        };
        Resolved::new(text, kind)
    }
}

/// Check whether rendered text is a plain base-10 integer that fits in `i64`
pub fn is_integer_text(text: &str) -> bool {
    text.parse::<i64>().is_ok()
}
