//! Formula evaluation capability

use crate::error::CellEvaluationAnomaly;
use crate::reader::{Cell, Evaluated, Formula};

/// Produces the result of a formula cell
///
/// Implementations must be shareable across threads so sheets can be
/// resolved in parallel.
pub trait FormulaEvaluator: Sync {
    fn evaluate(&self, cell: &Cell, formula: &Formula) -> Result<Evaluated, CellEvaluationAnomaly>;
}

/// Evaluates formulas to the result the saving application cached in the document
#[derive(Debug, Clone, Copy, Default)]
pub struct CachedResultEvaluator;

impl FormulaEvaluator for CachedResultEvaluator {
    fn evaluate(&self, cell: &Cell, formula: &Formula) -> Result<Evaluated, CellEvaluationAnomaly> {
        formula.cached.clone().ok_or_else(|| CellEvaluationAnomaly {
            row: cell.row,
            col: cell.col,
            reason: "no cached result stored for formula".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::CellValue;

    fn formula_cell(cached: Option<Evaluated>) -> (Cell, Formula) {
        let formula = Formula {
            text: Some("A1*2".to_string()),
            cached,
        };
        let cell = Cell {
            row: 3,
            col: 1,
            value: CellValue::Formula(formula.clone()),
            num_fmt: None,
        };
        (cell, formula)
    }

    #[test]
    fn test_cached_result_is_returned() {
        let (cell, formula) = formula_cell(Some(Evaluated::Number(4.0)));
        let result = CachedResultEvaluator.evaluate(&cell, &formula);
        assert_eq!(result, Ok(Evaluated::Number(4.0)));
    }

    #[test]
    fn test_missing_cached_result_is_an_anomaly() {
        let (cell, formula) = formula_cell(None);
        let anomaly = CachedResultEvaluator.evaluate(&cell, &formula).unwrap_err();
        assert_eq!(anomaly.row, 3);
        assert_eq!(anomaly.col, 1);
    }
}
