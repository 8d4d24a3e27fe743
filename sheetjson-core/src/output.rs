//! JSON result tree: workbook → sheets → rows → cells
//!
//! Counts are derived from the child lists when a node is built, and nodes
//! are immutable afterwards, so every count equals the length of its list.

use crate::resolver::{Resolved, SemanticType};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkbookResult {
    #[serde(rename = "numsheets")]
    num_sheets: usize,
    #[serde(rename = "Sheets")]
    sheets: Vec<SheetResult>,
}

impl WorkbookResult {
    pub fn new(sheets: Vec<SheetResult>) -> Self {
        Self {
            num_sheets: sheets.len(),
            sheets,
        }
    }

    pub fn num_sheets(&self) -> usize {
        self.num_sheets
    }

    pub fn sheets(&self) -> &[SheetResult] {
        &self.sheets
    }

    /// Total number of cells across all sheets
    pub fn num_cells(&self) -> usize {
        self.sheets
            .iter()
            .flat_map(|s| s.rows.iter())
            .map(|r| r.num_cells)
            .sum()
    }

    /// Serialize to the JSON document
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetResult {
    name: String,
    #[serde(rename = "numrows")]
    num_rows: usize,
    #[serde(rename = "Rows")]
    rows: Vec<RowResult>,
}

impl SheetResult {
    pub fn new(name: impl Into<String>, rows: Vec<RowResult>) -> Self {
        Self {
            name: name.into(),
            num_rows: rows.len(),
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn rows(&self) -> &[RowResult] {
        &self.rows
    }

    /// Number of cells per semantic type, in first-seen order
    pub fn type_counts(&self) -> Vec<(SemanticType, usize)> {
        let mut counts: Vec<(SemanticType, usize)> = Vec::new();
        for cell in self.rows.iter().flat_map(|r| r.cells.iter()) {
            match counts.iter_mut().find(|(kind, _)| *kind == cell.kind) {
                Some((_, count)) => *count += 1,
                None => counts.push((cell.kind, 1)),
            }
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowResult {
    /// 0-based row index
    #[serde(rename = "rownum")]
    row_num: u32,
    #[serde(rename = "numcells")]
    num_cells: usize,
    #[serde(rename = "Cells")]
    cells: Vec<ResolvedCell>,
}

impl RowResult {
    pub fn new(row_num: u32, cells: Vec<ResolvedCell>) -> Self {
        Self {
            row_num,
            num_cells: cells.len(),
            cells,
        }
    }

    pub fn row_num(&self) -> u32 {
        self.row_num
    }

    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    pub fn cells(&self) -> &[ResolvedCell] {
        &self.cells
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCell {
    /// 0-based column index
    #[serde(rename = "colIndex")]
    pub col_index: u32,
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub kind: SemanticType,
}

impl ResolvedCell {
    pub fn new(col_index: u32, resolved: Resolved) -> Self {
        Self {
            col_index,
            value: resolved.value,
            kind: resolved.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(col: u32, value: Option<&str>, kind: SemanticType) -> ResolvedCell {
        ResolvedCell {
            col_index: col,
            value: value.map(str::to_string),
            kind,
        }
    }

    #[test]
    fn test_field_names_and_counts() {
        let row = RowResult::new(
            2,
            vec![
                cell(0, Some("1"), SemanticType::Integer),
                cell(3, None, SemanticType::Null),
            ],
        );
        let workbook = WorkbookResult::new(vec![SheetResult::new("Sheet1", vec![row])]);

        let json = workbook.to_json(false).unwrap();
        assert_eq!(
            json,
            r#"{"numsheets":1,"Sheets":[{"name":"Sheet1","numrows":1,"Rows":[{"rownum":2,"numcells":2,"Cells":[{"colIndex":0,"value":"1","type":"integer"},{"colIndex":3,"value":null,"type":"null"}]}]}]}"#
        );
        assert_eq!(workbook.num_cells(), 2);
    }

    #[test]
    fn test_empty_workbook() {
        let workbook = WorkbookResult::new(Vec::new());
        assert_eq!(workbook.to_json(false).unwrap(), r#"{"numsheets":0,"Sheets":[]}"#);
    }

    #[test]
    fn test_type_counts() {
        let sheet = SheetResult::new(
            "Data",
            vec![
                RowResult::new(0, vec![cell(0, Some("a"), SemanticType::String)]),
                RowResult::new(
                    1,
                    vec![
                        cell(0, Some("b"), SemanticType::String),
                        cell(1, Some("1.5"), SemanticType::Decimal),
                    ],
                ),
            ],
        );
        assert_eq!(
            sheet.type_counts(),
            vec![(SemanticType::String, 2), (SemanticType::Decimal, 1)]
        );
    }
}
