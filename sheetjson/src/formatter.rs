//! Output formatters for converted workbooks

use anyhow::{Context, Result};
use colored::*;
use sheetjson_core::{SemanticType, WorkbookResult};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Write the JSON document to a file, or to stdout when no path is given
pub fn write_json(result: &WorkbookResult, pretty: bool, output: Option<&Path>) -> Result<()> {
    let json = result.to_json(pretty).context("Failed to serialize workbook")?;

    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Print per-sheet row, cell and type counts
pub fn print_summary(source: &str, result: &WorkbookResult) {
    println!("{}", format!("Workbook: {}", source).bold());
    println!();

    if result.num_sheets() == 0 {
        println!("{}", "No sheets found".yellow().bold());
        return;
    }

    for sheet in result.sheets() {
        let cells: usize = sheet.rows().iter().map(|r| r.num_cells()).sum();
        println!(
            "{} {}  {} rows, {} cells",
            "Sheet:".bold(),
            sheet.name().cyan().bold(),
            sheet.num_rows(),
            cells
        );
        for (kind, count) in sheet.type_counts() {
            println!("  {} {}", colored_kind(kind), count);
        }
        println!();
    }

    println!("{}", "Summary:".bold().underline());
    println!("  {} {}", "Sheets:".bold(), result.num_sheets());
    println!("  {} {}", "Cells:".bold(), result.num_cells());
}

fn colored_kind(kind: SemanticType) -> ColoredString {
    let label = format!("{:<8}", kind.as_str());
    let name = label.as_str();
    match kind {
        SemanticType::Error => name.red().bold(),
        SemanticType::Unknown => name.yellow().bold(),
        SemanticType::Null => name.bright_black(),
        SemanticType::Date => name.magenta(),
        SemanticType::Integer | SemanticType::Decimal => name.blue(),
        SemanticType::String | SemanticType::Boolean => name.green(),
    }
}
