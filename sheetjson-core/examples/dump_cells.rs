use sheetjson_core::reader::{CellValue, read_workbook};
use sheetjson_core::resolver::CellResolver;
use sheetjson_core::resolver::dates::DateRenderer;
use sheetjson_core::CachedResultEvaluator;
use std::env;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <file.xlsx|file.ods> [sheet]", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    let workbook = read_workbook(std::fs::read(path)?)?;

    println!("File: {}", path);
    println!("Sheets: {}", workbook.sheets.len());
    println!("Date system: {:?}", workbook.date_system);

    for sheet in &workbook.sheets {
        if args.get(2).is_some_and(|wanted| *wanted != sheet.name) {
            continue;
        }
        println!("\n=== Sheet: {} ===", sheet.name);

        let resolver = CellResolver::new(
            &CachedResultEvaluator,
            DateRenderer::utc(workbook.date_system),
            &sheet.name,
        );
        for row in &sheet.rows {
            if row.cells.is_empty() {
                println!("  row {}: <empty>", row.index);
            }
            for cell in &row.cells {
                let resolved = resolver.resolve(cell);
                println!(
                    "  ({}, {}) {:?} fmt={:?} -> {:?} [{}]",
                    cell.row, cell.col, cell.value, cell.num_fmt, resolved.value, resolved.kind
                );
                if let CellValue::Formula(formula) = &cell.value {
                    println!("    formula: {:?}", formula.text);
                }
            }
        }
    }

    Ok(())
}
