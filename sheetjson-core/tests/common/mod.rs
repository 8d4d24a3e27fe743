#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// `s` attribute values understood by the mock styles part
pub const STYLE_GENERAL: u32 = 0;
pub const STYLE_DATE: u32 = 1;
pub const STYLE_TWO_DECIMALS: u32 = 2;
pub const STYLE_DATETIME: u32 = 3;
pub const STYLE_THOUSANDS: u32 = 4;

/// Entries of the shared string table, referenced by index from `t="s"` cells
pub const SHARED_STRINGS: [&str; 2] = ["shared text", "second entry"];

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd\ hh:mm"/></numFmts>
<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
<fills count="1"><fill><patternFill patternType="none"/></fill></fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="5">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
<xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
<xf numFmtId="2" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
<xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
<xf numFmtId="3" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
</cellXfs>
</styleSheet>"#;

/// Build a minimal XLSX package in memory
///
/// Each sheet is given as its name and the inner XML of `<sheetData>`.
pub fn create_mock_xlsx<S: AsRef<str>>(sheets: &[(&str, S)], date1904: bool) -> anyhow::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    // 1. [Content_Types].xml
    zip.start_file("[Content_Types].xml", options)?;
    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
"#,
    );
    for (i, _) in sheets.iter().enumerate() {
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i + 1
        ));
    }
    content_types.push_str("</Types>");
    zip.write_all(content_types.as_bytes())?;

    // 2. _rels/.rels
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#.as_bytes())?;

    // 3. xl/workbook.xml
    zip.start_file("xl/workbook.xml", options)?;
    let mut workbook_xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
"#,
    );
    if date1904 {
        workbook_xml.push_str(r#"<workbookPr date1904="1"/>"#);
    }
    workbook_xml.push_str("<sheets>");
    for (i, (name, _)) in sheets.iter().enumerate() {
        workbook_xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            name,
            i + 1,
            i + 1
        ));
    }
    workbook_xml.push_str("</sheets></workbook>");
    zip.write_all(workbook_xml.as_bytes())?;

    // 4. xl/_rels/workbook.xml.rels
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    let mut rels_xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );
    for (i, _) in sheets.iter().enumerate() {
        rels_xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            i + 1, i + 1
        ));
    }
    rels_xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheets.len() + 1
    ));
    rels_xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheets.len() + 2
    ));
    rels_xml.push_str("</Relationships>");
    zip.write_all(rels_xml.as_bytes())?;

    // 5. xl/styles.xml
    zip.start_file("xl/styles.xml", options)?;
    zip.write_all(STYLES_XML.as_bytes())?;

    // 6. xl/sharedStrings.xml
    zip.start_file("xl/sharedStrings.xml", options)?;
    let mut sst_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        SHARED_STRINGS.len()
    );
    for entry in SHARED_STRINGS {
        sst_xml.push_str(&format!("<si><t>{}</t></si>", entry));
    }
    sst_xml.push_str("</sst>");
    zip.write_all(sst_xml.as_bytes())?;

    // 7. sheets
    for (i, (_, sheet_data)) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                sheet_data.as_ref()
            )
            .as_bytes(),
        )?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Same as [`create_mock_xlsx`], base64-encoded
pub fn mock_xlsx_base64<S: AsRef<str>>(sheets: &[(&str, S)], date1904: bool) -> anyhow::Result<String> {
    Ok(STANDARD.encode(create_mock_xlsx(sheets, date1904)?))
}

/// Inline string cell
pub fn text(cell_ref: &str, value: &str) -> String {
    format!(r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#, cell_ref, value)
}

/// Numeric cell with a `cellXfs` style
/// Shared string cell pointing into [`SHARED_STRINGS`]
pub fn shared(cell_ref: &str, index: usize) -> String {
    format!(r#"<c r="{}" t="s"><v>{}</v></c>"#, cell_ref, index)
}

/// Date cell stored as ISO 8601 text (`t="d"`)
pub fn iso_date(cell_ref: &str, value: &str) -> String {
    format!(r#"<c r="{}" t="d"><v>{}</v></c>"#, cell_ref, value)
}

/// Numeric cell with a `cellXfs` style
pub fn number(cell_ref: &str, value: f64, style: u32) -> String {
    format!(r#"<c r="{}" s="{}"><v>{}</v></c>"#, cell_ref, style, value)
}

pub fn boolean(cell_ref: &str, value: bool) -> String {
    format!(r#"<c r="{}" t="b"><v>{}</v></c>"#, cell_ref, u8::from(value))
}

pub fn error(cell_ref: &str, code: &str) -> String {
    format!(r#"<c r="{}" t="e"><v>{}</v></c>"#, cell_ref, code)
}

/// Styled cell without a value
pub fn blank(cell_ref: &str, style: u32) -> String {
    format!(r#"<c r="{}" s="{}"/>"#, cell_ref, style)
}

/// Formula cell with an optional cached `<v>` and cell type
pub fn formula(cell_ref: &str, expr: &str, cached: Option<&str>, cell_type: Option<&str>) -> String {
    let t = cell_type
        .map(|t| format!(r#" t="{}""#, t))
        .unwrap_or_default();
    let v = cached.map(|v| format!("<v>{}</v>", v)).unwrap_or_default();
    format!(r#"<c r="{}"{}><f>{}</f>{}</c>"#, cell_ref, t, expr, v)
}

pub fn row(index: u32, cells: &[String]) -> String {
    format!(r#"<row r="{}">{}</row>"#, index, cells.concat())
}
