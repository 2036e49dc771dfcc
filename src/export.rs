//! Delimited-text and spreadsheet export of the enriched table.
//!
//! Both formats are row-for-row identical to the in-memory table, with a
//! header row equal to the canonical column names. An xlsx file is a zip
//! container of sheet XML, so the workbook is written as a minimal
//! single-sheet OOXML package with inline strings.

use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::models::EnrichedRecord;

/// Serialize the table as UTF-8 CSV.
pub fn to_csv(records: &[EnrichedRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EnrichedRecord::COLUMNS)?;
    for record in records {
        writer.write_record(record.display_row())?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing csv writer: {e}"))
}

/// Serialize the table as a single-sheet Excel workbook.
pub fn to_xlsx(records: &[EnrichedRecord]) -> Result<Vec<u8>> {
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    archive.start_file("[Content_Types].xml", options)?;
    archive.write_all(CONTENT_TYPES_XML.as_bytes())?;

    archive.start_file("_rels/.rels", options)?;
    archive.write_all(ROOT_RELS_XML.as_bytes())?;

    archive.start_file("xl/workbook.xml", options)?;
    archive.write_all(WORKBOOK_XML.as_bytes())?;

    archive.start_file("xl/_rels/workbook.xml.rels", options)?;
    archive.write_all(WORKBOOK_RELS_XML.as_bytes())?;

    archive.start_file("xl/worksheets/sheet1.xml", options)?;
    archive.write_all(sheet_xml(records).as_bytes())?;

    let cursor = archive.finish().context("finalizing xlsx archive")?;
    Ok(cursor.into_inner())
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="ETF Data" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

fn sheet_xml(records: &[EnrichedRecord]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    push_row(&mut xml, EnrichedRecord::COLUMNS.iter().map(|c| c.to_string()));
    for record in records {
        push_row(&mut xml, record.display_row().into_iter());
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_row(xml: &mut String, cells: impl Iterator<Item = String>) {
    xml.push_str("<row>");
    for cell in cells {
        xml.push_str("<c t=\"inlineStr\"><is><t>");
        xml.push_str(&xml_escape(&cell));
        xml.push_str("</t></is></c>");
    }
    xml.push_str("</row>");
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
