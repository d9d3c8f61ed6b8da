use std::io::{Cursor, Write};

use anyhow::Context;
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use super::model::{Cell, Table};

const MIMETYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2">
 <manifest:file-entry manifest:full-path="/" manifest:version="1.2" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/>
 <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
</manifest:manifest>
"#;

const CONTENT_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" office:version="1.2">
<office:body><office:spreadsheet>
"#;

const CONTENT_TAIL: &str = "</office:spreadsheet></office:body></office:document-content>\n";

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn cell_xml(cell: &Cell) -> String {
    let shown = escape(&cell.display());
    match cell {
        Cell::Empty => "<table:table-cell/>".to_string(),
        Cell::Text(_) => format!(
            r#"<table:table-cell office:value-type="string"><text:p>{shown}</text:p></table:table-cell>"#
        ),
        Cell::Int(_) | Cell::Float(_) => format!(
            r#"<table:table-cell office:value-type="float" office:value="{shown}"><text:p>{shown}</text:p></table:table-cell>"#
        ),
        Cell::Date(_) => format!(
            r#"<table:table-cell office:value-type="date" office:date-value="{shown}"><text:p>{shown}</text:p></table:table-cell>"#
        ),
        Cell::Time(t) => format!(
            r#"<table:table-cell office:value-type="time" office:time-value="PT{:02}H{:02}M{:02}S"><text:p>{shown}</text:p></table:table-cell>"#,
            t.hour(),
            t.minute(),
            t.second()
        ),
    }
}

fn content_xml(tables: &[Table]) -> String {
    let mut xml = String::from(CONTENT_HEAD);
    for table in tables {
        xml.push_str(&format!(r#"<table:table table:name="{}">"#, escape(table.title)));
        xml.push_str("<table:table-row>");
        for h in table.headers {
            xml.push_str(&cell_xml(&Cell::Text(h.to_string())));
        }
        xml.push_str("</table:table-row>\n");
        for row in &table.rows {
            xml.push_str("<table:table-row>");
            for cell in row {
                xml.push_str(&cell_xml(cell));
            }
            xml.push_str("</table:table-row>\n");
        }
        xml.push_str("</table:table>\n");
    }
    xml.push_str(CONTENT_TAIL);
    xml
}

/// OpenDocument spreadsheet with one table per section. The `mimetype`
/// entry has to be first and uncompressed.
pub fn render(tables: &[Table]) -> anyhow::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored)?;
    zip.write_all(MIMETYPE.as_bytes())?;
    zip.start_file("META-INF/manifest.xml", deflated)?;
    zip.write_all(MANIFEST.as_bytes())?;
    zip.start_file("content.xml", deflated)?;
    zip.write_all(content_xml(tables).as_bytes())?;

    let cursor = zip.finish().context("finish ods archive")?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::export::model::{fixtures, meals_table, readings_table};

    #[test]
    fn archive_starts_with_stored_mimetype() {
        let bytes = render(&[readings_table(&fixtures::readings())]).expect("ods");
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).expect("zip");

        let mut first = zip.by_index(0).expect("first entry");
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
        let mut mt = String::new();
        first.read_to_string(&mut mt).expect("read");
        assert_eq!(mt, MIMETYPE);
    }

    #[test]
    fn content_has_both_tables_and_escapes_text() {
        let xml = content_xml(&[
            readings_table(&fixtures::readings()),
            meals_table(&fixtures::meals()),
        ]);
        assert!(xml.contains(r#"table:name="Glucose Readings""#));
        assert!(xml.contains(r#"table:name="Meals""#));
        assert_eq!(xml.matches("<table:table-row>").count(), 4 + 3);
        assert!(xml.contains("caffè &amp; &lt;cake&gt;"));
        assert!(xml.contains(r#"office:date-value="2024-03-05""#));
        assert!(xml.contains(r#"office:time-value="PT07H15M00S""#));
        assert!(xml.contains(r#"office:value="450""#));
    }
}
