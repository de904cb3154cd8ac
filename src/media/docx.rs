//! DOCX reading and writing.
//!
//! DOCX files are ZIP archives; the body lives in `word/document.xml` with
//! text in `<w:t>` runs inside `<w:p>` paragraphs.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{read_entry, xml_escape, MediaError, MAX_ENTRY_BYTES};

/// Extract plain text from a DOCX file, one line per non-empty paragraph.
pub fn extract_text(data: &[u8]) -> Result<String, MediaError> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| MediaError::Format(format!("invalid DOCX (not a valid ZIP): {e}")))?;

    let document_xml = read_entry(&mut archive, "word/document.xml", "DOCX", MAX_ENTRY_BYTES)?;

    Ok(text_from_document_xml(&document_xml))
}

/// Walk WordprocessingML tags and collect run text per paragraph.
fn text_from_document_xml(xml: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut in_text = false;
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        if in_text {
            paragraph.push_str(&decode_entities(&rest[..open]));
        }
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let tag = &rest[open + 1..open + close];
        rest = &rest[open + close + 1..];

        let self_closing = tag.ends_with('/');
        let (closing, name) = match tag.strip_prefix('/') {
            Some(name) => (true, name),
            None => (false, tag),
        };
        let name = name
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("");

        match (closing, name) {
            (false, "w:p") if !self_closing => paragraph.clear(),
            (true, "w:p") | (false, "w:p") => {
                let trimmed = paragraph.trim();
                if !trimmed.is_empty() {
                    paragraphs.push(trimmed.to_string());
                }
                paragraph.clear();
            }
            (false, "w:t") => in_text = !self_closing,
            (true, "w:t") => in_text = false,
            (false, "w:br") => paragraph.push('\n'),
            (false, "w:tab") => paragraph.push('\t'),
            _ => {}
        }
    }

    paragraphs.join("\n")
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Write a DOCX with a large bold title followed by `paragraphs`.
pub fn render(title: &str, paragraphs: &[String]) -> Result<Vec<u8>, MediaError> {
    let mut body = format!(
        r#"<w:p><w:r><w:rPr><w:b/><w:sz w:val="40"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        xml_escape(title)
    );
    for paragraph in paragraphs {
        body.push_str(&format!(
            r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            xml_escape(paragraph)
        ));
    }
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("word/document.xml", document.as_str()),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }
    Ok(zip.finish()?.into_inner())
}
