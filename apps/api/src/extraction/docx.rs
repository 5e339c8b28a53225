use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::{DocumentFormat, ExtractError};

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads paragraph text from an OOXML word-processing document. Every paragraph is
/// followed by a newline, including empty ones.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| failed(format!("not a valid DOCX archive: {e}")))?;

    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| failed(format!("missing {DOCUMENT_PART}: {e}")))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| failed(format!("failed to read {DOCUMENT_PART}: {e}")))?;

    paragraphs_to_text(&xml)
}

fn failed(message: String) -> ExtractError {
    ExtractError::Failed {
        format: DocumentFormat::Docx,
        message,
    }
}

fn paragraphs_to_text(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);

    let mut text = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text_run => {
                let decoded = e
                    .unescape()
                    .map_err(|err| failed(format!("bad text in {DOCUMENT_PART}: {err}")))?;
                text.push_str(&decoded);
            }
            Ok(Event::CData(e)) if in_text_run => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(failed(format!("XML parsing error: {e}"))),
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    /// Wraps `body` (the children of `<w:body>`) into a minimal in-memory DOCX.
    pub(crate) fn build_docx(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCUMENT_PART, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_paragraphs_end_with_newline() {
        let docx = build_docx(
            "<w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Senior </w:t></w:r><w:r><w:t>Engineer</w:t></w:r></w:p>",
        );
        assert_eq!(extract_text(&docx).unwrap(), "Jane Doe\nSenior Engineer\n");
    }

    #[test]
    fn test_preserves_spaces_and_entities() {
        let docx = build_docx(
            r#"<w:p><w:r><w:t xml:space="preserve">R&amp;D </w:t></w:r><w:r><w:t>lead</w:t></w:r></w:p>"#,
        );
        assert_eq!(extract_text(&docx).unwrap(), "R&D lead\n");
    }

    #[test]
    fn test_tabs_breaks_and_empty_paragraphs() {
        let docx = build_docx(
            "<w:p><w:r><w:t>2019</w:t><w:tab/><w:t>Acme</w:t><w:br/><w:t>Remote</w:t></w:r></w:p><w:p/>",
        );
        assert_eq!(extract_text(&docx).unwrap(), "2019\tAcme\nRemote\n\n");
    }

    #[test]
    fn test_non_run_text_is_ignored() {
        let docx = build_docx(
            "<w:p><w:pPr><w:pStyle w:val=\"Heading1\"/></w:pPr><w:r><w:t>Experience</w:t></w:r></w:p>",
        );
        assert_eq!(extract_text(&docx).unwrap(), "Experience\n");
    }

    #[test]
    fn test_not_a_zip_fails() {
        let err = extract_text(b"plain text pretending to be docx").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Failed {
                format: DocumentFormat::Docx,
                ..
            }
        ));
    }

    #[test]
    fn test_zip_without_document_part_fails() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<styles/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract_text(&bytes).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"));
    }
}
