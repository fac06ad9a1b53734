//! Text extraction for uploaded resumes (PDF, DOCX, TXT).
//!
//! Handlers supply the raw upload bytes plus the client filename; this module
//! returns plain UTF-8 text. Extraction is CPU-bound and runs inside
//! `spawn_blocking` at the call site.

use std::io::Read;

use thiserror::Error;

/// Maximum decompressed bytes read from word/document.xml (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}. Please upload a PDF, DOCX, or TXT file.")]
    UnsupportedFileType(String),

    #[error("Failed to extract text from resume: {0}")]
    Parse(String),
}

/// Upload format, decided by the client filename's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Txt,
}

impl FileKind {
    pub fn from_filename(name: &str) -> Result<Self, ExtractError> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "docx" => Ok(FileKind::Docx),
            "txt" => Ok(FileKind::Txt),
            other => Err(ExtractError::UnsupportedFileType(format!(".{other}"))),
        }
    }
}

/// Extracts plain text from an uploaded resume.
pub fn extract_text(bytes: &[u8], kind: FileKind) -> Result<String, ExtractError> {
    match kind {
        FileKind::Pdf => extract_pdf(bytes),
        FileKind::Docx => extract_docx(bytes),
        FileKind::Txt => String::from_utf8(bytes.to_vec())
            .map_err(|e| ExtractError::Parse(format!("file is not valid UTF-8: {e}"))),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Parse(e.to_string()))
}

/// DOCX is a ZIP with the document body in word/document.xml; visible text
/// lives in `<w:t>` runs.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Parse(e.to_string()))?;

    let mut doc_xml = Vec::new();
    {
        let entry = archive
            .by_name("word/document.xml")
            .map_err(|_| ExtractError::Parse("word/document.xml not found".to_string()))?;
        entry
            .take(MAX_XML_ENTRY_BYTES)
            .read_to_end(&mut doc_xml)
            .map_err(|e| ExtractError::Parse(e.to_string()))?;
        if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
            return Err(ExtractError::Parse(
                "word/document.xml exceeds size limit".to_string(),
            ));
        }
    }

    collect_text_runs(&doc_xml)
}

fn collect_text_runs(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Ok(Event::End(e)) if e.name().as_ref() == b"w:t" => in_text_run = false,
            // Paragraph boundaries become newlines so fragment matching in
            // the change engine sees the same line structure the user does.
            Ok(Event::End(e)) if e.name().as_ref() == b"w:p" => out.push('\n'),
            Ok(Event::Text(t)) if in_text_run => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractError::Parse(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file(
                "word/document.xml",
                zip::write::SimpleFileOptions::default(),
            )
            .unwrap();
            let body: String = paragraphs
                .iter()
                .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
                .collect();
            let xml = format!(
                "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{body}</w:body></w:document>"
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(FileKind::from_filename("resume.pdf").unwrap(), FileKind::Pdf);
        assert_eq!(FileKind::from_filename("Resume.DOCX").unwrap(), FileKind::Docx);
        assert_eq!(FileKind::from_filename("cv.txt").unwrap(), FileKind::Txt);
    }

    #[test]
    fn test_file_kind_rejects_unknown_extension() {
        assert!(matches!(
            FileKind::from_filename("resume.odt"),
            Err(ExtractError::UnsupportedFileType(_))
        ));
        assert!(matches!(
            FileKind::from_filename("no_extension"),
            Err(ExtractError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_txt_passthrough() {
        let text = extract_text("J. Doe, 5 yrs Python".as_bytes(), FileKind::Txt).unwrap();
        assert_eq!(text, "J. Doe, 5 yrs Python");
    }

    #[test]
    fn test_txt_rejects_invalid_utf8() {
        assert!(matches!(
            extract_text(&[0xff, 0xfe, 0x00], FileKind::Txt),
            Err(ExtractError::Parse(_))
        ));
    }

    #[test]
    fn test_docx_text_runs_with_paragraph_breaks() {
        let bytes = docx_with_paragraphs(&["J. Doe", "5 yrs Python"]);
        let text = extract_text(&bytes, FileKind::Docx).unwrap();
        assert_eq!(text, "J. Doe\n5 yrs Python");
    }

    #[test]
    fn test_docx_without_document_xml_fails() {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        assert!(matches!(
            extract_text(&buf, FileKind::Docx),
            Err(ExtractError::Parse(_))
        ));
    }

    #[test]
    fn test_garbage_pdf_fails_with_parse_error() {
        assert!(matches!(
            extract_text(b"not a pdf", FileKind::Pdf),
            Err(ExtractError::Parse(_))
        ));
    }
}
