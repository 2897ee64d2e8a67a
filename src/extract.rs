//! Text extraction for source files.
//!
//! The scanner supplies bytes plus a content type; this module returns
//! plain UTF-8 text. PDFs go through `pdf-extract`; plain text and
//! markdown are decoded as UTF-8, replacing invalid sequences.

use std::path::Path;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";

/// Extraction error. The caller skips the file and carries on.
#[derive(Debug)]
pub enum ExtractError {
    UnsupportedContentType(String),
    Pdf(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnsupportedContentType(ct) => {
                write!(f, "unsupported content-type: {}", ct)
            }
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Content type implied by a file extension, if it is one we can read.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(MIME_PDF),
        "md" | "markdown" => Some(MIME_MARKDOWN),
        "txt" | "text" => Some(MIME_TEXT),
        _ => None,
    }
}

pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<String, ExtractError> {
    match content_type {
        MIME_PDF => extract_pdf(bytes),
        MIME_TEXT | MIME_MARKDOWN => Ok(String::from_utf8_lossy(bytes).into_owned()),
        _ => Err(ExtractError::UnsupportedContentType(
            content_type.to_string(),
        )),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_content_type_returns_error() {
        let err = extract_text(b"foo", "application/octet-stream").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedContentType(_)));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_text(b"not a pdf", MIME_PDF).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn text_is_decoded_lossily() {
        let text = extract_text(b"caf\xc3\xa9 \xff ok", MIME_TEXT).unwrap();
        assert_eq!(text, "café \u{fffd} ok");
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for_path(Path::new("a/b.PDF")), Some(MIME_PDF));
        assert_eq!(content_type_for_path(Path::new("notes.md")), Some(MIME_MARKDOWN));
        assert_eq!(content_type_for_path(Path::new("notes.txt")), Some(MIME_TEXT));
        assert_eq!(content_type_for_path(Path::new("image.png")), None);
        assert_eq!(content_type_for_path(Path::new("Makefile")), None);
    }
}
