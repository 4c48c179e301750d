//! Plain-text content extraction for text formats

use crate::upload::FileKind;
use revisor_domain::traits::ContentExtractor;
use thiserror::Error;

/// Errors from content extraction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The extractor cannot handle this kind of file
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// Bytes are not valid UTF-8
    #[error("Invalid text encoding: {0}")]
    InvalidEncoding(String),

    /// A `.json` upload that does not parse
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Extraction produced no text
    #[error("No text content in {0}")]
    NoText(String),
}

/// Extracts text from plain text, markdown, and JSON uploads
///
/// PDF needs a dedicated extractor; hosts provide one through
/// [`ContentExtractor`].
///
/// # Examples
///
/// ```
/// use revisor_domain::traits::ContentExtractor;
/// use revisor_session::PlainTextExtractor;
///
/// let text = PlainTextExtractor.extract("memo.md", None, b"# Launch\r\nMarch 1").unwrap();
/// assert_eq!(text, "# Launch\nMarch 1");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl ContentExtractor for PlainTextExtractor {
    type Error = ExtractionError;

    fn extract(
        &self,
        file_name: &str,
        media_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, Self::Error> {
        let kind = FileKind::detect(file_name, media_type)
            .ok_or_else(|| ExtractionError::UnsupportedType(file_name.to_string()))?;

        if kind == FileKind::Pdf {
            return Err(ExtractionError::UnsupportedType(format!(
                "{} (PDF needs a PDF-capable extractor)",
                file_name
            )));
        }

        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractionError::InvalidEncoding(format!("{}: {}", file_name, e)))?
            .replace("\r\n", "\n");

        if kind == FileKind::Json {
            serde_json::from_str::<serde_json::Value>(&text)
                .map_err(|e| ExtractionError::InvalidJson(format!("{}: {}", file_name, e)))?;
        }

        if text.trim().is_empty() {
            return Err(ExtractionError::NoText(file_name.to_string()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let text = PlainTextExtractor.extract("memo.txt", None, b"rollout will begin March 1").unwrap();
        assert_eq!(text, "rollout will begin March 1");
    }

    #[test]
    fn test_bom_stripped() {
        let text = PlainTextExtractor.extract("memo.txt", None, b"\xEF\xBB\xBFhello").unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_json_validated() {
        assert!(PlainTextExtractor.extract("a.json", None, br#"{"launch": "March 1"}"#).is_ok());
        assert!(matches!(
            PlainTextExtractor.extract("a.json", None, b"{launch"),
            Err(ExtractionError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_pdf_unsupported() {
        let result = PlainTextExtractor.extract("brochure.pdf", None, b"%PDF-1.7");
        assert!(matches!(result, Err(ExtractionError::UnsupportedType(_))));
    }

    #[test]
    fn test_invalid_utf8() {
        let result = PlainTextExtractor.extract("memo.txt", None, &[0xff, 0xfe, 0x00]);
        assert!(matches!(result, Err(ExtractionError::InvalidEncoding(_))));
    }

    #[test]
    fn test_whitespace_only() {
        let result = PlainTextExtractor.extract("memo.txt", None, b"  \n ");
        assert_eq!(result, Err(ExtractionError::NoText("memo.txt".to_string())));
    }
}
