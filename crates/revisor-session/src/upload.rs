//! Upload validation
//!
//! Type and size are checked before anything else happens; a rejected
//! upload leaves the session untouched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Default upload size limit (50 MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Errors for rejected uploads
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// File type is not accepted
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// File exceeds the size limit
    #[error("File too large: {size} bytes (max: {max})")]
    TooLarge {
        /// Actual size
        size: u64,
        /// Configured limit
        max: u64,
    },

    /// File has no content
    #[error("File is empty: {0}")]
    Empty(String),
}

/// Accepted upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// `.txt`, `text/plain`
    PlainText,
    /// `.md`, `text/markdown`
    Markdown,
    /// `.json`, `application/json`
    Json,
    /// `.pdf`, `application/pdf`
    Pdf,
}

impl FileKind {
    /// Detect the kind from a media type, falling back to the file extension
    ///
    /// # Examples
    ///
    /// ```
    /// use revisor_session::FileKind;
    ///
    /// assert_eq!(FileKind::detect("notes.MD", None), Some(FileKind::Markdown));
    /// assert_eq!(FileKind::detect("blob", Some("application/json; charset=utf-8")), Some(FileKind::Json));
    /// assert_eq!(FileKind::detect("image.png", None), None);
    /// ```
    pub fn detect(file_name: &str, media_type: Option<&str>) -> Option<Self> {
        media_type
            .and_then(Self::from_media_type)
            .or_else(|| Self::from_extension(file_name))
    }

    fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type.split(';').next().unwrap_or_default().trim().to_lowercase();
        match essence.as_str() {
            "text/plain" => Some(FileKind::PlainText),
            "text/markdown" | "text/x-markdown" => Some(FileKind::Markdown),
            "application/json" => Some(FileKind::Json),
            "application/pdf" => Some(FileKind::Pdf),
            _ => None,
        }
    }

    fn from_extension(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name).extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "txt" | "text" => Some(FileKind::PlainText),
            "md" | "markdown" => Some(FileKind::Markdown),
            "json" => Some(FileKind::Json),
            "pdf" => Some(FileKind::Pdf),
            _ => None,
        }
    }

    /// Short lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::PlainText => "plain_text",
            FileKind::Markdown => "markdown",
            FileKind::Json => "json",
            FileKind::Pdf => "pdf",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upload acceptance rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPolicy {
    /// Largest accepted file in bytes
    pub max_size_bytes: u64,

    /// Accepted file kinds
    pub allowed_kinds: Vec<FileKind>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_kinds: vec![
                FileKind::PlainText,
                FileKind::Markdown,
                FileKind::Json,
                FileKind::Pdf,
            ],
        }
    }
}

impl UploadPolicy {
    /// Validate the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.max_size_bytes == 0 {
            return Err("max_size_bytes must be greater than 0".to_string());
        }
        if self.allowed_kinds.is_empty() {
            return Err("allowed_kinds must not be empty".to_string());
        }
        Ok(())
    }

    /// Check an upload's type and size
    pub fn check(
        &self,
        file_name: &str,
        media_type: Option<&str>,
        size: u64,
    ) -> Result<FileKind, UploadError> {
        let kind = FileKind::detect(file_name, media_type)
            .filter(|kind| self.allowed_kinds.contains(kind))
            .ok_or_else(|| {
                UploadError::UnsupportedType(media_type.unwrap_or(file_name).to_string())
            })?;

        if size == 0 {
            return Err(UploadError::Empty(file_name.to_string()));
        }
        if size > self.max_size_bytes {
            return Err(UploadError::TooLarge {
                size,
                max: self.max_size_bytes,
            });
        }
        Ok(kind)
    }
}
