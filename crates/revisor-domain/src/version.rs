//! Document versioning (`major.minor`) and linear version history

use std::fmt;

/// A `major.minor` document version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentVersion {
    /// Major component, bumped on large rewrites
    pub major: u32,
    /// Minor component, bumped on surgical edits
    pub minor: u32,
}

impl DocumentVersion {
    /// Create a version
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Version assigned to newly created documents (`1.0`)
    pub fn initial() -> Self {
        Self::new(1, 0)
    }

    /// Next minor version (`major.minor+1`), `None` when `minor` is exhausted
    pub fn next_minor(&self) -> Option<Self> {
        Some(Self::new(self.major, self.minor.checked_add(1)?))
    }

    /// Next major version (`major+1.0`), `None` when `major` is exhausted
    pub fn next_major(&self) -> Option<Self> {
        Some(Self::new(self.major.checked_add(1)?, 0))
    }

    /// Parse `"major.minor"`; a bare `"major"` reads as `major.0`
    ///
    /// # Examples
    ///
    /// ```
    /// use revisor_domain::DocumentVersion;
    ///
    /// let v = DocumentVersion::parse("2.3").unwrap();
    /// assert_eq!(v.next_minor().unwrap().to_string(), "2.4");
    /// assert_eq!(v.next_major().unwrap().to_string(), "3.0");
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        let (major, minor) = match s.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (s, "0"),
        };
        let major = major
            .parse::<u32>()
            .map_err(|e| format!("Invalid major version in '{}': {}", s, e))?;
        let minor = minor
            .parse::<u32>()
            .map_err(|e| format!("Invalid minor version in '{}': {}", s, e))?;
        Ok(Self::new(major, minor))
    }
}

impl Default for DocumentVersion {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for DocumentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A prior state of a document, appended whenever its content is replaced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    /// Version the document had before the update
    pub version: DocumentVersion,
    /// Content the document had before the update
    pub content: String,
    /// When the content was replaced (unix seconds)
    pub replaced_at: u64,
    /// One-line description of what replaced it
    pub summary: String,
}
