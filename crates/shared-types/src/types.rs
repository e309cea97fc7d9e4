use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identity of the document under review
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Half-open character range `[start, end)` in a page's recognized text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharRange {
    pub start: usize, // Character offset in the page text
    pub end: usize,   // Exclusive end offset
}

impl CharRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Standard half-open overlap test
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        start < self.end && end > self.start
    }

    /// Clip to `[0, limit)`; `None` if nothing remains
    pub fn clip(&self, limit: usize) -> Option<CharRange> {
        let end = self.end.min(limit);
        (self.start < end).then(|| CharRange::new(self.start, end))
    }
}

/// Reasons an evidence target cannot be adopted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("page numbers start at 1")]
    InvalidPage,

    #[error("character range {start}..{end} is empty or reversed")]
    EmptyRange { start: usize, end: usize },

    #[error("only one of char_start/char_end was given")]
    HalfOpenRange,

    #[error("target has neither a character range nor search text")]
    NothingToHighlight,
}

/// What should be highlighted for an extracted field
///
/// At least one of the character range or a literal `quote`/`value` is
/// present. `value` is the normalized extracted value and is preferred over
/// `quote` as search text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvidenceTarget {
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_end: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl EvidenceTarget {
    pub fn on_page(page: u32) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    pub fn with_range(mut self, start: usize, end: usize) -> Self {
        self.char_start = Some(start);
        self.char_end = Some(end);
        self
    }

    pub fn with_quote(mut self, quote: impl Into<String>) -> Self {
        self.quote = Some(quote.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// The character range, when both ends are present
    pub fn char_range(&self) -> Option<CharRange> {
        match (self.char_start, self.char_end) {
            (Some(start), Some(end)) => Some(CharRange::new(start, end)),
            _ => None,
        }
    }

    /// Literal search text: `value` first, then `quote`. Blank strings are skipped.
    pub fn search_text(&self) -> Option<&str> {
        [self.value.as_deref(), self.quote.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<(), TargetError> {
        if self.page == 0 {
            return Err(TargetError::InvalidPage);
        }
        match (self.char_start, self.char_end) {
            (Some(start), Some(end)) if start >= end => {
                return Err(TargetError::EmptyRange { start, end })
            }
            (Some(_), None) | (None, Some(_)) => return Err(TargetError::HalfOpenRange),
            _ => {}
        }
        if self.char_range().is_none() && self.search_text().is_none() {
            return Err(TargetError::NothingToHighlight);
        }
        Ok(())
    }
}
