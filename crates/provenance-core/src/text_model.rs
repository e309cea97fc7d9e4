//! Recognized text, page by page
//!
//! Character offsets here are counted in Unicode scalar values, the same
//! unit evidence ranges and word spans use.

use shared_types::{CharRange, DocumentGeometry, EvidenceTarget};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageTextModel {
    pages: BTreeMap<u32, String>,
}

impl PageTextModel {
    pub fn from_geometry(geometry: &DocumentGeometry) -> Self {
        Self {
            pages: geometry
                .pages
                .iter()
                .map(|p| (p.page_number, p.full_text.clone()))
                .collect(),
        }
    }

    /// Per-page text in page order; page numbers start at 1
    pub fn from_page_texts(texts: Vec<String>) -> Self {
        Self {
            pages: (1u32..).zip(texts).collect(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_text(&self, page: u32) -> Option<&str> {
        self.pages.get(&page).map(String::as_str)
    }

    /// Text covered by `range`, clipped to the page
    pub fn excerpt(&self, page: u32, range: CharRange) -> Option<String> {
        let text = self.page_text(page)?;
        let len = text.chars().count();
        let range = range.clip(len)?;
        Some(text.chars().skip(range.start).take(range.len()).collect())
    }

    /// Find `needle` on `page`, ignoring case and treating any whitespace run
    /// as a single space. Returns the first match in original offsets.
    pub fn locate(&self, page: u32, needle: &str) -> Option<CharRange> {
        let text = self.page_text(page)?;
        let (needle, _) = fold(needle.trim());
        if needle.is_empty() {
            return None;
        }
        let (hay, origin) = fold(text);
        let at = hay
            .windows(needle.len())
            .position(|window| window == needle.as_slice())?;
        let start = origin[at];
        let end = origin[at + needle.len() - 1] + 1;
        Some(CharRange::new(start, end))
    }

    /// Text-surface span for a target: its range when present, otherwise the
    /// first occurrence of its search text
    pub fn span_for(&self, target: &EvidenceTarget) -> Option<CharRange> {
        match target.char_range() {
            Some(range) => {
                let len = self.page_text(target.page)?.chars().count();
                range.clip(len)
            }
            None => self.locate(target.page, target.search_text()?),
        }
    }
}

/// Lowercase and collapse whitespace, remembering each folded char's
/// original offset
fn fold(text: &str) -> (Vec<char>, Vec<usize>) {
    let mut folded = Vec::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    let mut in_space = false;
    for (i, c) in text.chars().enumerate() {
        if c.is_whitespace() {
            if !in_space {
                folded.push(' ');
                origin.push(i);
            }
            in_space = true;
            continue;
        }
        in_space = false;
        for lower in c.to_lowercase() {
            folded.push(lower);
            origin.push(i);
        }
    }
    (folded, origin)
}
