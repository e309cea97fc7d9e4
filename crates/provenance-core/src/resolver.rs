//! Character range to word rectangles
//!
//! Selects every recognized word whose span overlaps the requested range and
//! returns one axis-aligned rectangle per word, in word order. Rectangles are
//! never merged: a phrase that wraps across lines keeps one box per word.

use shared_types::{BoundingBox, RecognizedPage, RecognizedWord};

/// Resolve `[char_start, char_end)` against one page's words.
///
/// `words` must already be filtered to a single page and ordered by
/// `char_start`. A range past the end of the page text is clipped by the
/// overlap test itself. Single-point polygons produce zero-area boxes;
/// words with no polygon points contribute nothing.
pub fn resolve(words: &[RecognizedWord], char_start: usize, char_end: usize) -> Vec<BoundingBox> {
    overlapping_words(words, char_start, char_end)
        .filter_map(|w| BoundingBox::from_polygon(w.page_number, &w.polygon))
        .collect()
}

/// Words whose half-open span intersects `[char_start, char_end)`
pub fn overlapping_words(
    words: &[RecognizedWord],
    char_start: usize,
    char_end: usize,
) -> impl Iterator<Item = &RecognizedWord> {
    // Words are sorted, so everything at or past `char_end` can be skipped.
    let upper = words.partition_point(|w| w.char_start < char_end);
    words[..upper]
        .iter()
        .filter(move |w| w.char_start < char_end && w.char_end > char_start)
}

/// Convenience over a whole [`RecognizedPage`]
pub fn resolve_page(page: &RecognizedPage, char_start: usize, char_end: usize) -> Vec<BoundingBox> {
    resolve(&page.words, char_start, char_end)
}
