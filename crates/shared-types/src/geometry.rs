//! Word geometry from the recognition step and the boxes derived from it
//!
//! All coordinates are page-normalized: `(0, 0)` is the top-left corner of the
//! page and `(1, 1)` the bottom-right.

use crate::types::{CharRange, DocumentId};
use serde::{Deserialize, Serialize};

/// A recognized word with its source span and bounding polygon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedWord {
    pub text: String,
    pub char_start: usize,
    pub char_end: usize, // Exclusive
    pub polygon: Vec<(f64, f64)>,
    pub page_number: u32,
}

impl RecognizedWord {
    pub fn span(&self) -> CharRange {
        CharRange::new(self.char_start, self.char_end)
    }
}

/// Recognized text of one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedPage {
    pub page_number: u32,
    pub full_text: String,
    #[serde(default)]
    pub words: Vec<RecognizedWord>,
}

impl RecognizedPage {
    /// Length of `full_text` in characters, the unit evidence ranges use
    pub fn char_len(&self) -> usize {
        self.full_text.chars().count()
    }
}

/// Everything the recognition step produced for one document version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentGeometry {
    pub document_id: DocumentId,
    pub pages: Vec<RecognizedPage>,
}

impl DocumentGeometry {
    pub fn new(document_id: DocumentId, pages: Vec<RecognizedPage>) -> Self {
        Self { document_id, pages }
    }

    pub fn page(&self, page_number: u32) -> Option<&RecognizedPage> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn word_count(&self) -> usize {
        self.pages.iter().map(|p| p.words.len()).sum()
    }
}

/// Axis-aligned rectangle in page-normalized coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Min/max envelope of a polygon. `None` for an empty polygon.
    pub fn from_polygon(page: u32, polygon: &[(f64, f64)]) -> Option<Self> {
        let (first, rest) = polygon.split_first()?;
        let (mut min_x, mut min_y) = *first;
        let (mut max_x, mut max_y) = *first;
        for &(x, y) in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self {
            page,
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn point() -> impl Strategy<Value = (f64, f64)> {
        (0.0f64..1.0, 0.0f64..1.0)
    }

    proptest! {
        /// The envelope contains every vertex of the polygon
        #[test]
        fn envelope_contains_polygon(polygon in prop::collection::vec(point(), 1..8)) {
            let bbox = BoundingBox::from_polygon(1, &polygon).unwrap();
            prop_assert!(bbox.width >= 0.0 && bbox.height >= 0.0);
            for (x, y) in polygon {
                prop_assert!(x >= bbox.x && x <= bbox.right() + 1e-12);
                prop_assert!(y >= bbox.y && y <= bbox.bottom() + 1e-12);
            }
        }
    }
}
