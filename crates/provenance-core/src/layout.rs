//! Layout payload parsing
//!
//! Accepts either a Document Intelligence analyze result or the native
//! `{"pages": [...]}` form and produces [`DocumentGeometry`] with
//! page-normalized polygons and page-relative character offsets.
//!
//! Offsets in the result are Unicode scalar values. Document Intelligence
//! reports span offsets in the unit named by `stringIndexType`:
//! `utf16CodeUnit` offsets are converted, `unicodeCodePoint` offsets are
//! used as is. `textElements` (grapheme clusters, the service default) is
//! read as scalar values, which is exact unless the text contains
//! multi-scalar graphemes such as combining marks or emoji sequences;
//! request `unicodeCodePoint` from the service to avoid drift.

use crate::error::{ProvenanceError, Result};
use serde::Deserialize;
use shared_types::{DocumentGeometry, DocumentId, RecognizedPage, RecognizedWord};
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LayoutPayload {
    Native(NativeLayout),
    Envelope(AnalyzeEnvelope),
    Analyze(AnalyzeResult),
}

#[derive(Debug, Deserialize)]
struct NativeLayout {
    pages: Vec<RecognizedPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeEnvelope {
    analyze_result: AnalyzeResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResult {
    #[serde(default)]
    content: String,
    #[serde(default)]
    string_index_type: StringIndexType,
    pages: Vec<AnalyzePage>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
enum StringIndexType {
    #[default]
    TextElements,
    UnicodeCodePoint,
    Utf16CodeUnit,
}

/// Converts service offsets into scalar-value offsets into `content`
struct OffsetMap {
    /// Scalar index for every UTF-16 code unit, plus one past the end
    utf16: Option<Vec<usize>>,
}

impl OffsetMap {
    fn new(content: &str, index_type: StringIndexType) -> Self {
        let utf16 = (index_type == StringIndexType::Utf16CodeUnit).then(|| {
            let mut map = Vec::with_capacity(content.len() + 1);
            let mut scalars = 0;
            for c in content.chars() {
                map.extend(std::iter::repeat(scalars).take(c.len_utf16()));
                scalars += 1;
            }
            map.push(scalars);
            map
        });
        Self { utf16 }
    }

    fn scalar(&self, offset: usize) -> usize {
        match &self.utf16 {
            Some(map) => map
                .get(offset)
                .or_else(|| map.last())
                .copied()
                .unwrap_or(0),
            None => offset,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzePage {
    page_number: u32,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    spans: Vec<Span>,
    #[serde(default)]
    words: Vec<AnalyzeWord>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeWord {
    content: String,
    #[serde(default)]
    polygon: Vec<f64>, // Flat [x1, y1, x2, y2, ...] in page units
    span: Span,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Span {
    offset: usize,
    length: usize,
}

/// Parse a layout payload for `document_id`
pub fn parse_layout(document_id: DocumentId, json: &str) -> Result<DocumentGeometry> {
    let payload: LayoutPayload = serde_json::from_str(json)
        .map_err(|e| ProvenanceError::InvalidLayout(e.to_string()))?;

    let mut pages = match payload {
        LayoutPayload::Native(native) => native.pages,
        LayoutPayload::Envelope(AnalyzeEnvelope { analyze_result }) => {
            convert_analyze(analyze_result)?
        }
        LayoutPayload::Analyze(result) => convert_analyze(result)?,
    };

    for page in &mut pages {
        page.words.sort_by_key(|w| w.char_start);
    }
    pages.sort_by_key(|p| p.page_number);

    let geometry = DocumentGeometry::new(document_id, pages);
    debug!(
        document_id = %geometry.document_id,
        pages = geometry.page_count(),
        words = geometry.word_count(),
        "Parsed layout"
    );
    Ok(geometry)
}

fn convert_analyze(result: AnalyzeResult) -> Result<Vec<RecognizedPage>> {
    let offsets = OffsetMap::new(&result.content, result.string_index_type);
    if result.string_index_type == StringIndexType::TextElements {
        debug!("Reading textElements offsets as scalar values");
    }
    let content: Vec<char> = result.content.chars().collect();
    result
        .pages
        .into_iter()
        .map(|page| convert_page(&content, &offsets, page))
        .collect()
}

fn convert_page(content: &[char], offsets: &OffsetMap, page: AnalyzePage) -> Result<RecognizedPage> {
    if page.page_number == 0 {
        return Err(ProvenanceError::InvalidLayout(
            "page numbers start at 1".to_string(),
        ));
    }

    let page_start = page
        .spans
        .iter()
        .map(|s| offsets.scalar(s.offset))
        .min()
        .unwrap_or(0);
    let page_end = page
        .spans
        .iter()
        .map(|s| offsets.scalar(s.offset + s.length))
        .max()
        .unwrap_or(page_start);
    let full_text: String = content
        .get(page_start.min(content.len())..page_end.min(content.len()))
        .unwrap_or_default()
        .iter()
        .collect();

    let scale = |v: Option<f64>| v.filter(|d| *d > 0.0).unwrap_or(1.0);
    let (width, height) = (scale(page.width), scale(page.height));

    let words = page
        .words
        .into_iter()
        .filter(|w| w.span.length > 0)
        .map(|w| {
            let start = offsets.scalar(w.span.offset);
            let end = offsets.scalar(w.span.offset + w.span.length);
            RecognizedWord {
                text: w.content,
                char_start: start.saturating_sub(page_start),
                char_end: end.saturating_sub(page_start),
                polygon: w
                    .polygon
                    .chunks_exact(2)
                    .map(|xy| (xy[0] / width, xy[1] / height))
                    .collect(),
                page_number: page.page_number,
            }
        })
        .collect();

    Ok(RecognizedPage {
        page_number: page.page_number,
        full_text,
        words,
    })
}
