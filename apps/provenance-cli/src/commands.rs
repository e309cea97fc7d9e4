use anyhow::Context;
use provenance_core::coords::{is_renderable, to_pdf_rect};
use provenance_core::resolver::resolve_page;
use provenance_core::session::ReviewSession;
use provenance_core::source::LayoutDirSource;
use provenance_core::{
    parse_layout, BoundingBox, CharRange, DocumentGeometry, DocumentId, EvidenceTarget,
    HighlightSnapshot, PageTextModel, ProvenanceConfig, SourceSet, SurfaceDirective, ViewerTab,
    ViewerTabController,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct ResolveRequest {
    pub layout: PathBuf,
    pub page: u32,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub quote: Option<String>,
    pub value: Option<String>,
    pub has_pdf: bool,
    pub has_image: bool,
    pub tab: Option<ViewerTab>,
    pub media_box: Option<[f64; 4]>,
}

#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub snapshot: HighlightSnapshot,
    pub tab: ViewerTab,
    pub directive: Option<SurfaceDirective>,
    pub excerpt: Option<String>,
    /// Renderable boxes in PDF points, when a media box was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_rects: Option<Vec<[f64; 4]>>,
}

#[derive(Debug, Serialize)]
pub struct LocateReport {
    pub range: Option<CharRange>,
    pub excerpt: Option<String>,
    pub boxes: Vec<BoundingBox>,
}

/// Explicit layout file, or `<layout_dir>/<document>.json` from the config
pub fn layout_path(
    config: &ProvenanceConfig,
    layout: Option<PathBuf>,
    document: Option<String>,
) -> anyhow::Result<PathBuf> {
    if let Some(layout) = layout {
        return Ok(layout);
    }
    let document = document.context("Either --layout or --document is required")?;
    let dir = config
        .geometry
        .layout_dir
        .as_ref()
        .context("--document needs geometry.layout_dir in the configuration")?;
    Ok(LayoutDirSource::new(dir).path_for(&DocumentId::new(document)))
}

/// `dir/claim-7.json` -> (`dir`, `claim-7`)
fn split_layout_path(layout: &Path) -> anyhow::Result<(PathBuf, DocumentId)> {
    let stem = layout
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Layout path has no file name: {}", layout.display()))?;
    let dir = layout
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((dir.to_path_buf(), DocumentId::new(stem)))
}

fn load_geometry(layout: &Path) -> anyhow::Result<DocumentGeometry> {
    let (_, document_id) = split_layout_path(layout)?;
    let json = std::fs::read_to_string(layout)
        .with_context(|| format!("Failed to read layout file: {}", layout.display()))?;
    Ok(parse_layout(document_id, &json)?)
}

/// Run the full adopt -> fetch -> resolve flow for one target
pub async fn resolve(
    config: &ProvenanceConfig,
    request: ResolveRequest,
) -> anyhow::Result<ResolveReport> {
    let (dir, document_id) = split_layout_path(&request.layout)?;
    let session = ReviewSession::new(LayoutDirSource::new(dir), config);
    session.open_document(Some(document_id.clone())).await;

    let target = EvidenceTarget {
        page: request.page,
        char_start: request.start,
        char_end: request.end,
        quote: request.quote,
        value: request.value,
    };
    session.adopt(target).await?;
    let snapshot = session.settled().await;
    info!(phase = ?snapshot.phase, boxes = snapshot.boxes.len(), "Target resolved");

    // Text-only targets never load geometry through the session
    let text = match session.geometry().await {
        Some(geometry) => Some(PageTextModel::from_geometry(&geometry)),
        None => load_geometry(&request.layout)
            .map(|g| PageTextModel::from_geometry(&g))
            .ok(),
    };

    let mut tabs = ViewerTabController::new(config.viewer);
    tabs.load_document(document_id, SourceSet::new(request.has_pdf, request.has_image));
    if let Some(tab) = request.tab {
        if !tabs.select(tab) {
            warn!(?tab, "Requested surface is not available; using default");
        }
    }

    let directive = tabs.directive(&snapshot, text.as_ref());
    let excerpt = match (&snapshot.target, &text) {
        (Some(target), Some(text)) => text
            .span_for(target)
            .and_then(|range| text.excerpt(target.page, range)),
        _ => None,
    };

    let pdf_rects = request.media_box.map(|media_box| {
        snapshot
            .boxes
            .iter()
            .filter(|b| is_renderable(b))
            .map(|b| to_pdf_rect(b, media_box))
            .collect()
    });

    Ok(ResolveReport {
        snapshot,
        tab: tabs.active(),
        directive,
        excerpt,
        pdf_rects,
    })
}

/// Find `needle` on `page` and resolve the match to boxes
pub fn locate(layout: &Path, page: u32, needle: &str) -> anyhow::Result<LocateReport> {
    let geometry = load_geometry(layout)?;
    let model = PageTextModel::from_geometry(&geometry);

    let Some(range) = model.locate(page, needle) else {
        warn!(page, needle, "Text not found on page");
        return Ok(LocateReport {
            range: None,
            excerpt: None,
            boxes: Vec::new(),
        });
    };

    Ok(LocateReport {
        range: Some(range),
        excerpt: model.excerpt(page, range),
        boxes: geometry
            .page(page)
            .map(|p| resolve_page(p, range.start, range.end))
            .unwrap_or_default(),
    })
}
