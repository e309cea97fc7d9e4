//! Viewer tab selection and per-surface highlight directives

use crate::config::ViewerConfig;
use crate::coordinator::{HighlightPhase, HighlightSnapshot};
use crate::coords::is_renderable;
use crate::text_model::PageTextModel;
use serde::{Deserialize, Serialize};
use shared_types::{BoundingBox, CharRange, DocumentId};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerTab {
    Text,
    Pdf,
    Image,
}

/// Which rendering sources the current document has
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSet {
    pub has_pdf: bool,
    pub has_image: bool,
}

impl SourceSet {
    pub fn new(has_pdf: bool, has_image: bool) -> Self {
        Self { has_pdf, has_image }
    }

    /// Text is always available
    pub fn supports(&self, tab: ViewerTab) -> bool {
        match tab {
            ViewerTab::Text => true,
            ViewerTab::Pdf => self.has_pdf,
            ViewerTab::Image => self.has_image,
        }
    }
}

/// PDF over Image over Text
pub fn default_tab(has_pdf: bool, has_image: bool) -> ViewerTab {
    default_tab_with(&ViewerConfig::default(), SourceSet::new(has_pdf, has_image))
}

pub fn default_tab_with(config: &ViewerConfig, sources: SourceSet) -> ViewerTab {
    match (sources.has_pdf, sources.has_image) {
        (true, true) if config.prefer_image_over_pdf => ViewerTab::Image,
        (true, _) => ViewerTab::Pdf,
        (false, true) => ViewerTab::Image,
        (false, false) => ViewerTab::Text,
    }
}

/// What the active surface should show for the current highlight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "surface", rename_all = "snake_case")]
pub enum SurfaceDirective {
    Text {
        page: u32,
        span: Option<CharRange>,
    },
    Pdf {
        page: u32,
        search_text: Option<String>,
        boxes: Vec<BoundingBox>,
    },
    Image {
        page: u32,
        boxes: Vec<BoundingBox>,
    },
}

#[derive(Debug, Clone)]
pub struct ViewerTabController {
    config: ViewerConfig,
    document_id: Option<DocumentId>,
    sources: SourceSet,
    active: ViewerTab,
    user_selected: bool,
}

impl Default for ViewerTabController {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl ViewerTabController {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            document_id: None,
            sources: SourceSet::default(),
            active: ViewerTab::Text,
            user_selected: false,
        }
    }

    pub fn active(&self) -> ViewerTab {
        self.active
    }

    pub fn sources(&self) -> SourceSet {
        self.sources
    }

    pub fn available_tabs(&self) -> Vec<ViewerTab> {
        [ViewerTab::Pdf, ViewerTab::Image, ViewerTab::Text]
            .into_iter()
            .filter(|t| self.sources.supports(*t))
            .collect()
    }

    /// Show a new document. A manual choice from the previous document is forgotten.
    pub fn load_document(&mut self, document_id: DocumentId, sources: SourceSet) {
        if self.document_id.as_ref() != Some(&document_id) {
            self.user_selected = false;
        }
        self.document_id = Some(document_id);
        self.update_sources(sources);
    }

    /// Re-evaluate after the source set changed. A manual choice survives
    /// as long as its surface is still available.
    pub fn update_sources(&mut self, sources: SourceSet) {
        self.sources = sources;
        if self.user_selected && sources.supports(self.active) {
            return;
        }
        self.user_selected = false;
        self.active = default_tab_with(&self.config, sources);
        debug!(tab = ?self.active, "Default tab selected");
    }

    /// Manual tab switch; ignored for unavailable surfaces
    pub fn select(&mut self, tab: ViewerTab) -> bool {
        if !self.sources.supports(tab) {
            return false;
        }
        self.active = tab;
        self.user_selected = true;
        true
    }

    /// Directive for the active surface, or `None` while nothing is adopted.
    /// `text` is consulted for the text surface span.
    pub fn directive(
        &self,
        snapshot: &HighlightSnapshot,
        text: Option<&PageTextModel>,
    ) -> Option<SurfaceDirective> {
        let target = snapshot.target.as_ref()?;
        if snapshot.phase == HighlightPhase::Idle {
            return None;
        }
        let page = target.page;
        let boxes = || -> Vec<BoundingBox> {
            snapshot
                .boxes
                .iter()
                .filter(|b| is_renderable(b))
                .copied()
                .collect()
        };
        Some(match self.active {
            ViewerTab::Text => SurfaceDirective::Text {
                page,
                span: text.and_then(|model| model.span_for(target)),
            },
            ViewerTab::Pdf => SurfaceDirective::Pdf {
                page,
                search_text: snapshot.search_text().map(str::to_string),
                boxes: boxes(),
            },
            ViewerTab::Image => SurfaceDirective::Image {
                page,
                boxes: boxes(),
            },
        })
    }
}
