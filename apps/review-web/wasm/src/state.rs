//! Browser-independent session state
//!
//! Everything the JS-facing session does, minus the JS calls: each operation
//! returns the effects (geometry fetch, PDF navigation) the wrapper must run.
//! Any change of highlight, document or surface cancels the PDF navigation
//! still waiting on the renderer, whether or not a new one is issued.

use provenance_core::coords::{is_renderable, to_surface_rect, SurfaceRect};
use provenance_core::{
    DocumentGeometry, DocumentId, EvidenceTarget, FetchTicket, HighlightCoordinator,
    HighlightSnapshot, NavigationConfig, PageTextModel, PdfNavigationBridge, ProvenanceError,
    SourceSet, SurfaceDirective, ViewerConfig, ViewerTab, ViewerTabController,
};

/// Page and search text for the PDF surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub page: u32,
    pub search_text: Option<String>,
}

#[derive(Debug, Default)]
pub struct Effects {
    pub fetch: Option<FetchTicket>,
    pub navigate: Option<NavigationRequest>,
}

#[derive(Debug)]
pub struct SessionState {
    coordinator: HighlightCoordinator,
    tabs: ViewerTabController,
    text: Option<PageTextModel>,
    bridge: PdfNavigationBridge,
}

impl SessionState {
    pub fn new(viewer: ViewerConfig, navigation: NavigationConfig) -> Self {
        Self {
            coordinator: HighlightCoordinator::new(),
            tabs: ViewerTabController::new(viewer),
            text: None,
            bridge: PdfNavigationBridge::new(navigation),
        }
    }

    /// Bridge that navigation effects must be run through
    pub fn navigation_bridge(&self) -> PdfNavigationBridge {
        self.bridge.clone()
    }

    pub fn open_document(&mut self, document_id: DocumentId, sources: SourceSet) {
        if self.coordinator.set_document(Some(document_id.clone())) {
            self.text = None;
            self.bridge.cancel();
        }
        let before = self.tabs.active();
        self.tabs.load_document(document_id, sources);
        self.cancel_if_left_pdf(before);
    }

    pub fn close_document(&mut self) {
        self.coordinator.set_document(None);
        self.text = None;
        self.bridge.cancel();
    }

    pub fn set_sources(&mut self, sources: SourceSet) {
        let before = self.tabs.active();
        self.tabs.update_sources(sources);
        self.cancel_if_left_pdf(before);
    }

    /// Plain page text from the review backend, for the text surface
    pub fn set_page_texts(&mut self, texts: Vec<String>) {
        self.text = Some(PageTextModel::from_page_texts(texts));
    }

    pub fn adopt(&mut self, target: EvidenceTarget) -> Result<Effects, ProvenanceError> {
        let fetch = self.coordinator.adopt(target)?;
        self.bridge.cancel();
        Ok(Effects {
            fetch,
            navigate: self.pdf_navigation(),
        })
    }

    /// Returns `true` when the result was applied
    pub fn geometry_arrived(
        &mut self,
        ticket: &FetchTicket,
        result: Result<DocumentGeometry, ProvenanceError>,
    ) -> bool {
        if !self.coordinator.geometry_arrived(ticket, result) {
            return false;
        }
        if self.text.is_none() {
            self.text = self
                .coordinator
                .geometry()
                .map(|g| PageTextModel::from_geometry(&g));
        }
        true
    }

    /// Manual tab switch; switching to the PDF surface re-runs navigation
    pub fn select_tab(&mut self, tab: ViewerTab) -> Option<Effects> {
        let before = self.tabs.active();
        if !self.tabs.select(tab) {
            return None;
        }
        self.cancel_if_left_pdf(before);
        Some(Effects {
            fetch: None,
            navigate: self.pdf_navigation(),
        })
    }

    pub fn active_tab(&self) -> ViewerTab {
        self.tabs.active()
    }

    pub fn available_tabs(&self) -> Vec<ViewerTab> {
        self.tabs.available_tabs()
    }

    pub fn snapshot(&self) -> HighlightSnapshot {
        self.coordinator.current()
    }

    pub fn directive(&self) -> Option<SurfaceDirective> {
        self.tabs
            .directive(&self.coordinator.current(), self.text.as_ref())
    }

    /// Renderable boxes of the current highlight scaled onto a
    /// `width` x `height` pixel surface, for the image overlay
    pub fn surface_rects(&self, width: f64, height: f64) -> Vec<SurfaceRect> {
        self.coordinator
            .current()
            .boxes
            .iter()
            .filter(|b| is_renderable(b))
            .map(|b| to_surface_rect(b, width, height))
            .collect()
    }

    fn cancel_if_left_pdf(&self, before: ViewerTab) {
        if before == ViewerTab::Pdf && self.tabs.active() != ViewerTab::Pdf {
            self.bridge.cancel();
        }
    }

    fn pdf_navigation(&self) -> Option<NavigationRequest> {
        if self.tabs.active() != ViewerTab::Pdf {
            return None;
        }
        let snapshot = self.coordinator.current();
        Some(NavigationRequest {
            page: snapshot.page()?,
            search_text: snapshot.search_text().map(str::to_string),
        })
    }
}
