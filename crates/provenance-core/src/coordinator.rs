//! The single active highlight
//!
//! [`HighlightCoordinator`] owns the highlight state for the document under
//! review and is the only place it changes. It is driven by three events:
//! a document change, a target adoption, and geometry arrival. Consumers read
//! [`HighlightSnapshot`] values and never see partial updates.

use crate::error::{Degradation, ProvenanceError, Result};
use crate::resolver;
use crate::store::{FetchTicket, GeometryLoadState, ProvenanceStore, StoreLookup};
use serde::{Deserialize, Serialize};
use shared_types::{BoundingBox, DocumentGeometry, DocumentId, EvidenceTarget};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightPhase {
    /// No target adopted
    #[default]
    Idle,
    /// Target has a range; waiting for geometry
    PendingGeometry,
    /// Boxes computed (possibly none)
    Resolved,
    /// No boxes will be computed; consumers search for text instead
    TextOnly,
}

/// Read-only view of the highlight state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightSnapshot {
    pub document_id: Option<DocumentId>,
    pub target: Option<EvidenceTarget>,
    pub phase: HighlightPhase,
    pub boxes: Vec<BoundingBox>,
    pub geometry: GeometryLoadState,
    pub degradation: Option<Degradation>,
    /// Bumped on every adoption and document change
    pub revision: u64,
}

impl HighlightSnapshot {
    /// Literal text the PDF surface should search for
    pub fn search_text(&self) -> Option<&str> {
        self.target.as_ref().and_then(EvidenceTarget::search_text)
    }

    pub fn page(&self) -> Option<u32> {
        self.target.as_ref().map(|t| t.page)
    }

    /// True once nothing about this highlight is still in flight
    pub fn is_settled(&self) -> bool {
        self.phase != HighlightPhase::PendingGeometry
    }
}

#[derive(Debug, Default)]
pub struct HighlightCoordinator {
    store: ProvenanceStore,
    document_id: Option<DocumentId>,
    target: Option<EvidenceTarget>,
    phase: HighlightPhase,
    boxes: Vec<BoundingBox>,
    degradation: Option<Degradation>,
    revision: u64,
}

impl HighlightCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_id(&self) -> Option<&DocumentId> {
        self.document_id.as_ref()
    }

    /// Switch the document under review. Resets to Idle when it changes.
    #[instrument(skip(self))]
    pub fn set_document(&mut self, document_id: Option<DocumentId>) -> bool {
        if self.document_id == document_id {
            return false;
        }
        match &document_id {
            Some(id) => {
                self.store.select(id);
            }
            None => self.store.clear(),
        }
        self.document_id = document_id;
        self.reset();
        info!("Document changed; highlight cleared");
        true
    }

    /// Replace the current highlight with `target`.
    ///
    /// Returns a ticket when geometry must be fetched for the active
    /// document; the caller runs the fetch and reports back through
    /// [`HighlightCoordinator::geometry_arrived`]. Invalid targets are
    /// rejected and leave the current highlight untouched.
    #[instrument(skip(self, target), fields(page = target.page))]
    pub fn adopt(&mut self, target: EvidenceTarget) -> Result<Option<FetchTicket>> {
        target.validate()?;
        let document_id = self
            .document_id
            .clone()
            .ok_or(ProvenanceError::NoActiveDocument)?;

        self.revision += 1;
        self.boxes.clear();
        self.degradation = None;

        let mut ticket = None;
        if target.char_range().is_none() {
            self.phase = HighlightPhase::TextOnly;
        } else {
            match self.store.get(&document_id) {
                StoreLookup::Ready(geometry) => self.resolve_against(&target, &geometry),
                StoreLookup::Failed => self.text_only(Degradation::GeometryUnavailable),
                StoreLookup::Pending => self.phase = HighlightPhase::PendingGeometry,
                StoreLookup::Fetch(t) => {
                    self.phase = HighlightPhase::PendingGeometry;
                    ticket = Some(t);
                }
            }
        }
        self.target = Some(target);
        debug!(phase = ?self.phase, revision = self.revision, "Adopted target");
        Ok(ticket)
    }

    /// Apply a geometry fetch result. Returns `false` if it was stale.
    ///
    /// Boxes are always recomputed for the target current at arrival time,
    /// so a fetch started for an earlier target can never surface that
    /// target's boxes.
    pub fn geometry_arrived(
        &mut self,
        ticket: &FetchTicket,
        result: std::result::Result<DocumentGeometry, ProvenanceError>,
    ) -> bool {
        if !self.store.complete(ticket, result) {
            return false;
        }
        if self.phase != HighlightPhase::PendingGeometry {
            return true;
        }
        let Some(target) = self.target.clone() else {
            return true;
        };
        match self.store.geometry() {
            Some(geometry) => self.resolve_against(&target, &geometry),
            None => self.text_only(Degradation::GeometryUnavailable),
        }
        debug!(phase = ?self.phase, boxes = self.boxes.len(), "Geometry applied");
        true
    }

    pub fn current(&self) -> HighlightSnapshot {
        HighlightSnapshot {
            document_id: self.document_id.clone(),
            target: self.target.clone(),
            phase: self.phase,
            boxes: self.boxes.clone(),
            geometry: self.store.load_state(),
            degradation: self.degradation,
            revision: self.revision,
        }
    }

    /// Geometry cached for the active document
    pub fn geometry(&self) -> Option<std::sync::Arc<DocumentGeometry>> {
        self.store.geometry()
    }

    fn reset(&mut self) {
        self.target = None;
        self.phase = HighlightPhase::Idle;
        self.boxes.clear();
        self.degradation = None;
        self.revision += 1;
    }

    fn resolve_against(&mut self, target: &EvidenceTarget, geometry: &DocumentGeometry) {
        let (Some(range), Some(page)) = (target.char_range(), geometry.page(target.page)) else {
            self.text_only(Degradation::GeometryUnavailable);
            return;
        };
        if page.words.is_empty() {
            self.text_only(Degradation::GeometryUnavailable);
            return;
        }
        self.boxes = resolver::resolve(&page.words, range.start, range.end);
        self.phase = HighlightPhase::Resolved;
        if self.boxes.is_empty() {
            self.degradation = Some(Degradation::NoOverlap);
        }
    }

    fn text_only(&mut self, reason: Degradation) {
        self.phase = HighlightPhase::TextOnly;
        self.boxes.clear();
        self.degradation = Some(reason);
    }
}
