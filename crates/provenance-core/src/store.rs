//! Lazy single-document geometry cache
//!
//! The store never performs I/O. A lookup that needs data hands out a
//! [`FetchTicket`]; whoever runs the fetch reports back with
//! [`ProvenanceStore::complete`]. Tickets carry the selection epoch they were
//! issued under, so a result for a document that has since been replaced is
//! dropped instead of cached.

use crate::error::ProvenanceError;
use serde::{Deserialize, Serialize};
use shared_types::{DocumentGeometry, DocumentId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Geometry load state as seen by highlight consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryLoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

/// Permission to fetch geometry for one document selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub document_id: DocumentId,
    epoch: u64,
}

impl FetchTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Result of [`ProvenanceStore::get`]
#[derive(Debug, Clone)]
pub enum StoreLookup {
    Ready(Arc<DocumentGeometry>),
    /// A fetch is already in flight
    Pending,
    /// The fetch failed; no retry for this selection
    Failed,
    /// Nothing requested yet; the caller must run this fetch
    Fetch(FetchTicket),
}

#[derive(Debug)]
enum Slot {
    Empty,
    Loading,
    Loaded(Arc<DocumentGeometry>),
    Failed(String),
}

#[derive(Debug)]
struct Selection {
    document_id: DocumentId,
    epoch: u64,
    slot: Slot,
}

#[derive(Debug, Default)]
pub struct ProvenanceStore {
    selection: Option<Selection>,
    epoch: u64,
}

impl ProvenanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `document_id` the active document. Returns `false` if it already was.
    ///
    /// Any geometry held for the previous document is dropped, and the new
    /// selection starts empty even if the same id was active before.
    pub fn select(&mut self, document_id: &DocumentId) -> bool {
        if self.active_document() == Some(document_id) {
            return false;
        }
        self.epoch += 1;
        if let Some(previous) = self.selection.take() {
            debug!(document_id = %previous.document_id, "Evicting cached geometry");
        }
        self.selection = Some(Selection {
            document_id: document_id.clone(),
            epoch: self.epoch,
            slot: Slot::Empty,
        });
        true
    }

    /// Drop the active document
    pub fn clear(&mut self) {
        self.epoch += 1;
        self.selection = None;
    }

    pub fn active_document(&self) -> Option<&DocumentId> {
        self.selection.as_ref().map(|s| &s.document_id)
    }

    /// Geometry for `document_id`, switching the active document if needed.
    /// Only the first call for a selection returns [`StoreLookup::Fetch`].
    pub fn get(&mut self, document_id: &DocumentId) -> StoreLookup {
        self.select(document_id);
        let epoch = self.epoch;
        let Some(selection) = self.selection.as_mut() else {
            return StoreLookup::Failed;
        };
        match &selection.slot {
            Slot::Loaded(geometry) => return StoreLookup::Ready(Arc::clone(geometry)),
            Slot::Loading => return StoreLookup::Pending,
            Slot::Failed(_) => return StoreLookup::Failed,
            Slot::Empty => {}
        }
        selection.slot = Slot::Loading;
        info!(document_id = %document_id, "Requesting geometry");
        StoreLookup::Fetch(FetchTicket {
            document_id: document_id.clone(),
            epoch,
        })
    }

    /// Record a fetch result. Returns `false` when the ticket belongs to a
    /// selection that is no longer active.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<DocumentGeometry, ProvenanceError>,
    ) -> bool {
        let Some(selection) = self
            .selection
            .as_mut()
            .filter(|s| s.epoch == ticket.epoch && s.document_id == ticket.document_id)
        else {
            debug!(
                document_id = %ticket.document_id,
                epoch = ticket.epoch,
                "Discarding geometry for a replaced document"
            );
            return false;
        };

        selection.slot = match result {
            Ok(geometry) => {
                debug!(
                    document_id = %ticket.document_id,
                    pages = geometry.page_count(),
                    "Geometry loaded"
                );
                Slot::Loaded(Arc::new(geometry))
            }
            Err(e) => {
                warn!(document_id = %ticket.document_id, error = %e, "Geometry fetch failed");
                Slot::Failed(e.to_string())
            }
        };
        true
    }

    pub fn load_state(&self) -> GeometryLoadState {
        match self.selection.as_ref().map(|s| &s.slot) {
            None | Some(Slot::Empty) => GeometryLoadState::NotLoaded,
            Some(Slot::Loading) => GeometryLoadState::Loading,
            Some(Slot::Loaded(_)) => GeometryLoadState::Loaded,
            Some(Slot::Failed(_)) => GeometryLoadState::Failed,
        }
    }

    /// Cached geometry for the active document, if loaded
    pub fn geometry(&self) -> Option<Arc<DocumentGeometry>> {
        match self.selection.as_ref().map(|s| &s.slot) {
            Some(Slot::Loaded(geometry)) => Some(Arc::clone(geometry)),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self.selection.as_ref().map(|s| &s.slot) {
            Some(Slot::Failed(reason)) => Some(reason),
            _ => None,
        }
    }
}
