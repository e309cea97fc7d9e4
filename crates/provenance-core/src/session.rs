//! Async review session
//!
//! Wires the [`HighlightCoordinator`] to a [`GeometrySource`] on a tokio
//! runtime. Fetches run as spawned tasks and report back through the
//! coordinator's staleness guard; every state change is published on a
//! `watch` channel so surfaces can follow the current snapshot.

use crate::config::ProvenanceConfig;
use crate::coordinator::{HighlightCoordinator, HighlightSnapshot};
use crate::error::Result;
use crate::navigation::{NavigationOutcome, PdfNavigationBridge, PdfSurface};
use crate::source::GeometrySource;
use crate::store::FetchTicket;
use shared_types::{DocumentGeometry, DocumentId, EvidenceTarget};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

pub struct ReviewSession<G> {
    coordinator: Arc<Mutex<HighlightCoordinator>>,
    source: Arc<G>,
    bridge: PdfNavigationBridge,
    snapshots: Arc<watch::Sender<HighlightSnapshot>>,
}

impl<G: GeometrySource + 'static> ReviewSession<G> {
    pub fn new(source: G, config: &ProvenanceConfig) -> Self {
        let (snapshots, _) = watch::channel(HighlightSnapshot::default());
        Self {
            coordinator: Arc::new(Mutex::new(HighlightCoordinator::new())),
            source: Arc::new(source),
            bridge: PdfNavigationBridge::new(config.navigation),
            snapshots: Arc::new(snapshots),
        }
    }

    /// Follow highlight changes
    pub fn subscribe(&self) -> watch::Receiver<HighlightSnapshot> {
        self.snapshots.subscribe()
    }

    pub async fn current(&self) -> HighlightSnapshot {
        self.coordinator.lock().await.current()
    }

    /// Geometry cached for the open document
    pub async fn geometry(&self) -> Option<Arc<DocumentGeometry>> {
        self.coordinator.lock().await.geometry()
    }

    /// Switch documents; `None` closes the current one. A navigation still
    /// waiting for the renderer is superseded.
    pub async fn open_document(&self, document_id: Option<DocumentId>) -> HighlightSnapshot {
        let mut coordinator = self.coordinator.lock().await;
        if coordinator.set_document(document_id) {
            self.bridge.cancel();
            self.snapshots.send_replace(coordinator.current());
        }
        coordinator.current()
    }

    /// Adopt `target` and start any geometry fetch it needs. Returns the
    /// snapshot right after adoption, which may still be pending.
    ///
    /// Any navigation started for the previous target is superseded and
    /// never reaches the renderer.
    pub async fn adopt(&self, target: EvidenceTarget) -> Result<HighlightSnapshot> {
        let mut coordinator = self.coordinator.lock().await;
        let ticket = coordinator.adopt(target)?;
        self.bridge.cancel();
        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket);
        }
        let snapshot = coordinator.current();
        self.snapshots.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    /// Wait until the current highlight is no longer waiting on geometry
    pub async fn settled(&self) -> HighlightSnapshot {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(HighlightSnapshot::is_settled)
            .await
            .map(|snapshot| snapshot.clone());
        match settled {
            Ok(snapshot) => snapshot,
            Err(_) => self.current().await,
        }
    }

    /// Drive `surface` to the current highlight's page and search text.
    /// `None` while nothing is adopted.
    pub async fn navigate<S: PdfSurface + ?Sized>(&self, surface: &S) -> Option<NavigationOutcome> {
        let snapshot = self.current().await;
        let page = snapshot.page()?;
        let outcome = self
            .bridge
            .go_to_and_highlight(surface, page, snapshot.search_text())
            .await;
        debug!(?outcome, "Navigation finished");
        Some(outcome)
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let coordinator = Arc::clone(&self.coordinator);
        let source = Arc::clone(&self.source);
        let snapshots = Arc::clone(&self.snapshots);
        info!(document_id = %ticket.document_id, "Fetching geometry");

        tokio::spawn(async move {
            let result = source.fetch(&ticket.document_id).await;
            let mut coordinator = coordinator.lock().await;
            if coordinator.geometry_arrived(&ticket, result) {
                snapshots.send_replace(coordinator.current());
            }
        });
    }
}
