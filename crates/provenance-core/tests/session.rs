#![cfg(feature = "server")]
//! End-to-end highlight flow through the async review session

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use provenance_core::session::ReviewSession;
use provenance_core::source::{GeometrySource, StaticGeometrySource};
use provenance_core::{
    Degradation, DocumentGeometry, DocumentId, EvidenceTarget, GeometryLoadState, HighlightPhase,
    NavigationOutcome, PdfSurface, ProvenanceConfig, ProvenanceError, RecognizedPage,
    RecognizedWord,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn word(text: &str, start: usize, end: usize, x: f64) -> RecognizedWord {
    RecognizedWord {
        text: text.to_string(),
        char_start: start,
        char_end: end,
        polygon: vec![(x, 0.40), (x + 0.06, 0.40), (x + 0.06, 0.42), (x, 0.42)],
        page_number: 2,
    }
}

fn claim_geometry(id: &str) -> DocumentGeometry {
    DocumentGeometry::new(
        DocumentId::new(id),
        vec![RecognizedPage {
            page_number: 2,
            full_text: "Policy No. AB1234".to_string(),
            words: vec![
                word("Policy", 0, 6, 0.10),
                word("No.", 7, 10, 0.20),
                word("AB1234", 11, 17, 0.30),
            ],
        }],
    )
}

/// Holds every fetch until the test releases a permit
struct GatedSource {
    documents: HashMap<DocumentId, DocumentGeometry>,
    gate: Arc<Semaphore>,
    fetches: Arc<AtomicUsize>,
}

impl GatedSource {
    fn new(ids: &[&str]) -> (Self, Arc<Semaphore>, Arc<AtomicUsize>) {
        let gate = Arc::new(Semaphore::new(0));
        let fetches = Arc::new(AtomicUsize::new(0));
        let source = Self {
            documents: ids
                .iter()
                .map(|id| (DocumentId::new(*id), claim_geometry(id)))
                .collect(),
            gate: Arc::clone(&gate),
            fetches: Arc::clone(&fetches),
        };
        (source, gate, fetches)
    }
}

#[async_trait]
impl GeometrySource for GatedSource {
    async fn fetch(&self, document_id: &DocumentId) -> provenance_core::Result<DocumentGeometry> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ProvenanceError::geometry_unavailable(document_id, e))?;
        self.documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| ProvenanceError::geometry_unavailable(document_id, "unknown"))
    }
}

/// Records calls; ready after a number of checks; matches one phrase
#[derive(Default)]
struct RecordingRenderer {
    ready_after: usize,
    checks: AtomicUsize,
    calls: Mutex<Vec<String>>,
    matches: Option<&'static str>,
}

impl PdfSurface for RecordingRenderer {
    fn is_ready(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst) >= self.ready_after
    }

    fn go_to_page(&self, page: u32) {
        self.calls.lock().unwrap().push(format!("goToPage({page})"));
    }

    fn highlight_text(&self, text: &str) -> bool {
        self.calls.lock().unwrap().push(format!("highlightText({text})"));
        self.matches == Some(text)
    }
}

#[tokio::test]
async fn range_target_resolves_after_fetch() {
    let source = StaticGeometrySource::new().with_document(claim_geometry("claim-1"));
    let session = ReviewSession::new(source, &ProvenanceConfig::default());
    session.open_document(Some(DocumentId::new("claim-1"))).await;

    let pending = session
        .adopt(EvidenceTarget::on_page(2).with_range(7, 17))
        .await
        .unwrap();
    assert_eq!(pending.phase, HighlightPhase::PendingGeometry);

    let settled = session.settled().await;
    assert_eq!(settled.phase, HighlightPhase::Resolved);
    assert_eq!(settled.geometry, GeometryLoadState::Loaded);
    assert_eq!(settled.boxes.len(), 2);
    assert!((settled.boxes[0].x - 0.20).abs() < 1e-9);
    assert!((settled.boxes[1].x - 0.30).abs() < 1e-9);
}

#[tokio::test]
async fn newer_target_wins_over_in_flight_fetch() {
    init_tracing();
    let (source, gate, fetches) = GatedSource::new(&["claim-1"]);
    let session = ReviewSession::new(source, &ProvenanceConfig::default());
    session.open_document(Some(DocumentId::new("claim-1"))).await;

    session
        .adopt(EvidenceTarget::on_page(2).with_range(0, 6))
        .await
        .unwrap();
    tokio::task::yield_now().await;
    let b = session
        .adopt(EvidenceTarget::on_page(2).with_range(11, 17).with_value("AB1234"))
        .await
        .unwrap();
    assert_eq!(b.phase, HighlightPhase::PendingGeometry);

    gate.add_permits(1);
    let settled = session.settled().await;

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(settled.target.as_ref().unwrap().char_start, Some(11));
    assert_eq!(settled.boxes.len(), 1);
    assert!((settled.boxes[0].x - 0.30).abs() < 1e-9);
    assert_eq!(settled.revision, b.revision);
}

#[tokio::test]
async fn document_switch_discards_late_geometry() {
    init_tracing();
    let (source, gate, fetches) = GatedSource::new(&["claim-1", "claim-2"]);
    let session = ReviewSession::new(source, &ProvenanceConfig::default());
    let mut updates = session.subscribe();

    session.open_document(Some(DocumentId::new("claim-1"))).await;
    session
        .adopt(EvidenceTarget::on_page(2).with_range(7, 17))
        .await
        .unwrap();

    let switched = session.open_document(Some(DocumentId::new("claim-2"))).await;
    assert_eq!(switched.phase, HighlightPhase::Idle);
    assert!(switched.target.is_none());
    assert!(updates.has_changed().unwrap());

    // Both fetches may finish now; only claim-2's is applied
    session
        .adopt(EvidenceTarget::on_page(2).with_range(0, 6))
        .await
        .unwrap();
    gate.add_permits(2);
    let settled = session.settled().await;

    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    assert_eq!(settled.document_id, Some(DocumentId::new("claim-2")));
    assert_eq!(settled.phase, HighlightPhase::Resolved);
    assert_eq!(settled.boxes.len(), 1);
    assert_eq!(
        session.geometry().await.unwrap().document_id,
        DocumentId::new("claim-2")
    );
}

#[tokio::test(start_paused = true)]
async fn quote_only_target_navigates_and_searches() {
    let session = ReviewSession::new(StaticGeometrySource::new(), &ProvenanceConfig::default());
    session.open_document(Some(DocumentId::new("claim-1"))).await;

    let snapshot = session
        .adopt(EvidenceTarget::on_page(2).with_quote("claimant name"))
        .await
        .unwrap();
    assert_eq!(snapshot.phase, HighlightPhase::TextOnly);
    assert!(snapshot.boxes.is_empty());

    let renderer = RecordingRenderer {
        ready_after: 1,
        matches: Some("claimant name"),
        ..Default::default()
    };
    let outcome = session.navigate(&renderer).await;

    assert_eq!(outcome, Some(NavigationOutcome::Highlighted { page: 2 }));
    assert_eq!(
        *renderer.calls.lock().unwrap(),
        vec!["goToPage(2)".to_string(), "highlightText(claimant name)".to_string()]
    );
    // Quote-only targets never ask for geometry
    assert_eq!(session.current().await.geometry, GeometryLoadState::NotLoaded);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_still_navigates_with_text() {
    let session = ReviewSession::new(StaticGeometrySource::new(), &ProvenanceConfig::default());
    session.open_document(Some(DocumentId::new("missing"))).await;

    session
        .adopt(
            EvidenceTarget::on_page(2)
                .with_range(40, 53)
                .with_quote("claimant name"),
        )
        .await
        .unwrap();
    let settled = session.settled().await;
    assert_eq!(settled.phase, HighlightPhase::TextOnly);
    assert_eq!(settled.geometry, GeometryLoadState::Failed);
    assert_eq!(settled.degradation, Some(Degradation::GeometryUnavailable));

    let renderer = RecordingRenderer::default();
    let outcome = session.navigate(&renderer).await.unwrap();
    assert_eq!(outcome.degradation(), Some(Degradation::SearchTextNotFound));
    assert_eq!(renderer.calls.lock().unwrap()[0], "goToPage(2)");
}

#[tokio::test]
async fn navigate_without_target_does_nothing() {
    let session = ReviewSession::new(StaticGeometrySource::new(), &ProvenanceConfig::default());
    session.open_document(Some(DocumentId::new("claim-1"))).await;
    let renderer = RecordingRenderer::default();

    assert_eq!(session.navigate(&renderer).await, None);
    assert!(renderer.calls.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn adopting_new_target_supersedes_waiting_navigation() {
    let session = ReviewSession::new(StaticGeometrySource::new(), &ProvenanceConfig::default());
    session.open_document(Some(DocumentId::new("claim-1"))).await;
    session
        .adopt(EvidenceTarget::on_page(2).with_quote("old text"))
        .await
        .unwrap();

    // Ready on the fourth check, at t=300ms
    let renderer = RecordingRenderer {
        ready_after: 3,
        matches: Some("old text"),
        ..Default::default()
    };
    let (outcome, _) = tokio::join!(session.navigate(&renderer), async {
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        session
            .adopt(EvidenceTarget::on_page(7).with_quote("new text"))
            .await
            .unwrap()
    });

    assert_eq!(outcome, Some(NavigationOutcome::Superseded));
    assert!(renderer.calls.lock().unwrap().is_empty());
    assert_eq!(session.current().await.page(), Some(7));

    // The current target still navigates normally afterwards
    let outcome = session.navigate(&renderer).await;
    assert_eq!(
        outcome,
        Some(NavigationOutcome::Navigated {
            page: 7,
            degradation: Some(Degradation::SearchTextNotFound),
        })
    );
    assert_eq!(renderer.calls.lock().unwrap()[0], "goToPage(7)");
}

#[tokio::test(start_paused = true)]
async fn document_switch_supersedes_waiting_navigation() {
    let session = ReviewSession::new(StaticGeometrySource::new(), &ProvenanceConfig::default());
    session.open_document(Some(DocumentId::new("claim-1"))).await;
    session
        .adopt(EvidenceTarget::on_page(3).with_value("AB1234"))
        .await
        .unwrap();

    let renderer = RecordingRenderer {
        ready_after: 3,
        ..Default::default()
    };
    let (outcome, switched) = tokio::join!(session.navigate(&renderer), async {
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        session.open_document(Some(DocumentId::new("claim-2"))).await
    });

    assert_eq!(switched.phase, HighlightPhase::Idle);
    assert_eq!(outcome, Some(NavigationOutcome::Superseded));
    assert!(renderer.calls.lock().unwrap().is_empty());
}
