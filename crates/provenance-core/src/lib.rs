//! Evidence provenance resolution
//!
//! Maps an extracted field's evidence (a character range and/or literal quote
//! on a page) to word rectangles from OCR/Document Intelligence output, and
//! keeps one consistent highlight across the text, PDF and image surfaces
//! while geometry and the PDF renderer load on their own schedules.
//!
//! The state machines ([`HighlightCoordinator`], [`ProvenanceStore`],
//! [`NavigationTask`]) are sans-IO and run anywhere, including the browser.
//! The `server` feature adds a tokio-driven [`session::ReviewSession`] and
//! file-backed geometry sources.

pub mod config;
pub mod coordinator;
pub mod coords;
pub mod error;
pub mod layout;
pub mod navigation;
pub mod resolver;
pub mod store;
pub mod tabs;
pub mod text_model;

#[cfg(feature = "server")]
pub mod session;
#[cfg(feature = "server")]
pub mod source;

pub use config::{GeometryConfig, NavigationConfig, ProvenanceConfig, ViewerConfig};
pub use coordinator::{HighlightCoordinator, HighlightPhase, HighlightSnapshot};
pub use error::{Degradation, ProvenanceError, Result};
pub use layout::parse_layout;
pub use navigation::{NavigationOutcome, NavigationStep, NavigationTask, PdfNavigationBridge, PdfSurface};
pub use resolver::resolve;
pub use store::{FetchTicket, GeometryLoadState, ProvenanceStore, StoreLookup};
pub use tabs::{default_tab, SourceSet, SurfaceDirective, ViewerTab, ViewerTabController};
pub use text_model::PageTextModel;

pub use shared_types::{
    BoundingBox, CharRange, DocumentGeometry, DocumentId, EvidenceTarget, RecognizedPage,
    RecognizedWord,
};
