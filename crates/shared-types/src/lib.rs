//! Shared data model for evidence provenance
//!
//! Recognized text and word geometry as produced by the OCR/Document
//! Intelligence step, the evidence targets that point into it, and the
//! normalized boxes derived from both.

pub mod geometry;
pub mod types;

pub use geometry::{BoundingBox, DocumentGeometry, RecognizedPage, RecognizedWord};
pub use types::{CharRange, DocumentId, EvidenceTarget, TargetError};
