use serde::{Deserialize, Serialize};
use shared_types::TargetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvenanceError {
    #[error("Geometry unavailable for document {document_id}: {reason}")]
    GeometryUnavailable { document_id: String, reason: String },

    #[error("Invalid layout payload: {0}")]
    InvalidLayout(String),

    #[error("Invalid evidence target: {0}")]
    InvalidTarget(#[from] TargetError),

    #[error("No document is open")]
    NoActiveDocument,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProvenanceError {
    pub fn geometry_unavailable(document_id: impl ToString, reason: impl ToString) -> Self {
        Self::GeometryUnavailable {
            document_id: document_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvenanceError>;

/// A less precise highlight than requested. Informational only: every
/// degradation still leaves the reviewer with a usable view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    /// Geometry fetch failed, or the page has no recognized words
    GeometryUnavailable,
    /// Geometry is present but no word intersects the range
    NoOverlap,
    /// The renderer never became ready within the retry budget
    RendererNotReady,
    /// The renderer's text layer has no match for the search text
    SearchTextNotFound,
}
