//! Where recognition geometry comes from

use crate::error::{ProvenanceError, Result};
use crate::layout::parse_layout;
use async_trait::async_trait;
use shared_types::{DocumentGeometry, DocumentId};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Read-only access to recognition output, keyed by document
#[async_trait]
pub trait GeometrySource: Send + Sync {
    async fn fetch(&self, document_id: &DocumentId) -> Result<DocumentGeometry>;
}

/// In-memory geometry, mostly for tests and fixtures
#[derive(Debug, Default, Clone)]
pub struct StaticGeometrySource {
    documents: HashMap<DocumentId, DocumentGeometry>,
}

impl StaticGeometrySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, geometry: DocumentGeometry) -> Self {
        self.documents.insert(geometry.document_id.clone(), geometry);
        self
    }
}

#[async_trait]
impl GeometrySource for StaticGeometrySource {
    async fn fetch(&self, document_id: &DocumentId) -> Result<DocumentGeometry> {
        self.documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| ProvenanceError::geometry_unavailable(document_id, "no layout stored"))
    }
}

/// Layout JSON files named `<document_id>.json` in one directory
#[derive(Debug, Clone)]
pub struct LayoutDirSource {
    dir: PathBuf,
}

impl LayoutDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, document_id: &DocumentId) -> PathBuf {
        self.dir.join(format!("{}.json", document_id))
    }
}

#[async_trait]
impl GeometrySource for LayoutDirSource {
    #[instrument(skip_all, fields(document_id = %document_id))]
    async fn fetch(&self, document_id: &DocumentId) -> Result<DocumentGeometry> {
        // Ids come from the review backend; refuse anything that would leave the directory
        if document_id.as_str().contains(['/', '\\']) || document_id.as_str().starts_with('.') {
            return Err(ProvenanceError::geometry_unavailable(
                document_id,
                "document id is not a plain file name",
            ));
        }
        let path = self.path_for(document_id);
        debug!(path = %path.display(), "Reading layout");
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ProvenanceError::geometry_unavailable(document_id, e))?;
        parse_layout(document_id.clone(), &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::RecognizedPage;

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticGeometrySource::new().with_document(DocumentGeometry::new(
            DocumentId::new("claim-1"),
            vec![RecognizedPage {
                page_number: 1,
                full_text: "Claim".to_string(),
                words: vec![],
            }],
        ));

        let geometry = source.fetch(&DocumentId::new("claim-1")).await.unwrap();
        assert_eq!(geometry.page_count(), 1);

        let missing = source.fetch(&DocumentId::new("claim-2")).await.unwrap_err();
        assert!(matches!(missing, ProvenanceError::GeometryUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_layout_dir_source_reads_file() {
        let dir = std::env::temp_dir().join(format!("provenance-layouts-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(
            dir.join("claim-9.json"),
            r#"{"pages": [{"page_number": 1, "full_text": "Total", "words": []}]}"#,
        )
        .await
        .unwrap();

        let source = LayoutDirSource::new(&dir);
        let geometry = source.fetch(&DocumentId::new("claim-9")).await.unwrap();
        assert_eq!(geometry.page(1).unwrap().full_text, "Total");
        assert_eq!(geometry.document_id, DocumentId::new("claim-9"));

        let missing = source.fetch(&DocumentId::new("absent")).await.unwrap_err();
        assert!(matches!(missing, ProvenanceError::GeometryUnavailable { .. }));

        let escape = source.fetch(&DocumentId::new("../etc/passwd")).await.unwrap_err();
        assert!(matches!(escape, ProvenanceError::GeometryUnavailable { .. }));

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
