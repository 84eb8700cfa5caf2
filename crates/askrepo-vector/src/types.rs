use serde::{Deserialize, Serialize};

/// Metadata stored alongside every vector; the schema is fixed so the project
/// filter can be pushed down into the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub project_id: String,
    pub path: String,
    pub chunk_index: usize,
    pub hash: String,
    /// Truncated chunk excerpt, bounded at ingestion time.
    pub text: String,
}

/// The persisted unit: deterministic id, embedding values, typed metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// One nearest-neighbor hit with its original metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub id: String,
    pub score: f32,
    pub metadata: RecordMetadata,
}
