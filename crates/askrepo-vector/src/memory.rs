//! In-memory reference backend with cosine similarity.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::VectorStoreError;
use crate::store::{BoxFuture, VectorIndex};
use crate::types::{RecordMetadata, SearchMatch, VectorRecord};

struct StoredRecord {
    values: Vec<f32>,
    metadata: RecordMetadata,
}

/// Process-local vector index. Primary role is a test and reference backend;
/// upserts are keyed by record id so re-ingestion overwrites in place.
pub struct InMemoryIndex {
    records: RwLock<HashMap<String, StoredRecord>>,
}

impl InMemoryIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Total records currently held, across all projects.
    ///
    /// # Panics
    ///
    /// Panics if the inner lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().expect("index lock poisoned").len()
    }

    /// # Panics
    ///
    /// Panics if the inner lock is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().expect("index lock poisoned").is_empty()
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndex").finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorIndex for InMemoryIndex {
    fn upsert(&self, records: Vec<VectorRecord>) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async move {
            let mut map = self
                .records
                .write()
                .map_err(|e| VectorStoreError::Unknown(e.to_string()))?;
            for record in records {
                map.insert(
                    record.id,
                    StoredRecord {
                        values: record.values,
                        metadata: record.metadata,
                    },
                );
            }
            Ok(())
        })
    }

    fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        project_filter: Option<String>,
    ) -> BoxFuture<'_, Result<Vec<SearchMatch>, VectorStoreError>> {
        Box::pin(async move {
            let map = self
                .records
                .read()
                .map_err(|e| VectorStoreError::Unknown(e.to_string()))?;

            let mut matches: Vec<SearchMatch> = map
                .iter()
                .filter(|(_, stored)| {
                    project_filter
                        .as_deref()
                        .is_none_or(|p| stored.metadata.project_id == p)
                })
                .map(|(id, stored)| SearchMatch {
                    id: id.clone(),
                    score: cosine_similarity(&vector, &stored.values),
                    metadata: stored.metadata.clone(),
                })
                .collect();

            matches.sort_by(|a, b| b.score.total_cmp(&a.score));
            matches.truncate(top_k);
            Ok(matches)
        })
    }
}
