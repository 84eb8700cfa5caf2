//! Qdrant backend for the vector index contract.

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, PointStruct, ScoredPoint,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};

use crate::error::VectorStoreError;
use crate::store::{BoxFuture, VectorIndex};
use crate::types::{RecordMetadata, SearchMatch, VectorRecord};

/// Qdrant-backed index. Record ids are strings with embedded path segments,
/// so points are keyed by a name-based UUID derived from the record id; the
/// original id travels in the payload.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
}

impl std::fmt::Debug for QdrantIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantIndex")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

fn classify_backend_error(context: &str, detail: &str) -> VectorStoreError {
    let message = format!("{context}: {detail}");
    if message.contains("Not found") || message.contains("doesn't exist") {
        VectorStoreError::IndexNotFound(message)
    } else {
        VectorStoreError::Operation {
            status: None,
            message,
        }
    }
}

fn map_qdrant_err(context: &str, e: &qdrant_client::QdrantError) -> VectorStoreError {
    classify_backend_error(context, &e.to_string())
}

fn point_uuid(record_id: &str) -> String {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, record_id.as_bytes()).to_string()
}

impl QdrantIndex {
    /// Connect to a Qdrant instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be constructed from the URL.
    pub fn new(url: &str, collection: impl Into<String>) -> Result<Self, VectorStoreError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| map_qdrant_err("failed to create Qdrant client", &e))?;
        Ok(Self {
            client,
            collection: collection.into(),
        })
    }

    /// Ensure the collection exists with the given vector size.
    ///
    /// Idempotent: no-op if the collection already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if Qdrant cannot be reached or creation fails.
    pub async fn ensure_collection(&self, vector_size: u64) -> Result<(), VectorStoreError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| map_qdrant_err("collection_exists failed", &e))?;
        if exists {
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
            )
            .await
            .map_err(|e| map_qdrant_err("failed to create collection", &e))?;

        Ok(())
    }
}

impl VectorIndex for QdrantIndex {
    fn upsert(&self, records: Vec<VectorRecord>) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async move {
            let mut points = Vec::with_capacity(records.len());
            for record in records {
                let payload: std::collections::HashMap<String, qdrant_client::qdrant::Value> =
                    serde_json::from_value(serde_json::json!({
                        "id": record.id,
                        "project_id": record.metadata.project_id,
                        "path": record.metadata.path,
                        "chunk_index": record.metadata.chunk_index,
                        "hash": record.metadata.hash,
                        "text": record.metadata.text,
                    }))
                    .map_err(|e| VectorStoreError::Unknown(format!("payload encode: {e}")))?;

                points.push(PointStruct::new(
                    point_uuid(&record.id),
                    record.values,
                    payload,
                ));
            }

            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, points))
                .await
                .map_err(|e| map_qdrant_err("upsert failed", &e))?;
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
            let limit = top_k as u64;
            let mut builder =
                SearchPointsBuilder::new(&self.collection, vector, limit).with_payload(true);

            if let Some(project_id) = project_filter {
                builder = builder.filter(Filter::must(vec![Condition::matches(
                    "project_id",
                    project_id,
                )]));
            }

            let results = self
                .client
                .search_points(builder)
                .await
                .map_err(|e| map_qdrant_err("search failed", &e))?;

            Ok(results
                .result
                .iter()
                .filter_map(match_from_scored_point)
                .collect())
        })
    }
}

fn match_from_scored_point(point: &ScoredPoint) -> Option<SearchMatch> {
    let p = &point.payload;
    let get_str = |key: &str| {
        p.get(key)
            .and_then(qdrant_client::qdrant::Value::as_str)
            .cloned()
    };
    let chunk_index = p
        .get("chunk_index")
        .and_then(qdrant_client::qdrant::Value::as_integer)
        .and_then(|v| usize::try_from(v).ok())?;

    Some(SearchMatch {
        id: get_str("id")?,
        score: point.score,
        metadata: RecordMetadata {
            project_id: get_str("project_id")?,
            path: get_str("path")?,
            chunk_index,
            hash: get_str("hash")?,
            text: get_str("text").unwrap_or_default(),
        },
    })
}
