use std::future::Future;
use std::pin::Pin;

use crate::error::VectorStoreError;
use crate::types::{SearchMatch, VectorRecord};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Backend contract for a namespaced vector index.
///
/// Implementations own persistence and similarity search. The `project_filter`
/// must be enforced inside the backend, never by post-filtering results on the
/// client side; it is the sole multi-tenancy boundary.
pub trait VectorIndex: Send + Sync {
    /// Insert-or-update records keyed by their ids.
    fn upsert(&self, records: Vec<VectorRecord>) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    /// Return up to `top_k` nearest records, optionally restricted to one
    /// project's records.
    fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        project_filter: Option<String>,
    ) -> BoxFuture<'_, Result<Vec<SearchMatch>, VectorStoreError>>;
}
