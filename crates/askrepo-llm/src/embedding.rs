//! Batch embedding with per-item degradation.

use std::sync::Arc;

use crate::error::LlmError;
use crate::provider::LlmProvider;

/// Embeds batches of texts, one provider call per item.
///
/// A failed item degrades to a zero vector of the provider's dimensionality
/// instead of failing the whole batch; the degradation is logged so silent
/// quality loss stays observable. Both the ingestion path (many chunks) and
/// the answer path (a single question) go through this client.
#[derive(Debug, Clone)]
pub struct EmbeddingClient<P> {
    provider: Arc<P>,
}

impl<P: LlmProvider> EmbeddingClient<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Embed every text in `texts`, preserving order.
    ///
    /// An empty input returns an empty batch without calling the provider.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::EmbeddingFailed` when a non-empty batch produces no
    /// real embedding at all, or the provider's error for non-degradable
    /// failures surfaced before any call is made.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut slots: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        for (index, text) in texts.iter().enumerate() {
            match self.provider.embed(text).await {
                Ok(vector) => slots.push(Some(vector)),
                Err(e) => {
                    tracing::warn!(index, error = %e, "embedding degraded to zero vector");
                    slots.push(None);
                }
            }
        }

        let dim = slots
            .iter()
            .find_map(|s| s.as_ref().map(Vec::len))
            .ok_or(LlmError::EmbeddingFailed)?;

        Ok(slots
            .into_iter()
            .map(|s| s.unwrap_or_else(|| vec![0.0; dim]))
            .collect())
    }

    /// Embed a single question; no degradation, failure is the caller's to handle.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.provider.embed(text).await
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::mock::MockProvider;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[tokio::test]
    async fn empty_batch_makes_no_provider_call() {
        let provider = Arc::new(MockProvider::default());
        let client = EmbeddingClient::new(Arc::clone(&provider));
        let out = client.embed_batch(&[]).await.unwrap();
        assert!(out.is_empty());
        assert!(provider.embed_calls().is_empty());
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let provider = Arc::new(MockProvider::with_embedding(vec![1.0, 2.0]));
        let client = EmbeddingClient::new(Arc::clone(&provider));
        let out = client.embed_batch(&texts(&["a", "b", "c"])).await.unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(provider.embed_calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn failed_item_degrades_to_zero_vector() {
        let provider = Arc::new(MockProvider::failing_embeds_containing("bad"));
        let client = EmbeddingClient::new(Arc::clone(&provider));

        let out = client
            .embed_batch(&texts(&["good one", "bad one", "another good"]))
            .await
            .unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out[1], vec![0.0; 4]);
        assert_ne!(out[0], vec![0.0; 4]);
        assert_ne!(out[2], vec![0.0; 4]);
    }

    #[tokio::test]
    async fn all_items_failing_is_hard_failure() {
        let provider = Arc::new(MockProvider::failing());
        let client = EmbeddingClient::new(provider);
        let result = client.embed_batch(&texts(&["a", "b"])).await;
        assert!(matches!(result, Err(LlmError::EmbeddingFailed)));
    }

    #[tokio::test]
    async fn embed_one_propagates_failure() {
        let provider = Arc::new(MockProvider::failing());
        let client = EmbeddingClient::new(provider);
        assert!(client.embed_one("question").await.is_err());
    }
}
