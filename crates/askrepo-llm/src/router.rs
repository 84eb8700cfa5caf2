//! Ordered fallback over a list of providers.

use crate::error::LlmError;
use crate::provider::LlmProvider;

/// Tries each provider in order until one succeeds.
///
/// Used for model fallback at answer time: the providers differ only by model
/// identifier, in a fixed preference order.
#[derive(Debug, Clone)]
pub struct FallbackProvider<P> {
    providers: Vec<P>,
}

impl<P: LlmProvider> FallbackProvider<P> {
    #[must_use]
    pub fn new(providers: Vec<P>) -> Self {
        Self { providers }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl<P: LlmProvider> LlmProvider for FallbackProvider<P> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let mut last = LlmError::NoProviders;
        for p in &self.providers {
            match p.embed(text).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    tracing::warn!(provider = p.name(), error = %e, "fallback: embed failed");
                    last = e;
                }
            }
        }
        Err(last)
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let mut last = LlmError::NoProviders;
        for p in &self.providers {
            match p.generate(prompt, max_tokens).await {
                Ok(r) => return Ok(r),
                Err(e) => {
                    tracing::warn!(provider = p.name(), error = %e, "fallback: generate failed");
                    last = e;
                }
            }
        }
        Err(last)
    }

    fn embedding_dim(&self) -> usize {
        self.providers
            .first()
            .map_or(0, LlmProvider::embedding_dim)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "fallback"
    }
}
