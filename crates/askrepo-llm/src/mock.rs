//! Test-only mock provider.

use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::LlmProvider;

#[derive(Debug, Clone)]
pub struct MockProvider {
    pub embedding: Vec<f32>,
    pub response: String,
    pub fail_embed: bool,
    pub fail_generate: bool,
    /// Fail `embed` only for texts containing this substring.
    pub fail_embed_containing: Option<String>,
    embed_calls: Arc<Mutex<Vec<String>>>,
    generate_calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            embedding: vec![0.1; 4],
            response: "mock response".into(),
            fail_embed: false,
            fail_generate: false,
            fail_embed_containing: None,
            embed_calls: Arc::new(Mutex::new(Vec::new())),
            generate_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_response(response: &str) -> Self {
        Self {
            response: response.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embedding(embedding: Vec<f32>) -> Self {
        Self {
            embedding,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_embed: true,
            fail_generate: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_embeds_containing(substring: &str) -> Self {
        Self {
            fail_embed_containing: Some(substring.into()),
            ..Self::default()
        }
    }

    /// Texts passed to `embed`, in call order.
    #[must_use]
    pub fn embed_calls(&self) -> Vec<String> {
        self.embed_calls.lock().unwrap().clone()
    }

    /// Prompts passed to `generate`, in call order.
    #[must_use]
    pub fn generate_calls(&self) -> Vec<String> {
        self.generate_calls.lock().unwrap().clone()
    }
}

impl LlmProvider for MockProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed_calls.lock().unwrap().push(text.to_owned());
        if self.fail_embed {
            return Err(LlmError::Other("mock embed error".into()));
        }
        if let Some(ref needle) = self.fail_embed_containing
            && text.contains(needle.as_str())
        {
            return Err(LlmError::Other("mock embed error".into()));
        }
        Ok(self.embedding.clone())
    }

    async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        self.generate_calls.lock().unwrap().push(prompt.to_owned());
        if self.fail_generate {
            return Err(LlmError::Other("mock generate error".into()));
        }
        Ok(self.response.clone())
    }

    fn embedding_dim(&self) -> usize {
        self.embedding.len()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}
