//! Vertex-style Gemini provider for embeddings and text generation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::LlmProvider;
use crate::retry::send_with_retry;

const DEFAULT_BASE_URL: &str = "https://us-central1-aiplatform.googleapis.com/v1";
const MAX_RETRIES: u32 = 2;

#[derive(Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: String,
    embedding_dim: usize,
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dim", &self.embedding_dim)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    #[must_use]
    pub fn new(
        api_key: String,
        model: String,
        embedding_model: String,
        embedding_dim: usize,
    ) -> Self {
        Self {
            client: crate::http::default_client(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_owned(),
            model,
            embedding_model,
            embedding_dim,
        }
    }

    /// Override the API base URL. Intended for tests and self-hosted gateways.
    #[must_use]
    pub fn with_base_url(mut self, mut base_url: String) -> Self {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn require_key(&self) -> Result<(), LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::MissingApiKey { provider: "gemini" });
        }
        Ok(())
    }

    fn model_url(&self, model: &str, verb: &str) -> String {
        format!("{}/publishers/google/models/{model}:{verb}", self.base_url)
    }

    async fn post_json<B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::Response, LlmError> {
        send_with_retry("gemini", MAX_RETRIES, || {
            self.client
                .post(url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(body)
                .send()
        })
        .await
    }
}

#[derive(Serialize)]
struct Instance<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    instances: Vec<Instance<'a>>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    predictions: Vec<EmbedPrediction>,
    #[serde(default)]
    embeddings: Vec<EmbedPrediction>,
}

#[derive(Deserialize)]
struct EmbedPrediction {
    embedding: Option<Vec<f32>>,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: Vec<Instance<'a>>,
    parameters: PredictParameters,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
struct Prediction {
    content: Option<String>,
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: String,
}

impl LlmProvider for GeminiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.require_key()?;

        let url = self.model_url(&self.embedding_model, "embedText");
        let body = EmbedRequest {
            instances: vec![Instance { content: text }],
        };

        let response = self.post_json(&url, &body).await?;
        let status = response.status();
        let text_body = response.text().await.map_err(LlmError::Http)?;

        if !status.is_success() {
            tracing::error!("Gemini embed error {status}: {text_body}");
            return Err(LlmError::Other(format!(
                "Gemini embed request failed (status {status})"
            )));
        }

        let resp: EmbedResponse = serde_json::from_str(&text_body)?;
        resp.predictions
            .into_iter()
            .chain(resp.embeddings)
            .find_map(|p| p.embedding)
            .ok_or(LlmError::EmptyResponse { provider: "gemini" })
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        self.require_key()?;

        let url = self.model_url(&self.model, "predict");
        let body = PredictRequest {
            instances: vec![Instance { content: prompt }],
            parameters: PredictParameters {
                max_output_tokens: max_tokens,
            },
        };

        let response = self.post_json(&url, &body).await?;
        let status = response.status();
        let text_body = response.text().await.map_err(LlmError::Http)?;

        if !status.is_success() {
            tracing::error!("Gemini generate error {status}: {text_body}");
            return Err(LlmError::Other(format!(
                "Gemini generate request failed (status {status})"
            )));
        }

        let resp: PredictResponse = serde_json::from_str(&text_body)?;
        resp.predictions
            .into_iter()
            .find_map(|p| {
                p.content
                    .or_else(|| p.candidates.into_iter().next().map(|c| c.content))
            })
            .filter(|s| !s.is_empty())
            .ok_or(LlmError::EmptyResponse { provider: "gemini" })
    }

    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "gemini"
    }
}
