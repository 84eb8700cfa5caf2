#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited")]
    RateLimited,

    #[error("API key is not configured for {provider}")]
    MissingApiKey { provider: &'static str },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("no embeddings produced for a non-empty batch")]
    EmbeddingFailed,

    #[error("no providers available")]
    NoProviders,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
