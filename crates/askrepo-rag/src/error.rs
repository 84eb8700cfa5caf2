use askrepo_llm::LlmError;
use askrepo_vector::VectorStoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("invalid chunking configuration: {0}")]
    ChunkConfig(String),

    #[error("embedding failed: {0}")]
    Embedding(#[source] LlmError),

    #[error("all generation models failed: {0}")]
    Generation(#[source] LlmError),

    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),
}
