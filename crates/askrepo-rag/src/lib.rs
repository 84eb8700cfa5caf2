//! Retrieval-augmented pipeline over a repository's source text.
//!
//! [`chunker`] windows file content, [`ingest`] turns files into embedded
//! vector records with deterministic ids, and [`qa`] answers questions
//! grounded in the retrieved chunks.

pub mod chunker;
pub mod error;
pub mod ingest;
pub mod qa;

pub use chunker::{ChunkConfig, chunk_text};
pub use error::{RagError, Result};
pub use ingest::{CancelFlag, IngestConfig, IngestReport, Ingestor};
pub use qa::{Answer, AnswerConfig, AnswerEngine, Citation};
