//! Embedding and text-generation provider abstraction.
//!
//! Providers implement [`provider::LlmProvider`]; [`embedding::EmbeddingClient`]
//! adds batch semantics with per-item degradation, and [`router::FallbackProvider`]
//! tries an ordered list of models until one succeeds.

pub mod embedding;
pub mod error;
pub mod gemini;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod provider;
mod retry;
pub mod router;

pub use error::{LlmError, Result};
pub use provider::LlmProvider;
