//! Namespaced vector index: data contract, backends, and the resilient
//! batched client in front of them.
//!
//! [`store::VectorIndex`] is the backend contract ([`memory::InMemoryIndex`]
//! for tests, [`qdrant::QdrantIndex`] for production); [`client::VectorClient`]
//! adds validation, batch splitting, and the rate-limit/circuit-break/retry/
//! timeout composition every remote call goes through.

pub mod client;
pub mod error;
pub mod memory;
pub mod qdrant;
pub mod store;
pub mod types;

pub use client::{VectorClient, VectorClientConfig};
pub use error::VectorStoreError;
pub use store::VectorIndex;
pub use types::{RecordMetadata, SearchMatch, VectorRecord};
