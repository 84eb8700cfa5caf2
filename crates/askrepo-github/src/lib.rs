//! GitHub source retrieval for askrepo.
//!
//! [`GithubFetcher`] resolves a repository's default branch, walks its tree,
//! and downloads text content for every path surviving the shared
//! [`IgnorePolicy`] and a per-file size guard. The same policy instance is
//! reused at ingestion time so fetch-side and ingest-side filtering cannot
//! drift apart.

pub mod error;
pub mod fetcher;
pub mod filter;

pub use error::{GithubError, Result};
pub use fetcher::{FetchConfig, GithubFetcher, RepoFile};
pub use filter::IgnorePolicy;
