//! Repository ingestion: files to embedded, deterministically-keyed vector
//! records.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use askrepo_github::{IgnorePolicy, RepoFile};
use askrepo_llm::LlmProvider;
use askrepo_llm::embedding::EmbeddingClient;
use askrepo_vector::{RecordMetadata, VectorClient, VectorIndex, VectorRecord};

use crate::chunker::{ChunkConfig, chunk_text};
use crate::error::{RagError, Result};

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub chunk: ChunkConfig,
    /// Files larger than this are skipped outright.
    pub max_file_bytes: usize,
    /// Chunks shorter than this carry too little signal to embed.
    pub min_chunk_bytes: usize,
    /// Metadata excerpt length, bounding per-record storage.
    pub excerpt_chars: usize,
    /// Buffered records are flushed to the store at this count.
    pub flush_threshold: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk: ChunkConfig::default(),
            max_file_bytes: 200_000,
            min_chunk_bytes: 50,
            excerpt_chars: 500,
            flush_threshold: 100,
        }
    }
}

/// Outcome counters for one ingestion run.
///
/// `processed_files` counts files that contributed at least one chunk;
/// filtered, empty, oversized, and all-short files land in `skipped_files`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub processed_files: usize,
    pub skipped_files: usize,
    pub chunks_upserted: usize,
}

/// External cancellation signal, checked between files.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

/// Orchestrates chunk, embed, and upsert for a batch of repository files.
pub struct Ingestor<P, S> {
    embedder: EmbeddingClient<P>,
    store: Arc<VectorClient<S>>,
    policy: IgnorePolicy,
    config: IngestConfig,
}

impl<P: LlmProvider, S: VectorIndex> Ingestor<P, S> {
    #[must_use]
    pub fn new(
        embedder: EmbeddingClient<P>,
        store: Arc<VectorClient<S>>,
        policy: IgnorePolicy,
        config: IngestConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            policy,
            config,
        }
    }

    /// Ingest `files` under `project_id`.
    ///
    /// Record ids are derived from project, path, chunk index, and a content
    /// hash, so re-ingesting unchanged content re-upserts the same ids.
    /// Cancellation stops before the next file; records buffered so far are
    /// still flushed.
    ///
    /// # Errors
    ///
    /// The first unrecovered embedding or upsert failure aborts the run.
    pub async fn ingest(
        &self,
        files: &[RepoFile],
        project_id: &str,
        cancel: &CancelFlag,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut buffer: Vec<VectorRecord> = Vec::new();

        for file in files {
            if cancel.is_cancelled() {
                tracing::info!(project_id, "ingestion cancelled, flushing buffered records");
                break;
            }

            if self.policy.should_ignore(&file.path)
                || file.content.trim().is_empty()
                || file.content.len() > self.config.max_file_bytes
            {
                report.skipped_files += 1;
                continue;
            }

            let chunks: Vec<String> = chunk_text(&file.content, &self.config.chunk)?
                .into_iter()
                .filter(|c| c.len() >= self.config.min_chunk_bytes)
                .collect();
            if chunks.is_empty() {
                report.skipped_files += 1;
                continue;
            }

            let embeddings = self
                .embedder
                .embed_batch(&chunks)
                .await
                .map_err(RagError::Embedding)?;

            for (index, (chunk, values)) in chunks.iter().zip(embeddings).enumerate() {
                buffer.push(self.record(project_id, &file.path, index, chunk, values));
                if buffer.len() >= self.config.flush_threshold {
                    report.chunks_upserted += buffer.len();
                    self.store.upsert(std::mem::take(&mut buffer)).await?;
                }
            }

            report.processed_files += 1;
            tracing::debug!(path = %file.path, chunks = chunks.len(), "file ingested");
        }

        if !buffer.is_empty() {
            report.chunks_upserted += buffer.len();
            self.store.upsert(buffer).await?;
        }
        tracing::info!(
            project_id,
            processed = report.processed_files,
            skipped = report.skipped_files,
            chunks = report.chunks_upserted,
            "ingestion finished"
        );
        Ok(report)
    }

    fn record(
        &self,
        project_id: &str,
        path: &str,
        index: usize,
        chunk: &str,
        values: Vec<f32>,
    ) -> VectorRecord {
        let hash = chunk_hash(chunk);
        VectorRecord {
            id: format!("{project_id}--{path}--{index}--{hash}"),
            values,
            metadata: RecordMetadata {
                project_id: project_id.to_owned(),
                path: path.to_owned(),
                chunk_index: index,
                hash,
                text: chunk.chars().take(self.config.excerpt_chars).collect(),
            },
        }
    }
}

/// Short deterministic content digest used in record ids.
fn chunk_hash(chunk: &str) -> String {
    blake3::hash(chunk.as_bytes()).to_hex()[..12].to_owned()
}

#[cfg(test)]
mod tests {
    use askrepo_llm::mock::MockProvider;
    use askrepo_vector::VectorClientConfig;
    use askrepo_vector::memory::InMemoryIndex;

    use super::*;

    fn ingestor(
        provider: MockProvider,
        index: Arc<InMemoryIndex>,
        config: IngestConfig,
    ) -> Ingestor<MockProvider, InMemoryIndex> {
        let store = Arc::new(VectorClient::new(index, VectorClientConfig {
            batch_delay: std::time::Duration::from_millis(1),
            ..VectorClientConfig::default()
        }));
        Ingestor::new(
            EmbeddingClient::new(Arc::new(provider)),
            store,
            IgnorePolicy::default(),
            config,
        )
    }

    fn small_chunks() -> IngestConfig {
        IngestConfig {
            chunk: ChunkConfig {
                size: 100,
                overlap: 20,
            },
            min_chunk_bytes: 10,
            ..IngestConfig::default()
        }
    }

    fn file(path: &str, content: &str) -> RepoFile {
        RepoFile {
            path: path.to_owned(),
            content: content.to_owned(),
        }
    }

    #[tokio::test]
    async fn ingests_files_and_skips_filtered_ones() {
        let index = Arc::new(InMemoryIndex::default());
        let ing = ingestor(MockProvider::default(), Arc::clone(&index), small_chunks());

        let files = vec![
            file("src/lib.rs", &"fn lib() {}\n".repeat(20)),
            file("yarn.lock", "lockfile contents that are long enough"),
            file("empty.rs", "   \n"),
        ];
        let report = ing
            .ingest(&files, "proj-1", &CancelFlag::default())
            .await
            .unwrap();

        assert_eq!(report.processed_files, 1);
        assert_eq!(report.skipped_files, 2);
        assert_eq!(report.chunks_upserted, index.len());
        assert!(index.len() > 0);
    }

    #[tokio::test]
    async fn oversized_files_are_skipped() {
        let index = Arc::new(InMemoryIndex::default());
        let mut config = small_chunks();
        config.max_file_bytes = 50;
        let ing = ingestor(MockProvider::default(), Arc::clone(&index), config);

        let files = vec![file("big.rs", &"x".repeat(60))];
        let report = ing
            .ingest(&files, "proj-1", &CancelFlag::default())
            .await
            .unwrap();

        assert_eq!(report.skipped_files, 1);
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn small_text_file_processed_and_binary_sized_file_skipped() {
        let index = Arc::new(InMemoryIndex::default());
        let ing = ingestor(MockProvider::default(), Arc::clone(&index), small_chunks());

        let files = vec![
            file("notes.txt", "fifty bytes of plain text content for this test"),
            file("blob.dat", &"b".repeat(250_000)),
        ];
        let report = ing
            .ingest(&files, "proj-1", &CancelFlag::default())
            .await
            .unwrap();

        assert_eq!(report.processed_files, 1);
        assert_eq!(report.skipped_files, 1);
    }

    #[tokio::test]
    async fn short_chunks_are_not_embedded() {
        let index = Arc::new(InMemoryIndex::default());
        let provider = MockProvider::default();
        let ing = ingestor(provider.clone(), Arc::clone(&index), small_chunks());

        // Nine bytes, below the 10-byte chunk floor.
        let files = vec![file("tiny.rs", "fn a() {}")];
        let report = ing
            .ingest(&files, "proj-1", &CancelFlag::default())
            .await
            .unwrap();

        assert_eq!(report.processed_files, 0);
        assert_eq!(report.skipped_files, 1);
        assert!(provider.embed_calls().is_empty());
    }

    #[tokio::test]
    async fn reingesting_unchanged_content_reuses_ids() {
        let index = Arc::new(InMemoryIndex::default());
        let ing = ingestor(MockProvider::default(), Arc::clone(&index), small_chunks());
        let files = vec![file("src/lib.rs", &"fn lib() {}\n".repeat(30))];
        let cancel = CancelFlag::default();

        ing.ingest(&files, "proj-1", &cancel).await.unwrap();
        let after_first = index.len();
        ing.ingest(&files, "proj-1", &cancel).await.unwrap();

        assert_eq!(index.len(), after_first);
    }

    #[tokio::test]
    async fn changed_content_gets_new_ids() {
        let index = Arc::new(InMemoryIndex::default());
        let ing = ingestor(MockProvider::default(), Arc::clone(&index), small_chunks());
        let cancel = CancelFlag::default();

        ing.ingest(&[file("a.rs", &"fn one() {}\n".repeat(10))], "p", &cancel)
            .await
            .unwrap();
        let before = index.len();
        ing.ingest(&[file("a.rs", &"fn two() {}\n".repeat(10))], "p", &cancel)
            .await
            .unwrap();

        // Old ids stay behind, new content upserts under fresh ids.
        assert!(index.len() > before);
    }

    #[tokio::test]
    async fn embedding_failure_aborts_the_run() {
        let index = Arc::new(InMemoryIndex::default());
        let ing = ingestor(MockProvider::failing(), Arc::clone(&index), small_chunks());

        let files = vec![file("src/lib.rs", &"fn lib() {}\n".repeat(20))];
        let result = ing.ingest(&files, "proj-1", &CancelFlag::default()).await;

        assert!(matches!(result, Err(RagError::Embedding(_))));
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn cancellation_stops_before_the_next_file() {
        let index = Arc::new(InMemoryIndex::default());
        let provider = MockProvider::default();
        let ing = ingestor(provider.clone(), Arc::clone(&index), small_chunks());

        let cancel = CancelFlag::default();
        cancel.cancel();
        let files = vec![file("src/lib.rs", &"fn lib() {}\n".repeat(20))];
        let report = ing.ingest(&files, "proj-1", &cancel).await.unwrap();

        assert_eq!(report, IngestReport::default());
        assert!(provider.embed_calls().is_empty());
    }

    #[test]
    fn chunk_hash_is_short_and_content_addressed() {
        let a = chunk_hash("fn main() {}");
        let b = chunk_hash("fn main() {}");
        let c = chunk_hash("fn main() { }");
        assert_eq!(a.len(), 12);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
