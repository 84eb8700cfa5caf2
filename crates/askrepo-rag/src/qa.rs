//! Grounded question answering over previously ingested chunks.

use std::sync::Arc;

use askrepo_llm::LlmProvider;
use askrepo_llm::embedding::EmbeddingClient;
use askrepo_llm::router::FallbackProvider;
use askrepo_vector::{SearchMatch, VectorClient, VectorIndex};

use crate::error::{RagError, Result};

const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Pointer from an answer back to the retrieved evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub path: String,
    pub chunk_index: usize,
    pub excerpt: Option<String>,
}

/// A generated answer together with the evidence set it was grounded in.
///
/// Citations are exactly the retrieved matches, whether or not the model
/// used each one; they are never parsed back out of the answer text.
#[derive(Debug, Clone)]
pub struct Answer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Copy)]
pub struct AnswerConfig {
    pub top_k: usize,
    pub max_output_tokens: u32,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_output_tokens: 1500,
        }
    }
}

/// Embed, retrieve, prompt, generate.
pub struct AnswerEngine<P, G, S> {
    embedder: EmbeddingClient<P>,
    generator: FallbackProvider<G>,
    store: Arc<VectorClient<S>>,
    config: AnswerConfig,
}

impl<P, G, S> AnswerEngine<P, G, S>
where
    P: LlmProvider,
    G: LlmProvider,
    S: VectorIndex,
{
    #[must_use]
    pub fn new(
        embedder: EmbeddingClient<P>,
        generator: FallbackProvider<G>,
        store: Arc<VectorClient<S>>,
        config: AnswerConfig,
    ) -> Self {
        Self {
            embedder,
            generator,
            store,
            config,
        }
    }

    /// Answer `question` from chunks ingested under `project_id`.
    ///
    /// # Errors
    ///
    /// `RagError::Embedding` when the question cannot be embedded,
    /// `RagError::Generation` when every generation model fails, and the
    /// mapped store error when retrieval fails. No partial answers.
    pub async fn answer(&self, project_id: &str, question: &str) -> Result<Answer> {
        let query = self
            .embedder
            .embed_one(question)
            .await
            .map_err(RagError::Embedding)?;

        let matches = self
            .store
            .query(query, self.config.top_k, Some(project_id))
            .await?;
        tracing::debug!(project_id, matches = matches.len(), "retrieved context");

        let prompt = build_prompt(question, &matches);
        let answer = self
            .generator
            .generate(&prompt, self.config.max_output_tokens)
            .await
            .map_err(RagError::Generation)?;

        let citations = matches
            .into_iter()
            .map(|m| Citation {
                path: m.metadata.path,
                chunk_index: m.metadata.chunk_index,
                excerpt: Some(m.metadata.text).filter(|t| !t.is_empty()),
            })
            .collect();
        Ok(Answer { answer, citations })
    }
}

fn build_prompt(question: &str, matches: &[SearchMatch]) -> String {
    if matches.is_empty() {
        return format!(
            "You are answering a question about a code repository, but no \
             relevant source context was found for it. Say that the repository \
             does not appear to contain the answer, and suggest what to look \
             at instead if you can.\n\nQuestion: {question}\n\nAnswer:"
        );
    }

    let context = matches
        .iter()
        .map(|m| format!("[{}]\n{}", m.metadata.path, m.metadata.text))
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);
    format!(
        "You are answering a question about a code repository. Use ONLY the \
         source context below; do not invent code or files that are not shown. \
         Reference file paths when they are relevant to the answer.\n\n\
         Context:\n{context}\n\nQuestion: {question}\n\nAnswer:"
    )
}

#[cfg(test)]
mod tests {
    use askrepo_github::{IgnorePolicy, RepoFile};
    use askrepo_llm::mock::MockProvider;
    use askrepo_vector::VectorClientConfig;
    use askrepo_vector::memory::InMemoryIndex;

    use super::*;
    use crate::ingest::{CancelFlag, IngestConfig, Ingestor};

    fn store(index: Arc<InMemoryIndex>) -> Arc<VectorClient<InMemoryIndex>> {
        Arc::new(VectorClient::new(index, VectorClientConfig {
            batch_delay: std::time::Duration::from_millis(1),
            ..VectorClientConfig::default()
        }))
    }

    async fn seed(
        store: &Arc<VectorClient<InMemoryIndex>>,
        project_id: &str,
        files: &[RepoFile],
    ) {
        let config = IngestConfig {
            chunk: crate::chunker::ChunkConfig {
                size: 100,
                overlap: 20,
            },
            min_chunk_bytes: 10,
            ..IngestConfig::default()
        };
        let ingestor = Ingestor::new(
            EmbeddingClient::new(Arc::new(MockProvider::default())),
            Arc::clone(store),
            IgnorePolicy::default(),
            config,
        );
        ingestor
            .ingest(files, project_id, &CancelFlag::default())
            .await
            .unwrap();
    }

    fn file(path: &str, content: &str) -> RepoFile {
        RepoFile {
            path: path.to_owned(),
            content: content.to_owned(),
        }
    }

    fn engine(
        generator: MockProvider,
        store: Arc<VectorClient<InMemoryIndex>>,
    ) -> AnswerEngine<MockProvider, MockProvider, InMemoryIndex> {
        AnswerEngine::new(
            EmbeddingClient::new(Arc::new(MockProvider::default())),
            FallbackProvider::new(vec![generator]),
            store,
            AnswerConfig::default(),
        )
    }

    #[tokio::test]
    async fn answers_with_citations_from_retrieved_matches() {
        let index = Arc::new(InMemoryIndex::default());
        let store = store(index);
        seed(&store, "proj-1", &[file("src/lib.rs", &"fn lib() {}\n".repeat(20))]).await;

        let generator = MockProvider::with_response("The library defines `lib`.");
        let engine = engine(generator.clone(), store);
        let answer = engine.answer("proj-1", "What does the library do?").await.unwrap();

        assert_eq!(answer.answer, "The library defines `lib`.");
        assert!(!answer.citations.is_empty());
        assert!(answer.citations.iter().all(|c| c.path == "src/lib.rs"));
        assert!(answer.citations.iter().all(|c| c.excerpt.is_some()));

        let prompts = generator.generate_calls();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("src/lib.rs"));
        assert!(prompts[0].contains("Use ONLY the source context"));
        assert!(prompts[0].contains("What does the library do?"));
    }

    #[tokio::test]
    async fn retrieval_is_scoped_to_the_project() {
        let index = Arc::new(InMemoryIndex::default());
        let store = store(index);
        seed(&store, "proj-a", &[file("a.rs", &"fn alpha() {}\n".repeat(20))]).await;
        seed(&store, "proj-b", &[file("b.rs", &"fn beta() {}\n".repeat(20))]).await;

        let generator = MockProvider::with_response("answer");
        let engine = engine(generator, store);
        let answer = engine.answer("proj-b", "question").await.unwrap();

        assert!(!answer.citations.is_empty());
        assert!(answer.citations.iter().all(|c| c.path == "b.rs"));
    }

    #[tokio::test]
    async fn no_matches_still_answers_with_empty_citations() {
        let index = Arc::new(InMemoryIndex::default());
        let generator = MockProvider::with_response("Nothing relevant is indexed.");
        let engine = engine(generator.clone(), store(index));

        let answer = engine.answer("proj-1", "anything?").await.unwrap();

        assert_eq!(answer.answer, "Nothing relevant is indexed.");
        assert!(answer.citations.is_empty());
        let prompts = generator.generate_calls();
        assert!(prompts[0].contains("no relevant source context was found"));
    }

    #[tokio::test]
    async fn embedding_failure_fails_the_whole_operation() {
        let index = Arc::new(InMemoryIndex::default());
        let engine = AnswerEngine::new(
            EmbeddingClient::new(Arc::new(MockProvider::failing())),
            FallbackProvider::new(vec![MockProvider::default()]),
            store(index),
            AnswerConfig::default(),
        );

        let result = engine.answer("proj-1", "question").await;
        assert!(matches!(result, Err(RagError::Embedding(_))));
    }

    #[tokio::test]
    async fn all_generators_failing_fails_the_operation() {
        let index = Arc::new(InMemoryIndex::default());
        let store = store(index);
        seed(&store, "proj-1", &[file("a.rs", &"fn a() {}\n".repeat(20))]).await;

        let engine = AnswerEngine::new(
            EmbeddingClient::new(Arc::new(MockProvider::default())),
            FallbackProvider::new(vec![MockProvider::failing(), MockProvider::failing()]),
            store,
            AnswerConfig::default(),
        );

        let result = engine.answer("proj-1", "question").await;
        assert!(matches!(result, Err(RagError::Generation(_))));
    }

    #[tokio::test]
    async fn second_generator_is_used_when_the_first_fails() {
        let index = Arc::new(InMemoryIndex::default());
        let store = store(index);
        seed(&store, "proj-1", &[file("a.rs", &"fn a() {}\n".repeat(20))]).await;

        let engine = AnswerEngine::new(
            EmbeddingClient::new(Arc::new(MockProvider::default())),
            FallbackProvider::new(vec![
                MockProvider::failing(),
                MockProvider::with_response("from the fallback model"),
            ]),
            store,
            AnswerConfig::default(),
        );

        let answer = engine.answer("proj-1", "question").await.unwrap();
        assert_eq!(answer.answer, "from the fallback model");
    }
}
