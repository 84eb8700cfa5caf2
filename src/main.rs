mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use askrepo_github::{FetchConfig, GithubFetcher, IgnorePolicy};
use askrepo_llm::embedding::EmbeddingClient;
use askrepo_llm::gemini::GeminiProvider;
use askrepo_llm::router::FallbackProvider;
use askrepo_rag::{
    Answer, AnswerConfig, AnswerEngine, CancelFlag, ChunkConfig, IngestConfig, IngestReport,
    Ingestor,
};
use askrepo_vector::qdrant::QdrantIndex;
use askrepo_vector::{VectorClient, VectorClientConfig};
use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "askrepo", version, about = "Ask questions about GitHub repositories")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "askrepo.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a repository and index its text content.
    Ingest {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        repo: String,
        /// Namespace the indexed chunks are stored under.
        #[arg(long)]
        project_id: String,
    },
    /// Answer a question from a previously ingested project.
    Ask {
        #[arg(long)]
        project_id: String,
        question: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    config.validate()?;

    match cli.command {
        Command::Ingest {
            owner,
            repo,
            project_id,
        } => {
            let report = ingest(&config, &owner, &repo, &project_id).await?;
            println!(
                "Ingested {} file(s) ({} skipped), {} chunk(s) upserted under '{project_id}'.",
                report.processed_files, report.skipped_files, report.chunks_upserted
            );
        }
        Command::Ask {
            project_id,
            question,
        } => {
            let answer = ask(&config, &project_id, &question).await?;
            println!("{}", answer.answer);
            if !answer.citations.is_empty() {
                println!("\nSources:");
                for citation in &answer.citations {
                    println!("  - {} (chunk {})", citation.path, citation.chunk_index);
                }
            }
        }
    }
    Ok(())
}

async fn ingest(
    config: &Config,
    owner: &str,
    repo: &str,
    project_id: &str,
) -> anyhow::Result<IngestReport> {
    let policy = IgnorePolicy::default();
    let fetcher = GithubFetcher::new(
        config.github.token.clone(),
        policy.clone(),
        FetchConfig {
            max_file_bytes: u64::try_from(config.ingest.max_file_bytes)?,
            ..FetchConfig::default()
        },
    );

    let files = fetcher.list_files(owner, repo).await?;
    tracing::info!(owner, repo, files = files.len(), "repository listed");

    let embedder = EmbeddingClient::new(Arc::new(embedding_provider(config)?));
    let store = vector_client(config).await?;

    let cancel = CancelFlag::default();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping after the current file");
            signal_flag.cancel();
        }
    });

    let ingestor = Ingestor::new(
        embedder,
        store,
        policy,
        IngestConfig {
            chunk: ChunkConfig {
                size: config.ingest.chunk_size,
                overlap: config.ingest.chunk_overlap,
            },
            max_file_bytes: config.ingest.max_file_bytes,
            ..IngestConfig::default()
        },
    );
    Ok(ingestor.ingest(&files, project_id, &cancel).await?)
}

async fn ask(config: &Config, project_id: &str, question: &str) -> anyhow::Result<Answer> {
    let embedder = EmbeddingClient::new(Arc::new(embedding_provider(config)?));
    let generator = FallbackProvider::new(
        config
            .llm
            .models
            .iter()
            .map(|model| generation_provider(config, model))
            .collect::<anyhow::Result<Vec<_>>>()?,
    );
    let store = vector_client(config).await?;

    let engine = AnswerEngine::new(
        embedder,
        generator,
        store,
        AnswerConfig {
            top_k: config.qa.top_k,
            max_output_tokens: config.qa.max_output_tokens,
        },
    );
    Ok(engine.answer(project_id, question).await?)
}

fn embedding_provider(config: &Config) -> anyhow::Result<GeminiProvider> {
    // Embeddings go through the same provider as the first generation model.
    let model = config
        .llm
        .models
        .first()
        .context("llm.models must list at least one model")?;
    generation_provider(config, model)
}

fn generation_provider(config: &Config, model: &str) -> anyhow::Result<GeminiProvider> {
    let api_key = config
        .llm
        .api_key
        .clone()
        .context("GEMINI_API_KEY is not set")?;
    let mut provider = GeminiProvider::new(
        api_key,
        model.to_owned(),
        config.llm.embedding_model.clone(),
        config.llm.embedding_dim,
    );
    if let Some(base_url) = &config.llm.base_url {
        provider = provider.with_base_url(base_url.clone());
    }
    Ok(provider)
}

async fn vector_client(config: &Config) -> anyhow::Result<Arc<VectorClient<QdrantIndex>>> {
    let index = QdrantIndex::new(&config.vector.qdrant_url, config.vector.collection.clone())?;
    index
        .ensure_collection(u64::try_from(config.llm.embedding_dim)?)
        .await?;
    Ok(Arc::new(VectorClient::new(
        Arc::new(index),
        VectorClientConfig::default(),
    )))
}
