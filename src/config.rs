use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub github: GithubConfig,
    pub llm: LlmConfig,
    pub vector: VectorConfig,
    pub ingest: IngestSettings,
    pub qa: QaSettings,
}

#[derive(Debug, Deserialize)]
pub struct GithubConfig {
    /// Sourced from `GITHUB_TOKEN`; never read from the config file.
    #[serde(skip)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    /// Sourced from `GEMINI_API_KEY`; never read from the config file.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Generation models, tried in order.
    pub models: Vec<String>,
    pub embedding_model: String,
    pub embedding_dim: usize,
}

#[derive(Debug, Deserialize)]
pub struct VectorConfig {
    pub qdrant_url: String,
    pub collection: String,
}

#[derive(Debug, Deserialize)]
pub struct IngestSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_file_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct QaSettings {
    pub top_k: usize,
    pub max_output_tokens: u32,
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to sensible defaults when the file does not exist.
    /// Secrets (`GITHUB_TOKEN`, `GEMINI_API_KEY`) always come from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error when the chunk geometry or model list is unusable.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.ingest.chunk_overlap < self.ingest.chunk_size,
            "ingest.chunk_overlap must be smaller than ingest.chunk_size"
        );
        anyhow::ensure!(
            !self.llm.models.is_empty(),
            "llm.models must list at least one generation model"
        );
        anyhow::ensure!(self.llm.embedding_dim > 0, "llm.embedding_dim must be positive");
        anyhow::ensure!(self.qa.top_k > 0, "qa.top_k must be positive");
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("GITHUB_TOKEN") {
            self.github.token = Some(v);
        }
        if let Ok(v) = std::env::var("GEMINI_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("ASKREPO_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("ASKREPO_QDRANT_URL") {
            self.vector.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("ASKREPO_COLLECTION") {
            self.vector.collection = v;
        }
    }

    fn default() -> Self {
        Self {
            github: GithubConfig { token: None },
            llm: LlmConfig {
                api_key: None,
                base_url: None,
                models: vec![
                    "gemini-1.5-pro".into(),
                    "gemini-1.5-flash".into(),
                ],
                embedding_model: "textembedding-gecko".into(),
                embedding_dim: 768,
            },
            vector: VectorConfig {
                qdrant_url: "http://localhost:6334".into(),
                collection: "askrepo".into(),
            },
            ingest: IngestSettings {
                chunk_size: 800,
                chunk_overlap: 200,
                max_file_bytes: 200_000,
            },
            qa: QaSettings {
                top_k: 5,
                max_output_tokens: 1500,
            },
        }
    }
}
