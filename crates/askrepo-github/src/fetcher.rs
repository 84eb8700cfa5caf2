//! Repository listing and content retrieval against the GitHub REST API.

use std::sync::Arc;
use std::time::Duration;

use askrepo_guard::{CircuitBreaker, RateLimiter, retry_with_backoff, with_timeout};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{GithubError, Result};
use crate::filter::IgnorePolicy;

const GITHUB_API_URL: &str = "https://api.github.com";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// One repository path with its decoded text content. Ephemeral, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Blobs whose reported size exceeds this are skipped before any
    /// content request goes out.
    pub max_file_bytes: u64,
    /// Content requests issued concurrently per batch.
    pub content_batch: usize,
    /// Pause between consecutive content batches.
    pub batch_delay: Duration,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub breaker_threshold: u32,
    pub breaker_cooldown: Duration,
    pub rate_limit: usize,
    pub rate_window: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 200_000,
            content_batch: 10,
            batch_delay: Duration::from_millis(100),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            breaker_threshold: 3,
            breaker_cooldown: Duration::from_secs(30),
            rate_limit: 100,
            rate_window: Duration::from_secs(60),
        }
    }
}

#[derive(Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize, Clone)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Deserialize)]
struct ContentResponse {
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

/// Client for listing a repository's text files at its default branch.
///
/// Ignore filtering and the size guard both run before content requests, so
/// binaries and generated trees never cost bandwidth. Per-file fetch
/// failures are logged and skipped; listing-level failures abort the call.
pub struct GithubFetcher {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    policy: IgnorePolicy,
    config: FetchConfig,
    breaker: CircuitBreaker,
    limiter: Arc<RateLimiter>,
}

impl std::fmt::Debug for GithubFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubFetcher")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GithubFetcher {
    /// Create a fetcher. A `None` token is accepted here but rejected by
    /// [`list_files`](Self::list_files); credential sourcing belongs to the
    /// caller's configuration layer.
    ///
    /// # Panics
    ///
    /// Panics if the underlying `reqwest` client cannot be constructed
    /// (unreachable in practice).
    #[must_use]
    pub fn new(token: Option<String>, policy: IgnorePolicy, config: FetchConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("askrepo/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client builder should not fail with timeout and user_agent");
        let breaker = CircuitBreaker::new(config.breaker_threshold, config.breaker_cooldown);
        let limiter = Arc::new(RateLimiter::new(config.rate_limit, config.rate_window));
        Self {
            client,
            base_url: GITHUB_API_URL.to_owned(),
            token,
            policy,
            config,
            breaker,
            limiter,
        }
    }

    /// Override the API base URL. Intended for tests only.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn policy(&self) -> &IgnorePolicy {
        &self.policy
    }

    /// List all text files of `owner/repo` at its default branch.
    ///
    /// # Errors
    ///
    /// `MissingToken` when no credential is configured, `InvalidParams` for
    /// empty coordinates, and the mapped API error when branch resolution or
    /// tree listing fails after retries. Individual content fetch failures
    /// do not fail the listing.
    pub async fn list_files(&self, owner: &str, repo: &str) -> Result<Vec<RepoFile>> {
        if owner.trim().is_empty() || repo.trim().is_empty() {
            return Err(GithubError::InvalidParams(
                "owner and repo must be non-empty".to_owned(),
            ));
        }
        if self.token.is_none() {
            return Err(GithubError::MissingToken);
        }

        let info: RepoInfo = self.api_get(&format!("/repos/{owner}/{repo}")).await?;
        let branch = info.default_branch;

        let listing: TreeResponse = self
            .api_get(&format!("/repos/{owner}/{repo}/git/trees/{branch}?recursive=1"))
            .await?;
        if listing.truncated {
            tracing::warn!(owner, repo, "tree listing truncated by GitHub, some files missed");
        }

        let candidates: Vec<TreeEntry> = listing
            .tree
            .into_iter()
            .filter(|entry| {
                if entry.kind != "blob" || self.policy.should_ignore(&entry.path) {
                    return false;
                }
                if entry.size.unwrap_or(0) > self.config.max_file_bytes {
                    tracing::debug!(path = %entry.path, size = entry.size, "skipping oversized blob");
                    return false;
                }
                true
            })
            .collect();
        tracing::info!(
            owner,
            repo,
            branch,
            candidates = candidates.len(),
            "fetching repository contents"
        );

        let mut files = Vec::with_capacity(candidates.len());
        let batches: Vec<&[TreeEntry]> = candidates.chunks(self.config.content_batch).collect();
        let total = batches.len();
        for (i, batch) in batches.into_iter().enumerate() {
            self.fetch_batch(owner, repo, &branch, batch, &mut files).await;
            if i + 1 < total {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }
        Ok(files)
    }

    /// Fetch one batch of paths concurrently, appending survivors to `out`.
    async fn fetch_batch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        batch: &[TreeEntry],
        out: &mut Vec<RepoFile>,
    ) {
        let mut set = tokio::task::JoinSet::new();
        for entry in batch {
            let client = self.client.clone();
            let url = format!(
                "{}/repos/{owner}/{repo}/contents/{}?ref={branch}",
                self.base_url, entry.path
            );
            let token = self.token.clone();
            let limiter = Arc::clone(&self.limiter);
            let timeout = self.config.request_timeout;
            let path = entry.path.clone();
            set.spawn(async move {
                limiter.acquire().await;
                let result = with_timeout(
                    timeout,
                    GithubError::Timeout,
                    fetch_content(&client, &url, token.as_deref(), &path),
                )
                .await;
                (path, result)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((path, Ok(content))) => {
                    // Content can reveal itself as ignorable only after the
                    // fetch (misreported blobs, empty placeholders).
                    if self.policy.should_ignore(&path) || content.trim().is_empty() {
                        continue;
                    }
                    out.push(RepoFile { path, content });
                }
                Ok((path, Err(e))) => {
                    tracing::warn!(path, error = %e, "skipping file after fetch failure");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "content fetch task failed to complete");
                }
            }
        }
    }

    /// Rate-limited, breaker-guarded, retried GET returning decoded JSON.
    async fn api_get<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        self.limiter.acquire().await;

        if !self.breaker.try_acquire() {
            return Err(GithubError::ServiceUnavailable(
                "circuit breaker open".to_owned(),
            ));
        }

        let url = format!("{}{path_and_query}", self.base_url);
        let result = retry_with_backoff(
            self.config.max_retries,
            self.config.retry_base_delay,
            GithubError::is_retryable,
            || {
                with_timeout(self.config.request_timeout, GithubError::Timeout, async {
                    let mut req = self.client.get(&url).header("Accept", GITHUB_ACCEPT);
                    if let Some(token) = &self.token {
                        req = req.bearer_auth(token);
                    }
                    let resp = check_status(req.send().await?, &url).await?;
                    Ok(resp.json::<T>().await?)
                })
            },
        )
        .await;

        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(e) => {
                tracing::warn!(url, error = %e, "GitHub API call failed");
                self.breaker.record_failure();
            }
        }
        result
    }
}

async fn fetch_content(
    client: &reqwest::Client,
    url: &str,
    token: Option<&str>,
    path: &str,
) -> Result<String> {
    let mut req = client.get(url).header("Accept", GITHUB_ACCEPT);
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    let resp = check_status(req.send().await?, path).await?;
    let body: ContentResponse = resp.json().await?;
    decode_content(&body, path)
}

fn decode_content(body: &ContentResponse, path: &str) -> Result<String> {
    let Some(raw) = &body.content else {
        return Err(GithubError::Decode {
            path: path.to_owned(),
            reason: "response carries no content field".to_owned(),
        });
    };
    if let Some(encoding) = &body.encoding {
        if encoding != "base64" {
            return Err(GithubError::Decode {
                path: path.to_owned(),
                reason: format!("unsupported content encoding {encoding}"),
            });
        }
    }
    // GitHub wraps base64 payloads with embedded newlines.
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| GithubError::Decode {
        path: path.to_owned(),
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| GithubError::Decode {
        path: path.to_owned(),
        reason: e.to_string(),
    })
}

async fn check_status(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    match status.as_u16() {
        401 => Err(GithubError::Unauthorized),
        403 => {
            let exhausted = resp
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == "0");
            if exhausted {
                Err(GithubError::RateLimited)
            } else {
                Err(GithubError::Forbidden(context.to_owned()))
            }
        }
        404 => Err(GithubError::NotFound(context.to_owned())),
        422 => Err(GithubError::Validation(context.to_owned())),
        s => {
            let message = resp.text().await.unwrap_or_default();
            let message = message.chars().take(200).collect();
            Err(GithubError::Api { status: s, message })
        }
    }
}
