//! Resilient batched client in front of a [`VectorIndex`] backend.

use std::sync::Arc;
use std::time::Duration;

use askrepo_guard::{CircuitBreaker, RateLimiter, retry_with_backoff, with_timeout};

use crate::error::VectorStoreError;
use crate::store::VectorIndex;
use crate::types::{SearchMatch, VectorRecord};

#[derive(Debug, Clone)]
pub struct VectorClientConfig {
    /// Maximum records per backend upsert call.
    pub batch_size: usize,
    /// Pause between consecutive batches of one upsert.
    pub batch_delay: Duration,
    pub upsert_timeout: Duration,
    pub query_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    /// Consecutive failures before the breaker opens.
    pub breaker_threshold: u32,
    pub breaker_cooldown: Duration,
    /// Outbound-call quota per rolling window.
    pub rate_limit: usize,
    pub rate_window: Duration,
}

impl Default for VectorClientConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            batch_delay: Duration::from_millis(100),
            upsert_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(15),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            breaker_threshold: 3,
            breaker_cooldown: Duration::from_secs(30),
            rate_limit: 100,
            rate_window: Duration::from_secs(60),
        }
    }
}

/// Validating, batching, rate-limited front for a vector index.
///
/// Every backend call runs through
/// `rate_limit(circuit_break(retry(timeout(call))))`. Breaker and limiter
/// state is shared by all users of one client, so concurrent workers observe
/// a single quota and a single breaker.
pub struct VectorClient<S> {
    index: Arc<S>,
    config: VectorClientConfig,
    breaker: CircuitBreaker,
    limiter: RateLimiter,
}

impl<S> std::fmt::Debug for VectorClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: VectorIndex> VectorClient<S> {
    #[must_use]
    pub fn new(index: Arc<S>, config: VectorClientConfig) -> Self {
        let breaker = CircuitBreaker::new(config.breaker_threshold, config.breaker_cooldown);
        let limiter = RateLimiter::new(config.rate_limit, config.rate_window);
        Self {
            index,
            config,
            breaker,
            limiter,
        }
    }

    /// Upsert records, splitting into sequential bounded batches.
    ///
    /// # Errors
    ///
    /// `InvalidVectorFormat` for a record with an empty id or an empty or
    /// non-finite vector, detected locally before any backend call; otherwise
    /// the first batch failure after retries are exhausted.
    pub async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        for record in &records {
            validate_record(record)?;
        }
        if records.is_empty() {
            return Ok(());
        }

        let batches: Vec<Vec<VectorRecord>> = records
            .chunks(self.config.batch_size)
            .map(<[VectorRecord]>::to_vec)
            .collect();
        let total = batches.len();

        for (i, batch) in batches.into_iter().enumerate() {
            tracing::debug!(batch = i + 1, total, records = batch.len(), "upserting batch");
            self.execute(self.config.upsert_timeout, || {
                self.index.upsert(batch.clone())
            })
            .await?;

            if i + 1 < total {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }
        Ok(())
    }

    /// Nearest-neighbor query, optionally scoped to one project.
    ///
    /// # Errors
    ///
    /// `InvalidQueryVector` for an empty or non-finite query vector, detected
    /// locally; otherwise the backend failure after retries are exhausted.
    pub async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        project_filter: Option<&str>,
    ) -> Result<Vec<SearchMatch>, VectorStoreError> {
        if vector.is_empty() || vector.iter().any(|v| !v.is_finite()) {
            return Err(VectorStoreError::InvalidQueryVector(
                "query vector must be non-empty and finite".to_owned(),
            ));
        }

        let filter = project_filter.map(str::to_owned);
        self.execute(self.config.query_timeout, || {
            self.index.query(vector.clone(), top_k, filter.clone())
        })
        .await
    }

    async fn execute<T, F, Fut>(&self, timeout: Duration, mut call: F) -> Result<T, VectorStoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, VectorStoreError>>,
    {
        self.limiter.acquire().await;

        if !self.breaker.try_acquire() {
            return Err(VectorStoreError::ServiceUnavailable(
                "circuit breaker open".to_owned(),
            ));
        }

        let result = retry_with_backoff(
            self.config.max_retries,
            self.config.retry_base_delay,
            VectorStoreError::is_retryable,
            || with_timeout(timeout, VectorStoreError::Timeout, call()),
        )
        .await;

        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(e) => {
                tracing::warn!(error = %e, "vector store call failed");
                self.breaker.record_failure();
            }
        }
        result
    }
}

fn validate_record(record: &VectorRecord) -> Result<(), VectorStoreError> {
    if record.id.is_empty() {
        return Err(VectorStoreError::InvalidVectorFormat(
            "record id must be non-empty".to_owned(),
        ));
    }
    if record.values.is_empty() || record.values.iter().any(|v| !v.is_finite()) {
        return Err(VectorStoreError::InvalidVectorFormat(format!(
            "record {} has an empty or non-finite vector",
            record.id
        )));
    }
    Ok(())
}
