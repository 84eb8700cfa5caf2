use crate::error::LlmError;

pub trait LlmProvider: Send + Sync {
    /// Compute a fixed-dimension embedding for one text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    /// Generate text for a prompt within a bounded output-token budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Dimensionality of the vectors `embed` produces.
    fn embedding_dim(&self) -> usize;

    fn name(&self) -> &str;
}
