//! `LlmProvider` trait: the generative-text collaborator.

use async_trait::async_trait;

use crate::error::LlmError;

/// A hosted text-completion model.
///
/// Implementations are constructed explicitly from configuration and shared
/// as `Arc<dyn LlmProvider>`, so tests can swap in a stub.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Send a single prompt and return the model's text verbatim.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}
