//! Seams between the reasoning client and the service it talks to

use crate::error::ReasoningError;
use async_trait::async_trait;
use std::sync::Arc;

/// A remote generative model that answers a prompt with text
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Send one prompt and return the model's raw text reply
    async fn generate(&self, prompt: &str) -> Result<String, ReasoningError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Builds a backend bound to an API key
pub trait BackendFactory: Send + Sync {
    fn build(&self, api_key: &str) -> Result<Arc<dyn ReasoningBackend>, ReasoningError>;
}
