use async_trait::async_trait;
use crate::error::Result;

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send a single prompt and return the model's text answer.
    async fn generate(&self, prompt: &str) -> Result<String>;
    /// Identifier of the model serving requests.
    fn model(&self) -> &str;
    fn name(&self) -> &str;
}
