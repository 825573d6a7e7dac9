//! Dummy LLM provider: echoes the question back prefixed with `[echo]`.
//! Lets the whole remote path run without an API key.

use crate::llm::ProviderError;
use crate::message::Message;

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, question: &str, _history: &[Message]) -> Result<String, ProviderError> {
        Ok(format!("[echo] {question}"))
    }
}
