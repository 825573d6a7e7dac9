//! Answer selection: remote delegate first, local knowledge as fallback.
//!
//! ```text
//! question ──► remote enabled? ──no──► KnowledgeBase::answer
//!                   │
//!                  yes
//!                   ▼
//!           delegate.generate ──ok──► text, verbatim
//!                   │
//!                  err
//!                   ▼
//!   "<label> error: <err>\n\n" + KnowledgeBase::answer
//! ```
//!
//! Exactly one path produces the answer. Nothing here returns an error to
//! the caller.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::knowledge::KnowledgeBase;
use crate::llm::ProviderError;
use crate::message::Message;

/// The remote text-generation capability the responder delegates to.
///
/// [`LlmProvider`](crate::llm::LlmProvider) implements it for real backends;
/// tests provide their own.
#[allow(async_fn_in_trait)]
pub trait RemoteDelegate {
    /// Short name used to label failures, e.g. `"Gemini"`.
    fn label(&self) -> &str;

    /// Produce an answer for `question` given the prior conversation.
    async fn generate(&self, question: &str, history: &[Message]) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct Responder {
    knowledge: Arc<KnowledgeBase>,
}

impl Responder {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Answer from the local table only.
    pub fn local_answer(&self, question: &str) -> String {
        self.knowledge.answer(question).to_string()
    }

    /// Answer `question`, delegating when `remote_enabled` and a delegate is
    /// present.
    pub async fn respond<D: RemoteDelegate>(
        &self,
        question: &str,
        history: &[Message],
        remote_enabled: bool,
        delegate: Option<&D>,
    ) -> String {
        let delegate = match (remote_enabled, delegate) {
            (true, Some(d)) => d,
            (true, None) => {
                warn!("remote enabled without a delegate; answering locally");
                return self.local_answer(question);
            }
            (false, _) => {
                debug!("answering from local knowledge");
                return self.local_answer(question);
            }
        };

        match delegate.generate(question, history).await {
            Ok(text) => {
                debug!(provider = delegate.label(), answer_len = text.len(), "remote answer");
                text
            }
            Err(e) => {
                warn!(provider = delegate.label(), error = %e, "remote answer failed; using local knowledge");
                compose_fallback(delegate.label(), &e, &self.local_answer(question))
            }
        }
    }
}

/// Error banner followed by the local answer.
pub fn compose_fallback(label: &str, error: &ProviderError, fallback: &str) -> String {
    format!("{label} error: {error}\n\n{fallback}")
}
