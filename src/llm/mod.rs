//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities; clone them freely.
//! Every provider is one round-trip: the system prompt, the bounded history
//! and the new question go out, text comes back.

pub mod providers;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::message::Message;
use crate::responder::RemoteDelegate;

// ── Error ─────────────────────────────────────────────────────────────────────

/// Failure of a remote call or of provider construction.
///
/// `Display` texts are shown to the user inside the fallback answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("invalid API key — check your .env file")]
    InvalidCredential,
    #[error("API quota exceeded — try again later or check your provider account")]
    QuotaExceeded,
    #[error("technical issue: {0}")]
    Technical(String),
}

// Error envelope shared by OpenAI-compatible APIs and Gemini.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a non-success HTTP response body to a [`ProviderError`].
///
/// Markers are searched in the raw body (Gemini reports `API_KEY_INVALID`
/// in `error.details`); the technical message prefers `error.message`.
pub fn classify_http_error(status: StatusCode, body: &str) -> ProviderError {
    if body.contains("API_KEY_INVALID")
        || status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
    {
        return ProviderError::InvalidCredential;
    }
    if status == StatusCode::TOO_MANY_REQUESTS || body.to_lowercase().contains("quota") {
        return ProviderError::QuotaExceeded;
    }
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|env| env.error.message)
        .unwrap_or_else(|_| body.to_string());
    ProviderError::Technical(format!("HTTP {status}: {message}"))
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    Gemini(providers::gemini::GeminiProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `question` with prior `history` to the provider and return its
    /// text reply.
    pub async fn complete(&self, question: &str, history: &[Message]) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(question, history).await,
            LlmProvider::Gemini(p) => p.complete(question, history).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(question, history).await,
        }
    }

    /// Human-readable backend name used in status lines and error labels.
    pub fn label(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "Dummy",
            LlmProvider::Gemini(_) => "Gemini",
            LlmProvider::OpenAiCompatible(_) => "OpenAI",
        }
    }
}

impl RemoteDelegate for LlmProvider {
    fn label(&self) -> &str {
        LlmProvider::label(self)
    }

    async fn generate(&self, question: &str, history: &[Message]) -> Result<String, ProviderError> {
        self.complete(question, history).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_key_marker_wins() {
        let e = classify_http_error(StatusCode::BAD_REQUEST, "API key not valid. [API_KEY_INVALID]");
        assert_eq!(e, ProviderError::InvalidCredential);
    }

    #[test]
    fn gemini_envelope_with_key_reason() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        assert_eq!(classify_http_error(StatusCode::BAD_REQUEST, body), ProviderError::InvalidCredential);
    }

    #[test]
    fn technical_message_comes_from_envelope() {
        let body = r#"{"error":{"message":"model not found"}}"#;
        assert_eq!(
            classify_http_error(StatusCode::NOT_FOUND, body),
            ProviderError::Technical("HTTP 404 Not Found: model not found".into())
        );
    }

    #[test]
    fn auth_statuses_are_credential_errors() {
        assert_eq!(classify_http_error(StatusCode::UNAUTHORIZED, ""), ProviderError::InvalidCredential);
        assert_eq!(classify_http_error(StatusCode::FORBIDDEN, "nope"), ProviderError::InvalidCredential);
    }

    #[test]
    fn quota_detection() {
        assert_eq!(classify_http_error(StatusCode::TOO_MANY_REQUESTS, "slow down"), ProviderError::QuotaExceeded);
        assert_eq!(
            classify_http_error(StatusCode::BAD_REQUEST, "You exceeded your current Quota"),
            ProviderError::QuotaExceeded
        );
    }

    #[test]
    fn everything_else_is_technical() {
        let e = classify_http_error(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(&e, ProviderError::Technical(m) if m.contains("500") && m.contains("boom")));
        assert!(e.to_string().starts_with("technical issue"));
    }

    #[tokio::test]
    async fn dummy_variant_dispatches() {
        let p = LlmProvider::Dummy(providers::dummy::DummyProvider);
        assert_eq!(p.complete("hello", &[]).await.unwrap(), "[echo] hello");
        assert_eq!(p.label(), "Dummy");
    }
}
