//! OpenAI-compatible chat completion provider (`/v1/chat/completions`).
//!
//! Covers OpenAI itself and local servers speaking the same protocol
//! (Ollama, LM Studio…). The request is the system prompt, the bounded
//! history, then the question. Wire types are private to this module.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::config::ProviderConfig;
use crate::llm::{ProviderError, classify_http_error};
use crate::message::Message;

/// Constructed once at session start, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
    system_prompt: String,
}

impl OpenAiCompatibleProvider {
    /// `api_key` is `None` for keyless local models. When present it is sent
    /// as `Authorization: Bearer <key>` on every request.
    pub fn new(
        config: &ProviderConfig,
        api_key: Option<String>,
        system_prompt: String,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Technical(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
            system_prompt,
        })
    }

    pub async fn complete(&self, question: &str, history: &[Message]) -> Result<String, ProviderError> {
        let payload = build_request(
            &self.model,
            self.temperature,
            &self.system_prompt,
            history,
            question,
        );

        debug!(
            model = %payload.model,
            temperature = ?payload.temperature,
            messages = payload.messages.len(),
            "sending LLM request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let mut req = self.client.post(&self.api_base_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, "LLM HTTP request failed (transport)");
            ProviderError::Technical(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            let err = classify_http_error(status, &body);
            error!(%status, error = %err, "LLM request returned HTTP error");
            return Err(err);
        }

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            ProviderError::Technical(format!("failed to parse response body: {e}"))
        })?;

        debug!(choices = parsed.choices.len(), "received LLM response");
        extract_text(parsed)
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn build_request<'a>(
    model: &'a str,
    temperature: f32,
    system_prompt: &'a str,
    history: &'a [Message],
    question: &'a str,
) -> ChatCompletionRequest<'a> {
    // Some models (gpt-5 family) do not accept a temperature parameter.
    let temperature = (!model.starts_with("gpt-5")).then_some(temperature);

    let mut messages = Vec::with_capacity(history.len() + 2);
    if !system_prompt.is_empty() {
        messages.push(WireMessage { role: "system", content: system_prompt });
    }
    messages.extend(
        history
            .iter()
            .map(|m| WireMessage { role: m.role.as_str(), content: &m.content }),
    );
    messages.push(WireMessage { role: "user", content: question });

    ChatCompletionRequest { model, messages, temperature }
}

fn extract_text(response: ChatCompletionResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ProviderError::Technical("empty or missing content in response".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_carries_system_history_and_question() {
        let history = vec![Message::user("Hi"), Message::assistant("Hello!")];
        let req = build_request("gpt-4o-mini", 0.5, "Be an HR assistant.", &history, "Dress code?");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    { "role": "system", "content": "Be an HR assistant." },
                    { "role": "user", "content": "Hi" },
                    { "role": "assistant", "content": "Hello!" },
                    { "role": "user", "content": "Dress code?" }
                ],
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn gpt5_omits_temperature() {
        let req = build_request("gpt-5-mini", 0.5, "", &[], "q");
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("temperature").is_none());
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn first_choice_is_returned_verbatim() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "  Sure.\n" } }]
        }))
        .unwrap();
        assert_eq!(extract_text(resp).unwrap(), "  Sure.\n");
    }

    #[test]
    fn whitespace_only_content_is_an_error() {
        let resp: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [{ "message": { "content": " \n" } }] })).unwrap();
        assert!(extract_text(resp).is_err());
    }

    #[test]
    fn null_content_is_an_error() {
        let resp: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [{ "message": { "content": null } }] })).unwrap();
        assert!(extract_text(resp).is_err());
    }
}
