//! Google Gemini provider (`models/{model}:generateContent`).
//!
//! The HR system prompt goes in `systemInstruction`; prior messages become
//! `user` / `model` turns followed by the new question. Gemini wire types are
//! private to this module.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::config::ProviderConfig;
use crate::llm::{ProviderError, classify_http_error};
use crate::message::{Message, Role};

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: String,
    system_prompt: String,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig, api_key: String, system_prompt: String) -> Result<Self, ProviderError> {
        if config.model.trim().is_empty() {
            return Err(ProviderError::Technical("gemini model name is empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Technical(format!("failed to build HTTP client: {e}")))?;

        let endpoint = format!(
            "{}/{}:generateContent",
            config.api_base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
            system_prompt,
        })
    }

    pub async fn complete(&self, question: &str, history: &[Message]) -> Result<String, ProviderError> {
        let payload = build_request(&self.system_prompt, history, question, self.temperature);

        debug!(
            model = %self.model,
            turns = payload.contents.len(),
            question_len = question.len(),
            "sending Gemini request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full Gemini request payload");
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "Gemini request failed (transport)");
                ProviderError::Technical(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            let err = classify_http_error(status, &body);
            error!(%status, error = %err, "Gemini request returned HTTP error");
            return Err(err);
        }

        let parsed = response.json::<GenerateContentResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize Gemini response");
            ProviderError::Technical(format!("failed to parse response body: {e}"))
        })?;

        extract_text(parsed)
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn build_request(
    system_prompt: &str,
    history: &[Message],
    question: &str,
    temperature: f32,
) -> GenerateContentRequest {
    // Gemini rejects conversations that open with a model turn, so greetings
    // and other leading assistant messages are dropped.
    let mut contents: Vec<Content> = history
        .iter()
        .skip_while(|m| m.role == Role::Assistant)
        .map(|m| Content {
            role: Some(match m.role {
                Role::User => "user",
                Role::Assistant => "model",
            }),
            parts: vec![Part { text: m.content.clone() }],
        })
        .collect();
    contents.push(Content { role: Some("user"), parts: vec![Part { text: question.to_string() }] });

    let system_instruction = (!system_prompt.is_empty()).then(|| Content {
        role: None,
        parts: vec![Part { text: system_prompt.to_string() }],
    });

    GenerateContentRequest {
        system_instruction,
        contents,
        generation_config: GenerationConfig { temperature },
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, ProviderError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ProviderError::Technical(format!("prompt blocked: {reason}")));
    }
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ProviderError::Technical("empty or missing content in response".into()))
}
