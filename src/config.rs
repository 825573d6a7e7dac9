//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `HR_ASSISTANT_LOG_LEVEL` and `HR_ASSISTANT_PROVIDER`
//! overrides. The API key only ever comes from the environment.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;
use crate::logger;

/// Settings shared by every HTTP-backed provider section.
/// Populated from `[llm.gemini]` or `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Endpoint URL. For Gemini this is the models base, e.g.
    /// `https://generativelanguage.googleapis.com/v1beta/models`.
    pub api_base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds. This is the only bound on a
    /// remote call.
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// `false` keeps every session in local mode.
    pub enabled: bool,
    /// Which provider is active (`"gemini"`, `"openai"`, `"dummy"`).
    /// Maps to `default` in `[llm]`.
    pub provider: String,
    /// Key values that ship in templates and must not count as credentials.
    pub placeholder_keys: Vec<String>,
    pub gemini: ProviderConfig,
    pub openai: ProviderConfig,
}

impl LlmConfig {
    /// Whether the active provider can be constructed with `api_key`.
    ///
    /// Keyless providers are always configured, and so is `openai` pointed
    /// at anything other than the OpenAI endpoint (a local server). Everything
    /// else needs a non-empty key that is not one of the known placeholders.
    pub fn is_configured(&self, api_key: Option<&str>) -> bool {
        if !self.enabled {
            return false;
        }
        if self.provider == "dummy" {
            return true;
        }
        if self.provider == "openai" && self.openai.api_base_url != OPENAI_API_URL {
            return true;
        }
        match api_key.map(str::trim) {
            Some(key) if !key.is_empty() => !self.placeholder_keys.iter().any(|p| p == key),
            _ => false,
        }
    }
}

/// Session behaviour.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Number of most recent messages forwarded to the remote model.
    pub history_limit: usize,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub assistant_name: String,
    pub log_level: String,
    /// Directory holding prompt templates.
    pub prompts_dir: PathBuf,
    /// Optional TOML file replacing the built-in topic table.
    pub knowledge_file: Option<PathBuf>,
    pub session: SessionConfig,
    pub llm: LlmConfig,
    /// From `LLM_API_KEY`, falling back to `GOOGLE_API_KEY`. Never from TOML.
    /// Trimmed; blank and placeholder values are dropped.
    pub llm_api_key: Option<String>,
}

impl Config {
    /// Whether remote delegation may be attempted at all.
    pub fn is_configured(&self) -> bool {
        self.llm.is_configured(self.llm_api_key.as_deref())
    }
}

/// Env-sourced values applied on top of the TOML.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub provider: Option<String>,
    pub api_key: Option<String>,
    /// Used when `api_key` is missing, blank or a placeholder.
    pub fallback_api_key: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("HR_ASSISTANT_LOG_LEVEL").ok(),
            provider: env::var("HR_ASSISTANT_PROVIDER").ok(),
            api_key: env::var("LLM_API_KEY").ok(),
            fallback_api_key: env::var("GOOGLE_API_KEY").ok(),
        }
    }
}

// ── raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawConfig {
    assistant: RawAssistant,
    #[serde(default)]
    session: RawSession,
    #[serde(default)]
    llm: RawLlm,
}

#[derive(Deserialize)]
struct RawAssistant {
    #[serde(default = "default_assistant_name")]
    name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_prompts_dir")]
    prompts_dir: String,
    #[serde(default)]
    knowledge_file: Option<String>,
}

#[derive(Deserialize)]
struct RawSession {
    #[serde(default = "default_history_limit")]
    history_limit: usize,
}

impl Default for RawSession {
    fn default() -> Self {
        Self { history_limit: default_history_limit() }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default = "default_placeholder_keys")]
    placeholder_keys: Vec<String>,
    #[serde(default = "default_gemini")]
    gemini: RawProvider,
    #[serde(default = "default_openai")]
    openai: RawProvider,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: default_llm_provider(),
            placeholder_keys: default_placeholder_keys(),
            gemini: default_gemini(),
            openai: default_openai(),
        }
    }
}

/// Missing fields are filled in per provider in [`RawProvider::resolve`].
#[derive(Deserialize, Default)]
struct RawProvider {
    api_base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_seconds: Option<u64>,
}

impl RawProvider {
    fn resolve(self, fallback: RawProvider) -> ProviderConfig {
        ProviderConfig {
            api_base_url: self.api_base_url.or(fallback.api_base_url).unwrap_or_default(),
            model: self.model.or(fallback.model).unwrap_or_default(),
            temperature: self.temperature.or(fallback.temperature).unwrap_or(0.2),
            timeout_seconds: self.timeout_seconds.or(fallback.timeout_seconds).unwrap_or(60),
        }
    }
}

fn default_assistant_name() -> String { "HR Assistant".to_string() }
fn default_log_level() -> String { "warn".to_string() }
fn default_prompts_dir() -> String { "config/prompts".to_string() }
fn default_history_limit() -> usize { 20 }
fn default_true() -> bool { true }
fn default_llm_provider() -> String { "gemini".to_string() }
fn default_placeholder_keys() -> Vec<String> {
    vec!["your_api_key_here".to_string(), "changeme".to_string()]
}

fn default_gemini() -> RawProvider {
    RawProvider {
        api_base_url: Some("https://generativelanguage.googleapis.com/v1beta/models".to_string()),
        model: Some("gemini-2.0-flash".to_string()),
        temperature: Some(0.3),
        timeout_seconds: Some(60),
    }
}

/// Hosted OpenAI endpoint. Any other `[llm.openai] api_base_url` is treated
/// as a local server that needs no key.
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

fn default_openai() -> RawProvider {
    RawProvider {
        api_base_url: Some(OPENAI_API_URL.to_string()),
        model: Some("gpt-4o-mini".to_string()),
        temperature: Some(0.2),
        timeout_seconds: Some(60),
    }
}

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Load config from `path` (default `config/default.toml`), then apply
/// env-var overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let path = Path::new(path.unwrap_or(DEFAULT_CONFIG_PATH));
    load_from(path, Overrides::from_env())
}

/// Internal loader. Accepts an explicit path and overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, overrides: Overrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse(&raw, overrides)
        .map_err(|e| AppError::Config(format!("{} in {}", e, path.display())))
}

fn parse(raw: &str, overrides: Overrides) -> Result<Config, String> {
    let parsed: RawConfig = toml::from_str(raw).map_err(|e| format!("parse error: {e}"))?;

    let a = parsed.assistant;
    let provider = overrides.provider.unwrap_or(parsed.llm.provider);
    if !matches!(provider.as_str(), "gemini" | "openai" | "dummy") {
        return Err(format!("unknown llm provider '{provider}'"));
    }

    let log_level = overrides.log_level.unwrap_or(a.log_level);
    logger::parse_level(&log_level).map_err(|e| e.to_string())?;

    let placeholder_keys = parsed.llm.placeholder_keys;
    let llm_api_key = [overrides.api_key, overrides.fallback_api_key]
        .into_iter()
        .flatten()
        .map(|k| k.trim().to_string())
        .find(|k| !k.is_empty() && !placeholder_keys.contains(k));

    Ok(Config {
        assistant_name: a.name,
        log_level,
        prompts_dir: PathBuf::from(a.prompts_dir),
        knowledge_file: a.knowledge_file.map(PathBuf::from),
        session: SessionConfig { history_limit: parsed.session.history_limit },
        llm: LlmConfig {
            enabled: parsed.llm.enabled,
            provider,
            placeholder_keys,
            gemini: parsed.llm.gemini.resolve(default_gemini()),
            openai: parsed.llm.openai.resolve(default_openai()),
        },
        llm_api_key,
    })
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for tests: dummy provider, no API key, no network.
impl Config {
    pub fn test_default() -> Self {
        Self {
            assistant_name: "test".into(),
            log_level: "warn".into(),
            prompts_dir: PathBuf::from("config/prompts"),
            knowledge_file: None,
            session: SessionConfig { history_limit: default_history_limit() },
            llm: LlmConfig {
                enabled: true,
                provider: "dummy".into(),
                placeholder_keys: default_placeholder_keys(),
                gemini: default_gemini().resolve(RawProvider::default()),
                openai: default_openai().resolve(RawProvider::default()),
            },
            llm_api_key: None,
        }
    }
}
