//! LLM provider implementations.
//!
//! `build(config, api_key, system_prompt)` is the factory, called once at
//! session start. Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod gemini;
pub mod openai_compatible;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and an optional API key.
///
/// `api_key` is sourced from the environment (never TOML). Keyed providers
/// refuse to build without one.
pub fn build(
    config: &LlmConfig,
    api_key: Option<String>,
    system_prompt: String,
) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "gemini" => {
            let key = api_key.ok_or(ProviderError::InvalidCredential)?;
            let p = gemini::GeminiProvider::new(&config.gemini, key, system_prompt)?;
            Ok(LlmProvider::Gemini(p))
        }
        "openai" => {
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                &config.openai,
                api_key,
                system_prompt,
            )?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn builds_dummy() {
        let cfg = Config::test_default();
        let p = build(&cfg.llm, None, String::new()).unwrap();
        assert!(matches!(p, LlmProvider::Dummy(_)));
    }

    #[test]
    fn gemini_without_key_fails() {
        let mut cfg = Config::test_default();
        cfg.llm.provider = "gemini".into();
        assert_eq!(build(&cfg.llm, None, String::new()).unwrap_err(), ProviderError::InvalidCredential);
    }

    #[test]
    fn gemini_with_key_builds() {
        let mut cfg = Config::test_default();
        cfg.llm.provider = "gemini".into();
        let p = build(&cfg.llm, Some("k".into()), "sys".into()).unwrap();
        assert_eq!(p.label(), "Gemini");
    }

    #[test]
    fn unknown_provider_fails() {
        let mut cfg = Config::test_default();
        cfg.llm.provider = "bard".into();
        assert!(matches!(
            build(&cfg.llm, None, String::new()),
            Err(ProviderError::UnknownProvider(name)) if name == "bard"
        ));
    }
}
