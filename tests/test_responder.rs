//! End-to-end answer selection through the public API with stub delegates.

use std::sync::Arc;

use hr_assistant::config::Config;
use hr_assistant::llm::{LlmProvider, ProviderError, providers};
use hr_assistant::{KnowledgeBase, Message, RemoteDelegate, Responder, Session, SessionStatus};

struct AlwaysFails(&'static str);

impl RemoteDelegate for AlwaysFails {
    fn label(&self) -> &str {
        "Gemini"
    }

    async fn generate(&self, _question: &str, _history: &[Message]) -> Result<String, ProviderError> {
        Err(ProviderError::Technical(self.0.to_string()))
    }
}

struct Fixed(&'static str);

impl RemoteDelegate for Fixed {
    fn label(&self) -> &str {
        "Fixed"
    }

    async fn generate(&self, _question: &str, _history: &[Message]) -> Result<String, ProviderError> {
        Ok(self.0.to_string())
    }
}

fn responder() -> Responder {
    Responder::new(Arc::new(KnowledgeBase::builtin()))
}

#[tokio::test]
async fn scenarios_in_local_mode() {
    let r = responder();
    let hours = r.respond("What are the working hours?", &[], false, None::<&Fixed>).await;
    assert!(hours.contains("9:00 AM to 6:00 PM"));

    let resign = r.respond("I want to resign", &[], false, None::<&Fixed>).await;
    assert!(resign.contains("30 days notice period"));

    let other = r.respond("random gibberish xyz", &[], false, None::<&Fixed>).await;
    assert_eq!(other, hr_assistant::knowledge::DEFAULT_ANSWER);
}

#[tokio::test]
async fn failing_delegate_yields_error_and_local_answer() {
    let r = responder();
    let q = "How many sick leaves do I get?";
    let answer = r.respond(q, &[], true, Some(&AlwaysFails("connection reset"))).await;
    assert!(answer.contains("connection reset"));
    assert!(answer.contains(r.local_answer(q).as_str()));
}

#[tokio::test]
async fn succeeding_delegate_is_unmodified() {
    let r = responder();
    let text = "  **Remote** answer\n with odd spacing ";
    let answer = r.respond("dress code", &[], true, Some(&Fixed(text))).await;
    assert_eq!(answer, text);
}

#[tokio::test]
async fn dummy_provider_session_round_trip() {
    let cfg = Config::test_default();
    let mut session: Session<LlmProvider> = Session::start(&cfg, Arc::new(KnowledgeBase::builtin()));
    assert_eq!(session.status(), &SessionStatus::Remote { provider: "Dummy".into() });
    assert_eq!(session.ask("sick leave?").await, "[echo] sick leave?");
}

#[tokio::test]
async fn unconfigured_gemini_session_answers_locally() {
    let mut cfg = Config::test_default();
    cfg.llm.provider = "gemini".into();
    let mut session = Session::start(&cfg, Arc::new(KnowledgeBase::builtin()));
    assert_eq!(session.status(), &SessionStatus::Local);
    let answer = session.ask("Tell me about health insurance benefits").await;
    assert!(answer.contains("₹5 lakhs"));
    assert!(!answer.contains("error"));
}

#[tokio::test]
async fn unreachable_openai_endpoint_falls_back() {
    let mut cfg = Config::test_default();
    cfg.llm.provider = "openai".into();
    cfg.llm_api_key = Some("test-key".into());
    cfg.llm.openai.api_base_url = "http://127.0.0.1:9/v1/chat/completions".into();
    cfg.llm.openai.timeout_seconds = 2;

    let provider = providers::build(&cfg.llm, cfg.llm_api_key.clone(), String::new()).unwrap();
    let r = responder();
    let answer = r.respond("probation period?", &[], true, Some(&provider)).await;
    assert!(answer.starts_with("OpenAI error: technical issue:"));
    assert!(answer.ends_with(r.local_answer("probation period?").as_str()));
}
