//! Per-user conversation state.
//!
//! A [`Session`] owns the conversation log, the remote delegate (if any) and
//! the decision whether to use it. That decision is taken once in
//! [`Session::start_with`] and never revisited: a session that could not
//! build its delegate stays local for its whole lifetime, including across
//! [`Session::clear`].

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::knowledge::KnowledgeBase;
use crate::llm::{LlmProvider, ProviderError, providers};
use crate::message::Message;
use crate::prompt;
use crate::responder::{RemoteDelegate, Responder};

/// How the session answers, fixed at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Remote delegation is active.
    Remote { provider: String },
    /// No usable credentials; local knowledge only.
    Local,
    /// Credentials were present but the delegate could not be built.
    Degraded { error: String },
}

impl SessionStatus {
    /// The first assistant message of a session.
    pub fn greeting(&self) -> String {
        match self {
            SessionStatus::Remote { provider } => format!(
                "✅ **{provider} Connected!** Hello! I'm your AI HR Assistant. How can I help you today?"
            ),
            SessionStatus::Local => "ℹ️ **Local Mode** Hello! I'm your HR Assistant. Ask me about HR policies (using local knowledge base).".to_string(),
            SessionStatus::Degraded { error } => format!(
                "⚠️ **Local Mode** Hello! AI connection failed. Using local knowledge. Error: {error}"
            ),
        }
    }
}

pub struct Session<D = LlmProvider> {
    id: Uuid,
    responder: Responder,
    remote: Option<D>,
    status: SessionStatus,
    messages: Vec<Message>,
    last_question: String,
    history_limit: usize,
}

impl Session<LlmProvider> {
    /// Start a session backed by the configured provider.
    pub fn start(config: &Config, knowledge: Arc<KnowledgeBase>) -> Self {
        Self::start_with(config, knowledge, || {
            let system_prompt = prompt::hr_system_prompt(&config.prompts_dir, &config.assistant_name);
            providers::build(&config.llm, config.llm_api_key.clone(), system_prompt)
        })
    }
}

impl<D: RemoteDelegate> Session<D> {
    /// Start a session, calling `build` only when the configuration allows
    /// remote delegation. A `build` failure degrades the session to local.
    pub fn start_with<F>(config: &Config, knowledge: Arc<KnowledgeBase>, build: F) -> Self
    where
        F: FnOnce() -> Result<D, ProviderError>,
    {
        let id = Uuid::new_v4();
        let (remote, status) = if !config.is_configured() {
            info!(session_id = %id, provider = %config.llm.provider, "no usable API key; local mode");
            (None, SessionStatus::Local)
        } else {
            match build() {
                Ok(delegate) => {
                    let provider = delegate.label().to_string();
                    info!(session_id = %id, %provider, "remote delegate ready");
                    (Some(delegate), SessionStatus::Remote { provider })
                }
                Err(e) => {
                    warn!(session_id = %id, error = %e, "remote delegate construction failed; local mode");
                    (None, SessionStatus::Degraded { error: e.to_string() })
                }
            }
        };

        let greeting = Message::assistant(status.greeting());
        Self {
            id,
            responder: Responder::new(knowledge),
            remote,
            status,
            messages: vec![greeting],
            last_question: String::new(),
            history_limit: config.session.history_limit,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn remote_enabled(&self) -> bool {
        matches!(self.status, SessionStatus::Remote { .. })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Answer `question` and record both turns in the log.
    pub async fn ask(&mut self, question: &str) -> String {
        let start = self.messages.len().saturating_sub(self.history_limit);
        let history = &self.messages[start..];
        debug!(session_id = %self.id, history = history.len(), "answering question");

        let answer = self
            .responder
            .respond(question, history, self.remote_enabled(), self.remote.as_ref())
            .await;

        self.messages.push(Message::user(question));
        self.messages.push(Message::assistant(answer.clone()));
        answer
    }

    /// Typed input: ignores blank lines and an exact repeat of the previous
    /// submission.
    pub async fn submit(&mut self, input: &str) -> Option<String> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if input == self.last_question {
            debug!(session_id = %self.id, "duplicate question ignored");
            return None;
        }
        self.last_question = input.to_string();
        Some(self.ask(input).await)
    }

    /// Drop the log and the duplicate guard. The remote decision stays.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.last_question.clear();
        info!(session_id = %self.id, "conversation cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Echoes the question and records every history it was given.
    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<Vec<Message>>>,
    }

    impl RemoteDelegate for Recorder {
        fn label(&self) -> &str {
            "Recorder"
        }

        async fn generate(&self, question: &str, history: &[Message]) -> Result<String, ProviderError> {
            self.seen.borrow_mut().push(history.to_vec());
            Ok(format!("remote: {question}"))
        }
    }

    fn kb() -> Arc<KnowledgeBase> {
        Arc::new(KnowledgeBase::builtin())
    }

    fn keyed_config() -> Config {
        let mut cfg = Config::test_default();
        cfg.llm.provider = "gemini".into();
        cfg.llm_api_key = Some("real-key".into());
        cfg
    }

    #[test]
    fn unconfigured_session_is_local_and_never_builds() {
        let mut cfg = keyed_config();
        cfg.llm_api_key = None;
        let s: Session<Recorder> = Session::start_with(&cfg, kb(), || panic!("must not build"));
        assert_eq!(s.status(), &SessionStatus::Local);
        assert!(!s.remote_enabled());
        assert!(s.messages()[0].content.contains("Local Mode"));
    }

    #[test]
    fn build_failure_degrades() {
        let s: Session<Recorder> = Session::start_with(&keyed_config(), kb(), || {
            Err(ProviderError::Technical("no route".into()))
        });
        assert!(!s.remote_enabled());
        assert!(matches!(s.status(), SessionStatus::Degraded { error } if error.contains("no route")));
        assert!(s.messages()[0].content.contains("no route"));
    }

    #[test]
    fn build_success_enables_remote() {
        let s = Session::start_with(&keyed_config(), kb(), || Ok(Recorder::default()));
        assert!(s.remote_enabled());
        assert!(s.messages()[0].content.contains("Recorder Connected"));
    }

    #[tokio::test]
    async fn local_ask_records_turns() {
        let mut s: Session<Recorder> = Session::start_with(&Config::test_default(), kb(), || {
            Err(ProviderError::InvalidCredential)
        });
        let answer = s.ask("What are the working hours?").await;
        assert!(answer.contains("9:00 AM to 6:00 PM"));
        assert_eq!(s.messages().len(), 3);
        assert_eq!(s.messages()[1], Message::user("What are the working hours?"));
        assert_eq!(s.messages()[2].content, answer);
    }

    #[tokio::test]
    async fn remote_sees_prior_history_only() {
        let mut s = Session::start_with(&keyed_config(), kb(), || Ok(Recorder::default()));
        s.ask("first").await;
        s.ask("second").await;
        let seen = s.remote.as_ref().unwrap().seen.borrow().clone();
        assert_eq!(seen[0].len(), 1);
        assert_eq!(seen[1].len(), 3);
        assert_eq!(seen[1][1], Message::user("first"));
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let mut cfg = keyed_config();
        cfg.session.history_limit = 2;
        let mut s = Session::start_with(&cfg, kb(), || Ok(Recorder::default()));
        for q in ["a", "b", "c"] {
            s.ask(q).await;
        }
        let seen = s.remote.as_ref().unwrap().seen.borrow().clone();
        assert_eq!(seen[2], vec![Message::user("b"), Message::assistant("remote: b")]);
    }

    #[tokio::test]
    async fn submit_ignores_repeats_and_blanks() {
        let mut s: Session<Recorder> =
            Session::start_with(&Config::test_default(), kb(), || Err(ProviderError::QuotaExceeded));
        assert!(s.submit("   ").await.is_none());
        assert!(s.submit("sick leave?").await.is_some());
        assert!(s.submit(" sick leave? ").await.is_none());
        assert!(s.submit("dress code?").await.is_some());
        assert!(s.submit("sick leave?").await.is_some());
        assert_eq!(s.messages().len(), 7);
    }

    #[tokio::test]
    async fn ask_bypasses_duplicate_guard() {
        let mut s: Session<Recorder> =
            Session::start_with(&Config::test_default(), kb(), || Err(ProviderError::QuotaExceeded));
        s.submit("probation").await;
        s.ask("probation").await;
        assert_eq!(s.messages().len(), 5);
    }

    #[tokio::test]
    async fn clear_keeps_mode() {
        let mut s = Session::start_with(&keyed_config(), kb(), || Ok(Recorder::default()));
        s.submit("hello").await;
        s.clear();
        assert!(s.messages().is_empty());
        assert!(s.remote_enabled());
        assert_eq!(s.submit("hello").await.as_deref(), Some("remote: hello"));
    }
}
