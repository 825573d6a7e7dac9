//! Local HR knowledge base and keyword matcher.
//!
//! A [`KnowledgeBase`] is an immutable table: topics with canned markdown
//! answers, an ordered list of [`KeywordRule`]s, and a default answer.
//! [`KnowledgeBase::answer`] lower-cases the question and returns the topic
//! of the first rule that matches. Rule order is priority order, so a
//! question mentioning both "dress" and "maternity" resolves to the dress
//! code.
//!
//! The built-in table can be swapped for a TOML file:
//!
//! ```toml
//! default_answer = "Ask me about leave."
//!
//! [[topics]]
//! id = "sick_leave"
//! answer = "**Sick Leave Policy** ..."
//!
//! [[rules]]
//! topic = "sick_leave"
//! triggers = [["sick"]]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;

/// A named HR policy area with one canned answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Topic {
    pub id: String,
    pub answer: String,
}

/// Maps keyword triggers to a topic.
///
/// `triggers` is a disjunction of conjunctions: the rule matches when every
/// substring of at least one trigger occurs in the question.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordRule {
    pub topic: String,
    pub triggers: Vec<Vec<String>>,
}

impl KeywordRule {
    pub fn new(topic: &str, triggers: &[&[&str]]) -> Self {
        Self {
            topic: topic.to_string(),
            triggers: triggers
                .iter()
                .map(|t| t.iter().map(|s| s.to_lowercase()).collect())
                .collect(),
        }
    }

    /// `question` must already be lower-cased.
    fn matches(&self, question: &str) -> bool {
        self.triggers
            .iter()
            .any(|all| all.iter().all(|needle| question.contains(needle.as_str())))
    }
}

#[derive(Deserialize)]
struct RawKnowledge {
    default_answer: String,
    topics: Vec<Topic>,
    rules: Vec<KeywordRule>,
}

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    topics: Vec<Topic>,
    rules: Vec<KeywordRule>,
    default_answer: String,
}

pub const DEFAULT_ANSWER: &str = "I can help with HR policies including leaves, benefits, and company procedures. Please ask a specific question!";

const BUILTIN_TOPICS: &[(&str, &str)] = &[
    (
        "sick_leave",
        "**Sick Leave Policy**\n\n• 12 days per year\n• Medical certificate required for leaves beyond 3 days\n• Can be used for personal illness or medical appointments",
    ),
    (
        "dress_code",
        "**Dress Code Policy**\n\n• Business casual (Monday-Thursday)\n• Casual wear (Friday)\n• Formal attire for client meetings",
    ),
    (
        "health_insurance",
        "**Health Insurance**\n\n• Covers employee + family\n• ₹5 lakhs coverage per year\n• Includes hospitalization and OPD",
    ),
    (
        "working_hours",
        "**Working Hours**\n\n• 9:00 AM to 6:00 PM\n• Monday to Friday\n• 1 hour lunch break",
    ),
    (
        "maternity_leave",
        "**Maternity Leave**\n\n• 26 weeks fully paid\n• Apply 8 weeks before due date\n• Medical documentation required",
    ),
    (
        "paternity_leave",
        "**Paternity Leave**\n\n• 15 days fully paid\n• Use within 6 months of childbirth",
    ),
    (
        "annual_leave",
        "**Annual Leave**\n\n• 15 days per year (<5 years service)\n• 20 days (5+ years service)\n• Can carry forward 30 days",
    ),
    (
        "probation",
        "**Probation Period**\n\n• 6 months for new hires\n• Performance reviews at 3 and 6 months",
    ),
    (
        "resignation",
        "**Resignation Process**\n\n• 30 days notice period\n• Submit resignation to manager\n• Exit interview required",
    ),
];

impl KnowledgeBase {
    /// Build a table, checking that it is internally consistent.
    pub fn new(
        topics: Vec<Topic>,
        rules: Vec<KeywordRule>,
        default_answer: impl Into<String>,
    ) -> Result<Self, AppError> {
        let mut ids = HashSet::new();
        for t in &topics {
            if !ids.insert(t.id.as_str()) {
                return Err(AppError::Knowledge(format!("duplicate topic id '{}'", t.id)));
            }
        }

        let mut normalized = Vec::with_capacity(rules.len());
        for rule in rules {
            if !ids.contains(rule.topic.as_str()) {
                return Err(AppError::Knowledge(format!(
                    "rule references unknown topic '{}'",
                    rule.topic
                )));
            }
            let empty_trigger = rule.triggers.is_empty()
                || rule.triggers.iter().any(|t| t.is_empty() || t.iter().any(String::is_empty));
            if empty_trigger {
                return Err(AppError::Knowledge(format!(
                    "rule for '{}' has an empty trigger",
                    rule.topic
                )));
            }
            normalized.push(KeywordRule {
                triggers: rule
                    .triggers
                    .into_iter()
                    .map(|t| t.into_iter().map(|s| s.to_lowercase()).collect())
                    .collect(),
                topic: rule.topic,
            });
        }

        Ok(Self { topics, rules: normalized, default_answer: default_answer.into() })
    }

    /// The company's standard policy table.
    pub fn builtin() -> Self {
        let topics = BUILTIN_TOPICS
            .iter()
            .map(|(id, answer)| Topic { id: id.to_string(), answer: answer.to_string() })
            .collect();
        let rules = vec![
            KeywordRule::new("sick_leave", &[&["sick"]]),
            KeywordRule::new("dress_code", &[&["dress"]]),
            KeywordRule::new("health_insurance", &[&["health"], &["insurance"]]),
            KeywordRule::new("working_hours", &[&["work", "hour"]]),
            KeywordRule::new("maternity_leave", &[&["maternity"]]),
            KeywordRule::new("paternity_leave", &[&["paternity"]]),
            KeywordRule::new("annual_leave", &[&["annual"], &["vacation"]]),
            KeywordRule::new("probation", &[&["probation"]]),
            KeywordRule::new("resignation", &[&["resign"]]),
        ];
        Self { topics, rules, default_answer: DEFAULT_ANSWER.to_string() }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        let parsed: RawKnowledge = toml::from_str(raw)
            .map_err(|e| AppError::Knowledge(format!("parse error: {e}")))?;
        Self::new(parsed.topics, parsed.rules, parsed.default_answer)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| AppError::Knowledge(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Answer `question` from the table. Never fails.
    pub fn answer(&self, question: &str) -> &str {
        self.match_topic(question)
            .map(|t| t.answer.as_str())
            .unwrap_or(&self.default_answer)
    }

    /// The topic selected for `question`, or `None` for the default answer.
    pub fn match_topic(&self, question: &str) -> Option<&Topic> {
        let q = question.to_lowercase();
        let rule = self.rules.iter().find(|r| r.matches(&q))?;
        self.topic(&rule.topic)
    }

    pub fn topic(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    pub fn default_answer(&self) -> &str {
        &self.default_answer
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}
