//! Layered prompt builder for the remote model's system instruction.
//!
//! Prompts are assembled from plain-text template files under
//! `config/prompts/`. Missing files are skipped, so a deployment without
//! the directory still gets the built-in HR instruction via
//! [`hr_system_prompt`].
//!
//! Variable substitution uses `{{key}}` syntax and is applied once at
//! [`build()`](PromptBuilder::build) time, after all layers are joined.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const SEPARATOR: &str = "\n\n";

pub const HR_PROMPT_FILE: &str = "hr_assistant.txt";

const BUILTIN_HR_PROMPT: &str = "You are {{assistant_name}}, a professional HR Assistant. Answer HR questions clearly and helpfully.

Guidelines:
- Be professional and empathetic
- Provide accurate HR information
- Keep responses concise (2-3 paragraphs)
- Focus on leaves, benefits, policies, procedures";

pub struct PromptBuilder {
    prompts_dir: PathBuf,
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self { prompts_dir: prompts_dir.into(), parts: Vec::new(), vars: HashMap::new() }
    }

    /// Append a layer loaded from `filename` in the prompts directory.
    /// Silently skips the layer when the file does not exist.
    pub fn layer(mut self, filename: &str) -> Self {
        let path = self.prompts_dir.join(filename);
        match fs::read_to_string(&path) {
            Ok(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    self.parts.push(trimmed.to_string());
                }
            }
            Err(_) => {
                tracing::debug!("prompt: layer '{}' not found — skipped", path.display());
            }
        }
        self
    }

    pub fn append(mut self, text: impl Into<String>) -> Self {
        let s = text.into();
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            self.parts.push(trimmed.to_string());
        }
        self
    }

    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Join all layers with blank lines and apply variable substitution.
    pub fn build(self) -> String {
        let mut prompt = self.parts.join(SEPARATOR);
        for (k, v) in &self.vars {
            let placeholder = format!("{{{{{}}}}}", k);
            prompt = prompt.replace(&placeholder, v);
        }
        prompt
    }
}

/// The HR assistant's system instruction: `hr_assistant.txt` when present,
/// otherwise the built-in text.
pub fn hr_system_prompt(prompts_dir: impl AsRef<Path>, assistant_name: &str) -> String {
    let builder = PromptBuilder::new(prompts_dir.as_ref()).layer(HR_PROMPT_FILE);
    let builder = if builder.is_empty() { builder.append(BUILTIN_HR_PROMPT) } else { builder };
    builder.var("assistant_name", assistant_name).build()
}
