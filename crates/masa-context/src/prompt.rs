use std::path::Path;

use anyhow::{Context, Result};

use crate::templates::DEFAULT_ASSISTANT_TEMPLATE;

const PLACEHOLDERS: [&str; 3] = ["{context}", "{conversation_context}", "{question}"];

/// Fills the assistant template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilder {
    template: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            template: DEFAULT_ASSISTANT_TEMPLATE.to_string(),
        }
    }
}

impl PromptBuilder {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        let missing: Vec<&str> = PLACEHOLDERS
            .iter()
            .copied()
            .filter(|p| !template.contains(p))
            .collect();
        if !missing.is_empty() {
            anyhow::bail!("Prompt template is missing placeholders: {}", missing.join(", "));
        }
        Ok(Self { template })
    }

    /// Load a template override from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt template {}", path.display()))?;
        Self::new(template)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Substitute all placeholders in one pass, so braces inside product
    /// text or the question are never re-expanded.
    pub fn build(&self, context: &str, history: &str, question: &str) -> String {
        let values = [context, history, question];
        let mut out = String::with_capacity(
            self.template.len() + context.len() + history.len() + question.len(),
        );
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            match PLACEHOLDERS.iter().position(|p| tail.starts_with(p)) {
                Some(i) => {
                    out.push_str(values[i]);
                    rest = &tail[PLACEHOLDERS[i].len()..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}
