//! Prompt assembly, one template per [`AgentKind`].
//!
//! Every function here is pure. The embedded code is cut to a hard character
//! budget on the serialized string, never per file.

use crate::application::change_impact::{diff_all, impact_prompt};
use crate::domain::{AgentKind, PromptError, RepoSnapshot};
use crate::infra::app_config::PromptLimits;
use crate::prompts;
use serde_json::json;

/// The first `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Everything a turn can feed into a prompt.
#[derive(Debug, Clone, Copy)]
pub struct TurnInput<'a> {
    pub snapshot: &'a RepoSnapshot,
    /// `snapshot.flatten()`, computed once per repository load.
    pub code: &'a str,
    pub instruction: &'a str,
    /// Default-branch snapshot, required for change analysis.
    pub reference: Option<&'a RepoSnapshot>,
}

#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    limits: PromptLimits,
}

impl PromptAssembler {
    pub fn new(limits: PromptLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &PromptLimits {
        &self.limits
    }

    pub fn assemble(&self, agent: AgentKind, input: &TurnInput<'_>) -> Result<String, PromptError> {
        match agent {
            AgentKind::CodebaseQa => self.qa(input.code, input.instruction),
            AgentKind::LowLevelDesign => self.low_level_design(input.code, input.instruction),
            AgentKind::CodeGeneration => self.code_generation(input.code, input.instruction),
            AgentKind::ChangeAnalysis => {
                let reference = input.reference.ok_or(PromptError::MissingReference)?;
                self.change_analysis(input.snapshot, reference)
            }
        }
    }

    pub fn qa(&self, code: &str, question: &str) -> Result<String, PromptError> {
        Ok(prompts::render(
            "qa",
            &json!({ "code": self.embed(code), "question": question }),
        )?)
    }

    pub fn low_level_design(&self, code: &str, feature: &str) -> Result<String, PromptError> {
        Ok(prompts::render(
            "low_level_design",
            &json!({ "code": self.embed(code), "feature": feature }),
        )?)
    }

    pub fn code_generation(&self, code: &str, task: &str) -> Result<String, PromptError> {
        Ok(prompts::render(
            "code_generation",
            &json!({ "code": self.embed(code), "task": task }),
        )?)
    }

    pub fn change_analysis(
        &self,
        current: &RepoSnapshot,
        reference: &RepoSnapshot,
    ) -> Result<String, PromptError> {
        let record = diff_all(current, reference);
        log::debug!(
            "Change analysis over {} changed files ({} diff chars)",
            record.changed_paths.len(),
            record.diff_text.len()
        );
        impact_prompt(&record, &self.limits)
    }

    fn embed<'a>(&self, code: &'a str) -> &'a str {
        truncate_chars(code, self.limits.code_chars)
    }
}
