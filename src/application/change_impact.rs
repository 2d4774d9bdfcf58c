//! Change-impact analysis between the loaded branch and a reference branch.

use crate::application::prompt::truncate_chars;
use crate::domain::{PromptError, RepoSnapshot};
use crate::infra::app_config::PromptLimits;
use crate::infra::diff::{DiffStat, line_stats, unified_diff};
use crate::prompts;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

/// Difference between two snapshots. Computed on demand, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffRecord {
    pub changed_paths: BTreeSet<String>,
    /// Concatenated unified diffs, in path order.
    pub diff_text: String,
    pub stats: BTreeMap<String, DiffStat>,
}

impl DiffRecord {
    pub fn is_empty(&self) -> bool {
        self.changed_paths.is_empty()
    }

    /// One `- path (+added/-removed)` line per changed file.
    pub fn changed_files_summary(&self) -> String {
        self.changed_paths
            .iter()
            .map(|path| {
                let stat = self.stats.get(path).copied().unwrap_or_default();
                format!("- {path} (+{}/-{})", stat.added, stat.removed)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Diff every path present in either snapshot, reference side as the original.
///
/// A path counts as changed when it exists on one side only or its content
/// differs. Pure: no disk or network access.
pub fn diff_all(current: &RepoSnapshot, reference: &RepoSnapshot) -> DiffRecord {
    let paths: BTreeSet<&str> = current.paths().chain(reference.paths()).collect();

    let mut record = DiffRecord::default();
    for path in paths {
        let before = reference.get(path);
        let after = current.get(path);
        if before == after {
            continue;
        }

        let original = before.unwrap_or_default();
        let modified = after.unwrap_or_default();
        record
            .diff_text
            .push_str(&unified_diff(path, original, modified));
        record
            .stats
            .insert(path.to_string(), line_stats(original, modified));
        record.changed_paths.insert(path.to_string());
    }
    record
}

pub fn impact_prompt(record: &DiffRecord, limits: &PromptLimits) -> Result<String, PromptError> {
    let changed_files = if record.is_empty() {
        "(none)".to_string()
    } else {
        record.changed_files_summary()
    };

    let prompt = prompts::render(
        "change_analysis",
        &json!({
            "changed_files": changed_files,
            "diff": truncate_chars(&record.diff_text, limits.diff_chars),
        }),
    )?;
    Ok(prompt)
}
