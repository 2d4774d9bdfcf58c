//! Relevance selection: let the model pick files from the repository
//! structure, then embed only those files.

use crate::domain::{PromptError, RepoSnapshot};
use crate::prompts;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use std::collections::HashSet;

lazy_static! {
    static ref QUOTED_RE: Regex = Regex::new(r#"'([^'\n]+)'|"([^"\n]+)""#).expect("quoted path regex");
    static ref PATH_TOKEN_RE: Regex = Regex::new(r"[\w./-]+").expect("path token regex");
}

pub fn relevance_prompt(snapshot: &RepoSnapshot, question: &str) -> Result<String, PromptError> {
    Ok(prompts::render(
        "file_selection",
        &json!({ "files": snapshot.file_list(), "question": question }),
    )?)
}

/// Paths named in a model reply, in order of first appearance.
///
/// Accepts a JSON array (bare or inside a code fence), falls back to quoted
/// strings, then to bare path-like tokens.
pub fn parse_path_list(text: &str) -> Vec<String> {
    if let Some(paths) = json_array(text) {
        return dedup(paths);
    }

    let quoted: Vec<String> = QUOTED_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !quoted.is_empty() {
        return dedup(quoted);
    }

    dedup(
        PATH_TOKEN_RE
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches('.'))
            .filter(|token| token.contains('/') || token.contains('.'))
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

fn json_array(text: &str) -> Option<Vec<String>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn dedup(paths: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

/// Content of the selected files; paths missing from the snapshot are skipped.
pub fn selected_content(snapshot: &RepoSnapshot, paths: &[String]) -> String {
    paths
        .iter()
        .filter_map(|path| {
            snapshot
                .get(path)
                .map(|content| format!("🔎 {path}:\n{content}\n"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevance_prompt_lists_paths_without_content() {
        let snapshot = RepoSnapshot::from([("src/a.rs", "SECRET"), ("b.md", "doc")]);
        let prompt = relevance_prompt(&snapshot, "where is a?").unwrap();
        assert!(prompt.contains("Repository Structure:\nb.md\nsrc/a.rs\n"));
        assert!(prompt.contains("Question: where is a?"));
        assert!(!prompt.contains("SECRET"));
    }

    #[test]
    fn parses_json_array_inside_fence() {
        let reply = "Here you go:\n```json\n[\"src/a.rs\", \"b.md\", \"src/a.rs\"]\n```";
        assert_eq!(parse_path_list(reply), vec!["src/a.rs", "b.md"]);
    }

    #[test]
    fn parses_python_style_quoted_list() {
        let reply = "['src/main.py', 'utils/io.py']";
        assert_eq!(parse_path_list(reply), vec!["src/main.py", "utils/io.py"]);
    }

    #[test]
    fn falls_back_to_path_tokens() {
        let reply = "Look at src/lib.rs and Cargo.toml.";
        assert_eq!(parse_path_list(reply), vec!["src/lib.rs", "Cargo.toml"]);
    }

    #[test]
    fn garbage_reply_yields_nothing() {
        assert!(parse_path_list("no idea").is_empty());
        assert!(parse_path_list("").is_empty());
    }

    #[test]
    fn selected_content_skips_unknown_paths() {
        let snapshot = RepoSnapshot::from([("a.rs", "fn a() {}")]);
        let out = selected_content(&snapshot, &["a.rs".into(), "ghost.rs".into()]);
        assert_eq!(out, "🔎 a.rs:\nfn a() {}\n");
    }
}
