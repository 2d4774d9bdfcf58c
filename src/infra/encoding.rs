//! Byte-to-text resolution for ingested files.
//!
//! `resolve` always returns a string. Content that cannot be decoded is
//! replaced by one of the placeholder markers below so that every file in a
//! snapshot has a value.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use serde::Deserialize;
use std::path::Path;

pub const BINARY_PLACEHOLDER: &str = "binary file (not shown)";
pub const INVALID_NOTEBOOK_PLACEHOLDER: &str = "invalid notebook format";

/// Leading window inspected for NUL bytes, same as git's binary heuristic.
const BINARY_SNIFF_LEN: usize = 8000;

/// Share of control characters above which a decoded text is treated as binary.
const MAX_CONTROL_RATIO: f64 = 0.1;

/// Placeholder for a file that could not be read or resolved.
pub fn processing_error_placeholder(cause: impl std::fmt::Display) -> String {
    format!("file processing error: {cause}")
}

pub fn resolve(path: &Path, bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    if is_notebook(path) {
        return notebook_text(bytes).unwrap_or_else(|| INVALID_NOTEBOOK_PLACEHOLDER.to_string());
    }

    decode_text(bytes).unwrap_or_else(|| {
        log::debug!("No text encoding inferred for {}", path.display());
        BINARY_PLACEHOLDER.to_string()
    })
}

fn is_notebook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ipynb"))
}

#[derive(Debug, Deserialize)]
struct Notebook {
    #[serde(default)]
    cells: Vec<NotebookCell>,
}

#[derive(Debug, Deserialize)]
struct NotebookCell {
    #[serde(default)]
    cell_type: String,
    #[serde(default)]
    source: CellSource,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CellSource {
    Text(String),
    Lines(Vec<String>),
}

impl Default for CellSource {
    fn default() -> Self {
        CellSource::Text(String::new())
    }
}

impl CellSource {
    fn joined(&self) -> String {
        match self {
            CellSource::Text(text) => text.clone(),
            CellSource::Lines(lines) => lines.concat(),
        }
    }
}

/// Markdown and code cell sources in document order, one cell per line group.
fn notebook_text(bytes: &[u8]) -> Option<String> {
    let notebook: Notebook = serde_json::from_slice(bytes).ok()?;
    let sources: Vec<String> = notebook
        .cells
        .iter()
        .filter(|cell| matches!(cell.cell_type.as_str(), "markdown" | "code"))
        .map(|cell| cell.source.joined())
        .collect();
    Some(sources.join("\n"))
}

fn decode_text(bytes: &[u8]) -> Option<String> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
        return (!had_errors).then(|| text.into_owned());
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        if text.contains('\0') {
            return None;
        }
        return Some(text.to_string());
    }

    let window = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    if window.contains(&0) {
        return None;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, false);
    let text = encoding.decode_without_bom_handling_and_without_replacement(bytes)?;

    if looks_binary(&text) {
        return None;
    }
    Some(text.into_owned())
}

fn looks_binary(text: &str) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return false;
    }
    let control = text
        .chars()
        .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\x0c' | '\x1b'))
        .count();
    (control as f64 / total as f64) > MAX_CONTROL_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytes_resolve_to_empty_string() {
        assert_eq!(resolve(Path::new("empty.txt"), b""), "");
        assert_eq!(resolve(Path::new("no_ext"), b""), "");
        assert_eq!(resolve(Path::new("nb.ipynb"), b""), "");
    }

    #[test]
    fn utf8_text_is_kept_verbatim() {
        let text = "fn main() {\n    println!(\"héllo ✓\");\n}\n";
        assert_eq!(resolve(Path::new("src/main.rs"), text.as_bytes()), text);
    }

    #[test]
    fn latin1_text_is_decoded_through_detection() {
        let bytes: Vec<u8> =
            b"Le caf\xe9 est servi, une recette fran\xe7aise tr\xe8s appr\xe9ci\xe9e\n".to_vec();
        let out = resolve(Path::new("menu.txt"), &bytes);
        assert_ne!(out, BINARY_PLACEHOLDER);
        assert!(out.contains("café"), "got {out:?}");
        assert!(out.contains("appréciée"), "got {out:?}");
    }

    #[test]
    fn utf16_with_bom_is_decoded() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "hello".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(resolve(Path::new("wide.txt"), &bytes), "hello");
    }

    #[test]
    fn binary_bytes_get_placeholder() {
        let bytes = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0xFF];
        assert_eq!(resolve(Path::new("logo.png"), &bytes), BINARY_PLACEHOLDER);
    }

    #[test]
    fn notebook_keeps_markdown_and_code_cells_in_order() {
        let nb = br##"{
            "cells": [
                {"cell_type": "markdown", "source": ["# Title\n", "intro"]},
                {"cell_type": "raw", "source": "ignored"},
                {"cell_type": "code", "source": "x = 1"}
            ],
            "nbformat": 4
        }"##;
        assert_eq!(resolve(Path::new("analysis.ipynb"), nb), "# Title\nintro\nx = 1");
    }

    #[test]
    fn malformed_notebook_gets_placeholder() {
        assert_eq!(
            resolve(Path::new("broken.IPYNB"), b"{not json"),
            INVALID_NOTEBOOK_PLACEHOLDER
        );
    }

    #[test]
    fn arbitrary_bytes_never_panic() {
        let samples: Vec<Vec<u8>> = vec![
            (0u8..=255).collect(),
            vec![0xC3],
            vec![0xFE, 0xFF, 0xD8],
            vec![b'a'; 10_000],
            (0u8..=255).rev().cycle().take(20_000).collect(),
        ];
        for bytes in samples {
            let _ = resolve(Path::new("blob.bin"), &bytes);
            let _ = resolve(Path::new("blob.ipynb"), &bytes);
        }
    }
}
