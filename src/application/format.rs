//! Best-effort restructuring of model output for display.
//!
//! Model responses are free-form text, so everything here is a heuristic over
//! markdown conventions. Each formatter is total: when extraction finds
//! nothing, the (bullet-normalized) input comes back unchanged.

use crate::domain::AgentKind;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADING_SPLIT_RE: Regex = Regex::new(r"(?m)^#+\s+").expect("heading split regex");
    static ref SECTION_TITLE_RE: Regex = Regex::new(r"^(\w+)(.*?)\n").expect("section title regex");
    static ref CODE_BLOCK_RE: Regex =
        Regex::new(r"(?s)```([\w+#.-]+)?\n(.*?)\n```").expect("code block regex");
    static ref ANY_FENCE_RE: Regex = Regex::new(r"(?s)```.*?```").expect("fence regex");
    static ref NUMBERED_ITEM_RE: Regex =
        Regex::new(r"(?m)^\d+\.[ \t]*([^:\n]+)(?::[ \t]*|[ \t]*$)").expect("numbered item regex");
    static ref TOP_LEVEL_NUMBER_RE: Regex = Regex::new(r"(?m)^\d+\.").expect("top-level number regex");
    static ref NUMBER_PREFIX_RE: Regex = Regex::new(r"^(?:\d+\.\s*)+").expect("number prefix regex");
    static ref DIFF_BLOCK_RE: Regex = Regex::new(r"(?s)```diff(.*?)```").expect("diff block regex");
    static ref FILE_LINE_RE: Regex = Regex::new(r"File:\s+(.+\.\w+)").expect("file line regex");
    static ref CODE_BODY_RE: Regex = Regex::new(r"(?s)```.*?\n(.*?)\n```").expect("code body regex");
    static ref COMPONENT_RE: Regex = Regex::new(r"Component:\s+(.+?)\n").expect("component regex");
    static ref INTERACTION_RE: Regex =
        Regex::new(r"Interaction:\s+(.+?)\n").expect("interaction regex");
}

const BULLET_GLYPH: char = '•';

pub fn format_response(raw: &str, agent: AgentKind) -> String {
    let text = raw.replace(BULLET_GLYPH, "-");
    let structured = match agent {
        AgentKind::CodebaseQa => None,
        AgentKind::LowLevelDesign => format_design(&text),
        AgentKind::CodeGeneration => format_code(&text),
        AgentKind::ChangeAnalysis => format_changes(&text),
    };
    structured.unwrap_or(text)
}

/// Re-emit each markdown section as `### <Title>` with its trimmed body.
fn format_design(text: &str) -> Option<String> {
    let sections: Vec<String> = HEADING_SPLIT_RE
        .split(text)
        .filter(|segment| !segment.trim().is_empty())
        .filter_map(|segment| {
            let caps = SECTION_TITLE_RE.captures(segment)?;
            let header_end = caps.get(0)?.end();
            let title = title_case(&caps[1]);
            Some(format!("### {title}\n{}", segment[header_end..].trim()))
        })
        .collect();

    (!sections.is_empty()).then(|| sections.join("\n\n"))
}

/// Normalize fenced code blocks and move the prose under an explanation heading.
fn format_code(text: &str) -> Option<String> {
    let mut parts: Vec<String> = CODE_BLOCK_RE
        .captures_iter(text)
        .map(|caps| {
            let lang = caps.get(1).map_or("", |m| m.as_str());
            format!("```{lang}\n{}\n```", caps[2].trim())
        })
        .collect();

    let explanation = ANY_FENCE_RE.replace_all(text, "");
    let explanation = explanation.trim();
    if !explanation.is_empty() {
        parts.push(format!("\n**Explanation**\n{explanation}"));
    }

    (!parts.is_empty()).then(|| parts.join("\n"))
}

/// Turn `N. Title: body` items into numbered `####` sections.
///
/// A body runs until the next line starting with a number and a dot, or the
/// end of the text. Titles never contain a colon.
fn format_changes(text: &str) -> Option<String> {
    let boundaries: Vec<usize> = TOP_LEVEL_NUMBER_RE
        .find_iter(text)
        .map(|m| m.start())
        .collect();

    let mut sections = Vec::new();
    for caps in NUMBERED_ITEM_RE.captures_iter(text) {
        let Some(item) = caps.get(0) else {
            continue;
        };
        let body_end = boundaries
            .iter()
            .copied()
            .find(|&start| start > item.start())
            .unwrap_or(text.len());
        let body = text.get(item.end()..body_end).unwrap_or_default().trim();

        let raw_title = caps[1].trim();
        let title = title_case(NUMBER_PREFIX_RE.replace(raw_title, "").trim());
        sections.push(format!("#### {}. {title}\n{body}\n", sections.len() + 1));
    }

    if sections.is_empty() {
        return None;
    }

    if let Some(diff) = DIFF_BLOCK_RE.captures(text) {
        sections.insert(0, format!("```diff\n{}\n```\n", diff[1].trim()));
    }

    Some(sections.join("\n"))
}

/// Uppercase the first letter of every word and lowercase the rest.
pub(crate) fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_cased = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(c);
            prev_cased = false;
        }
    }
    out
}

/// Structured fields pulled out of a raw model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    Code {
        files: Vec<String>,
        code: Vec<String>,
        explanation: String,
    },
    Design {
        components: Vec<String>,
        interactions: Vec<String>,
    },
    Raw(String),
}

pub fn parse_response(raw: &str, agent: AgentKind) -> ParsedResponse {
    match agent {
        AgentKind::CodeGeneration => ParsedResponse::Code {
            files: capture_all(&FILE_LINE_RE, raw),
            code: capture_all(&CODE_BODY_RE, raw),
            explanation: ANY_FENCE_RE.replace_all(raw, "").into_owned(),
        },
        AgentKind::LowLevelDesign => ParsedResponse::Design {
            components: capture_all(&COMPONENT_RE, raw),
            interactions: capture_all(&INTERACTION_RE, raw),
        },
        AgentKind::CodebaseQa | AgentKind::ChangeAnalysis => ParsedResponse::Raw(raw.to_string()),
    }
}

fn capture_all(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
