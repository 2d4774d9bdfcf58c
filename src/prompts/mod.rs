use handlebars::Handlebars;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;

static PROMPT_REGISTRY: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("qa", include_str!("qa.hbs"));
    m.insert("low_level_design", include_str!("low_level_design.hbs"));
    m.insert("code_generation", include_str!("code_generation.hbs"));
    m.insert("change_analysis", include_str!("change_analysis.hbs"));
    m.insert("file_selection", include_str!("file_selection.hbs"));
    m.insert("codebase_preamble", include_str!("codebase_preamble.hbs"));
    m
});

/// Render a prompt by name using Handlebars.
///
/// Usage:
///     render("qa", json!({"code": "...", "question": "..."}))
///
/// Values are inserted verbatim: prompts carry source code, so HTML escaping
/// is disabled.
pub fn render(name: &str, ctx: &Value) -> anyhow::Result<String> {
    let template = PROMPT_REGISTRY
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("unknown prompt '{name}'"))?;

    let mut hb = Handlebars::new();
    hb.set_strict_mode(true); // fail if a variable is missing
    hb.register_escape_fn(handlebars::no_escape);

    hb.render_template(template, ctx)
        .map_err(|e| anyhow::anyhow!("rendering prompt '{name}' failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_without_html_escaping() {
        let out = render(
            "qa",
            &json!({"code": "if a < b && c > d {}", "question": "what's \"this\"?"}),
        )
        .unwrap();
        assert!(out.contains("if a < b && c > d {}"));
        assert!(out.contains("Question: what's \"this\"?"));
    }

    #[test]
    fn missing_variable_is_an_error() {
        let err = render("qa", &json!({"code": "x"})).unwrap_err();
        assert!(err.to_string().contains("qa"));
    }

    #[test]
    fn unknown_prompt_is_an_error() {
        assert!(render("poem", &json!({})).is_err());
    }
}
