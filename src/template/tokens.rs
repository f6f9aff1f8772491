// src/template/tokens.rs

//! Token scanners for layout and fragment templates.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::template::context::TemplateValue;

/// `{% name key="value" other=3 %}`
pub static EMBED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{%\s*([A-Za-z0-9_-]+)((?:\s+[A-Za-z0-9_-]+\s*=\s*(?:"[^"]*"|[^\s"%]+))*)\s*%\}"#)
        .expect("embed token regex is valid")
});

/// `{{ expression }}`
pub static EXPRESSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("expression token regex is valid")
});

static EMBED_PROP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z0-9_-]+)\s*=\s*(?:"([^"]*)"|([^\s"%]+))"#)
        .expect("embed property regex is valid")
});

/// One parsed embed token.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedToken {
    pub name: String,
    pub props: BTreeMap<String, TemplateValue>,
}

impl EmbedToken {
    fn from_captures(caps: &Captures<'_>) -> Self {
        let name = caps[1].to_string();
        let props = caps
            .get(2)
            .map(|m| parse_props(m.as_str()))
            .unwrap_or_default();
        Self { name, props }
    }
}

/// Quoted values are always strings; bare values may be numbers or booleans.
fn parse_props(raw: &str) -> BTreeMap<String, TemplateValue> {
    EMBED_PROP
        .captures_iter(raw)
        .map(|caps| {
            let key = caps[1].to_string();
            let value = match (caps.get(2), caps.get(3)) {
                (Some(quoted), _) => TemplateValue::Str(quoted.as_str().to_string()),
                (None, Some(bare)) => TemplateValue::from_bare(bare.as_str()),
                (None, None) => TemplateValue::Str(String::new()),
            };
            (key, value)
        })
        .collect()
}

/// All embed tokens in `content`, in document order.
pub fn embed_tokens(content: &str) -> impl Iterator<Item = EmbedToken> + '_ {
    EMBED_TOKEN
        .captures_iter(content)
        .map(|caps| EmbedToken::from_captures(&caps))
}

/// Replace every embed token with the output of `replace`.
pub fn replace_embeds<F>(content: &str, mut replace: F) -> String
where
    F: FnMut(&EmbedToken) -> String,
{
    EMBED_TOKEN
        .replace_all(content, |caps: &Captures<'_>| {
            replace(&EmbedToken::from_captures(caps))
        })
        .into_owned()
}

/// Replace every expression token with the output of `replace`, which
/// receives the trimmed expression text.
pub fn replace_expressions<F>(content: &str, mut replace: F) -> String
where
    F: FnMut(&str) -> String,
{
    EXPRESSION_TOKEN
        .replace_all(content, |caps: &Captures<'_>| replace(&caps[1]))
        .into_owned()
}

/// Layout and fragment names share the embed token's name alphabet.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
