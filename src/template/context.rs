// src/template/context.rs

use std::collections::BTreeMap;
use std::fmt;

/// A scalar value visible to template expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl TemplateValue {
    /// Parse an unquoted literal: booleans and numbers are typed, anything
    /// else stays a string.
    pub fn from_bare(s: &str) -> Self {
        match s {
            "true" => TemplateValue::Bool(true),
            "false" => TemplateValue::Bool(false),
            _ => s
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(TemplateValue::Num)
                .unwrap_or_else(|| TemplateValue::Str(s.to_string())),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TemplateValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateValue::Str(s) => f.write_str(s),
            // Integral numbers print without a trailing ".0".
            TemplateValue::Num(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            TemplateValue::Num(n) => write!(f, "{n}"),
            TemplateValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::Str(s.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::Str(s)
    }
}

impl From<f64> for TemplateValue {
    fn from(n: f64) -> Self {
        TemplateValue::Num(n)
    }
}

impl From<bool> for TemplateValue {
    fn from(b: bool) -> Self {
        TemplateValue::Bool(b)
    }
}

/// Flat, ordered variable map used while rendering.
///
/// Nested names are stored with dotted keys (`post.title`, `props.level`),
/// which keeps lookups trivial and the iteration order stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    values: BTreeMap<String, TemplateValue>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TemplateValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Insert every entry of `values` under `prefix.`.
    pub fn insert_prefixed<'a, I>(&mut self, prefix: &str, values: I)
    where
        I: IntoIterator<Item = (&'a String, &'a TemplateValue)>,
    {
        for (key, value) in values {
            self.values.insert(format!("{prefix}.{key}"), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        self.values.get(key)
    }
}
