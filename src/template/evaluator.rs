// src/template/evaluator.rs

//! Expression evaluation for `{{ ... }}` tokens.
//!
//! The render pipeline owns the "never abort" contract: it calls
//! [`TemplateEvaluator::evaluate`] and turns every `Err` into empty text.
//! Implementations are therefore free to report failures precisely.

use std::fmt::Debug;

use thiserror::Error;

use crate::template::context::{TemplateContext, TemplateValue};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,

    #[error("undefined variable `{0}`")]
    Undefined(String),

    #[error("unsupported expression `{0}`")]
    Unsupported(String),
}

/// Capability interface for expression evaluation.
pub trait TemplateEvaluator: Send + Sync + Debug {
    fn evaluate(&self, expr: &str, ctx: &TemplateContext) -> Result<TemplateValue, EvalError>;
}

/// Minimal, side-effect free expression language.
///
/// ```text
/// expr    := operand ( "??" operand )*
/// operand := "string" | 'string' | number | true | false | path
/// path    := ident ( "." ident )*
/// ```
///
/// `a ?? b` yields `a` when it is defined and `b` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleEvaluator;

impl TemplateEvaluator for SimpleEvaluator {
    fn evaluate(&self, expr: &str, ctx: &TemplateContext) -> Result<TemplateValue, EvalError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(EvalError::Empty);
        }

        let mut last_err = EvalError::Empty;
        for operand in split_fallbacks(expr) {
            match eval_operand(operand.trim(), ctx) {
                Ok(value) => return Ok(value),
                // Only an undefined variable falls through to the next operand;
                // malformed syntax is reported as-is.
                Err(err @ EvalError::Undefined(_)) => last_err = err,
                Err(err) => return Err(err),
            }
        }
        Err(last_err)
    }
}

/// Split on `??` outside of string literals.
fn split_fallbacks(expr: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut chars = expr.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '?' && matches!(chars.peek(), Some((_, '?'))) => {
                parts.push(&expr[start..i]);
                chars.next();
                start = i + 2;
            }
            None => {}
        }
    }
    parts.push(&expr[start..]);
    parts
}

fn eval_operand(operand: &str, ctx: &TemplateContext) -> Result<TemplateValue, EvalError> {
    if operand.is_empty() {
        return Err(EvalError::Empty);
    }

    if let Some(lit) = string_literal(operand) {
        return Ok(TemplateValue::Str(lit.to_string()));
    }

    match operand {
        "true" => return Ok(TemplateValue::Bool(true)),
        "false" => return Ok(TemplateValue::Bool(false)),
        _ => {}
    }

    if operand.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        return operand
            .parse::<f64>()
            .map(TemplateValue::Num)
            .map_err(|_| EvalError::Unsupported(operand.to_string()));
    }

    if is_path(operand) {
        return ctx
            .get(operand)
            .cloned()
            .ok_or_else(|| EvalError::Undefined(operand.to_string()));
    }

    Err(EvalError::Unsupported(operand.to_string()))
}

fn string_literal(s: &str) -> Option<&str> {
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            let inner = &s[1..s.len() - 1];
            if !inner.contains(q) {
                return Some(inner);
            }
        }
    }
    None
}

fn is_path(s: &str) -> bool {
    s.split('.').all(|segment| {
        segment.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    })
}
