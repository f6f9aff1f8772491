// src/template/mod.rs

//! Template syntax shared by layouts and fragments.
//!
//! - [`tokens`] scans `{% name key="value" %}` embed tokens and
//!   `{{ expression }}` tokens.
//! - [`deps`] derives a layout's fragment dependencies from its content.
//! - [`context`] is the value model handed to expressions.
//! - [`evaluator`] defines the `TemplateEvaluator` capability and the small
//!   expression language shipped by default.

pub mod context;
pub mod deps;
pub mod evaluator;
pub mod tokens;

pub use context::{TemplateContext, TemplateValue};
pub use deps::fragment_dependencies;
pub use evaluator::{EvalError, SimpleEvaluator, TemplateEvaluator};
pub use tokens::EmbedToken;
