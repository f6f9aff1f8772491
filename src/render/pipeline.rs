// src/render/pipeline.rs

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::render::markdown::{CommonMarkRenderer, MarkdownRenderer};
use crate::site::entity::{Fragment, Layout, Post};
use crate::template::context::TemplateContext;
use crate::template::evaluator::{EvalError, SimpleEvaluator, TemplateEvaluator};
use crate::template::tokens::{replace_embeds, replace_expressions};

/// Recoverable problem found while rendering one post.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderWarning {
    /// The post's layout does not exist; `used` was rendered instead.
    MissingLayout { requested: String, used: String },
    /// An embed token names a fragment that does not exist.
    MissingFragment { name: String },
    /// An expression failed and was replaced by empty text.
    ExpressionFailed { expr: String, error: EvalError },
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderWarning::MissingLayout { requested, used } => {
                write!(f, "layout `{requested}` not found; using `{used}`")
            }
            RenderWarning::MissingFragment { name } => {
                write!(f, "fragment `{name}` not found; substituted empty text")
            }
            RenderWarning::ExpressionFailed { expr, error } => {
                write!(f, "expression `{expr}` failed ({error}); substituted empty text")
            }
        }
    }
}

/// Output of one render.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub html: String,
    pub warnings: Vec<RenderWarning>,
}

/// Expands a layout around a post.
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    markdown: Arc<dyn MarkdownRenderer>,
    evaluator: Arc<dyn TemplateEvaluator>,
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new(Arc::new(CommonMarkRenderer), Arc::new(SimpleEvaluator))
    }
}

impl RenderPipeline {
    pub fn new(
        markdown: Arc<dyn MarkdownRenderer>,
        evaluator: Arc<dyn TemplateEvaluator>,
    ) -> Self {
        Self {
            markdown,
            evaluator,
        }
    }

    /// Render `post` inside `layout`.
    ///
    /// Never fails: missing fragments and broken expressions become empty
    /// text and are reported in [`Rendered::warnings`].
    pub fn render_post<F>(&self, post: &Post, layout: &Layout, fragments: F, out_dir: &Path) -> Rendered
    where
        F: Fn(&str) -> Option<Fragment>,
    {
        let mut warnings = Vec::new();

        let body_html = if post.markdown {
            self.markdown.render(&post.body)
        } else {
            post.body.clone()
        };

        let ctx = post_context(post, layout.name(), &body_html, out_dir);
        let expanded = self.expand_fragments(layout.content(), &fragments, &ctx, &mut warnings);
        let html = self.substitute_expressions(&expanded, &ctx, &mut warnings);

        Rendered { html, warnings }
    }

    /// Replace each embed token with the named fragment's content, whose
    /// expressions see the token's properties as `props.*`.
    pub fn expand_fragments<F>(
        &self,
        layout_content: &str,
        fragments: &F,
        ctx: &TemplateContext,
        warnings: &mut Vec<RenderWarning>,
    ) -> String
    where
        F: Fn(&str) -> Option<Fragment>,
    {
        replace_embeds(layout_content, |token| match fragments(&token.name) {
            Some(fragment) => {
                let mut scoped = ctx.clone();
                scoped.insert_prefixed("props", &token.props);
                self.substitute_expressions(fragment.content(), &scoped, warnings)
            }
            None => {
                warn!(fragment = %token.name, "fragment not found; substituting empty text");
                warnings.push(RenderWarning::MissingFragment {
                    name: token.name.clone(),
                });
                String::new()
            }
        })
    }

    /// Replace each `{{ expr }}` with its value. Failures become `""`.
    pub fn substitute_expressions(
        &self,
        text: &str,
        ctx: &TemplateContext,
        warnings: &mut Vec<RenderWarning>,
    ) -> String {
        replace_expressions(text, |expr| match self.evaluator.evaluate(expr, ctx) {
            Ok(value) => value.to_string(),
            Err(error) => {
                debug!(expr, %error, "expression failed; substituting empty text");
                warnings.push(RenderWarning::ExpressionFailed {
                    expr: expr.to_string(),
                    error,
                });
                String::new()
            }
        })
    }
}

/// Variables visible to a post's layout and fragments.
pub fn post_context(post: &Post, layout_name: &str, body_html: &str, out_dir: &Path) -> TemplateContext {
    let mut ctx = TemplateContext::new();
    // Custom metadata first so the fixed keys below always win.
    ctx.insert_prefixed("post", &post.metadata);

    ctx.insert("content", body_html);
    ctx.insert("post.title", post.title());
    ctx.insert("post.createdAt", post.created_at().format("%Y-%m-%d").to_string());
    if let Some(updated) = post.updated_at {
        ctx.insert("post.updatedAt", updated.format("%Y-%m-%d").to_string());
    }
    ctx.insert("post.layout", layout_name);
    if let Ok(rel) = post.output_path().strip_prefix(out_dir) {
        ctx.insert("post.url", format!("/{}", rel.to_string_lossy().replace('\\', "/")));
    }
    ctx.insert("layout.name", layout_name);
    ctx
}
