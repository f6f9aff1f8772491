// src/render/mod.rs

//! Render pipeline.
//!
//! The engine only talks to the traits defined here:
//! - [`FrontmatterParser`] splits a post source into metadata and body.
//! - [`MarkdownRenderer`] turns a markdown body into HTML.
//! - [`crate::template::TemplateEvaluator`] evaluates `{{ }}` expressions.
//!
//! [`RenderPipeline`] combines them to expand a layout around a post.

pub mod frontmatter;
pub mod markdown;
pub mod pipeline;

pub use frontmatter::{ExtractedFrontmatter, FrontmatterParser, YamlFrontmatter};
pub use markdown::{CommonMarkRenderer, MarkdownRenderer};
pub use pipeline::{RenderPipeline, RenderWarning, Rendered, post_context};
