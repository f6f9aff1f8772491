// src/render/markdown.rs

use std::fmt::Debug;

use pulldown_cmark::{Options, Parser, html};

pub trait MarkdownRenderer: Send + Sync + Debug {
    fn render(&self, body: &str) -> String;
}

/// CommonMark plus tables, strikethrough, footnotes and heading attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMarkRenderer;

impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, body: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options.insert(Options::ENABLE_FOOTNOTES);

        let parser = Parser::new_ext(body, options);
        let mut out = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}
