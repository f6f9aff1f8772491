// src/watch/filter.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::types::SourceKind;

/// Extensions a file in the posts directory must have to count as a post.
pub const POST_EXTENSIONS: &[&str] = &["md", "markdown", "html", "htm"];

/// Decides which files under a content directory are content at all.
///
/// Ignore globs are matched against the file name only, so `.*` hides
/// dot-files anywhere in the tree without having to spell out `**/`.
#[derive(Clone)]
pub struct SourceFilter {
    ignore: GlobSet,
    patterns: Vec<String>,
}

impl fmt::Debug for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFilter")
            .field("ignore", &self.patterns)
            .finish()
    }
}

impl SourceFilter {
    pub fn new(ignore: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in ignore {
            let glob = Glob::new(pattern)
                .with_context(|| format!("invalid ignore pattern '{pattern}'"))?;
            builder.add(glob);
        }
        Ok(Self {
            ignore: builder.build().context("building ignore glob set")?,
            patterns: ignore.to_vec(),
        })
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.ignore.is_match(Path::new(name)))
            .unwrap_or(true)
    }

    /// Whether `path` should be loaded as a source of `kind`.
    pub fn accepts(&self, kind: SourceKind, path: &Path) -> bool {
        if self.is_ignored(path) {
            return false;
        }
        match kind {
            SourceKind::Posts => has_post_extension(path),
            _ => true,
        }
    }
}

pub fn has_post_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            POST_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}
