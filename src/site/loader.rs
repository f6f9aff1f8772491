// src/site/loader.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate};
use tracing::{debug, warn};

use crate::errors::{BlogwatchError, Result};
use crate::fs::FileSystem;
use crate::render::frontmatter::FrontmatterParser;
use crate::site::entity::{Fragment, Layout, Metadata, Post, PostKey};
use crate::site::paths::{entity_name, is_markdown, parse_post_file_name, resolve_output_path};
use crate::template::context::TemplateValue;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reads source files into entities.
///
/// All IO is synchronous; async callers run it under `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    fs: Arc<dyn FileSystem>,
    frontmatter: Arc<dyn FrontmatterParser>,
    out_dir: PathBuf,
    default_layout: String,
}

impl SourceLoader {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        frontmatter: Arc<dyn FrontmatterParser>,
        out_dir: impl Into<PathBuf>,
        default_layout: impl Into<String>,
    ) -> Self {
        Self {
            fs,
            frontmatter,
            out_dir: out_dir.into(),
            default_layout: default_layout.into(),
        }
    }

    pub fn read_fragment(&self, path: &Path) -> Result<Fragment> {
        let name = self.name_of(path)?;
        let content = self.fs.read_to_string(path)?;
        Ok(Fragment::new(name, content))
    }

    pub fn read_layout(&self, path: &Path) -> Result<Layout> {
        let name = self.name_of(path)?;
        let content = self.fs.read_to_string(path)?;
        let layout = Layout::new(name, content);
        debug!(
            layout = layout.name(),
            deps = ?layout.fragment_dependencies(),
            "layout loaded"
        );
        Ok(layout)
    }

    /// Parse a post source file.
    ///
    /// Frontmatter keys `layout`, `title`, `staticPath`, `createdAt` and
    /// `updatedAt` are consumed; every other scalar stays in
    /// [`Post::metadata`].
    pub fn read_post(&self, path: &Path) -> Result<Post> {
        let raw = self.fs.read_to_string(path)?;
        let extracted = self
            .frontmatter
            .extract(&raw)
            .map_err(|e| BlogwatchError::Frontmatter {
                path: path.to_path_buf(),
                message: format!("{e:#}"),
            })?;
        let mut metadata = extracted.metadata;

        let layout_name = take_string(&mut metadata, "layout")
            .unwrap_or_else(|| self.default_layout.clone());
        let title = take_string(&mut metadata, "title");
        let static_path = take_string(&mut metadata, "staticPath");
        let created_meta = take_date(&mut metadata, "createdAt", path);
        let updated_at = take_date(&mut metadata, "updatedAt", path);

        let file_name = parse_post_file_name(path);
        let output_path =
            resolve_output_path(&self.out_dir, path, &file_name, static_path.as_deref())?;

        let created_at = match (file_name.date, created_meta) {
            (Some(date), _) => date,
            (None, Some(date)) => date,
            (None, None) => {
                warn!(
                    path = %path.display(),
                    "post has no date in its file name or metadata; using file creation date"
                );
                self.creation_date(path)?
            }
        };

        Ok(Post {
            key: PostKey::new(title.unwrap_or(file_name.slug), created_at),
            layout_name,
            body: extracted.body,
            markdown: is_markdown(path),
            input_path: path.to_path_buf(),
            output_path,
            updated_at,
            metadata,
        })
    }

    fn name_of(&self, path: &Path) -> Result<String> {
        entity_name(path).ok_or_else(|| {
            BlogwatchError::Other(anyhow::anyhow!("cannot derive a name from {:?}", path))
        })
    }

    fn creation_date(&self, path: &Path) -> Result<NaiveDate> {
        let created = self.fs.created(path)?;
        Ok(DateTime::<Local>::from(created).date_naive())
    }
}

fn take_string(metadata: &mut Metadata, key: &str) -> Option<String> {
    metadata
        .remove(key)
        .map(|v| v.to_string())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn take_date(metadata: &mut Metadata, key: &str, path: &Path) -> Option<NaiveDate> {
    let value = metadata.remove(key)?;
    let text = match &value {
        TemplateValue::Str(s) => s.trim(),
        _ => {
            warn!(path = %path.display(), key, value = %value, "ignoring non-text date");
            return None;
        }
    };
    // Accept full timestamps by only reading the date part.
    let date_part = text.get(..10).unwrap_or(text);
    match NaiveDate::parse_from_str(date_part, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(path = %path.display(), key, value = text, error = %e, "ignoring unparsable date");
            None
        }
    }
}
