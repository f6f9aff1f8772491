// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::SourceKind;

/// Site configuration exactly as read from (or written to) `blogwatch.json`.
///
/// ```json
/// {
///   "defaultLayout": "default",
///   "serveCommand": "python3 -m http.server --directory",
///   "outDir": "publish",
///   "debounceMs": 100
/// }
/// ```
///
/// Every key is optional. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSiteConfig {
    /// Layout used when a post names none, or names one that does not exist.
    pub default_layout: String,

    /// Preview server started after the initial build in watch mode. The
    /// output directory is appended as the last argument.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serve_command: Option<String>,

    pub out_dir: String,
    pub posts_dir: String,
    pub layouts_dir: String,
    pub fragments_dir: String,
    pub assets_dir: String,

    /// Window in which successive events for one path are coalesced.
    pub debounce_ms: u64,

    /// Globs (matched against file names) that are never treated as content.
    pub ignore: Vec<String>,
}

impl Default for RawSiteConfig {
    fn default() -> Self {
        Self {
            default_layout: "default".to_string(),
            serve_command: None,
            out_dir: "publish".to_string(),
            posts_dir: "posts".to_string(),
            layouts_dir: "layouts".to_string(),
            fragments_dir: "fragments".to_string(),
            assets_dir: "wwwroot".to_string(),
            debounce_ms: 100,
            ignore: vec![
                ".*".to_string(),
                "*~".to_string(),
                "*.swp".to_string(),
                "*.tmp".to_string(),
            ],
        }
    }
}

/// Validated site configuration.
///
/// Only obtainable through `SiteConfig::try_from(RawSiteConfig)`, which runs
/// the checks in `validate.rs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    raw: RawSiteConfig,
}

impl SiteConfig {
    pub(crate) fn new_unchecked(raw: RawSiteConfig) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &RawSiteConfig {
        &self.raw
    }

    pub fn default_layout(&self) -> &str {
        &self.raw.default_layout
    }

    pub fn serve_command(&self) -> Option<&str> {
        self.raw
            .serve_command
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.raw.debounce_ms)
    }

    pub fn ignore(&self) -> &[String] {
        &self.raw.ignore
    }

    /// Resolve every configured directory against the site root.
    pub fn paths(&self, root: &Path) -> SitePaths {
        SitePaths {
            root: root.to_path_buf(),
            out: root.join(&self.raw.out_dir),
            posts: root.join(&self.raw.posts_dir),
            layouts: root.join(&self.raw.layouts_dir),
            fragments: root.join(&self.raw.fragments_dir),
            assets: root.join(&self.raw.assets_dir),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::new_unchecked(RawSiteConfig::default())
    }
}

/// Absolute (or root-relative) locations of the site directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub root: PathBuf,
    pub out: PathBuf,
    pub posts: PathBuf,
    pub layouts: PathBuf,
    pub fragments: PathBuf,
    pub assets: PathBuf,
}

impl SitePaths {
    pub fn source_dir(&self, kind: SourceKind) -> &Path {
        match kind {
            SourceKind::Posts => &self.posts,
            SourceKind::Layouts => &self.layouts,
            SourceKind::Fragments => &self.fragments,
            SourceKind::Assets => &self.assets,
        }
    }
}
