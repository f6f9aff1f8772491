// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{RawSiteConfig, SiteConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawSiteConfig`.
///
/// This only performs JSON deserialization; it does **not** validate. Use
/// [`load_or_create`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSiteConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawSiteConfig = serde_json::from_str(&contents)?;

    Ok(config)
}

/// Load and validate the site config, writing a default one first when the
/// file does not exist yet.
pub fn load_or_create(path: impl AsRef<Path>) -> Result<SiteConfig> {
    let path = path.as_ref();

    if !path.exists() {
        let defaults = RawSiteConfig::default();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&defaults)?)?;
        info!(?path, "config file not found; wrote defaults");
    }

    let raw = load_from_path(path)?;
    SiteConfig::try_from(raw)
}

/// `blogwatch.json` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("blogwatch.json")
}

/// Figure out the site root for a config path.
///
/// - If the config path has a non-empty parent (e.g. "site/blogwatch.json"),
///   that directory is the root.
/// - A bare filename like "blogwatch.json" (parent = "") falls back to the
///   current working directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
