// src/config/validate.rs

use std::collections::HashSet;
use std::path::Path;

use globset::Glob;

use crate::config::model::{RawSiteConfig, SiteConfig};
use crate::errors::{BlogwatchError, Result};
use crate::template::tokens::is_valid_name;

impl TryFrom<RawSiteConfig> for SiteConfig {
    type Error = BlogwatchError;

    fn try_from(raw: RawSiteConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(SiteConfig::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawSiteConfig) -> Result<()> {
    validate_default_layout(cfg)?;
    validate_directories(cfg)?;
    validate_debounce(cfg)?;
    validate_ignore_globs(cfg)?;
    Ok(())
}

fn validate_default_layout(cfg: &RawSiteConfig) -> Result<()> {
    if !is_valid_name(&cfg.default_layout) {
        return Err(BlogwatchError::ConfigError(format!(
            "defaultLayout must be a layout name made of letters, digits, '-' or '_' (got {:?})",
            cfg.default_layout
        )));
    }
    Ok(())
}

fn validate_directories(cfg: &RawSiteConfig) -> Result<()> {
    let dirs = [
        ("outDir", &cfg.out_dir),
        ("postsDir", &cfg.posts_dir),
        ("layoutsDir", &cfg.layouts_dir),
        ("fragmentsDir", &cfg.fragments_dir),
        ("assetsDir", &cfg.assets_dir),
    ];

    let mut seen: HashSet<&str> = HashSet::new();
    for (key, dir) in dirs {
        let trimmed = dir.trim().trim_end_matches(['/', '\\']);
        if trimmed.is_empty() {
            return Err(BlogwatchError::ConfigError(format!(
                "{key} must not be empty"
            )));
        }
        if !seen.insert(trimmed) {
            return Err(BlogwatchError::ConfigError(format!(
                "{key} ({dir:?}) is used for more than one directory"
            )));
        }
    }

    // Writing output into a watched source tree would feed our own writes
    // back into the watchers.
    let out = Path::new(cfg.out_dir.trim());
    for (key, dir) in &dirs[1..] {
        let src = Path::new(dir.trim());
        if out.starts_with(src) || src.starts_with(out) {
            return Err(BlogwatchError::ConfigError(format!(
                "outDir ({:?}) must not overlap {key} ({dir:?})",
                cfg.out_dir
            )));
        }
    }

    Ok(())
}

fn validate_debounce(cfg: &RawSiteConfig) -> Result<()> {
    if cfg.debounce_ms == 0 {
        return Err(BlogwatchError::ConfigError(
            "debounceMs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_ignore_globs(cfg: &RawSiteConfig) -> Result<()> {
    for pattern in &cfg.ignore {
        Glob::new(pattern).map_err(|e| {
            BlogwatchError::ConfigError(format!("invalid ignore glob {pattern:?}: {e}"))
        })?;
    }
    Ok(())
}
