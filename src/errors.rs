// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only conditions that abort an operation live here. Recoverable render
//! problems (missing layout, missing fragment, failed expression) are
//! reported as [`crate::render::RenderWarning`]s instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlogwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("invalid frontmatter in {path:?}: {message}")]
    Frontmatter { path: PathBuf, message: String },

    #[error(
        "cannot resolve output path for {path:?}: file name has no YYYY-MM-DD- prefix and no `staticPath` metadata is set"
    )]
    UnresolvableOutputPath { path: PathBuf },

    #[error("invalid staticPath {static_path:?} in {path:?}: must be a relative path inside the output directory")]
    InvalidStaticPath { path: PathBuf, static_path: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BlogwatchError>;
