// src/config/mod.rs

//! Site configuration for blogwatch.
//!
//! Responsibilities:
//! - Define the JSON-backed data model (`model.rs`).
//! - Load the config file from disk, creating it with defaults when it is
//!   missing (`loader.rs`).
//! - Validate basic invariants like distinct directories and compilable
//!   ignore globs (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_root_dir, default_config_path, load_from_path, load_or_create};
pub use model::{RawSiteConfig, SiteConfig, SitePaths};
