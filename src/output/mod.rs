// src/output/mod.rs

//! Output tree maintenance.
//!
//! [`writer::OutputWriter`] owns every mutation of the output directory:
//! rendered posts, stale-file removal with single-level pruning, and asset
//! copies. [`assets`] maps asset sources onto the output tree.

pub mod assets;
pub mod writer;

pub use assets::{asset_output_path, mirror_assets};
pub use writer::{OutputWriter, StaleRemoval};
