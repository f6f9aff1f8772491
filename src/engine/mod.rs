// src/engine/mod.rs

//! Change propagation engine.
//!
//! - [`core`] is the pure planning half: it applies a [`ChangeEvent`] to the
//!   [`crate::site::SiteStore`] and returns the [`BuildCommand`]s that follow
//!   from it. No IO, no Tokio.
//! - [`propagator`] is the async shell that executes those commands: stale
//!   output removal first, then one render task per affected post.
//! - [`session`] wires config, loader, store, pipeline and writer together
//!   and runs the initial bulk build.

use std::path::PathBuf;

use crate::site::entity::{Fragment, Layout, Post, PostKey};
use crate::types::WriteOutcome;

/// A content unit was (re)loaded or removed.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    FragmentChanged(Fragment),
    FragmentRemoved(String),
    LayoutChanged(Layout),
    LayoutRemoved(String),
    PostChanged(Post),
    /// The source at `input_path` is gone. Only removes the cached post
    /// when it still comes from that file.
    PostRemoved { key: PostKey, input_path: PathBuf },
}

/// Work the async shell has to carry out after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildCommand {
    /// Delete a stale output file and prune its directory if left empty.
    RemoveOutput(PathBuf),
    /// Re-render these posts (each independently).
    RenderPosts(Vec<PostKey>),
}

/// Notifications emitted while commands execute.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    PostRendered {
        key: PostKey,
        output: PathBuf,
        outcome: WriteOutcome,
        warnings: usize,
    },
    PostFailed {
        key: PostKey,
        error: String,
    },
    OutputRemoved {
        path: PathBuf,
        pruned_dir: bool,
    },
}

pub mod core;
pub mod propagator;
pub mod session;

pub use self::core::{ChangeStep, apply_change, full_render};
pub use propagator::{Propagation, Propagator};
pub use session::{BuildReport, BuildSession, ScanReport};
