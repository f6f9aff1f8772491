// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - Subscribing to each content directory with `notify`.
//! - Turning raw notify events into per-path [`FsChange`]s.
//! - Debouncing them per path.
//! - Mapping debounced changes onto cache and output operations.
//!
//! It does **not** decide what has to be re-rendered; that is the engine's
//! job.

pub mod debounce;
pub mod event;
pub mod filter;
pub mod handler;
pub mod watcher;

pub use debounce::{ChangeHandler, Debouncer};
pub use event::{ChangeKind, FsChange, RenamePairing, changes_from_event};
pub use filter::SourceFilter;
pub use handler::SourceHandler;
pub use watcher::{WatcherHandle, spawn_site_watchers, spawn_watcher};
