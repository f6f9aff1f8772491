// src/watch/event.rs

//! Mapping raw `notify` events onto per-path changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::Event;
use tokio::time::Instant;

/// What happened to a path, as far as the build cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// One logical change to a single path.
///
/// A rename is delivered as a change of the new path with `renamed_from`
/// set, so the removal of the old identity and the load of the new one are
/// handled by the same worker in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub renamed_from: Option<PathBuf>,
}

impl FsChange {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            renamed_from: None,
        }
    }

    pub fn renamed(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            path: to.into(),
            kind: ChangeKind::Modified,
            renamed_from: Some(from.into()),
        }
    }

    /// Fold a later event for the same path into this one.
    ///
    /// The latest kind wins; a pending rename source is kept so the old
    /// identity is still removed.
    pub fn coalesce(&mut self, later: FsChange) {
        self.kind = later.kind;
        if later.renamed_from.is_some() {
            self.renamed_from = later.renamed_from;
        }
    }
}

/// Translate one `notify` event into per-path changes.
///
/// `exists` is consulted only for ambiguous events where the backend does
/// not say which side of a rename a path is on.
pub fn changes_from_event<F>(event: &Event, exists: F) -> Vec<FsChange>
where
    F: Fn(&Path) -> bool,
{
    let per_path = |kind: ChangeKind| {
        event
            .paths
            .iter()
            .map(|p| FsChange::new(p.clone(), kind))
            .collect::<Vec<_>>()
    };

    let by_existence = || {
        event
            .paths
            .iter()
            .map(|p| {
                let kind = if exists(p) {
                    ChangeKind::Modified
                } else {
                    ChangeKind::Removed
                };
                FsChange::new(p.clone(), kind)
            })
            .collect::<Vec<_>>()
    };

    match event.kind {
        EventKind::Create(_) => per_path(ChangeKind::Created),
        EventKind::Remove(_) => per_path(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::Both => match event.paths.as_slice() {
                [from, to] => vec![FsChange::renamed(from.clone(), to.clone())],
                _ => per_path(ChangeKind::Modified),
            },
            RenameMode::From => per_path(ChangeKind::Removed),
            RenameMode::To => per_path(ChangeKind::Modified),
            RenameMode::Any | RenameMode::Other => by_existence(),
        },
        EventKind::Modify(_) => per_path(ChangeKind::Modified),
        EventKind::Any => by_existence(),
        EventKind::Access(_) | EventKind::Other => Vec::new(),
    }
}

/// Joins the halves of a tracked rename.
///
/// Backends such as inotify report one rename as `Name(From)`, `Name(To)`
/// and finally `Name(Both)`, all sharing a tracker id. The `From` half is
/// held back; when the `Both` event arrives it is dropped, so the whole
/// rename is handled as one change of the new path. A `From` with no partner
/// inside `window` (a move out of the watched tree) is released as a
/// removal.
#[derive(Debug)]
pub struct RenamePairing {
    window: Duration,
    held: Vec<HeldSource>,
}

#[derive(Debug)]
struct HeldSource {
    tracker: usize,
    path: PathBuf,
    deadline: Instant,
}

impl RenamePairing {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            held: Vec::new(),
        }
    }

    /// Changes to dispatch for `event`, received at `now`.
    pub fn feed<F>(&mut self, event: &Event, exists: F, now: Instant) -> Vec<FsChange>
    where
        F: Fn(&Path) -> bool,
    {
        match (&event.kind, event.attrs.tracker()) {
            (EventKind::Modify(ModifyKind::Name(RenameMode::From)), Some(tracker)) => {
                let deadline = now + self.window;
                self.held.extend(event.paths.iter().map(|path| HeldSource {
                    tracker,
                    path: path.clone(),
                    deadline,
                }));
                Vec::new()
            }
            (EventKind::Modify(ModifyKind::Name(RenameMode::Both)), Some(tracker)) => {
                self.held.retain(|h| h.tracker != tracker);
                changes_from_event(event, exists)
            }
            _ => changes_from_event(event, exists),
        }
    }

    /// Earliest moment a held source must be released.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.held.iter().map(|h| h.deadline).min()
    }

    /// Release the held sources whose window ended at or before `now`.
    pub fn expire(&mut self, now: Instant) -> Vec<FsChange> {
        let (due, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.held)
            .into_iter()
            .partition(|h| h.deadline <= now);
        self.held = kept;
        due.into_iter()
            .map(|h| FsChange::new(h.path, ChangeKind::Removed))
            .collect()
    }

    /// Release everything still held.
    pub fn drain(&mut self) -> Vec<FsChange> {
        self.held
            .drain(..)
            .map(|h| FsChange::new(h.path, ChangeKind::Removed))
            .collect()
    }
}
