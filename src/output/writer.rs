// src/output/writer.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, trace};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::WriteOutcome;

/// What [`OutputWriter::remove_stale`] actually removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaleRemoval {
    pub removed_file: bool,
    pub pruned_dir: bool,
}

/// Serialised access to the output tree.
///
/// Operations on one output path are ordered by a per-path async mutex, so
/// two renders racing for the same file never interleave their writes. A
/// second set of locks, keyed by parent directory, keeps a prune of an
/// emptied directory from removing it under a sibling write. File locks are
/// always taken before directory locks, each set in sorted order. The
/// blocking filesystem work itself runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    fs: Arc<dyn FileSystem>,
    out_dir: PathBuf,
    files: Arc<PathLocks>,
    dirs: Arc<PathLocks>,
}

/// Async mutexes keyed by path, created on demand.
#[derive(Debug, Default)]
struct PathLocks {
    entries: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl PathLocks {
    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<AsyncMutex<()>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn len(&self) -> usize {
        self.entries().len()
    }

    /// Lock every path in `keys`, in sorted order.
    async fn lock_all(self: &Arc<Self>, mut keys: Vec<&Path>) -> Vec<PathGuard> {
        keys.sort();
        keys.dedup();
        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            let lock = Arc::clone(self.entries().entry(key.to_path_buf()).or_default());
            guards.push(PathGuard {
                locks: Arc::clone(self),
                key: key.to_path_buf(),
                guard: Some(lock.lock_owned().await),
            });
        }
        guards
    }
}

/// A held path lock. Releasing the last holder drops the map entry.
struct PathGuard {
    locks: Arc<PathLocks>,
    key: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut entries = self.locks.entries();
        // Waiters hold a clone of the Arc, so a count of one means idle.
        if entries.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            entries.remove(&self.key);
        }
    }
}

impl OutputWriter {
    pub fn new(fs: Arc<dyn FileSystem>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            out_dir: out_dir.into(),
            files: Arc::default(),
            dirs: Arc::default(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Number of file and directory locks currently tracked.
    pub fn active_locks(&self) -> usize {
        self.files.len() + self.dirs.len()
    }

    /// Lock `paths` and then their parent directories.
    async fn lock(&self, paths: &[&Path]) -> (Vec<PathGuard>, Vec<PathGuard>) {
        let files = self.files.lock_all(paths.to_vec()).await;
        let parents = paths.iter().filter_map(|p| p.parent()).collect();
        let dirs = self.dirs.lock_all(parents).await;
        (files, dirs)
    }

    /// Write `contents` to `path`, creating parent directories.
    ///
    /// Returns [`WriteOutcome::Unchanged`] without touching the file when it
    /// already holds the same bytes.
    pub async fn write(&self, path: &Path, contents: Vec<u8>) -> Result<WriteOutcome> {
        let _guards = self.lock(&[path]).await;
        let fs = Arc::clone(&self.fs);
        let path = path.to_path_buf();
        let outcome = tokio::task::spawn_blocking(move || write_if_changed(fs.as_ref(), &path, &contents))
            .await
            .context("output write task failed")??;
        Ok(outcome)
    }

    /// Delete `path` if present, then remove its parent directory if that
    /// left it empty. Only one level is pruned and never the output root.
    pub async fn remove_stale(&self, path: &Path) -> Result<StaleRemoval> {
        let _guards = self.lock(&[path]).await;
        let fs = Arc::clone(&self.fs);
        let out_dir = self.out_dir.clone();
        let target = path.to_path_buf();
        let removal = tokio::task::spawn_blocking(move || -> anyhow::Result<StaleRemoval> {
            let removed_file = fs.remove_file(&target)?;
            let pruned_dir = prune_parent(fs.as_ref(), &out_dir, &target)?;
            Ok(StaleRemoval {
                removed_file,
                pruned_dir,
            })
        })
        .await
        .context("output removal task failed")??;

        debug!(
            path = %path_display(&self.out_dir, path),
            removed_file = removal.removed_file,
            pruned_dir = removal.pruned_dir,
            "removed stale output"
        );
        Ok(removal)
    }

    /// Copy a source file byte-for-byte to `dest`.
    pub async fn copy_file(&self, src: &Path, dest: &Path) -> Result<WriteOutcome> {
        let fs = Arc::clone(&self.fs);
        let src_path = src.to_path_buf();
        let bytes = tokio::task::spawn_blocking(move || fs.read(&src_path))
            .await
            .context("asset read task failed")??;
        self.write(dest, bytes).await
    }

    /// Move an output file from `from` to `to`, pruning `from`'s parent if
    /// the move emptied it.
    pub async fn move_file(&self, from: &Path, to: &Path) -> Result<StaleRemoval> {
        let _guards = self.lock(&[from, to]).await;
        let fs = Arc::clone(&self.fs);
        let out_dir = self.out_dir.clone();
        let (from, to) = (from.to_path_buf(), to.to_path_buf());
        let removal = tokio::task::spawn_blocking(move || -> anyhow::Result<StaleRemoval> {
            if !fs.is_file(&from) {
                return Ok(StaleRemoval::default());
            }
            fs.rename(&from, &to)?;
            let pruned_dir = prune_parent(fs.as_ref(), &out_dir, &from)?;
            Ok(StaleRemoval {
                removed_file: true,
                pruned_dir,
            })
        })
        .await
        .context("output move task failed")??;
        Ok(removal)
    }
}

fn write_if_changed(fs: &dyn FileSystem, path: &Path, contents: &[u8]) -> anyhow::Result<WriteOutcome> {
    if fs.is_file(path) {
        if let Ok(existing) = fs.read(path) {
            if blake3::hash(&existing) == blake3::hash(contents) {
                trace!(?path, "output unchanged; skipping write");
                return Ok(WriteOutcome::Unchanged);
            }
        }
    }
    fs.write(path, contents)?;
    Ok(WriteOutcome::Written)
}

fn prune_parent(fs: &dyn FileSystem, out_dir: &Path, path: &Path) -> anyhow::Result<bool> {
    let Some(parent) = path.parent() else {
        return Ok(false);
    };
    if parent == out_dir || !parent.starts_with(out_dir) || !fs.is_dir(parent) {
        return Ok(false);
    }
    if !fs.read_dir(parent)?.is_empty() {
        return Ok(false);
    }
    fs.remove_dir(parent)
}

/// `path` relative to the output root, for log lines.
pub(crate) fn path_display(out_dir: &Path, path: &Path) -> String {
    path.strip_prefix(out_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
