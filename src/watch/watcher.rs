// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, trace};

use crate::engine::session::BuildSession;
use crate::types::SourceKind;
use crate::watch::debounce::{ChangeHandler, Debouncer};
use crate::watch::event::{ChangeKind, FsChange, RenamePairing};
use crate::watch::filter::SourceFilter;
use crate::watch::handler::SourceHandler;

/// Handle for one directory watcher.
///
/// Dropping it stops the `notify` subscription, which in turn ends the
/// dispatch loop and lets pending path workers finish.
pub struct WatcherHandle {
    kind: SourceKind,
    dir: PathBuf,
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("kind", &self.kind)
            .field("dir", &self.dir)
            .finish()
    }
}

impl WatcherHandle {
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Watch `dir` recursively and feed debounced changes to `handler`.
pub fn spawn_watcher(
    kind: SourceKind,
    dir: impl Into<PathBuf>,
    filter: SourceFilter,
    handler: Arc<dyn ChangeHandler>,
    window: Duration,
) -> Result<WatcherHandle> {
    let dir = dir.into();
    std::fs::create_dir_all(&dir).with_context(|| format!("creating watched dir {:?}", dir))?;

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("blogwatch: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("blogwatch: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher
        .watch(&dir, RecursiveMode::Recursive)
        .with_context(|| format!("watching {:?}", dir))?;

    info!(%kind, dir = %dir.display(), "watching");

    tokio::spawn(async move {
        let mut debouncer = Debouncer::new(handler, window);
        let mut pairing = RenamePairing::new(window);
        let mut dispatch = |changes: Vec<FsChange>| {
            for change in changes {
                if let Some(change) = admit(kind, &filter, change) {
                    debouncer.push(change);
                }
            }
        };

        loop {
            let next = match pairing.next_deadline() {
                Some(deadline) => match timeout_at(deadline, event_rx.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        dispatch(pairing.expire(Instant::now()));
                        continue;
                    }
                },
                None => event_rx.recv().await,
            };
            let Some(event) = next else {
                break;
            };
            trace!(%kind, ?event, "received notify event");
            dispatch(pairing.feed(&event, |p| p.exists(), Instant::now()));
        }
        dispatch(pairing.drain());

        debug!(%kind, "watcher event loop finished; flushing pending changes");
        debouncer.flush().await;
    });

    Ok(WatcherHandle {
        kind,
        dir,
        _inner: watcher,
    })
}

/// Apply the source filter to both sides of a change.
///
/// A rename out of an ignored name (editor temp file saved over the real
/// one) becomes a plain modification; a rename into an ignored name becomes
/// a removal of the old path.
pub fn admit(kind: SourceKind, filter: &SourceFilter, mut change: FsChange) -> Option<FsChange> {
    let from_ok = change
        .renamed_from
        .as_deref()
        .map(|from| filter.accepts(kind, from));

    if filter.accepts(kind, &change.path) {
        if from_ok == Some(false) {
            change.renamed_from = None;
        }
        return Some(change);
    }

    match (change.renamed_from.take(), from_ok) {
        (Some(from), Some(true)) => Some(FsChange::new(from, ChangeKind::Removed)),
        _ => {
            trace!(path = %change.path.display(), "ignoring filtered path");
            None
        }
    }
}

/// Start one watcher per content directory, all sharing `session`.
pub fn spawn_site_watchers(session: &BuildSession) -> Result<Vec<WatcherHandle>> {
    let window = session.config().debounce();
    SourceKind::ALL
        .into_iter()
        .map(|kind| {
            let handler: Arc<dyn ChangeHandler> = Arc::new(SourceHandler::new(kind, session.clone()));
            spawn_watcher(
                kind,
                session.paths().source_dir(kind),
                session.filter().clone(),
                handler,
                window,
            )
        })
        .collect()
}
