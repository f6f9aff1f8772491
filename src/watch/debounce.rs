// src/watch/debounce.rs

//! Per-path debouncing.
//!
//! Every active path gets its own worker task that runs the cycle
//! `Idle -> PendingDebounce -> Processing -> Idle`:
//!
//! - **Idle**: waiting for the first event. After `idle_ttl` without one the
//!   worker retires; the dispatcher re-creates it on the next event.
//! - **PendingDebounce**: each further event restarts the window and is
//!   folded into the pending change.
//! - **Processing**: the handler runs. Events arriving meanwhile stay queued
//!   in the worker's channel and start the next cycle.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::watch::event::FsChange;

/// Minimum time a worker stays alive without events.
const MIN_IDLE_TTL: Duration = Duration::from_secs(5);

/// Receives one debounced change at a time per path.
///
/// Production code uses `watch::handler::SourceHandler`; tests can record
/// the changes instead.
pub trait ChangeHandler: Send + Sync + 'static {
    fn handle(&self, change: FsChange) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

struct PathSlot {
    tx: mpsc::UnboundedSender<FsChange>,
    // Shared by successive workers for the same path, so a retiring worker
    // flushing a late event never overlaps its successor.
    gate: Arc<AsyncMutex<()>>,
}

/// Routes changes to per-path workers.
pub struct Debouncer {
    handler: Arc<dyn ChangeHandler>,
    window: Duration,
    idle_ttl: Duration,
    slots: HashMap<PathBuf, PathSlot>,
    workers: JoinSet<()>,
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("window", &self.window)
            .field("idle_ttl", &self.idle_ttl)
            .field("paths", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl Debouncer {
    pub fn new(handler: Arc<dyn ChangeHandler>, window: Duration) -> Self {
        let idle_ttl = (window * 20).max(MIN_IDLE_TTL);
        Self::with_idle_ttl(handler, window, idle_ttl)
    }

    pub fn with_idle_ttl(handler: Arc<dyn ChangeHandler>, window: Duration, idle_ttl: Duration) -> Self {
        Self {
            handler,
            window,
            idle_ttl,
            slots: HashMap::new(),
            workers: JoinSet::new(),
        }
    }

    /// Hand a change to the worker for its path, spawning one if needed.
    pub fn push(&mut self, change: FsChange) {
        self.reap();

        let change = match self.slots.get(&change.path) {
            Some(slot) => match slot.tx.send(change) {
                Ok(()) => return,
                // The worker retired; start a new one below.
                Err(mpsc::error::SendError(change)) => change,
            },
            None => change,
        };

        let path = change.path.clone();
        let gate = self
            .slots
            .get(&path)
            .map(|slot| Arc::clone(&slot.gate))
            .unwrap_or_default();

        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is alive until the worker below drops it.
        let _ = tx.send(change);

        trace!(path = %path.display(), "spawning path worker");
        self.workers.spawn(run_worker(
            path.clone(),
            rx,
            Arc::clone(&self.handler),
            Arc::clone(&gate),
            self.window,
            self.idle_ttl,
        ));
        self.slots.insert(path, PathSlot { tx, gate });
    }

    /// Number of paths that currently have a live worker.
    pub fn active_workers(&self) -> usize {
        self.slots.values().filter(|slot| !slot.tx.is_closed()).count()
    }

    /// Stop accepting changes and wait until every pending change has been
    /// handled.
    pub async fn flush(mut self) {
        self.slots.clear();
        while self.workers.join_next().await.is_some() {}
    }

    fn reap(&mut self) {
        while self.workers.try_join_next().is_some() {}
        self.slots
            .retain(|_, slot| !slot.tx.is_closed() || Arc::strong_count(&slot.gate) > 1);
    }
}

async fn run_worker(
    path: PathBuf,
    mut rx: mpsc::UnboundedReceiver<FsChange>,
    handler: Arc<dyn ChangeHandler>,
    gate: Arc<AsyncMutex<()>>,
    window: Duration,
    idle_ttl: Duration,
) {
    loop {
        // Idle
        let first = match timeout(idle_ttl, rx.recv()).await {
            Ok(Some(change)) => change,
            Ok(None) => break,
            Err(_) => {
                // Refuse new sends, then flush anything that raced in.
                rx.close();
                let mut late: Option<FsChange> = None;
                while let Ok(change) = rx.try_recv() {
                    match late.as_mut() {
                        Some(pending) => pending.coalesce(change),
                        None => late = Some(change),
                    }
                }
                if let Some(change) = late {
                    let _processing = gate.lock().await;
                    handler.handle(change).await;
                }
                trace!(path = %path.display(), "path worker retired");
                break;
            }
        };

        // PendingDebounce
        let mut pending = first;
        let mut coalesced = 0usize;
        loop {
            match timeout(window, rx.recv()).await {
                Ok(Some(later)) => {
                    pending.coalesce(later);
                    coalesced += 1;
                }
                Ok(None) | Err(_) => break,
            }
        }

        // Processing
        debug!(
            path = %pending.path.display(),
            kind = ?pending.kind,
            renamed_from = ?pending.renamed_from,
            coalesced,
            "processing debounced change"
        );
        let _processing = gate.lock().await;
        handler.handle(pending).await;
    }
}
