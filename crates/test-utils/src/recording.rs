//! A `ChangeHandler` that records what it is given.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use blogwatch::watch::{ChangeHandler, FsChange};

/// Records every debounced change, optionally taking `delay` to "process"
/// each one so tests can send events while a path is busy.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    changes: Arc<Mutex<Vec<FsChange>>>,
    delay: Duration,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            changes: Arc::default(),
            delay,
        }
    }

    pub fn changes(&self) -> Vec<FsChange> {
        self.changes.lock().unwrap().clone()
    }

    pub fn count_for(&self, path: impl AsRef<Path>) -> usize {
        self.changes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.path == path.as_ref())
            .count()
    }
}

impl ChangeHandler for RecordingHandler {
    fn handle(&self, change: FsChange) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.changes.lock().unwrap().push(change);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        })
    }
}
