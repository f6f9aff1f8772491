// src/watch/handler.rs

//! Debounced change → domain operation.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::engine::session::BuildSession;
use crate::engine::ChangeEvent;
use crate::errors::Result;
use crate::output::assets::asset_output_path;
use crate::site::paths::entity_name;
use crate::types::SourceKind;
use crate::watch::debounce::ChangeHandler;
use crate::watch::event::{ChangeKind, FsChange};

/// Handles changes under one content directory.
#[derive(Debug, Clone)]
pub struct SourceHandler {
    kind: SourceKind,
    session: BuildSession,
}

impl SourceHandler {
    pub fn new(kind: SourceKind, session: BuildSession) -> Self {
        Self { kind, session }
    }

    pub async fn handle_change(&self, change: FsChange) {
        let FsChange {
            path,
            kind,
            renamed_from,
        } = change;

        if self.kind == SourceKind::Assets {
            self.handle_asset(path, kind, renamed_from).await;
            return;
        }

        if let Some(from) = renamed_from {
            info!(kind = %self.kind, from = %from.display(), to = %path.display(), "source renamed");
            self.remove(&from).await;
        }

        match kind {
            ChangeKind::Removed => self.remove(&path).await,
            // A new post file is picked up by the write that follows it.
            ChangeKind::Created if self.kind == SourceKind::Posts => {
                debug!(path = %path.display(), "ignoring post creation");
            }
            ChangeKind::Created | ChangeKind::Modified => self.reload(&path).await,
        }
    }

    async fn reload(&self, path: &Path) {
        let event = match self.load(path).await {
            Ok(event) => event,
            Err(e) if !self.session.fs().exists(path) => {
                warn!(path = %path.display(), error = %e, "file vanished before it could be read; treating as removed");
                self.remove(path).await;
                return;
            }
            Err(e) => {
                error!(kind = %self.kind, path = %path.display(), error = %e, "failed to load changed file");
                return;
            }
        };

        info!(kind = %self.kind, path = %path.display(), "source changed");
        let report = self.session.propagator().apply(event).await;
        debug!(
            rendered = report.rendered.len(),
            failed = report.failed.len(),
            removed = report.removed.len(),
            "change propagated"
        );
    }

    async fn load(&self, path: &Path) -> Result<ChangeEvent> {
        let loader = self.session.loader().clone();
        let kind = self.kind;
        let path = path.to_path_buf();
        let event = tokio::task::spawn_blocking(move || -> Result<ChangeEvent> {
            Ok(match kind {
                SourceKind::Fragments => ChangeEvent::FragmentChanged(loader.read_fragment(&path)?),
                SourceKind::Layouts => ChangeEvent::LayoutChanged(loader.read_layout(&path)?),
                SourceKind::Posts | SourceKind::Assets => {
                    ChangeEvent::PostChanged(loader.read_post(&path)?)
                }
            })
        })
        .await
        .context("source load task failed")??;
        Ok(event)
    }

    /// Remove the entity that was loaded from `path`, if any.
    async fn remove(&self, path: &Path) {
        let event = match self.kind {
            SourceKind::Posts => match self.session.store().post_at(path) {
                Some(post) => ChangeEvent::PostRemoved {
                    key: post.key,
                    input_path: post.input_path,
                },
                None => {
                    debug!(path = %path.display(), "removed file had no cached post");
                    return;
                }
            },
            SourceKind::Layouts | SourceKind::Fragments => {
                let Some(name) = entity_name(path) else {
                    return;
                };
                if self.kind == SourceKind::Layouts {
                    ChangeEvent::LayoutRemoved(name)
                } else {
                    ChangeEvent::FragmentRemoved(name)
                }
            }
            SourceKind::Assets => return,
        };

        info!(kind = %self.kind, path = %path.display(), "source removed");
        self.session.propagator().apply(event).await;
    }

    async fn handle_asset(&self, path: PathBuf, kind: ChangeKind, renamed_from: Option<PathBuf>) {
        let paths = self.session.paths();
        let writer = self.session.propagator().writer();
        let Some(dest) = asset_output_path(&paths.assets, &paths.out, &path) else {
            return;
        };

        if let Some(from) = renamed_from {
            if let Some(old_dest) = asset_output_path(&paths.assets, &paths.out, &from) {
                match writer.move_file(&old_dest, &dest).await {
                    Ok(moved) if moved.removed_file => {
                        info!(from = %from.display(), to = %path.display(), "asset moved")
                    }
                    Ok(_) => {}
                    Err(e) => warn!(from = %old_dest.display(), error = %e, "failed to move asset output"),
                }
            }
        }

        match kind {
            ChangeKind::Removed => match writer.remove_stale(&dest).await {
                Ok(removal) if removal.removed_file => info!(path = %path.display(), "asset removed"),
                Ok(_) => {}
                Err(e) => error!(path = %dest.display(), error = %e, "failed to remove asset output"),
            },
            ChangeKind::Created | ChangeKind::Modified => match writer.copy_file(&path, &dest).await {
                Ok(outcome) => debug!(path = %path.display(), ?outcome, "asset copied"),
                Err(_) if !self.session.fs().exists(&path) => {
                    warn!(path = %path.display(), "asset vanished before it could be copied; removing output");
                    if let Err(e) = writer.remove_stale(&dest).await {
                        error!(path = %dest.display(), error = %e, "failed to remove asset output");
                    }
                }
                Err(e) => error!(path = %path.display(), error = %e, "failed to copy asset"),
            },
        }
    }
}

impl ChangeHandler for SourceHandler {
    fn handle(&self, change: FsChange) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(self.handle_change(change))
    }
}
