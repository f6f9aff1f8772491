// src/engine/propagator.rs

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::engine::core::{ChangeStep, apply_change, full_render};
use crate::engine::{BuildCommand, BuildEvent, ChangeEvent};
use crate::errors::Result;
use crate::output::writer::{OutputWriter, path_display};
use crate::render::pipeline::{RenderPipeline, RenderWarning};
use crate::site::entity::{Layout, Post, PostKey};
use crate::site::store::SiteStore;
use crate::types::WriteOutcome;

/// What executing a set of build commands did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Propagation {
    pub rendered: Vec<(PostKey, WriteOutcome)>,
    pub failed: Vec<(PostKey, String)>,
    pub removed: Vec<PathBuf>,
    pub warnings: usize,
}

impl Propagation {
    /// Keys of successfully rendered posts, sorted.
    pub fn rendered_keys(&self) -> Vec<PostKey> {
        let mut keys: Vec<PostKey> = self.rendered.iter().map(|(k, _)| k.clone()).collect();
        keys.sort();
        keys
    }

    pub fn written(&self) -> usize {
        self.rendered
            .iter()
            .filter(|(_, outcome)| *outcome == WriteOutcome::Written)
            .count()
    }

    fn merge(&mut self, other: Propagation) {
        self.rendered.extend(other.rendered);
        self.failed.extend(other.failed);
        self.removed.extend(other.removed);
        self.warnings += other.warnings;
    }
}

struct RenderedPost {
    output: PathBuf,
    outcome: WriteOutcome,
    warnings: usize,
}

/// Executes change steps against the output tree.
///
/// Cheap to clone; every render task gets its own copy.
#[derive(Debug, Clone)]
pub struct Propagator {
    store: Arc<SiteStore>,
    pipeline: Arc<RenderPipeline>,
    writer: OutputWriter,
    default_layout: Arc<str>,
    events: Option<mpsc::UnboundedSender<BuildEvent>>,
}

impl Propagator {
    pub fn new(
        store: Arc<SiteStore>,
        pipeline: Arc<RenderPipeline>,
        writer: OutputWriter,
        default_layout: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            store,
            pipeline,
            writer,
            default_layout: default_layout.into(),
            events: None,
        }
    }

    /// Report every render and removal on `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<BuildEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn store(&self) -> &Arc<SiteStore> {
        &self.store
    }

    pub fn writer(&self) -> &OutputWriter {
        &self.writer
    }

    /// Apply one change to the cache and carry out the consequences.
    pub async fn apply(&self, change: ChangeEvent) -> Propagation {
        debug!(?change, "applying change");
        let step = apply_change(&self.store, &self.default_layout, change);
        self.execute(step).await
    }

    /// Render every cached post.
    pub async fn render_all(&self) -> Propagation {
        self.execute(full_render(&self.store)).await
    }

    /// Run stale-output removals in order, then every render in parallel.
    pub async fn execute(&self, step: ChangeStep) -> Propagation {
        let mut report = Propagation::default();
        let mut renders = Vec::new();

        for command in step.commands {
            match command {
                BuildCommand::RemoveOutput(path) => self.remove_output(path, &mut report).await,
                BuildCommand::RenderPosts(keys) => renders.extend(keys),
            }
        }

        if !renders.is_empty() {
            report.merge(self.render_many(renders).await);
        }
        report
    }

    async fn remove_output(&self, path: PathBuf, report: &mut Propagation) {
        match self.writer.remove_stale(&path).await {
            Ok(removal) => {
                if removal.removed_file {
                    info!(output = %path_display(self.writer.out_dir(), &path), "removed output");
                }
                self.emit(BuildEvent::OutputRemoved {
                    path: path.clone(),
                    pruned_dir: removal.pruned_dir,
                });
                report.removed.push(path);
            }
            Err(e) => error!(output = %path.display(), error = %e, "failed to remove stale output"),
        }
    }

    async fn render_many(&self, keys: Vec<PostKey>) -> Propagation {
        let mut set = JoinSet::new();
        for key in keys {
            let this = self.clone();
            set.spawn(async move {
                let result = this.render_post(&key).await;
                (key, result)
            });
        }

        let mut report = Propagation::default();
        while let Some(joined) = set.join_next().await {
            let (key, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "render task panicked");
                    continue;
                }
            };
            match result {
                Ok(Some(rendered)) => {
                    report.warnings += rendered.warnings;
                    self.emit(BuildEvent::PostRendered {
                        key: key.clone(),
                        output: rendered.output,
                        outcome: rendered.outcome,
                        warnings: rendered.warnings,
                    });
                    report.rendered.push((key, rendered.outcome));
                }
                Ok(None) => {}
                Err(e) => {
                    error!(post = %key, error = %e, "failed to render post");
                    self.emit(BuildEvent::PostFailed {
                        key: key.clone(),
                        error: e.to_string(),
                    });
                    report.failed.push((key, e.to_string()));
                }
            }
        }
        report
    }

    /// Render one post and write its output.
    ///
    /// `Ok(None)` when the post left the cache before the task ran.
    async fn render_post(&self, key: &PostKey) -> Result<Option<RenderedPost>> {
        let Some(post) = self.store.posts.find(key) else {
            debug!(post = %key, "post no longer cached; skipping render");
            return Ok(None);
        };

        let (layout, missing) = self.resolve_layout(&post);
        let store = Arc::clone(&self.store);
        let mut rendered = self.pipeline.render_post(
            &post,
            &layout,
            |name| store.fragments.find(&name.to_string()),
            self.writer.out_dir(),
        );
        if let Some(warning) = missing {
            warn!(post = %key, "{warning}");
            rendered.warnings.insert(0, warning);
        }

        let outcome = self
            .writer
            .write(post.output_path(), rendered.html.into_bytes())
            .await?;

        match outcome {
            WriteOutcome::Written => info!(
                post = %key,
                output = %path_display(self.writer.out_dir(), post.output_path()),
                "rendered"
            ),
            WriteOutcome::Unchanged => debug!(post = %key, "output unchanged"),
        }

        Ok(Some(RenderedPost {
            output: post.output_path,
            outcome,
            warnings: rendered.warnings.len(),
        }))
    }

    /// The layout a post is rendered with: its own, else the default, else
    /// the built-in `{{ content }}` layout.
    fn resolve_layout(&self, post: &Post) -> (Layout, Option<RenderWarning>) {
        let requested = post.layout_name.as_str();
        let name = self.store.effective_layout_name(post, &self.default_layout);

        // The layout may have been removed since the lookup above.
        let (layout, used) = match self.store.layouts.find(&name.to_string()) {
            Some(layout) if name == requested => return (layout, None),
            Some(layout) => (layout, name.to_string()),
            None => (Layout::builtin(self.default_layout.to_string()), "built-in".to_string()),
        };
        let warning = RenderWarning::MissingLayout {
            requested: requested.to_string(),
            used,
        };
        (layout, Some(warning))
    }

    fn emit(&self, event: BuildEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
