// src/engine/session.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::{SiteConfig, SitePaths};
use crate::engine::propagator::{Propagation, Propagator};
use crate::errors::{BlogwatchError, Result};
use crate::fs::{FileSystem, collect_files};
use crate::output::assets::mirror_assets;
use crate::output::writer::OutputWriter;
use crate::render::frontmatter::{FrontmatterParser, YamlFrontmatter};
use crate::render::pipeline::RenderPipeline;
use crate::site::loader::SourceLoader;
use crate::site::store::SiteStore;
use crate::types::SourceKind;
use crate::watch::filter::SourceFilter;

/// Counts from the initial bulk scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub fragments: usize,
    pub layouts: usize,
    pub posts: usize,
    /// Files that could not be loaded (logged individually).
    pub skipped: Vec<PathBuf>,
}

/// Outcome of a full generation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub scan: ScanReport,
    pub render: Propagation,
    pub assets: usize,
}

/// Everything one site build needs, wired together once.
///
/// Cloning is cheap and shares the underlying cache, so the watch handlers
/// and the initial build operate on the same state.
#[derive(Debug, Clone)]
pub struct BuildSession {
    config: Arc<SiteConfig>,
    paths: Arc<SitePaths>,
    fs: Arc<dyn FileSystem>,
    filter: Arc<SourceFilter>,
    loader: SourceLoader,
    propagator: Propagator,
}

impl BuildSession {
    /// Session with the default YAML frontmatter parser and render pipeline.
    pub fn new(config: SiteConfig, root: &Path, fs: Arc<dyn FileSystem>) -> Result<Self> {
        Self::with_components(
            config,
            root,
            fs,
            Arc::new(YamlFrontmatter),
            RenderPipeline::default(),
        )
    }

    pub fn with_components(
        config: SiteConfig,
        root: &Path,
        fs: Arc<dyn FileSystem>,
        frontmatter: Arc<dyn FrontmatterParser>,
        pipeline: RenderPipeline,
    ) -> Result<Self> {
        let paths = config.paths(root);
        let filter = SourceFilter::new(config.ignore())
            .map_err(|e| BlogwatchError::ConfigError(format!("{e:#}")))?;

        let loader = SourceLoader::new(
            Arc::clone(&fs),
            frontmatter,
            paths.out.clone(),
            config.default_layout(),
        );
        let writer = OutputWriter::new(Arc::clone(&fs), paths.out.clone());
        let propagator = Propagator::new(
            Arc::new(SiteStore::new()),
            Arc::new(pipeline),
            writer,
            config.default_layout(),
        );

        Ok(Self {
            config: Arc::new(config),
            paths: Arc::new(paths),
            fs,
            filter: Arc::new(filter),
            loader,
            propagator,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn paths(&self) -> &SitePaths {
        &self.paths
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn filter(&self) -> &SourceFilter {
        &self.filter
    }

    pub fn loader(&self) -> &SourceLoader {
        &self.loader
    }

    pub fn store(&self) -> &Arc<SiteStore> {
        self.propagator.store()
    }

    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    /// Scan all sources, render every post and mirror the assets.
    pub async fn generate(&self) -> Result<BuildReport> {
        let scan = self.scan().await?;
        info!(
            fragments = scan.fragments,
            layouts = scan.layouts,
            posts = scan.posts,
            skipped = scan.skipped.len(),
            "content loaded"
        );

        let render = self.propagator.render_all().await;
        info!(
            rendered = render.rendered.len(),
            written = render.written(),
            failed = render.failed.len(),
            warnings = render.warnings,
            "initial render complete"
        );

        let assets = mirror_assets(
            self.fs.as_ref(),
            self.propagator.writer(),
            &self.filter,
            &self.paths.assets,
        )
        .await?;

        Ok(BuildReport {
            scan,
            render,
            assets,
        })
    }

    /// Load every fragment, layout and post into the cache, one task per
    /// file. Files that fail to load are logged and skipped.
    pub async fn scan(&self) -> Result<ScanReport> {
        let mut set = JoinSet::new();

        for kind in SourceKind::ALL.into_iter().filter(|k| k.is_entity()) {
            for path in self.source_files(kind).await? {
                let loader = self.loader.clone();
                let store = Arc::clone(self.store());
                set.spawn_blocking(move || {
                    let result = load_into(&loader, &store, kind, &path);
                    (kind, path, result)
                });
            }
        }

        let mut report = ScanReport::default();
        while let Some(joined) = set.join_next().await {
            let (kind, path, result) = joined.context("scan task failed")?;
            match result {
                Ok(()) => match kind {
                    SourceKind::Fragments => report.fragments += 1,
                    SourceKind::Layouts => report.layouts += 1,
                    SourceKind::Posts => report.posts += 1,
                    SourceKind::Assets => {}
                },
                Err(e) => {
                    error!(%kind, path = %path.display(), error = %e, "skipping file");
                    report.skipped.push(path);
                }
            }
        }
        report.skipped.sort();
        Ok(report)
    }

    /// Accepted source files of `kind`, sorted.
    pub async fn source_files(&self, kind: SourceKind) -> Result<Vec<PathBuf>> {
        let fs = Arc::clone(&self.fs);
        let dir = self.paths.source_dir(kind).to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_files(fs.as_ref(), &dir))
            .await
            .context("directory scan task failed")??;

        Ok(files
            .into_iter()
            .filter(|path| {
                let accepted = self.filter.accepts(kind, path);
                if !accepted {
                    debug!(%kind, path = %path.display(), "ignoring file");
                }
                accepted
            })
            .collect())
    }
}

fn load_into(loader: &SourceLoader, store: &SiteStore, kind: SourceKind, path: &Path) -> Result<()> {
    match kind {
        SourceKind::Fragments => {
            store.fragments.upsert(loader.read_fragment(path)?);
        }
        SourceKind::Layouts => {
            store.layouts.upsert(loader.read_layout(path)?);
        }
        SourceKind::Posts => {
            let post = loader.read_post(path)?;
            if let Some(previous) = store.posts.upsert(post) {
                // Two files claiming one identity: the later load wins.
                warn!(
                    post = %previous.key,
                    kept = %path.display(),
                    replaced = %previous.input_path.display(),
                    "duplicate post identity"
                );
            }
        }
        SourceKind::Assets => {}
    }
    Ok(())
}
