// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod output;
pub mod render;
pub mod site;
pub mod template;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{config_root_dir, load_or_create};
use crate::engine::BuildSession;
use crate::errors::Result;
use crate::exec::PreviewServer;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::spawn_site_watchers;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (creating a default config if needed)
/// - the initial full build
/// - in `--watch` mode: the preview server, one watcher per content
///   directory, and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let config = load_or_create(&config_path)?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let root = config_root_dir(&config_path);
    // notify reports canonical paths; cache keys must use the same spelling.
    let root = fs.canonicalize(&root).unwrap_or(root);
    info!(root = %root.display(), "site root");

    let session = BuildSession::new(config, &root, fs)?;
    let report = session.generate().await?;
    info!(
        posts = report.scan.posts,
        written = report.render.written(),
        failed = report.render.failed.len(),
        assets = report.assets,
        "site generated"
    );

    if !args.watch {
        return Ok(());
    }

    let preview = match session.config().serve_command() {
        Some(cmd) => Some(PreviewServer::spawn(cmd, &session.paths().out)?),
        None => None,
    };

    let watchers = spawn_site_watchers(&session)?;
    info!("watching for changes; press Ctrl-C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
    }

    info!("shutting down");
    drop(watchers);
    if let Some(preview) = preview {
        if let Err(e) = preview.shutdown().await {
            warn!(error = %e, "failed to stop preview server");
        }
    }
    Ok(())
}
