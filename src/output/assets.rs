// src/output/assets.rs

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::fs::{FileSystem, collect_files};
use crate::output::writer::OutputWriter;
use crate::types::{SourceKind, WriteOutcome};
use crate::watch::filter::SourceFilter;

/// Where an asset under `assets_dir` lands in the output tree.
///
/// `None` when `src` is not inside `assets_dir`.
pub fn asset_output_path(assets_dir: &Path, out_dir: &Path, src: &Path) -> Option<PathBuf> {
    let rel = src.strip_prefix(assets_dir).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    Some(out_dir.join(rel))
}

/// Copy every asset into the output tree, preserving relative paths.
///
/// Returns the number of files actually written. A failing copy is logged
/// and does not stop the others.
pub async fn mirror_assets(
    fs: &dyn FileSystem,
    writer: &OutputWriter,
    filter: &SourceFilter,
    assets_dir: &Path,
) -> Result<usize> {
    let files = collect_files(fs, assets_dir)?;
    let mut written = 0;

    for src in files {
        if !filter.accepts(SourceKind::Assets, &src) {
            debug!(path = %src.display(), "skipping ignored asset");
            continue;
        }
        let Some(dest) = asset_output_path(assets_dir, writer.out_dir(), &src) else {
            continue;
        };
        match writer.copy_file(&src, &dest).await {
            Ok(WriteOutcome::Written) => written += 1,
            Ok(WriteOutcome::Unchanged) => {}
            Err(e) => warn!(path = %src.display(), error = %e, "failed to copy asset"),
        }
    }

    info!(written, "assets mirrored");
    Ok(written)
}
