#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blogwatch::config::{RawSiteConfig, SiteConfig};
use blogwatch::engine::BuildSession;
use blogwatch::fs::{FileSystem, RealFileSystem};
use tempfile::TempDir;

/// Builder for `SiteConfig` to simplify test setup.
#[derive(Debug, Clone)]
pub struct SiteConfigBuilder {
    config: RawSiteConfig,
}

impl SiteConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawSiteConfig::default(),
        }
    }

    pub fn default_layout(mut self, name: &str) -> Self {
        self.config.default_layout = name.to_string();
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.debounce_ms = ms;
        self
    }

    pub fn serve_command(mut self, cmd: &str) -> Self {
        self.config.serve_command = Some(cmd.to_string());
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.ignore.push(pattern.to_string());
        self
    }

    pub fn raw(&self) -> &RawSiteConfig {
        &self.config
    }

    pub fn build(self) -> SiteConfig {
        SiteConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for SiteConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A throwaway site tree on disk.
///
/// Directory names follow the default config (`posts/`, `layouts/`,
/// `fragments/`, `wwwroot/`, output in `publish/`).
pub struct SiteFixture {
    dir: TempDir,
    root: PathBuf,
    config: SiteConfigBuilder,
}

impl SiteFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        // Canonical, so paths compare equal to the ones notify reports.
        let root = dir.path().canonicalize().expect("canonicalize temp dir");
        Self {
            dir,
            root,
            config: SiteConfigBuilder::new(),
        }
    }

    pub fn with_config(mut self, config: SiteConfigBuilder) -> Self {
        self.config = config;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> SiteConfig {
        self.config.clone().build()
    }

    /// Write `contents` to `rel` below the site root, creating directories.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    pub fn post(&self, file: &str, contents: &str) -> PathBuf {
        self.write(&format!("posts/{file}"), contents)
    }

    pub fn layout(&self, name: &str, contents: &str) -> PathBuf {
        self.write(&format!("layouts/{name}.html"), contents)
    }

    pub fn fragment(&self, name: &str, contents: &str) -> PathBuf {
        self.write(&format!("fragments/{name}.html"), contents)
    }

    pub fn asset(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        self.write(&format!("wwwroot/{rel}"), contents)
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.root.join(rel)).expect("remove fixture file");
    }

    pub fn rename(&self, from: &str, to: &str) -> (PathBuf, PathBuf) {
        let (from, to) = (self.root.join(from), self.root.join(to));
        fs::rename(&from, &to).expect("rename fixture file");
        (from, to)
    }

    /// Path of `rel` inside the output directory.
    pub fn out(&self, rel: &str) -> PathBuf {
        self.root.join("publish").join(rel)
    }

    /// Contents of an output file, if it exists.
    pub fn read_out(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.out(rel)).ok()
    }

    /// A build session on the real filesystem rooted at this fixture.
    pub fn session(&self) -> BuildSession {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        BuildSession::new(self.config(), &self.root, fs).expect("build session")
    }

    /// Keep the directory alive while borrowing it.
    pub fn temp_dir(&self) -> &TempDir {
        &self.dir
    }
}

impl Default for SiteFixture {
    fn default() -> Self {
        Self::new()
    }
}
