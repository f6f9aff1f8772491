mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use blogwatch::fs::{FileSystem, RealFileSystem};
use blogwatch::fs::mock::MockFileSystem;
use blogwatch::output::{OutputWriter, asset_output_path};
use blogwatch::types::WriteOutcome;

type TestResult = Result<(), Box<dyn Error>>;

fn writer() -> (MockFileSystem, OutputWriter) {
    let fs = MockFileSystem::new();
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    (fs, OutputWriter::new(shared, "out"))
}

#[tokio::test]
async fn identical_content_is_not_rewritten() -> TestResult {
    init_tracing();
    let (fs, writer) = writer();
    let path = Path::new("out/a/b.html");

    assert_eq!(writer.write(path, b"one".to_vec()).await?, WriteOutcome::Written);
    assert_eq!(writer.write(path, b"one".to_vec()).await?, WriteOutcome::Unchanged);
    assert_eq!(writer.write(path, b"two".to_vec()).await?, WriteOutcome::Written);
    assert_eq!(fs.contents(path).as_deref(), Some("two"));
    Ok(())
}

#[tokio::test]
async fn remove_stale_prunes_exactly_one_empty_level() -> TestResult {
    init_tracing();
    let (fs, writer) = writer();
    writer.write(Path::new("out/2024/01/02/a.html"), b"a".to_vec()).await?;

    let removal = writer.remove_stale(Path::new("out/2024/01/02/a.html")).await?;

    assert!(removal.removed_file);
    assert!(removal.pruned_dir);
    assert!(!fs.exists(Path::new("out/2024/01/02")));
    assert!(fs.is_dir(Path::new("out/2024/01")));
    Ok(())
}

#[tokio::test]
async fn remove_stale_never_prunes_the_output_root() -> TestResult {
    init_tracing();
    let (fs, writer) = writer();
    writer.write(Path::new("out/index.html"), b"i".to_vec()).await?;

    let removal = writer.remove_stale(Path::new("out/index.html")).await?;
    assert!(removal.removed_file);
    assert!(!removal.pruned_dir);
    assert!(fs.is_dir(Path::new("out")));

    let again = writer.remove_stale(Path::new("out/index.html")).await?;
    assert!(!again.removed_file);
    Ok(())
}

#[tokio::test]
async fn concurrent_writes_to_one_path_are_serialised() -> TestResult {
    init_tracing();
    let (fs, writer) = writer();
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..16 {
        let writer = writer.clone();
        tasks.spawn(async move { writer.write(Path::new("out/same.html"), format!("v{i}").into_bytes()).await });
    }
    while let Some(res) = tasks.join_next().await {
        res??;
    }

    let contents = fs.contents("out/same.html").unwrap();
    assert!(contents.starts_with('v'));
    Ok(())
}

#[tokio::test]
async fn assets_copy_and_move() -> TestResult {
    init_tracing();
    let (fs, writer) = writer();
    fs.add_file("assets/css/site.css", "a{}");

    let dest = asset_output_path(Path::new("assets"), Path::new("out"), Path::new("assets/css/site.css")).unwrap();
    assert_eq!(dest, Path::new("out/css/site.css"));
    assert_eq!(writer.copy_file(Path::new("assets/css/site.css"), &dest).await?, WriteOutcome::Written);

    let moved = writer.move_file(&dest, Path::new("out/style/site.css")).await?;
    assert!(moved.removed_file);
    assert!(moved.pruned_dir);
    assert_eq!(fs.contents("out/style/site.css").as_deref(), Some("a{}"));

    assert!(asset_output_path(Path::new("assets"), Path::new("out"), Path::new("elsewhere/x")).is_none());
    Ok(())
}

/// Real filesystem whose writes pause between creating the parent directory
/// and writing the file.
#[derive(Debug)]
struct SlowWrites {
    inner: RealFileSystem,
    pause: Duration,
}

impl FileSystem for SlowWrites {
    fn read_to_string(&self, path: &Path) -> anyhow::Result<String> {
        self.inner.read_to_string(path)
    }

    fn read(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
        self.inner.read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::thread::sleep(self.pause);
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> anyhow::Result<bool> {
        self.inner.remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> anyhow::Result<bool> {
        self.inner.remove_dir(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> anyhow::Result<()> {
        self.inner.rename(from, to)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn modified(&self, path: &Path) -> anyhow::Result<SystemTime> {
        self.inner.modified(path)
    }

    fn created(&self, path: &Path) -> anyhow::Result<SystemTime> {
        self.inner.created(path)
    }

    fn canonicalize(&self, path: &Path) -> anyhow::Result<PathBuf> {
        self.inner.canonicalize(path)
    }

    fn read_dir(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
        self.inner.read_dir(path)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pruning_a_sibling_does_not_remove_the_dir_under_a_write() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let out = tmp.path().join("publish");
    let day = out.join("2024/01/02");
    std::fs::create_dir_all(&day)?;
    std::fs::write(day.join("a.html"), "a")?;

    let fs: Arc<dyn FileSystem> = Arc::new(SlowWrites {
        inner: RealFileSystem,
        pause: Duration::from_millis(300),
    });
    let writer = OutputWriter::new(fs, &out);

    let write = {
        let writer = writer.clone();
        let target = day.join("b.html");
        tokio::spawn(async move { writer.write(&target, b"b".to_vec()).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    let removal = writer.remove_stale(&day.join("a.html")).await?;

    assert_eq!(write.await??, WriteOutcome::Written);
    assert!(removal.removed_file);
    assert!(!removal.pruned_dir);
    assert_eq!(std::fs::read_to_string(day.join("b.html"))?, "b");
    Ok(())
}

#[tokio::test]
async fn path_locks_are_released_after_use() -> TestResult {
    init_tracing();
    let (_fs, writer) = writer();
    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..8 {
        let writer = writer.clone();
        tasks.spawn(async move {
            let path = PathBuf::from(format!("out/2024/01/0{}/p{i}.html", i % 3 + 1));
            writer.write(&path, b"x".to_vec()).await?;
            writer.remove_stale(&path).await
        });
    }
    while let Some(res) = tasks.join_next().await {
        res??;
    }
    writer
        .move_file(Path::new("out/missing.html"), Path::new("out/other.html"))
        .await?;

    assert_eq!(writer.active_locks(), 0);
    Ok(())
}
