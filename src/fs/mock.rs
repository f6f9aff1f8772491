// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem for tests.
///
/// Paths are used verbatim as keys; tests should stick to one spelling
/// (usually relative paths like `publish/2024/01/02/hello.html`).
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    // (created, modified); paths without an entry report the Unix epoch.
    times: Arc<Mutex<HashMap<PathBuf, (SystemTime, SystemTime)>>>,
}

fn parent_of(path: &Path) -> Option<&Path> {
    path.parent().map(|parent| {
        if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        }
    })
}

fn child_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
            times: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.lock();
        files.insert(path.clone(), MockEntry::File(content.into()));
        Self::link_to_parent(&mut files, &path);
    }

    /// Pin the creation and modification times reported for `path`.
    pub fn set_times(&self, path: impl AsRef<Path>, created: SystemTime, modified: SystemTime) {
        self.times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.as_ref().to_path_buf(), (created, modified));
    }

    fn times_of(&self, path: &Path) -> Result<(SystemTime, SystemTime)> {
        if !self.exists(path) {
            return Err(anyhow!("File not found: {:?}", path));
        }
        let times = self.times.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(times
            .get(path)
            .copied()
            .unwrap_or((SystemTime::UNIX_EPOCH, SystemTime::UNIX_EPOCH)))
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.lock();
        Self::ensure_dir_entry(&mut files, path.as_ref());
    }

    /// Current contents of a file as UTF-8, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        match self.lock().get(path.as_ref()) {
            Some(MockEntry::File(bytes)) => String::from_utf8(bytes.clone()).ok(),
            _ => None,
        }
    }

    fn link_to_parent(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = parent_of(path) else {
            return;
        };
        if parent == path {
            return;
        }
        Self::ensure_dir_entry(files, parent);
        if let (Some(MockEntry::Dir(children)), Some(name)) =
            (files.get_mut(parent), child_name(path))
        {
            if !children.contains(&name) {
                children.push(name);
            }
        }
    }

    fn unlink_from_parent(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if let (Some(parent), Some(name)) = (parent_of(path), child_name(path)) {
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                children.retain(|c| c != &name);
            }
        }
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if !files.contains_key(path) {
            files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
            Self::link_to_parent(files, path);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let files = self.lock();
        match files.get(path) {
            Some(MockEntry::File(content)) => Ok(content.clone()),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<bool> {
        let mut files = self.lock();
        match files.get(path) {
            Some(MockEntry::File(_)) => {
                files.remove(path);
                Self::unlink_from_parent(&mut files, path);
                Ok(true)
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Ok(false),
        }
    }

    fn remove_dir(&self, path: &Path) -> Result<bool> {
        let mut files = self.lock();
        match files.get(path) {
            Some(MockEntry::Dir(children)) if children.is_empty() => {
                files.remove(path);
                Self::unlink_from_parent(&mut files, path);
                Ok(true)
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Directory not empty: {:?}", path)),
            Some(MockEntry::File(_)) => Err(anyhow!("Not a directory: {:?}", path)),
            None => Ok(false),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut files = self.lock();
        match files.remove(from) {
            Some(entry @ MockEntry::File(_)) => {
                Self::unlink_from_parent(&mut files, from);
                files.insert(to.to_path_buf(), entry);
                Self::link_to_parent(&mut files, to);
                Ok(())
            }
            Some(entry) => {
                files.insert(from.to_path_buf(), entry);
                Err(anyhow!("Renaming directories is not supported: {:?}", from))
            }
            None => Err(anyhow!("File not found: {:?}", from)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Dir(_)))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        self.times_of(path).map(|(_, modified)| modified)
    }

    fn created(&self, path: &Path) -> Result<SystemTime> {
        self.times_of(path).map(|(created, _)| created)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // In mock, we just return the path as is, assuming absolute paths are used in tests
        Ok(path.to_path_buf())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.lock();
        match files.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
