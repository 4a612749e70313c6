use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::File;

/// Read-only view of the directory the server exposes.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a requested name onto a path inside the root.
    ///
    /// Only the final path component is honoured, so `../etc/passwd` and
    /// `/etc/passwd` both resolve to `passwd` in the root.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let name = Path::new(filename.trim()).file_name()?;
        Some(self.root.join(name))
    }

    /// Open a requested file for sequential reading.
    ///
    /// `Ok(None)` means there is nothing servable under that name.
    pub async fn open(&self, filename: &str) -> io::Result<Option<File>> {
        let Some(path) = self.resolve(filename) else {
            return Ok(None);
        };
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        }
        File::open(&path).await.map(Some)
    }
}
