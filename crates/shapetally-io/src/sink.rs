//! Artifact persistence.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Destination for encoded artifacts.
pub trait ArtifactSink {
    /// Store `bytes` under `name` and return a reference to the stored
    /// artifact (a path, URL or key) for the result payload.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the artifact cannot be stored.
    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<String>;
}

/// Writes artifacts into a directory on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Sink writing into `dir`, created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    fn write(&self, name: &str, bytes: &[u8]) -> io::Result<String> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
        Ok(path.display().to_string())
    }
}
