//! Scoped directory for intermediate files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// A work directory removed when dropped, unless `keep` is set.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    keep: bool,
}

impl WorkDir {
    pub fn create(path: impl Into<PathBuf>, keep: bool) -> std::io::Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        debug!(path = %path.display(), keep, "Created work directory");
        Ok(Self { path, keep })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.keep {
            debug!(path = %self.path.display(), "Keeping work directory");
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove work directory");
        }
    }
}
