//! Temporary file bookkeeping
//!
//! Tracks the on-disk artifacts a run produces (encoded selections handed to
//! subprocess consumers) and cleans them up on drop unless explicitly kept.
//! Files live in a dedicated subdirectory of the system temp dir with
//! timestamped names, so concurrent runs do not clobber each other.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Utc;

/// Tracks temp files for one CLI run
#[derive(Debug)]
pub struct TempFileManager {
    dir:     PathBuf,
    tracked: Mutex<Vec<PathBuf>>,
}

impl TempFileManager {
    /// Creates the manager and its `$TMPDIR/lasso` directory
    pub fn new() -> Result<Self> {
        let dir = std::env::temp_dir().join("lasso");
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating temp dir {}", dir.display()))?;
        Ok(Self {
            dir,
            tracked: Mutex::new(Vec::new()),
        })
    }

    /// Writes `bytes` to a fresh tracked file named
    /// `<prefix>-<timestamp>.<ext>` and returns its path
    pub fn write(&self, prefix: &str, ext: &str, bytes: &[u8]) -> Result<PathBuf> {
        let name = format!("{}-{}.{}", prefix, Utc::now().format("%Y%m%d-%H%M%S%.6f"), ext);
        let path = self.dir.join(name);
        fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        self.tracked.lock().unwrap().push(path.clone());
        Ok(path)
    }

    /// Stops tracking `path` so it survives cleanup (e.g. a file an upload
    /// subprocess still reads after this process exits)
    pub fn keep(&self, path: &Path) {
        self.tracked.lock().unwrap().retain(|p| p != path);
    }

    /// Returns a fresh, untracked path for a file that must outlive this
    /// process (consumers hand such paths to detached subprocesses)
    pub fn persistent_path(&self, prefix: &str, ext: &str) -> PathBuf {
        self.dir.join(format!(
            "{}-{}.{}",
            prefix,
            Utc::now().format("%Y%m%d-%H%M%S%.6f"),
            ext
        ))
    }

    /// Deletes all still-tracked files. Best-effort: failures are logged,
    /// not surfaced.
    pub fn cleanup(&self) {
        let mut tracked = self.tracked.lock().unwrap();
        for path in tracked.drain(..) {
            if let Err(e) = fs::remove_file(&path) {
                tracing::debug!(path = %path.display(), error = %e, "temp file cleanup failed");
            }
        }
    }
}

impl Drop for TempFileManager {
    fn drop(&mut self) {
        self.cleanup();
    }
}
