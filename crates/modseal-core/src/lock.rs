//! Directory lock for signing runs
//!
//! Two processes signing the same directory could interleave their writes,
//! so a sign batch holds an exclusive lock file from its first write until it
//! finishes.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Lock file name inside the modules directory
pub const LOCK_FILE_NAME: &str = ".modseal.lock";

/// Held while a batch run owns the directory; released on drop
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
}

impl DirLock {
    /// Acquire the lock for `dir`, failing with [`Error::Locked`] if taken
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(LOCK_FILE_NAME);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(Error::Locked(path)),
            Err(e) => return Err(e.into()),
        };

        let lock = Self { path };
        // Owner pid helps an operator judge whether the lock is stale
        writeln!(file, "{}", std::process::id())?;
        debug!("Acquired lock {}", lock.path.display());
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}
