//! File replacement helpers
//!
//! Every file modseal writes (modules, key files, room snapshots) goes
//! through a sibling temporary file that is renamed over the target, so a
//! crash never leaves a half-written file behind.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Sibling temporary path: `room.py` -> `room.py.tmp`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `content`, keeping the permissions of an existing file.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let temp = temp_path(path);
    write_new(&temp, content, None)?;

    if let Ok(existing) = fs::metadata(path) {
        fs::set_permissions(&temp, existing.permissions())?;
    }

    rename_into_place(&temp, path)
}

/// Replace `path` with secret `content`; the file is owner-only on Unix.
pub fn write_secret(path: &Path, content: &[u8]) -> Result<()> {
    let temp = temp_path(path);
    write_new(&temp, content, Some(0o600))?;
    rename_into_place(&temp, path)
}

fn write_new(path: &Path, content: &[u8], mode: Option<u32>) -> Result<()> {
    // A stale temp file would keep its old permissions
    let _ = fs::remove_file(path);

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if let Some(mode) = mode {
            options.mode(mode);
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.sync_all()?;
    Ok(())
}

fn rename_into_place(temp: &Path, path: &Path) -> Result<()> {
    if let Err(e) = fs::rename(temp, path) {
        let _ = fs::remove_file(temp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_is_sibling() {
        let temp = temp_path(Path::new("/srv/modules/room1.py"));
        assert_eq!(temp, PathBuf::from("/srv/modules/room1.py.tmp"));
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("module.py");

        write_atomic(&path, b"first\n").unwrap();
        write_atomic(&path, b"second\n").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second\n");
        assert!(!temp_path(&path).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_secret_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("private_key.pem");
        write_secret(&path, b"secret").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool.py");
        fs::write(&path, b"old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o750)).unwrap();

        write_atomic(&path, b"new").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }
}
