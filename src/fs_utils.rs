//! Filesystem helpers used by the profile store.
//!
//! Writes go through a sibling temp file and a rename so the destination
//! always holds either the old or the new contents in full.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{ProfileError, Result};

/// Read a whole file as UTF-8, mapping a missing file to `FileNotFound`
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ProfileError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ProfileError::io(path, e),
    })
}

/// Replace the contents of `path` atomically
///
/// The parent directory must already exist. The new file keeps the
/// permissions of the one it replaces; a new file is owner-only on unix.
/// Callers serialize writers with [`WriteLock`].
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let temp_path = sibling_path(path, ".", ".tmp");
    if let Err(e) = write_synced(&temp_path, path, contents) {
        let _ = fs::remove_file(&temp_path);
        return Err(ProfileError::io(&temp_path, e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ProfileError::io(path, e)
    })
}

fn write_synced(temp_path: &Path, dest: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(temp_path)?;

    // A stale temp file keeps its old mode, so set it explicitly either way
    match fs::metadata(dest) {
        Ok(meta) => file.set_permissions(meta.permissions())?,
        Err(_) => {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                file.set_permissions(fs::Permissions::from_mode(0o600))?;
            }
        }
    }

    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

/// `<dir>/<prefix><file name><suffix>`
fn sibling_path(path: &Path, prefix: &str, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}{}", prefix, name, suffix))
}

/// Exclusive lock on `<path>.lock`, released on drop
///
/// The lock file is left in place; removing it would let a waiting writer
/// hold a lock on an unlinked inode.
pub struct WriteLock {
    file: File,
}

impl WriteLock {
    pub fn acquire(target: &Path) -> Result<Self> {
        let path = sibling_path(target, "", ".lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| ProfileError::io(&path, e))?;

        // Blocks until available
        file.lock_exclusive()
            .map_err(|e| ProfileError::io(&path, e))?;

        Ok(Self { file })
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind as ProfileErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_replaces_contents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials");
        fs::write(&path, "old contents that are longer than the new ones").unwrap();

        atomic_write(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!temp_dir.path().join(".credentials.tmp").exists());
    }

    #[test]
    fn test_atomic_write_missing_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("credentials");

        let err = atomic_write(&path, "x").unwrap_err();
        assert_eq!(err.kind(), ProfileErrorKind::Io);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    fn mode_of(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        atomic_write(&path, "new").unwrap();
        assert_eq!(mode_of(&path), 0o600);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        atomic_write(&path, "newer").unwrap();
        assert_eq!(mode_of(&path), 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_new_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials");
        let stale = temp_dir.path().join(".credentials.tmp");
        fs::write(&stale, "leftover").unwrap();
        fs::set_permissions(&stale, fs::Permissions::from_mode(0o644)).unwrap();

        atomic_write(&path, "fresh").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh");
        assert_eq!(mode_of(&path), 0o600);
    }

    #[test]
    fn test_write_lock_reacquire() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials");
        drop(WriteLock::acquire(&path).unwrap());
        assert!(WriteLock::acquire(&path).is_ok());
        assert!(temp_dir.path().join("credentials.lock").exists());
    }

    #[test]
    fn test_read_text_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_text(&temp_dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), ProfileErrorKind::NotFound);
    }
}
