//! Utility functions for profile storage

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

/// Owner-only read/write mode for newly created database files
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Create `path` as an empty file readable and writable only by its owner
///
/// Returns `Ok(true)` if the file was created by this call and `Ok(false)` if
/// it already existed, in which case its permissions are left alone.
///
/// # Errors
/// Returns an error if the file cannot be created
pub fn create_private_file(path: &Path) -> io::Result<bool> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(PRIVATE_FILE_MODE);
    }

    match options.open(path) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e),
    }

    // The umask can only strip bits, but make the mode exact regardless
    #[cfg(unix)]
    {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(path)?.permissions();
        if perms.mode() & 0o777 != PRIVATE_FILE_MODE {
            perms.set_mode(PRIVATE_FILE_MODE);
            fs::set_permissions(path, perms)?;
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config");

        assert!(create_private_file(&path).unwrap());
        assert!(path.is_file());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_existing_file_is_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config");
        std::fs::write(&path, b"contents").unwrap();

        assert!(!create_private_file(&path).unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"contents");
    }

    #[cfg(unix)]
    #[test]
    fn test_mode_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config");
        create_private_file(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
