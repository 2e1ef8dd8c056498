//! Default location of the profile database

use crate::error::{ProfileError, ProfileResult};
use std::path::PathBuf;

/// Environment variable overriding the database location
pub const DATABASE_ENV_VAR: &str = "MAAS_PROFILES_DB";

/// File name of the database inside the home directory
pub const DATABASE_FILE_NAME: &str = ".maascli.db";

/// Resolve the profile database path
///
/// `$MAAS_PROFILES_DB` wins when set and non-empty; otherwise the database
/// lives at `~/.maascli.db`.
///
/// # Errors
/// Returns an error if no override is set and the home directory is unknown
pub fn default_database_path() -> ProfileResult<PathBuf> {
    resolve(std::env::var_os(DATABASE_ENV_VAR).map(PathBuf::from), dirs::home_dir())
}

fn resolve(env_path: Option<PathBuf>, home: Option<PathBuf>) -> ProfileResult<PathBuf> {
    if let Some(path) = env_path {
        if !path.as_os_str().is_empty() {
            return Ok(path);
        }
    }
    let home = home.ok_or(ProfileError::NoHomeDir)?;
    Ok(home.join(DATABASE_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_override_wins() {
        let path = resolve(
            Some(PathBuf::from("/tmp/profiles.db")),
            Some(PathBuf::from("/home/alice")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/profiles.db"));
    }

    #[test]
    fn test_empty_override_ignored() {
        let path = resolve(Some(PathBuf::new()), Some(PathBuf::from("/home/alice"))).unwrap();
        assert_eq!(path, PathBuf::from("/home/alice/.maascli.db"));
    }

    #[test]
    fn test_no_home() {
        assert!(matches!(resolve(None, None), Err(ProfileError::NoHomeDir)));
    }
}
