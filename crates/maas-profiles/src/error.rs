//! Error types for profile operations

use crate::storage::db::DatabaseError;
use thiserror::Error;

/// Result type for profile operations
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors that can occur while building, storing or loading profiles
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Profile names must be non-empty
    #[error("Invalid profile name: {0:?}")]
    InvalidName(String),

    /// Credentials string could not be parsed
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// A reserved attribute was given a value of the wrong shape
    #[error("Invalid value for '{key}': {message}")]
    InvalidAttribute { key: String, message: String },

    /// No profile stored under this name
    #[error("Profile '{name}' not found")]
    NotFound { name: String },

    /// A stored row exists but cannot be decoded
    #[error("Profile '{name}' is malformed: {message}")]
    Malformed { name: String, message: String },

    /// No home directory to place the default database in
    #[error("Could not determine home directory")]
    NoHomeDir,

    /// Storage layer error
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ProfileError {
    /// Get the error code for CLI/API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidName(_) | Self::InvalidCredentials(_) | Self::InvalidAttribute { .. } => {
                "VALIDATION_ERROR"
            }
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Malformed { .. } => "MALFORMED",
            Self::NoHomeDir => "NO_HOME_DIR",
            Self::Database(DatabaseError::Closed) => "STORE_CLOSED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Whether this is the not-found error raised by `load`
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the store was used after being closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Database(DatabaseError::Closed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = ProfileError::NotFound {
            name: "alice".to_string(),
        };
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(err.is_not_found());
        assert!(!err.is_closed());

        let err = ProfileError::from(DatabaseError::Closed);
        assert_eq!(err.code(), "STORE_CLOSED");
        assert!(err.is_closed());

        let err = ProfileError::InvalidName(String::new());
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_not_found_message() {
        let err = ProfileError::NotFound {
            name: "alice".to_string(),
        };
        assert_eq!(err.to_string(), "Profile 'alice' not found");
    }
}
