//! OAuth credentials carried by a profile

use crate::error::ProfileError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OAuth 1.0a credentials for the remote API
///
/// Stored as a three-element array and written on the command line as
/// `consumer_key:token_key:token_secret`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "[String; 3]", try_from = "[String; 3]")]
pub struct Credentials {
    consumer_key: String,
    token_key: String,
    token_secret: String,
}

impl Credentials {
    /// Create credentials from their three parts
    ///
    /// # Errors
    /// Returns an error if any part is empty
    pub fn new(
        consumer_key: impl Into<String>,
        token_key: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Result<Self, ProfileError> {
        let credentials = Self {
            consumer_key: consumer_key.into(),
            token_key: token_key.into(),
            token_secret: token_secret.into(),
        };
        if credentials.consumer_key.is_empty()
            || credentials.token_key.is_empty()
            || credentials.token_secret.is_empty()
        {
            return Err(ProfileError::InvalidCredentials(
                "consumer key, token key and token secret must all be non-empty".to_string(),
            ));
        }
        Ok(credentials)
    }

    /// Parse the `consumer_key:token_key:token_secret` form
    ///
    /// # Errors
    /// Returns an error unless there are exactly three non-empty parts
    pub fn parse(s: &str) -> Result<Self, ProfileError> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [consumer_key, token_key, token_secret] => {
                Self::new(*consumer_key, *token_key, *token_secret)
            }
            _ => Err(ProfileError::InvalidCredentials(format!(
                "expected 3 colon-separated parts, got {}",
                parts.len()
            ))),
        }
    }

    #[must_use]
    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    #[must_use]
    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    #[must_use]
    pub fn token_secret(&self) -> &str {
        &self.token_secret
    }
}

impl FromStr for Credentials {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.consumer_key, self.token_key, self.token_secret
        )
    }
}

// Keep the secret out of debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("token_key", &self.token_key)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

impl From<Credentials> for [String; 3] {
    fn from(credentials: Credentials) -> Self {
        [
            credentials.consumer_key,
            credentials.token_key,
            credentials.token_secret,
        ]
    }
}

impl TryFrom<[String; 3]> for Credentials {
    type Error = ProfileError;

    fn try_from([consumer_key, token_key, token_secret]: [String; 3]) -> Result<Self, Self::Error> {
        Self::new(consumer_key, token_key, token_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let credentials = Credentials::parse("ck:tk:ts").unwrap();
        assert_eq!(credentials.consumer_key(), "ck");
        assert_eq!(credentials.token_key(), "tk");
        assert_eq!(credentials.token_secret(), "ts");
        assert_eq!(credentials.to_string(), "ck:tk:ts");
        assert_eq!("ck:tk:ts".parse::<Credentials>().unwrap(), credentials);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Credentials::parse("ck:tk").is_err());
        assert!(Credentials::parse("ck:tk:ts:extra").is_err());
        assert!(Credentials::parse("ck::ts").is_err());
        assert!(Credentials::parse("").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credentials = Credentials::new("ck", "tk", "hunter2").unwrap();
        let debug = format!("{credentials:?}");
        assert!(debug.contains("ck"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_serializes_as_array() {
        let credentials = Credentials::new("ck", "tk", "ts").unwrap();
        let json = serde_json::to_value(&credentials).unwrap();
        assert_eq!(json, serde_json::json!(["ck", "tk", "ts"]));

        let back: Credentials = serde_json::from_value(json).unwrap();
        assert_eq!(back, credentials);

        let bad = serde_json::from_value::<Credentials>(serde_json::json!(["ck", "", "ts"]));
        assert!(bad.is_err());
    }
}
