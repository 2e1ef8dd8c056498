//! The profile value type

use super::replace::Replace;
use crate::credentials::Credentials;
use crate::error::{ProfileError, ProfileResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Attribute names held in dedicated fields rather than in [`Profile::other`]
pub const RESERVED_KEYS: [&str; 4] = ["name", "url", "credentials", "description"];

/// A named connection to a remote MAAS server
///
/// Profiles are immutable: fields are only reachable through accessors, and
/// every change goes through [`Profile::replace`], which leaves the receiver
/// untouched and yields a new value.
///
/// ```compile_fail
/// let profile = maas_profiles::Profile::new("alice", "http://example.com/").unwrap();
/// profile.name = String::from("bob");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Map<String, Value>", try_from = "Map<String, Value>")]
pub struct Profile {
    pub(super) name: String,
    pub(super) url: String,
    pub(super) credentials: Option<Credentials>,
    pub(super) description: Value,
    pub(super) other: Map<String, Value>,
}

impl Profile {
    /// Create an anonymous profile with an empty description
    ///
    /// # Errors
    /// Returns an error if the name is empty
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> ProfileResult<Self> {
        Self::builder(name, url).build()
    }

    /// Start building a profile from scratch
    pub fn builder(name: impl Into<String>, url: impl Into<String>) -> Replace {
        Replace::new(Self {
            name: name.into(),
            url: url.into(),
            credentials: None,
            description: empty_description(),
            other: Map::new(),
        })
    }

    /// Derive a new profile from this one
    ///
    /// The builder starts as a copy; `self` is never modified.
    pub fn replace(&self) -> Replace {
        Replace::new(self.clone())
    }

    /// Derive a new profile by applying a whole object of changes
    ///
    /// Reserved keys overwrite the matching attribute; every other key is
    /// merged into [`Profile::other`].
    ///
    /// # Errors
    /// Returns an error if a reserved key has the wrong shape or the
    /// resulting name is empty
    pub fn replace_with(&self, changes: Map<String, Value>) -> ProfileResult<Self> {
        changes
            .into_iter()
            .fold(self.replace(), |replace, (key, value)| replace.set(key, value))
            .build()
    }

    /// Flatten the profile into a single JSON object
    ///
    /// Contains the reserved attributes plus every key of [`Profile::other`].
    #[must_use]
    pub fn dump(&self) -> Map<String, Value> {
        let mut dump = self.other.clone();
        dump.insert("name".to_string(), Value::String(self.name.clone()));
        dump.insert("url".to_string(), Value::String(self.url.clone()));
        dump.insert(
            "credentials".to_string(),
            match &self.credentials {
                Some(credentials) => Value::from(<[String; 3]>::from(credentials.clone()).to_vec()),
                None => Value::Null,
            },
        );
        dump.insert("description".to_string(), self.description.clone());
        dump
    }

    /// Rebuild a profile from the output of [`Profile::dump`]
    ///
    /// # Errors
    /// Returns an error if `name` or `url` is missing or not a string, or if
    /// any other reserved attribute cannot be decoded
    pub fn from_dump(mut dump: Map<String, Value>) -> ProfileResult<Self> {
        let name = take_string(&mut dump, "name")?;
        let url = take_string(&mut dump, "url")?;
        dump.into_iter()
            .fold(Self::builder(name, url), |replace, (key, value)| {
                replace.set(key, value)
            })
            .build()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// `None` for an anonymous profile
    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Cached description of the server's API
    #[must_use]
    pub fn description(&self) -> &Value {
        &self.description
    }

    /// Extra attributes outside the reserved set
    #[must_use]
    pub fn other(&self) -> &Map<String, Value> {
        &self.other
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.credentials.is_none()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            write!(f, "<Profile {} (anonymous) {}>", self.name, self.url)
        } else {
            write!(f, "<Profile {} {}>", self.name, self.url)
        }
    }
}

impl From<Profile> for Map<String, Value> {
    fn from(profile: Profile) -> Self {
        profile.dump()
    }
}

impl TryFrom<Map<String, Value>> for Profile {
    type Error = ProfileError;

    fn try_from(dump: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_dump(dump)
    }
}

fn empty_description() -> Value {
    Value::Object(Map::new())
}

fn take_string(dump: &mut Map<String, Value>, key: &str) -> ProfileResult<String> {
    match dump.remove(key) {
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(ProfileError::InvalidAttribute {
            key: key.to_string(),
            message: format!("expected a string, got {other}"),
        }),
        None => Err(ProfileError::InvalidAttribute {
            key: key.to_string(),
            message: "missing".to_string(),
        }),
    }
}
