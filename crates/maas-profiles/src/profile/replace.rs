//! Derivation of new profiles from existing ones

use super::types::Profile;
use crate::credentials::Credentials;
use crate::error::{ProfileError, ProfileResult};
use serde_json::Value;

/// Builder returned by [`Profile::replace`] and [`Profile::builder`]
///
/// Works on its own copy of the profile. Decoding errors from [`Replace::set`]
/// are held back until [`Replace::build`].
#[derive(Debug)]
#[must_use]
pub struct Replace {
    profile: Profile,
    error: Option<ProfileError>,
}

impl Replace {
    pub(super) fn new(profile: Profile) -> Self {
        Self {
            profile,
            error: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.profile.name = name.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.profile.url = url.into();
        self
    }

    /// Set or clear the credentials; `None` makes the profile anonymous
    pub fn credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.profile.credentials = credentials;
        self
    }

    pub fn description(mut self, description: Value) -> Self {
        self.profile.description = description;
        self
    }

    /// Set an attribute by name
    ///
    /// Reserved names go to their dedicated field; anything else is merged
    /// into `other`, overwriting an existing key.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            "name" | "url" => match value {
                Value::String(s) if key == "name" => self.profile.name = s,
                Value::String(s) => self.profile.url = s,
                other => self.fail(&key, format!("expected a string, got {other}")),
            },
            "credentials" => match serde_json::from_value::<Option<Credentials>>(value) {
                Ok(credentials) => self.profile.credentials = credentials,
                Err(e) => self.fail(&key, e.to_string()),
            },
            "description" => self.profile.description = value,
            _ => {
                self.profile.other.insert(key, value);
            }
        }
        self
    }

    /// Finish the derivation
    ///
    /// # Errors
    /// Returns the first attribute error recorded by [`Replace::set`], or
    /// an error if the name is empty
    pub fn build(self) -> ProfileResult<Profile> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.profile.name.is_empty() {
            return Err(ProfileError::InvalidName(self.profile.name));
        }
        Ok(self.profile)
    }

    fn fail(&mut self, key: &str, message: String) {
        if self.error.is_none() {
            self.error = Some(ProfileError::InvalidAttribute {
                key: key.to_string(),
                message,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Profile {
        Profile::builder("alice", "http://example.com:5240/MAAS/")
            .credentials(Some(Credentials::new("ck", "tk", "ts").unwrap()))
            .set("something", "else")
            .build()
            .unwrap()
    }

    #[test]
    fn test_reserved_keys_route_to_fields() {
        let profile = base()
            .replace()
            .set("name", "bob")
            .set("url", "http://other/")
            .set("credentials", Value::Null)
            .set("description", json!({"resources": []}))
            .build()
            .unwrap();

        assert_eq!(profile.name(), "bob");
        assert_eq!(profile.url(), "http://other/");
        assert!(profile.is_anonymous());
        assert_eq!(profile.description(), &json!({"resources": []}));
        assert_eq!(profile.other().len(), 1);
        assert!(!profile.other().contains_key("name"));
    }

    #[test]
    fn test_credentials_from_json_array() {
        let profile = Profile::builder("alice", "http://example.com/")
            .set("credentials", json!(["a", "b", "c"]))
            .build()
            .unwrap();
        assert_eq!(profile.credentials().unwrap().to_string(), "a:b:c");
    }

    #[test]
    fn test_bad_reserved_value_fails_at_build() {
        let err = base().replace().set("url", 42).build().unwrap_err();
        assert!(matches!(err, ProfileError::InvalidAttribute { ref key, .. } if key == "url"));

        let err = base()
            .replace()
            .set("credentials", "not-a-triple")
            .build()
            .unwrap_err();
        assert!(
            matches!(err, ProfileError::InvalidAttribute { ref key, .. } if key == "credentials")
        );
    }

    #[test]
    fn test_first_error_wins() {
        let err = base()
            .replace()
            .set("name", 1)
            .set("url", 2)
            .build()
            .unwrap_err();
        assert!(matches!(err, ProfileError::InvalidAttribute { ref key, .. } if key == "name"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = base().replace().name("").build().unwrap_err();
        assert!(matches!(err, ProfileError::InvalidName(_)));
    }
}
