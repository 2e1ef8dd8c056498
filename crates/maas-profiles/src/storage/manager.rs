//! Profile storage operations (CRUD and the default profile)

use crate::error::{ProfileError, ProfileResult};
use crate::paths;
use crate::profile::Profile;
use crate::storage::db::{Database, DatabaseError};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;

/// Key of the option naming the default profile
const DEFAULT_OPTION: &str = "default";

/// Profile storage operations
///
/// Borrows a [`Database`]; any number of managers may share one, and every
/// write is visible to the others as soon as it returns.
pub struct ProfileManager<'a> {
    db: &'a Database,
}

impl<'a> ProfileManager<'a> {
    /// Create a new profile manager
    #[must_use]
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Open the database at `path` for the duration of `f`
    ///
    /// A missing file is created readable and writable by its owner only;
    /// an existing file keeps its permissions. The connection is closed as in
    /// [`ProfileManager::scoped`]. The manager cannot outlive the call:
    ///
    /// ```compile_fail
    /// use maas_profiles::{ProfileError, ProfileManager};
    /// let escaped = ProfileManager::open("/tmp/profiles.db", |manager| {
    ///     Ok::<_, ProfileError>(manager.database())
    /// });
    /// ```
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or closed, or the
    /// error returned by `f`
    pub fn open<T, E, F>(path: impl AsRef<Path>, f: F) -> Result<T, E>
    where
        F: FnOnce(&ProfileManager<'_>) -> Result<T, E>,
        E: From<ProfileError>,
    {
        let mut db = Database::open_private(path.as_ref()).map_err(ProfileError::from)?;
        Self::scoped(&mut db, f)
    }

    /// Run `f` with a manager over `db`, then close `db`
    ///
    /// `db` is closed on every exit path: after `f` returns `Ok` or `Err`,
    /// and while unwinding if `f` panics.
    ///
    /// # Errors
    /// Returns the error from `f`, or an error if the database cannot be
    /// closed
    pub fn scoped<T, E, F>(db: &mut Database, f: F) -> Result<T, E>
    where
        F: FnOnce(&ProfileManager<'_>) -> Result<T, E>,
        E: From<ProfileError>,
    {
        let mut guard = CloseOnDrop(db);
        let result = f(&ProfileManager::new(&*guard.0));
        let closed = guard.0.close();
        let value = result?;
        closed.map_err(ProfileError::from)?;
        Ok(value)
    }

    /// Like [`ProfileManager::open`], at [`paths::default_database_path`]
    ///
    /// # Errors
    /// Returns an error if the path cannot be resolved, plus everything
    /// [`ProfileManager::open`] can return
    pub fn open_default<T, E, F>(f: F) -> Result<T, E>
    where
        F: FnOnce(&ProfileManager<'_>) -> Result<T, E>,
        E: From<ProfileError>,
    {
        let path = paths::default_database_path()?;
        Self::open(path, f)
    }

    /// The database this manager works on
    #[must_use]
    pub fn database(&self) -> &'a Database {
        self.db
    }

    /// Insert or overwrite the profile stored under `profile.name()`
    ///
    /// # Errors
    /// Returns an error if the profile cannot be written
    pub fn save(&self, profile: &Profile) -> ProfileResult<()> {
        self.db.with_transaction(|tx| save_profile(tx, profile))?;
        tracing::debug!(profile = profile.name(), "saved profile");
        Ok(())
    }

    /// Load the profile stored under `name`
    ///
    /// # Errors
    /// Returns [`ProfileError::NotFound`] if there is no such profile and
    /// [`ProfileError::Malformed`] if the stored row cannot be decoded
    pub fn load(&self, name: &str) -> ProfileResult<Profile> {
        self.db.with_transaction(|tx| load_profile(tx, name))
    }

    /// Delete the profile stored under `name`
    ///
    /// Clears the default pointer too if it names this profile. Deleting a
    /// missing profile is not an error; the return value says whether a row
    /// was removed.
    ///
    /// # Errors
    /// Returns an error if the profile cannot be deleted
    pub fn delete(&self, name: &str) -> ProfileResult<bool> {
        let pointer = encode_json(name, &Value::String(name.to_string()))?;
        let deleted = self.db.with_transaction(|tx| {
            let deleted = tx
                .execute("DELETE FROM profiles WHERE name = ?1", params![name])
                .map_err(DatabaseError::from)?;
            tx.execute(
                "DELETE FROM config WHERE name = ?1 AND data = ?2",
                params![DEFAULT_OPTION, pointer],
            )
            .map_err(DatabaseError::from)?;
            Ok::<_, ProfileError>(deleted > 0)
        })?;

        tracing::debug!(profile = name, deleted, "deleted profile");
        Ok(deleted)
    }

    /// Names of all stored profiles
    ///
    /// # Errors
    /// Returns an error if the profiles cannot be listed
    pub fn names(&self) -> ProfileResult<BTreeSet<String>> {
        self.db.with_transaction(|tx| {
            let mut stmt = tx
                .prepare("SELECT name FROM profiles")
                .map_err(DatabaseError::from)?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(DatabaseError::from)?
                .collect::<Result<BTreeSet<_>, _>>()
                .map_err(DatabaseError::from)?;
            Ok(names)
        })
    }

    /// Whether a profile is stored under `name`
    ///
    /// # Errors
    /// Returns an error if the lookup fails
    pub fn contains(&self, name: &str) -> ProfileResult<bool> {
        self.db.with_transaction(|tx| {
            let exists = tx
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM profiles WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )
                .map_err(DatabaseError::from)?;
            Ok(exists)
        })
    }

    /// Load every stored profile, ordered by name
    ///
    /// A row that cannot be decoded shows up as an `Err` entry without
    /// hiding the others.
    ///
    /// # Errors
    /// Returns an error if the profiles cannot be listed
    pub fn profiles(&self) -> ProfileResult<Vec<ProfileResult<Profile>>> {
        self.db.with_transaction(|tx| {
            let mut stmt = tx
                .prepare("SELECT name, data FROM profiles ORDER BY name")
                .map_err(DatabaseError::from)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(DatabaseError::from)?;

            let mut profiles = Vec::new();
            for row in rows {
                let (name, data) = row.map_err(DatabaseError::from)?;
                let profile = decode_profile(&name, &data);
                if let Err(e) = &profile {
                    tracing::warn!(profile = %name, error = %e, "malformed profile row");
                }
                profiles.push(profile);
            }
            Ok(profiles)
        })
    }

    /// The default profile, if one is set and still exists
    ///
    /// A pointer to a profile that no longer exists reads as no default. The
    /// stored pointer is left as it is.
    ///
    /// # Errors
    /// Returns an error if the pointer or the profile cannot be read
    pub fn default_profile(&self) -> ProfileResult<Option<Profile>> {
        self.db.with_transaction(|tx| {
            let Some(name) = read_default_name(tx)? else {
                return Ok(None);
            };
            match load_profile(tx, &name) {
                Ok(profile) => Ok(Some(profile)),
                Err(ProfileError::NotFound { .. }) => {
                    tracing::debug!(profile = %name, "default profile no longer exists");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
    }

    /// The raw default pointer, without checking that the profile exists
    ///
    /// # Errors
    /// Returns an error if the pointer cannot be read
    pub fn default_name(&self) -> ProfileResult<Option<String>> {
        self.db.with_transaction(|tx| read_default_name(tx))
    }

    /// Save `profile` and make it the default, in one transaction
    ///
    /// # Errors
    /// Returns an error if either write fails
    pub fn set_default(&self, profile: &Profile) -> ProfileResult<()> {
        let pointer = encode_json(profile.name(), &Value::String(profile.name().to_string()))?;
        self.db.with_transaction(|tx| {
            save_profile(tx, profile)?;
            tx.execute(
                r"
                INSERT INTO config (name, data) VALUES (?1, ?2)
                ON CONFLICT(name) DO UPDATE SET data = excluded.data
                ",
                params![DEFAULT_OPTION, pointer],
            )
            .map_err(DatabaseError::from)?;
            Ok::<_, ProfileError>(())
        })?;

        tracing::debug!(profile = profile.name(), "set default profile");
        Ok(())
    }

    /// Forget the default profile; the profile itself stays stored
    ///
    /// # Errors
    /// Returns an error if the pointer cannot be removed
    pub fn clear_default(&self) -> ProfileResult<()> {
        self.db.with_transaction(|tx| {
            tx.execute(
                "DELETE FROM config WHERE name = ?1",
                params![DEFAULT_OPTION],
            )
            .map_err(DatabaseError::from)?;
            Ok::<_, ProfileError>(())
        })?;

        tracing::debug!("cleared default profile");
        Ok(())
    }
}

/// Closes the database when dropped, unless it was closed already
struct CloseOnDrop<'d>(&'d mut Database);

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.0.close() {
            tracing::warn!(error = %e, "failed to close profile database");
        }
    }
}

fn save_profile(conn: &Connection, profile: &Profile) -> ProfileResult<()> {
    let mut dump = profile.dump();
    // The row key carries the name
    dump.remove("name");
    let data = encode_json(profile.name(), &Value::Object(dump))?;

    conn.execute(
        r"
        INSERT INTO profiles (name, data) VALUES (?1, ?2)
        ON CONFLICT(name) DO UPDATE SET data = excluded.data
        ",
        params![profile.name(), data],
    )
    .map_err(DatabaseError::from)?;

    Ok(())
}

fn load_profile(conn: &Connection, name: &str) -> ProfileResult<Profile> {
    let data: Option<String> = conn
        .query_row(
            "SELECT data FROM profiles WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()
        .map_err(DatabaseError::from)?;

    match data {
        Some(data) => decode_profile(name, &data),
        None => Err(ProfileError::NotFound {
            name: name.to_string(),
        }),
    }
}

fn decode_profile(name: &str, data: &str) -> ProfileResult<Profile> {
    let malformed = |message: String| ProfileError::Malformed {
        name: name.to_string(),
        message,
    };

    let mut dump: Map<String, Value> =
        serde_json::from_str(data).map_err(|e| malformed(e.to_string()))?;
    dump.insert("name".to_string(), Value::String(name.to_string()));
    Profile::from_dump(dump).map_err(|e| malformed(e.to_string()))
}

fn read_default_name(conn: &Connection) -> ProfileResult<Option<String>> {
    let data: Option<String> = conn
        .query_row(
            "SELECT data FROM config WHERE name = ?1",
            params![DEFAULT_OPTION],
            |row| row.get(0),
        )
        .optional()
        .map_err(DatabaseError::from)?;

    let Some(data) = data else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(&data) {
        Ok(Value::String(name)) => Ok(Some(name)),
        Ok(Value::Null) => Ok(None),
        Ok(other) => Err(ProfileError::Malformed {
            name: DEFAULT_OPTION.to_string(),
            message: format!("expected a profile name, got {other}"),
        }),
        Err(e) => Err(ProfileError::Malformed {
            name: DEFAULT_OPTION.to_string(),
            message: e.to_string(),
        }),
    }
}

fn encode_json(name: &str, value: &Value) -> ProfileResult<String> {
    serde_json::to_string(value).map_err(|e| ProfileError::Malformed {
        name: name.to_string(),
        message: format!("Failed to serialize: {e}"),
    })
}
