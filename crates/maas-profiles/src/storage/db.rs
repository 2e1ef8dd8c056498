//! Database connection management

use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::migrations;
use crate::util;

/// How long to wait on another process holding the database lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Profile store is closed")]
    Closed,

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Database wrapper
///
/// Owns the single connection. Once [`Database::close`] has been called every
/// further operation fails with [`DatabaseError::Closed`].
pub struct Database {
    conn: Option<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path)?;
        configure(&conn)?;
        migrations::run_migrations(&conn)?;

        tracing::debug!(path = %path.display(), "opened profile database");
        Ok(Self { conn: Some(conn) })
    }

    /// Open a database, creating it owner-only if it does not exist yet
    ///
    /// A file that already exists keeps whatever permissions it has.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or opened
    pub fn open_private(path: &Path) -> Result<Self, DatabaseError> {
        let created = util::create_private_file(path)?;
        if created {
            tracing::debug!(path = %path.display(), "created private profile database");
        }
        Self::open(path)
    }

    /// Create an in-memory database (for testing)
    ///
    /// # Errors
    /// Returns an error if the database cannot be created
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        configure(&conn)?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn: Some(conn) })
    }

    /// Get a reference to the connection
    ///
    /// # Errors
    /// Returns [`DatabaseError::Closed`] after [`Database::close`]
    pub fn connection(&self) -> Result<&Connection, DatabaseError> {
        self.conn.as_ref().ok_or(DatabaseError::Closed)
    }

    /// Run `f` inside a transaction
    ///
    /// Commits when `f` returns `Ok`. Returning `Err` or unwinding drops the
    /// transaction, which rolls it back.
    ///
    /// # Errors
    /// Returns the error from `f`, or a database error if the transaction
    /// cannot be started or committed
    pub fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        let conn = self.connection()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(DatabaseError::from)?;
        let value = f(&tx)?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(value)
    }

    /// Close the connection
    ///
    /// Closing twice is a no-op.
    ///
    /// # Errors
    /// Returns an error if `SQLite` refuses to close the connection
    pub fn close(&mut self) -> Result<(), DatabaseError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| DatabaseError::from(e))?;
            tracing::debug!("closed profile database");
        }
        Ok(())
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}

fn configure(conn: &Connection) -> Result<(), DatabaseError> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    // Concurrent writers from other processes wait on SQLite's own lock
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_then_use() {
        let mut db = Database::in_memory().unwrap();
        assert!(!db.is_closed());

        db.close().unwrap();
        assert!(db.is_closed());
        assert!(matches!(db.connection(), Err(DatabaseError::Closed)));

        let result: Result<(), DatabaseError> = db.with_transaction(|_| Ok(()));
        assert!(matches!(result, Err(DatabaseError::Closed)));

        // Second close is harmless
        db.close().unwrap();
    }

    #[test]
    fn test_transaction_commits_on_ok() {
        let db = Database::in_memory().unwrap();
        db.with_transaction(|tx| {
            tx.execute("INSERT INTO config (name, data) VALUES ('k', '1')", [])?;
            Ok::<_, DatabaseError>(())
        })
        .unwrap();

        let count: i64 = db
            .connection()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM config", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_err() {
        let db = Database::in_memory().unwrap();
        let result: Result<(), DatabaseError> = db.with_transaction(|tx| {
            tx.execute("INSERT INTO config (name, data) VALUES ('k', '1')", [])?;
            Err(DatabaseError::Migration("boom".to_string()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .connection()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM config", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
