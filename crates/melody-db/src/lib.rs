pub mod migrations;
pub mod models;
pub mod queries;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;
use tracing::{error, info};

/// How long a statement waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DbError {
    /// The database could not be opened for this request.
    #[error("database unavailable: {0}")]
    Unavailable(#[source] rusqlite::Error),
    #[error("username already exists")]
    Conflict,
    #[error(transparent)]
    Query(#[from] rusqlite::Error),
}

/// Handle to the SQLite file. Holds no open connection: every call to
/// [`Database::with_conn`] opens its own and closes it when done.
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Create the database if needed and bring the schema up to date.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a connection to an existing database file.
    ///
    /// The file is never created here, so a missing or unreadable database
    /// surfaces as [`DbError::Unavailable`].
    pub fn connect(&self) -> Result<Connection, DbError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .and_then(|conn| {
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            Ok(conn)
        })
        .map_err(|e| {
            error!("Error connecting to database {}: {}", self.path.display(), e);
            DbError::Unavailable(e)
        })?;
        Ok(conn)
    }

    /// Run `f` on a fresh connection. The connection is dropped on every exit path.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self.connect()?;
        f(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("melody.db")).unwrap();

        let tables: Vec<String> = db
            .with_conn(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .unwrap();

        for table in ["calendar_todos", "messages", "moments", "users"] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }
    }

    #[test]
    fn reopening_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("melody.db");
        Database::open(&path).unwrap();
        Database::open(&path).unwrap();
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("melody.db")).unwrap();
        drop(dir);

        let err = db.connect().unwrap_err();
        assert!(matches!(err, DbError::Unavailable(_)));
    }
}
