//! SQLite connection factory for shelf.
//!
//! A single `rusqlite::Connection` sits behind a mutex; async callers hand a
//! closure to [`Database::call`], which runs it on the blocking pool so the
//! runtime never stalls on disk I/O. Each closure runs with exclusive access
//! to the connection, so one statement (or one transaction) is atomic with
//! respect to every other caller.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rusqlite::Connection;
use shelf_kernel::settings::DatabaseSettings;
use shelf_kernel::Migration;
use thiserror::Error;

mod migrations;

pub use migrations::apply_migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database connection lock poisoned")]
    Poisoned,

    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Cloneable handle to the shared SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the store described by `settings`.
    pub fn open(settings: &DatabaseSettings) -> DbResult<Self> {
        if settings.is_in_memory() {
            Self::open_in_memory()
        } else {
            Self::open_path(&settings.path)
        }
    }

    /// Opens (or creates) a database file.
    pub fn open_path(path: impl AsRef<Path>) -> DbResult<Self> {
        let started_at = Instant::now();
        let path = path.as_ref();

        let conn = Connection::open(path).inspect_err(|err| {
            tracing::error!(path = %path.display(), error = %err, "failed to open database file");
        })?;
        let database = Self::bootstrap(conn)?;

        tracing::info!(
            mode = "file",
            path = %path.display(),
            duration_ms = started_at.elapsed().as_millis() as u64,
            "database opened"
        );
        Ok(database)
    }

    /// Opens a private in-memory database, discarded when the last handle drops.
    pub fn open_in_memory() -> DbResult<Self> {
        let started_at = Instant::now();
        let database = Self::bootstrap(Connection::open_in_memory()?)?;

        tracing::info!(
            mode = "memory",
            duration_ms = started_at.elapsed().as_millis() as u64,
            "database opened"
        );
        Ok(database)
    }

    fn bootstrap(conn: Connection) -> DbResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with exclusive access to the connection on the blocking pool.
    pub async fn call<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| E::from(DbError::Poisoned))?;
            f(&mut *guard)
        })
        .await
        .map_err(|err| E::from(DbError::Task(err)))?
    }

    /// Applies every migration not yet recorded in `schema_migrations`.
    ///
    /// Returns the number of migrations applied by this call.
    pub async fn migrate(&self, migrations: Vec<(String, Migration)>) -> DbResult<usize> {
        self.call(move |conn| apply_migrations(conn, &migrations))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn call_runs_closure_against_connection() {
        let database = Database::open_in_memory().unwrap();

        let value: i64 = database
            .call(|conn| -> DbResult<i64> {
                Ok(conn.query_row("SELECT 40 + 2", [], |row| row.get(0))?)
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn foreign_keys_are_enabled() {
        let database = Database::open_in_memory().unwrap();

        let enabled: i64 = database
            .call(|conn| -> DbResult<i64> {
                Ok(conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0))?)
            })
            .await
            .unwrap();

        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn sqlite_errors_surface_as_db_errors() {
        let database = Database::open_in_memory().unwrap();

        let err = database
            .call(|conn| -> DbResult<()> {
                conn.execute_batch("SELECT * FROM missing_table;")?;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Sqlite(_)));
    }

    #[test]
    fn open_honours_in_memory_setting() {
        let settings = DatabaseSettings {
            path: DatabaseSettings::IN_MEMORY.to_string(),
        };
        assert!(Database::open(&settings).is_ok());
    }
}
