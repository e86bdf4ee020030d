//! Database connection management.
//!
//! The [`Database`] struct owns an r2d2 pool of SQLite connections and
//! guarantees that migrations are run before any other operation. Every
//! pooled connection enforces foreign keys, which is what makes message
//! deletion cascade to delivery statuses.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Pool sizing and lock-wait bounds.
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// How long SQLite waits on a locked database before reporting busy.
    pub busy_timeout: Duration,
    /// How long a caller waits for a free pooled connection.
    pub checkout_timeout: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 8,
            busy_timeout: Duration::from_secs(2),
            checkout_timeout: Duration::from_secs(5),
        }
    }
}

/// Pooled handle to the WASAText database. Cloning shares the pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl Database {
    /// Open (or create) the database in the platform data directory.
    ///
    /// - Linux:   `~/.local/share/wasatext/wasatext.db`
    /// - macOS:   `~/Library/Application Support/io.wasatext.wasatext/wasatext.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\wasatext\wasatext\data\wasatext.db`
    pub fn open_default(options: &DatabaseOptions) -> Result<Self> {
        let path = default_path()?;
        Self::open_at(&path, options)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path, options: &DatabaseOptions) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!(
            path = %path.display(),
            max_connections = options.max_connections,
            "opening database"
        );

        let busy_timeout = options.busy_timeout;
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(options.max_connections.max(1))
            .min_idle(Some(1))
            .connection_timeout(options.checkout_timeout)
            .build(manager)
            .map_err(StoreError::Open)?;

        let db = Self {
            pool,
            path: path.to_path_buf(),
        };

        // Run schema migrations.
        let conn = db.pool.get().map_err(StoreError::Open)?;
        migrations::run_migrations(&conn)?;

        Ok(db)
    }

    /// Check out a pooled connection.
    ///
    /// The returned guard dereferences to a [`rusqlite::Connection`]; callers
    /// that need atomicity open a transaction on it themselves.
    pub fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Liveness probe: round-trips a trivial query.
    pub fn ping(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Applied schema version (`PRAGMA user_version`).
    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.conn()?;
        Ok(migrations::current_version(&conn)?)
    }

    /// Filesystem path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn default_path() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("io", "wasatext", "wasatext").ok_or(StoreError::NoDataDir)?;
    Ok(project_dirs.data_dir().join("wasatext.db"))
}

#[cfg(test)]
pub(crate) fn test_db() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("test.db"), &DatabaseOptions::default())
        .expect("should open");
    (db, dir)
}
