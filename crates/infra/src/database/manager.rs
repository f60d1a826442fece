//! Connection pooling and schema management for the SQLite store.

use std::path::{Path, PathBuf};

use coverageiq_domain::{CoverageError, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::{debug, info};

const SCHEMA_VERSION: i64 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Owns the connection pool and the schema lifecycle. Repositories borrow
/// connections from here; nothing else opens the database file.
pub struct DbManager {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl DbManager {
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let manager = SqliteConnectionManager::file(&path).with_init(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        });
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .map_err(|e| CoverageError::Database(format!("failed to build pool: {e}")))?;

        info!(
            db_path = %path.display(),
            max_connections = pool.max_size(),
            "sqlite pool initialised"
        );
        Ok(Self { pool, path })
    }

    pub fn get_connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| CoverageError::Database(format!("failed to acquire connection: {e}")))
    }

    /// Applies the schema. Idempotent: every statement guards on
    /// existence, so running against a current database is a no-op.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, strftime('%s','now'))",
            params![SCHEMA_VERSION],
        )
        .map_err(map_sql_error)?;
        debug!(version = SCHEMA_VERSION, "schema migrations applied");
        Ok(())
    }

    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(map_sql_error)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub(crate) fn map_sql_error(err: rusqlite::Error) -> CoverageError {
    CoverageError::Database(format!("sqlite error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_manager() -> (tempfile::TempDir, DbManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = DbManager::new(dir.path().join("test.db"), 4).unwrap();
        (dir, manager)
    }

    #[test]
    fn migrations_create_the_schema() {
        let (_dir, manager) = temp_manager();
        manager.run_migrations().unwrap();

        let conn = manager.get_connection().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn migrations_are_idempotent() {
        let (_dir, manager) = temp_manager();
        manager.run_migrations().unwrap();
        manager.run_migrations().unwrap();

        let conn = manager.get_connection().unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn health_check_passes_on_a_fresh_database() {
        let (_dir, manager) = temp_manager();
        manager.run_migrations().unwrap();
        manager.health_check().unwrap();
    }
}
