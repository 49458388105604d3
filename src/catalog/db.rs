// SQLite catalog setup and migrations
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type DbResult<T> = Result<T, DbError>;

// Thread-safe database connection wrapper
pub struct DbConnection {
    conn: Arc<Mutex<Connection>>,
}

impl DbConnection {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clone for DbConnection {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

/// Open (or create) the catalog database at `db_path`
pub fn init_db(db_path: &Path) -> DbResult<DbConnection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(db_path)?;
    prepare(&conn)?;
    Ok(DbConnection::new(conn))
}

/// In-memory catalog, used by tests and dry runs
pub fn open_in_memory() -> DbResult<DbConnection> {
    let conn = Connection::open_in_memory()?;
    prepare(&conn)?;
    Ok(DbConnection::new(conn))
}

fn prepare(conn: &Connection) -> DbResult<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    run_migrations(conn)
}

fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current_version < 1 {
        migration_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [1])?;
    }

    Ok(())
}

fn migration_v1(conn: &Connection) -> DbResult<()> {
    // base_seed is TEXT because SQLite integers are signed 64-bit
    conn.execute(
        "CREATE TABLE IF NOT EXISTS build_runs (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            split TEXT NOT NULL,
            base_seed TEXT NOT NULL,
            severity_json TEXT NOT NULL,
            status TEXT NOT NULL,
            mean_f1 REAL,
            processed INTEGER NOT NULL DEFAULT 0,
            skipped INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_build_runs_created_at ON build_runs(created_at DESC)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS performances (
            id TEXT PRIMARY KEY,
            run_id TEXT NOT NULL,
            performance_id TEXT NOT NULL,
            annotation_path TEXT NOT NULL,
            output_path TEXT NOT NULL,
            output_sha256 TEXT NOT NULL,
            bytes INTEGER NOT NULL,
            beat_count INTEGER NOT NULL,
            f1 REAL NOT NULL,
            deleted INTEGER NOT NULL,
            inserted INTEGER NOT NULL,
            offset_count INTEGER NOT NULL,
            noisy INTEGER NOT NULL,
            FOREIGN KEY (run_id) REFERENCES build_runs(id) ON DELETE CASCADE,
            UNIQUE (run_id, performance_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_performances_run_id ON performances(run_id)",
        [],
    )?;

    Ok(())
}
