//! Database connection pool management.
//!
//! This module provides connection pooling for SQLite using r2d2.
//! It handles pool initialization, connection customization, and running migrations.
//! Every failure here is reported as [`Error::Initialization`].

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use imageforge_common::{Error, Result};
use rusqlite::Connection;

use crate::migrations;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const POOL_SIZE: u32 = 4;

const CONNECTION_PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA busy_timeout = 5000;";

/// Initialize a new database pool with the given file path.
///
/// This function will:
/// - Create the SQLite database file if it doesn't exist
/// - Run pending database migrations on a dedicated connection
/// - Set up connection pooling with r2d2 (WAL journal, busy timeout)
///
/// The file is opened once directly before the pool is built so that an
/// unopenable path fails immediately instead of after the pool's
/// connection timeout.
///
/// # Example
///
/// ```no_run
/// use imageforge_db::pool::init_pool;
///
/// let pool = init_pool("/var/lib/imageforge/imageforge-gallery.sqlite").unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let conn = Connection::open(db_path)
        .map_err(|e| Error::initialization(format!("Failed to open {}: {}", db_path, e)))?;
    conn.execute_batch(CONNECTION_PRAGMAS)
        .map_err(|e| Error::initialization(format!("Failed to configure {}: {}", db_path, e)))?;
    migrations::run_migrations(&conn)?;
    drop(conn);

    let manager =
        SqliteConnectionManager::file(db_path).with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));

    Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .map_err(|e| Error::initialization(format!("Failed to create connection pool: {}", e)))
}

/// Initialize an in-memory database pool for testing.
///
/// Each call creates a uniquely-named shared-cache in-memory database, so
/// separate pools never see each other's data while all connections within
/// one pool share state. The database is lost when the pool is dropped.
///
/// # Example
///
/// ```
/// use imageforge_db::pool::init_memory_pool;
///
/// let pool = init_memory_pool().unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let uri = format!(
        "file:imageforge_mem_{}_{}?mode=memory&cache=shared",
        std::process::id(),
        n
    );

    let manager = SqliteConnectionManager::file(uri);

    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .map_err(|e| Error::initialization(format!("Failed to create in-memory pool: {}", e)))?;

    let conn = pool.get().map_err(|e| {
        Error::initialization(format!("Failed to get connection for migrations: {}", e))
    })?;

    migrations::run_migrations(&conn)?;

    Ok(pool)
}

/// Get a connection from the pool.
///
/// The caller picks the error kind, since a connection failure during a
/// read is a read failure and during a write is a write failure.
///
/// # Example
///
/// ```
/// use imageforge_common::Error;
/// use imageforge_db::pool::{init_memory_pool, get_conn};
///
/// let pool = init_memory_pool().unwrap();
/// let conn = get_conn(&pool, Error::read).unwrap();
/// ```
pub fn get_conn(pool: &DbPool, kind: fn(String) -> Error) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| kind(format!("Failed to get connection from pool: {}", e)))
}
