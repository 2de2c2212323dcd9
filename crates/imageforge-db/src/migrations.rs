//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order. A
//! `schema_migrations` table tracks which versions have been applied.
//! A database whose recorded version is newer than any migration known to
//! this build is refused rather than opened.

use imageforge_common::{Error, Result};
use rusqlite::Connection;

/// V1: the gallery collection.
///
/// `AUTOINCREMENT` keeps SQLite from handing out the id of a deleted
/// highest row again.
const V1_GALLERY: &str = r#"
CREATE TABLE IF NOT EXISTS images (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    image_data TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// A single migration with its SQL content
struct Migration {
    version: usize,
    name: &'static str,
    sql: &'static str,
}

/// All available migrations
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "gallery",
    sql: V1_GALLERY,
}];

fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY NOT NULL,
            name       TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::initialization(format!("Failed to create schema_migrations: {}", e)))
}

fn get_current_version(conn: &Connection) -> Result<usize> {
    conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
        row.get::<_, Option<usize>>(0)
    })
    .map(Option::unwrap_or_default)
    .map_err(|e| Error::initialization(format!("Failed to read schema version: {}", e)))
}

/// Run all pending migrations
///
/// Creates the migrations table if needed, refuses databases written by a
/// newer schema, then applies each outstanding migration inside its own
/// transaction.
///
/// # Returns
///
/// * `Ok(usize)` - Number of migrations applied
/// * `Err(Error::Initialization)` - If any migration fails or the schema is too new
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    init_migrations_table(conn)?;

    let current = get_current_version(conn)?;
    let latest = latest_version();
    if current > latest {
        return Err(Error::initialization(format!(
            "database schema version {} is newer than supported version {}",
            current, latest
        )));
    }

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::initialization(e.to_string()))?;

        tx.execute_batch(migration.sql).map_err(|e| {
            Error::initialization(format!("Migration V{} failed: {}", migration.version, e))
        })?;

        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.name],
        )
        .map_err(|e| Error::initialization(e.to_string()))?;

        tx.commit()
            .map_err(|e| Error::initialization(e.to_string()))?;

        tracing::info!(
            "Applied migration {}: {}",
            migration.version,
            migration.name
        );
        applied += 1;
    }

    Ok(applied)
}

/// Get the latest available migration version
pub fn latest_version() -> usize {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}
