//! Record store schema and migrations.
//!
//! Migrations are embedded SQL files applied in version order. Each one runs
//! in its own transaction and is recorded in `schema_migrations`.

use rusqlite::Connection;

use crate::error::{FlowError, Result};

const RECORD_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("../../migrations/001_leak_checks.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("../../migrations/002_bill_analyses.sql"),
    },
];

/// Latest schema version this build knows about.
pub const LATEST_VERSION: i32 = 2;

/// Run schema migrations for the record database.
///
/// Returns the latest schema version applied.
///
/// # Errors
/// Returns an error if creating the migrations table, reading the schema version,
/// or applying any migration fails.
pub fn run_migrations(conn: &mut Connection) -> Result<i32> {
    ensure_schema_migrations_table(conn)?;

    let mut current_version = schema_version(conn)?;

    for migration in RECORD_MIGRATIONS {
        if migration.version > current_version {
            apply_migration(conn, migration)?;
            tracing::debug!(version = migration.version, "Applied record migration");
            current_version = migration.version;
        }
    }

    Ok(current_version)
}

/// Highest applied migration version, 0 for a fresh database.
///
/// # Errors
/// Returns an error if the migrations table cannot be read.
pub fn schema_version(conn: &Connection) -> Result<i32> {
    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .map_err(|e| FlowError::Storage(format!("read schema version: {e}")))?;

    Ok(version.unwrap_or(0))
}

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: i32,
    sql: &'static str,
}

fn ensure_schema_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (\
            version INTEGER PRIMARY KEY,\
            applied_at TEXT DEFAULT (datetime('now'))\
        );",
    )
    .map_err(|e| FlowError::Storage(format!("create schema_migrations: {e}")))
}

fn apply_migration(conn: &mut Connection, migration: &Migration) -> Result<()> {
    let tx = conn
        .transaction()
        .map_err(|e| FlowError::Storage(format!("begin migration: {e}")))?;

    tx.execute_batch(migration.sql).map_err(|e| {
        FlowError::Storage(format!("apply migration {}: {e}", migration.version))
    })?;

    tx.execute(
        "INSERT INTO schema_migrations (version) VALUES (?1)",
        [migration.version],
    )
    .map_err(|e| FlowError::Storage(format!("record migration {}: {e}", migration.version)))?;

    tx.commit()
        .map_err(|e| FlowError::Storage(format!("commit migration {}: {e}", migration.version)))
}
