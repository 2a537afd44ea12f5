//! Versioned schema setup for the warehouse database.

use ::duckdb::{params, Connection};
use tracing::info;

use crate::normalize::NormalizedTable;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: "0002_normalize_log",
    sql: r"
CREATE TABLE IF NOT EXISTS normalize_log (
    run_id TEXT NOT NULL,
    table_name TEXT NOT NULL,
    source_table TEXT NOT NULL,
    row_count BIGINT,
    status TEXT NOT NULL,
    message TEXT,
    timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
",
}];

/// Apply pending migrations.
///
/// The normalized tables are created empty on first use so that the views
/// can bind before the first rebuild; every rebuild drops and recreates them.
pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
",
    )?;

    if !is_applied(connection, "0001_normalized_tables")? {
        for table in NormalizedTable::ALL {
            connection.execute_batch(&table.create_sql(true))?;
        }
        mark_applied(connection, "0001_normalized_tables")?;
    }

    for migration in MIGRATIONS {
        if !is_applied(connection, migration.version)? {
            connection.execute_batch(migration.sql)?;
            mark_applied(connection, migration.version)?;
        }
    }

    Ok(())
}

fn is_applied(connection: &Connection, version: &str) -> Result<bool, ::duckdb::Error> {
    let applied: i64 = connection.query_row(
        "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
        params![version],
        |row| row.get(0),
    )?;
    Ok(applied > 0)
}

fn mark_applied(connection: &Connection, version: &str) -> Result<(), ::duckdb::Error> {
    connection.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        params![version],
    )?;
    info!(version, "applied migration");
    Ok(())
}
