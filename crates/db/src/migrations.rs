//! Migration runner.
//!
//! Applied migrations are keyed by `(module, id)` in `schema_migrations`.
//! Pending migrations run in the order given, inside one transaction: either
//! every pending migration lands or none does.

use rusqlite::{params, Connection};
use shelf_kernel::Migration;

use crate::DbResult;

const MIGRATIONS_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    module     TEXT    NOT NULL,
    id         TEXT    NOT NULL,
    applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
    PRIMARY KEY (module, id)
);";

/// Applies pending migrations and returns how many were applied.
pub fn apply_migrations(conn: &mut Connection, migrations: &[(String, Migration)]) -> DbResult<usize> {
    conn.execute_batch(MIGRATIONS_TABLE_SQL)?;

    let tx = conn.transaction()?;
    let mut applied = 0;

    for (module, migration) in migrations {
        let already_applied: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE module = ?1 AND id = ?2)",
            params![module, migration.id],
            |row| row.get(0),
        )?;
        if already_applied {
            continue;
        }

        tx.execute_batch(migration.up)?;
        tx.execute(
            "INSERT INTO schema_migrations (module, id) VALUES (?1, ?2)",
            params![module, migration.id],
        )?;

        tracing::info!(module = %module, migration = migration.id, "applied migration");
        applied += 1;
    }

    tx.commit()?;

    if applied == 0 {
        tracing::debug!("schema is up to date");
    }

    Ok(applied)
}
