//! Database schema migrations.
//!
//! Applies the initial schema: threads, messages, and the
//! schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use colloquy_core::error::ColloquyError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental changes.
pub fn run_migrations(conn: &Connection) -> Result<(), ColloquyError> {
    // Create the migrations tracking table first.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| ColloquyError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| ColloquyError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), ColloquyError> {
    conn.execute_batch(
        "
        -- Conversation containers. Ids are opaque client-suppliable strings.
        CREATE TABLE IF NOT EXISTS threads (
            id          TEXT PRIMARY KEY NOT NULL,
            title       TEXT,
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_threads_updated_at
            ON threads (updated_at DESC);

        -- Conversation turns, append-only. Ordering key is created_at
        -- (unix millis) with rowid breaking ties in insertion order.
        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY NOT NULL,
            thread_id   TEXT NOT NULL,
            role        TEXT NOT NULL
                        CHECK (role IN ('user', 'assistant')),
            content     TEXT NOT NULL,
            created_at  INTEGER NOT NULL,
            model       TEXT,
            usage       TEXT,
            FOREIGN KEY (thread_id) REFERENCES threads(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_messages_thread
            ON messages (thread_id, created_at ASC);

        -- Record migration.
        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| ColloquyError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        // Running again should be idempotent.
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_threads_table_exists() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO threads (id, title, created_at, updated_at)
             VALUES ('t1', 'First thread', 1700000000000, 1700000000000)",
            [],
        )
        .unwrap();

        let title: String = conn
            .query_row("SELECT title FROM threads WHERE id = 't1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(title, "First thread");
    }

    #[test]
    fn test_messages_table_exists() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO threads (id, created_at, updated_at) VALUES ('t1', 0, 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO messages (id, thread_id, role, content, created_at)
             VALUES ('m1', 't1', 'user', 'hello', 1700000000000)",
            [],
        )
        .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_messages_role_check() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO threads (id, created_at, updated_at) VALUES ('t1', 0, 0)",
            [],
        )
        .unwrap();
        let result = conn.execute(
            "INSERT INTO messages (id, thread_id, role, content, created_at)
             VALUES ('m1', 't1', 'system', 'hello', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_messages_require_existing_thread() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO messages (id, thread_id, role, content, created_at)
             VALUES ('m1', 'missing', 'user', 'hello', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_thread_delete_cascades_to_messages() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO threads (id, created_at, updated_at) VALUES ('t1', 0, 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO messages (id, thread_id, role, content, created_at)
             VALUES ('m1', 't1', 'user', 'hello', 0)",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM threads WHERE id = 't1'", []).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
