//! Repository implementations for SQLite-backed persistence.
//!
//! Provides ThreadRepository and MessageRepository operating on the
//! Database struct using raw SQL. Timestamps are stored as unix
//! milliseconds; message ordering is `created_at` ascending with rowid
//! breaking ties in insertion order.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use colloquy_core::error::ColloquyError;
use colloquy_core::types::{Message, Role, Thread};

use crate::db::Database;

/// Repository for conversation threads.
pub struct ThreadRepository {
    db: Arc<Database>,
}

impl ThreadRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new thread. Fails if the id already exists.
    pub fn create(&self, thread: &Thread) -> Result<(), ColloquyError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO threads (id, title, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    thread.id,
                    thread.title,
                    thread.created_at.timestamp_millis(),
                    thread.updated_at.timestamp_millis(),
                ],
            )
            .map_err(|e| ColloquyError::Storage(format!("Failed to create thread: {}", e)))?;
            Ok(())
        })
    }

    /// Create the thread if it does not exist, then return it.
    ///
    /// Existing threads are left untouched; this backs the auto-create
    /// behavior of the send-message operation for client-held thread ids.
    pub fn upsert(&self, thread_id: &str, now: DateTime<Utc>) -> Result<Thread, ColloquyError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO threads (id, title, created_at, updated_at)
                 VALUES (?1, NULL, ?2, ?2)",
                rusqlite::params![thread_id, now.timestamp_millis()],
            )
            .map_err(|e| ColloquyError::Storage(format!("Failed to upsert thread: {}", e)))?;

            let mut stmt = conn
                .prepare(
                    "SELECT id, title, created_at, updated_at FROM threads WHERE id = ?1",
                )
                .map_err(|e| ColloquyError::Storage(e.to_string()))?;
            let thread = stmt
                .query_row(rusqlite::params![thread_id], |row| Ok(row_to_thread(row)))
                .map_err(|e| ColloquyError::Storage(e.to_string()))??;
            Ok(thread)
        })
    }

    /// Find a thread by id.
    pub fn find_by_id(&self, thread_id: &str) -> Result<Option<Thread>, ColloquyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, title, created_at, updated_at FROM threads WHERE id = ?1",
                )
                .map_err(|e| ColloquyError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![thread_id], |row| Ok(row_to_thread(row)))
                .optional()
                .map_err(|e| ColloquyError::Storage(e.to_string()))?;

            match result {
                Some(thread) => Ok(Some(thread?)),
                None => Ok(None),
            }
        })
    }

    /// List threads ordered by `updated_at` descending, with message counts.
    pub fn list(
        &self,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<(Thread, u64)>, ColloquyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT t.id, t.title, t.created_at, t.updated_at,
                            (SELECT COUNT(*) FROM messages m WHERE m.thread_id = t.id)
                     FROM threads t
                     ORDER BY t.updated_at DESC
                     LIMIT ?1 OFFSET ?2",
                )
                .map_err(|e| ColloquyError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![limit, skip], |row| {
                    let count: i64 = row.get(4)?;
                    Ok((row_to_thread(row), count as u64))
                })
                .map_err(|e| ColloquyError::Storage(e.to_string()))?;

            let mut threads = Vec::new();
            for row in rows {
                let (thread, count) = row.map_err(|e| ColloquyError::Storage(e.to_string()))?;
                threads.push((thread?, count));
            }
            Ok(threads)
        })
    }

    /// Update a thread's title and advance `updated_at`.
    ///
    /// Returns false if the thread does not exist.
    pub fn update_title(
        &self,
        thread_id: &str,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ColloquyError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE threads
                     SET title = ?2, updated_at = MAX(updated_at, ?3)
                     WHERE id = ?1",
                    rusqlite::params![thread_id, title, now.timestamp_millis()],
                )
                .map_err(|e| ColloquyError::Storage(format!("Failed to update thread: {}", e)))?;
            Ok(changed > 0)
        })
    }

    /// Advance a thread's `updated_at`. Monotonic: never moves backwards.
    pub fn touch(&self, thread_id: &str, now: DateTime<Utc>) -> Result<(), ColloquyError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE threads SET updated_at = MAX(updated_at, ?2) WHERE id = ?1",
                rusqlite::params![thread_id, now.timestamp_millis()],
            )
            .map_err(|e| ColloquyError::Storage(format!("Failed to touch thread: {}", e)))?;
            Ok(())
        })
    }

    /// Delete a thread; messages cascade. Returns false if absent.
    pub fn delete(&self, thread_id: &str) -> Result<bool, ColloquyError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "DELETE FROM threads WHERE id = ?1",
                    rusqlite::params![thread_id],
                )
                .map_err(|e| ColloquyError::Storage(format!("Failed to delete thread: {}", e)))?;
            Ok(changed > 0)
        })
    }

    /// Count total threads.
    pub fn count(&self) -> Result<u64, ColloquyError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM threads", [], |row| row.get(0))
                .map_err(|e| ColloquyError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

/// Repository for conversation messages. Append-only.
pub struct MessageRepository {
    db: Arc<Database>,
}

impl MessageRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append a message to its thread.
    pub fn append(&self, message: &Message) -> Result<(), ColloquyError> {
        let usage_json = message
            .usage
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ColloquyError::Storage(format!("Failed to encode usage: {}", e)))?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, thread_id, role, content, created_at, model, usage)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    message.id.to_string(),
                    message.thread_id,
                    message.role.as_str(),
                    message.content,
                    message.created_at.timestamp_millis(),
                    message.model,
                    usage_json,
                ],
            )
            .map_err(|e| ColloquyError::Storage(format!("Failed to append message: {}", e)))?;
            Ok(())
        })
    }

    /// Find a message by id.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Message>, ColloquyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, thread_id, role, content, created_at, model, usage
                     FROM messages WHERE id = ?1",
                )
                .map_err(|e| ColloquyError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![id.to_string()], |row| {
                    Ok(row_to_message(row))
                })
                .optional()
                .map_err(|e| ColloquyError::Storage(e.to_string()))?;

            match result {
                Some(message) => Ok(Some(message?)),
                None => Ok(None),
            }
        })
    }

    /// List messages for a thread, ordered ascending, with pagination.
    pub fn list_for_thread(
        &self,
        thread_id: &str,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Message>, ColloquyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, thread_id, role, content, created_at, model, usage
                     FROM messages
                     WHERE thread_id = ?1
                     ORDER BY created_at ASC, rowid ASC
                     LIMIT ?2 OFFSET ?3",
                )
                .map_err(|e| ColloquyError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![thread_id, limit, skip], |row| {
                    Ok(row_to_message(row))
                })
                .map_err(|e| ColloquyError::Storage(e.to_string()))?;

            let mut messages = Vec::new();
            for row in rows {
                let message = row.map_err(|e| ColloquyError::Storage(e.to_string()))??;
                messages.push(message);
            }
            Ok(messages)
        })
    }

    /// The most recent `k` messages of a thread, returned oldest-first.
    ///
    /// This is the context window read used by the completion pipeline.
    pub fn recent_window(&self, thread_id: &str, k: u64) -> Result<Vec<Message>, ColloquyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, thread_id, role, content, created_at, model, usage
                     FROM messages
                     WHERE thread_id = ?1
                     ORDER BY created_at DESC, rowid DESC
                     LIMIT ?2",
                )
                .map_err(|e| ColloquyError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![thread_id, k], |row| {
                    Ok(row_to_message(row))
                })
                .map_err(|e| ColloquyError::Storage(e.to_string()))?;

            let mut messages = Vec::new();
            for row in rows {
                let message = row.map_err(|e| ColloquyError::Storage(e.to_string()))??;
                messages.push(message);
            }
            // Query returns newest-first; callers want chronological order.
            messages.reverse();
            Ok(messages)
        })
    }

    /// Count messages in a thread.
    pub fn count_for_thread(&self, thread_id: &str) -> Result<u64, ColloquyError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM messages WHERE thread_id = ?1",
                    rusqlite::params![thread_id],
                    |row| row.get(0),
                )
                .map_err(|e| ColloquyError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }

    /// Delete all messages for a thread. Returns the number removed.
    pub fn delete_for_thread(&self, thread_id: &str) -> Result<u64, ColloquyError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "DELETE FROM messages WHERE thread_id = ?1",
                    rusqlite::params![thread_id],
                )
                .map_err(|e| ColloquyError::Storage(format!("Failed to delete messages: {}", e)))?;
            Ok(changed as u64)
        })
    }
}

// ============================================================================
// Helper functions for row-to-entity conversion.
// ============================================================================

fn row_to_thread(row: &rusqlite::Row<'_>) -> Result<Thread, ColloquyError> {
    let id: String = row.get(0).map_err(|e| ColloquyError::Storage(e.to_string()))?;
    let title: Option<String> = row.get(1).map_err(|e| ColloquyError::Storage(e.to_string()))?;
    let created_ms: i64 = row.get(2).map_err(|e| ColloquyError::Storage(e.to_string()))?;
    let updated_ms: i64 = row.get(3).map_err(|e| ColloquyError::Storage(e.to_string()))?;

    Ok(Thread {
        id,
        title,
        created_at: millis_to_datetime(created_ms),
        updated_at: millis_to_datetime(updated_ms),
    })
}

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<Message, ColloquyError> {
    let id_str: String = row.get(0).map_err(|e| ColloquyError::Storage(e.to_string()))?;
    let thread_id: String = row.get(1).map_err(|e| ColloquyError::Storage(e.to_string()))?;
    let role_str: String = row.get(2).map_err(|e| ColloquyError::Storage(e.to_string()))?;
    let content: String = row.get(3).map_err(|e| ColloquyError::Storage(e.to_string()))?;
    let created_ms: i64 = row.get(4).map_err(|e| ColloquyError::Storage(e.to_string()))?;
    let model: Option<String> = row.get(5).map_err(|e| ColloquyError::Storage(e.to_string()))?;
    let usage_str: Option<String> = row.get(6).map_err(|e| ColloquyError::Storage(e.to_string()))?;

    let role = Role::parse(&role_str)
        .ok_or_else(|| ColloquyError::Storage(format!("Invalid role: {}", role_str)))?;
    let usage = usage_str
        .map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| ColloquyError::Storage(format!("Invalid usage JSON: {}", e)))?;

    Ok(Message {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| ColloquyError::Storage(format!("Invalid UUID: {}", e)))?,
        thread_id,
        role,
        content,
        created_at: millis_to_datetime(created_ms),
        model,
        usage,
    })
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

/// Extension trait for rusqlite to support optional query results.
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_db() -> Arc<Database> {
        Arc::new(Database::in_memory().unwrap())
    }

    fn make_thread(id: &str) -> Thread {
        let now = Utc::now();
        Thread {
            id: id.to_string(),
            title: Some("Test thread".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    fn make_message(thread_id: &str, role: Role, content: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            thread_id: thread_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
            model: None,
            usage: None,
        }
    }

    // ========================================================================
    // ThreadRepository tests
    // ========================================================================

    #[test]
    fn test_thread_create_and_find() {
        let db = make_db();
        let repo = ThreadRepository::new(db);

        let thread = make_thread("t1");
        repo.create(&thread).unwrap();

        let found = repo.find_by_id("t1").unwrap().unwrap();
        assert_eq!(found.id, "t1");
        assert_eq!(found.title.as_deref(), Some("Test thread"));
    }

    #[test]
    fn test_thread_find_nonexistent() {
        let db = make_db();
        let repo = ThreadRepository::new(db);
        assert!(repo.find_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_thread_create_duplicate_fails() {
        let db = make_db();
        let repo = ThreadRepository::new(db);

        repo.create(&make_thread("t1")).unwrap();
        assert!(repo.create(&make_thread("t1")).is_err());
    }

    #[test]
    fn test_thread_upsert_creates_once() {
        let db = make_db();
        let repo = ThreadRepository::new(db);

        let now = Utc::now();
        let first = repo.upsert("client-id", now).unwrap();
        assert_eq!(first.id, "client-id");
        assert!(first.title.is_none());

        // Second upsert leaves the existing row untouched.
        let later = now + chrono::Duration::seconds(10);
        let second = repo.upsert("client-id", later).unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_thread_upsert_preserves_existing_title() {
        let db = make_db();
        let repo = ThreadRepository::new(db);

        repo.create(&make_thread("t1")).unwrap();
        let upserted = repo.upsert("t1", Utc::now()).unwrap();
        assert_eq!(upserted.title.as_deref(), Some("Test thread"));
    }

    #[test]
    fn test_thread_update_title() {
        let db = make_db();
        let repo = ThreadRepository::new(db);

        repo.create(&make_thread("t1")).unwrap();
        let updated = repo
            .update_title("t1", "New title", Utc::now())
            .unwrap();
        assert!(updated);

        let found = repo.find_by_id("t1").unwrap().unwrap();
        assert_eq!(found.title.as_deref(), Some("New title"));
    }

    #[test]
    fn test_thread_update_title_nonexistent() {
        let db = make_db();
        let repo = ThreadRepository::new(db);
        let updated = repo
            .update_title("missing", "title", Utc::now())
            .unwrap();
        assert!(!updated);
    }

    #[test]
    fn test_thread_touch_advances_updated_at() {
        let db = make_db();
        let repo = ThreadRepository::new(db);

        repo.create(&make_thread("t1")).unwrap();
        let before = repo.find_by_id("t1").unwrap().unwrap();

        let later = before.updated_at + chrono::Duration::seconds(5);
        repo.touch("t1", later).unwrap();

        let after = repo.find_by_id("t1").unwrap().unwrap();
        assert!(after.updated_at > before.updated_at);
        assert!(after.updated_at >= after.created_at);
    }

    #[test]
    fn test_thread_touch_is_monotonic() {
        let db = make_db();
        let repo = ThreadRepository::new(db);

        repo.create(&make_thread("t1")).unwrap();
        let current = repo.find_by_id("t1").unwrap().unwrap().updated_at;

        // A touch with an older timestamp must not move updated_at backwards.
        let past = current - chrono::Duration::seconds(60);
        repo.touch("t1", past).unwrap();

        let after = repo.find_by_id("t1").unwrap().unwrap();
        assert_eq!(
            after.updated_at.timestamp_millis(),
            current.timestamp_millis()
        );
    }

    #[test]
    fn test_thread_delete() {
        let db = make_db();
        let repo = ThreadRepository::new(db);

        repo.create(&make_thread("t1")).unwrap();
        assert!(repo.delete("t1").unwrap());
        assert!(repo.find_by_id("t1").unwrap().is_none());
        assert!(!repo.delete("t1").unwrap());
    }

    #[test]
    fn test_thread_list_ordering_and_counts() {
        let db = make_db();
        let threads = ThreadRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(Arc::clone(&db));

        let mut old = make_thread("old");
        old.updated_at = Utc::now() - chrono::Duration::hours(1);
        threads.create(&old).unwrap();
        threads.create(&make_thread("new")).unwrap();

        messages
            .append(&make_message("new", Role::User, "hi"))
            .unwrap();
        messages
            .append(&make_message("new", Role::Assistant, "hello"))
            .unwrap();

        let listed = threads.list(0, 50).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].0.id, "new");
        assert_eq!(listed[0].1, 2);
        assert_eq!(listed[1].0.id, "old");
        assert_eq!(listed[1].1, 0);
    }

    #[test]
    fn test_thread_list_pagination() {
        let db = make_db();
        let repo = ThreadRepository::new(db);

        for i in 0..5 {
            repo.create(&make_thread(&format!("t{}", i))).unwrap();
        }

        assert_eq!(repo.list(0, 2).unwrap().len(), 2);
        assert_eq!(repo.list(4, 2).unwrap().len(), 1);
        assert_eq!(repo.list(10, 2).unwrap().len(), 0);
    }

    // ========================================================================
    // MessageRepository tests
    // ========================================================================

    #[test]
    fn test_message_append_and_find() {
        let db = make_db();
        let threads = ThreadRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(db);

        threads.create(&make_thread("t1")).unwrap();

        let msg = make_message("t1", Role::User, "hello");
        let id = msg.id;
        messages.append(&msg).unwrap();

        let found = messages.find_by_id(id).unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.thread_id, "t1");
        assert_eq!(found.role, Role::User);
        assert_eq!(found.content, "hello");
        assert!(found.model.is_none());
        assert!(found.usage.is_none());
    }

    #[test]
    fn test_message_find_nonexistent() {
        let db = make_db();
        let messages = MessageRepository::new(db);
        assert!(messages.find_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_message_append_to_missing_thread_fails() {
        let db = make_db();
        let messages = MessageRepository::new(db);
        let result = messages.append(&make_message("missing", Role::User, "hi"));
        assert!(result.is_err());
    }

    #[test]
    fn test_message_usage_round_trip() {
        let db = make_db();
        let threads = ThreadRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(db);

        threads.create(&make_thread("t1")).unwrap();

        let usage = serde_json::json!({"prompt_tokens": 10, "total_tokens": 25});
        let mut msg = make_message("t1", Role::Assistant, "reply");
        msg.model = Some("gpt-4o-mini".to_string());
        msg.usage = Some(usage.clone());
        messages.append(&msg).unwrap();

        let found = messages.find_by_id(msg.id).unwrap().unwrap();
        assert_eq!(found.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(found.usage.unwrap(), usage);
    }

    #[test]
    fn test_message_list_ordering() {
        let db = make_db();
        let threads = ThreadRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(db);

        threads.create(&make_thread("t1")).unwrap();

        let base = Utc::now();
        for i in 0..4 {
            let mut msg = make_message(
                "t1",
                if i % 2 == 0 { Role::User } else { Role::Assistant },
                &format!("msg {}", i),
            );
            msg.created_at = base + chrono::Duration::milliseconds(i);
            messages.append(&msg).unwrap();
        }

        let listed = messages.list_for_thread("t1", 0, 50).unwrap();
        assert_eq!(listed.len(), 4);
        assert_eq!(listed[0].content, "msg 0");
        assert_eq!(listed[3].content, "msg 3");
    }

    #[test]
    fn test_message_list_tie_broken_by_insertion_order() {
        let db = make_db();
        let threads = ThreadRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(db);

        threads.create(&make_thread("t1")).unwrap();

        // Identical timestamps: insertion order must win.
        let ts = Utc::now();
        for i in 0..3 {
            let mut msg = make_message("t1", Role::User, &format!("same-ts {}", i));
            msg.created_at = ts;
            messages.append(&msg).unwrap();
        }

        let listed = messages.list_for_thread("t1", 0, 50).unwrap();
        assert_eq!(listed[0].content, "same-ts 0");
        assert_eq!(listed[1].content, "same-ts 1");
        assert_eq!(listed[2].content, "same-ts 2");
    }

    #[test]
    fn test_message_list_pagination() {
        let db = make_db();
        let threads = ThreadRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(db);

        threads.create(&make_thread("t1")).unwrap();
        let base = Utc::now();
        for i in 0..5 {
            let mut msg = make_message("t1", Role::User, &format!("msg {}", i));
            msg.created_at = base + chrono::Duration::milliseconds(i);
            messages.append(&msg).unwrap();
        }

        let page = messages.list_for_thread("t1", 2, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].content, "msg 2");
        assert_eq!(page[1].content, "msg 3");
    }

    #[test]
    fn test_message_recent_window_oldest_first() {
        let db = make_db();
        let threads = ThreadRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(db);

        threads.create(&make_thread("t1")).unwrap();
        let base = Utc::now();
        for i in 0..10 {
            let mut msg = make_message("t1", Role::User, &format!("msg {}", i));
            msg.created_at = base + chrono::Duration::milliseconds(i);
            messages.append(&msg).unwrap();
        }

        let window = messages.recent_window("t1", 3).unwrap();
        assert_eq!(window.len(), 3);
        // Last three messages, chronological order.
        assert_eq!(window[0].content, "msg 7");
        assert_eq!(window[1].content, "msg 8");
        assert_eq!(window[2].content, "msg 9");
    }

    #[test]
    fn test_message_recent_window_fewer_than_k() {
        let db = make_db();
        let threads = ThreadRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(db);

        threads.create(&make_thread("t1")).unwrap();
        messages
            .append(&make_message("t1", Role::User, "only one"))
            .unwrap();

        let window = messages.recent_window("t1", 20).unwrap();
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_message_recent_window_empty_thread() {
        let db = make_db();
        let threads = ThreadRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(db);

        threads.create(&make_thread("t1")).unwrap();
        assert!(messages.recent_window("t1", 20).unwrap().is_empty());
    }

    #[test]
    fn test_message_count_and_delete_for_thread() {
        let db = make_db();
        let threads = ThreadRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(db);

        threads.create(&make_thread("t1")).unwrap();
        threads.create(&make_thread("t2")).unwrap();
        messages.append(&make_message("t1", Role::User, "a")).unwrap();
        messages.append(&make_message("t1", Role::Assistant, "b")).unwrap();
        messages.append(&make_message("t2", Role::User, "c")).unwrap();

        assert_eq!(messages.count_for_thread("t1").unwrap(), 2);
        assert_eq!(messages.delete_for_thread("t1").unwrap(), 2);
        assert_eq!(messages.count_for_thread("t1").unwrap(), 0);
        assert_eq!(messages.count_for_thread("t2").unwrap(), 1);
    }

    #[test]
    fn test_thread_delete_cascades() {
        let db = make_db();
        let threads = ThreadRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(db);

        threads.create(&make_thread("t1")).unwrap();
        messages.append(&make_message("t1", Role::User, "a")).unwrap();

        threads.delete("t1").unwrap();
        assert_eq!(messages.count_for_thread("t1").unwrap(), 0);
    }
}
