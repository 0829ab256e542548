//! SQLite-backed session registry implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{RegistryError, SessionRegistry, SessionRow};

/// SQLite-backed session registry.
pub struct SqliteSessionRegistry {
    conn: Mutex<Connection>,
}

impl SqliteSessionRegistry {
    /// Create a new SQLite registry, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, RegistryError> {
        let conn = Connection::open(path).map_err(|e| RegistryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite registry (useful for testing).
    pub fn in_memory() -> Result<Self, RegistryError> {
        let conn =
            Connection::open_in_memory().map_err(|e| RegistryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RegistryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                storage_prefix TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_created_at ON sessions(created_at);
            "#,
        )
        .map_err(|e| RegistryError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<SessionRow> {
        let session_id: String = row.get(0)?;
        let user_id: String = row.get(1)?;
        let storage_prefix: Option<String> = row.get(2)?;
        let created_at_str: String = row.get(3)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(SessionRow {
            session_id,
            user_id,
            storage_prefix,
            created_at,
        })
    }
}

impl SessionRegistry for SqliteSessionRegistry {
    fn insert(&self, row: &SessionRow) -> Result<(), RegistryError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT OR REPLACE INTO sessions (session_id, user_id, storage_prefix, created_at) VALUES (?, ?, ?, ?)",
            params![
                row.session_id,
                row.user_id,
                row.storage_prefix,
                row.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| RegistryError::Database(e.to_string()))?;

        Ok(())
    }

    fn get(&self, session_id: &str) -> Result<Option<SessionRow>, RegistryError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT session_id, user_id, storage_prefix, created_at FROM sessions WHERE session_id = ?",
            params![session_id],
            Self::row_to_session,
        );

        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(RegistryError::Database(e.to_string())),
        }
    }

    fn list_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<SessionRow>, RegistryError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT session_id, user_id, storage_prefix, created_at FROM sessions WHERE created_at < ? ORDER BY created_at ASC",
            )
            .map_err(|e| RegistryError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![cutoff.to_rfc3339()], Self::row_to_session)
            .map_err(|e| RegistryError::Database(e.to_string()))?;

        let mut sessions = Vec::new();
        for row_result in rows {
            let session = row_result.map_err(|e| RegistryError::Database(e.to_string()))?;
            sessions.push(session);
        }

        Ok(sessions)
    }

    fn delete(&self, session_id: &str) -> Result<(), RegistryError> {
        let conn = self.conn.lock().unwrap();

        conn.execute("DELETE FROM sessions WHERE session_id = ?", params![session_id])
            .map_err(|e| RegistryError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_registry() -> SqliteSessionRegistry {
        SqliteSessionRegistry::in_memory().unwrap()
    }

    fn create_test_row(session_id: &str, created_at: DateTime<Utc>) -> SessionRow {
        SessionRow {
            session_id: session_id.to_string(),
            user_id: "user-1".to_string(),
            storage_prefix: Some(session_id.to_string()),
            created_at,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let registry = create_test_registry();
        let row = create_test_row("s1", Utc::now());

        registry.insert(&row).unwrap();
        let fetched = registry.get("s1").unwrap();

        assert_eq!(fetched.as_ref().map(|r| r.session_id.as_str()), Some("s1"));
        assert_eq!(fetched.unwrap().storage_prefix, Some("s1".to_string()));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let registry = create_test_registry();
        assert!(registry.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_insert_twice_overwrites() {
        let registry = create_test_registry();
        let mut row = create_test_row("s1", Utc::now());

        registry.insert(&row).unwrap();
        row.user_id = "user-2".to_string();
        registry.insert(&row).unwrap();

        let fetched = registry.get("s1").unwrap().unwrap();
        assert_eq!(fetched.user_id, "user-2");
    }

    #[test]
    fn test_list_older_than() {
        let registry = create_test_registry();
        let now = Utc::now();

        registry
            .insert(&create_test_row("old-1", now - Duration::hours(48)))
            .unwrap();
        registry
            .insert(&create_test_row("old-2", now - Duration::hours(25)))
            .unwrap();
        registry
            .insert(&create_test_row("fresh", now - Duration::hours(1)))
            .unwrap();

        let expired = registry
            .list_older_than(now - Duration::hours(24))
            .unwrap();

        let ids: Vec<&str> = expired.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, vec!["old-1", "old-2"]);
    }

    #[test]
    fn test_delete() {
        let registry = create_test_registry();
        registry.insert(&create_test_row("s1", Utc::now())).unwrap();

        registry.delete("s1").unwrap();
        assert!(registry.get("s1").unwrap().is_none());

        // Deleting again is a no-op.
        registry.delete("s1").unwrap();
    }

    #[test]
    fn test_file_based_registry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("registry.db");

        let registry = SqliteSessionRegistry::new(&db_path).unwrap();
        registry.insert(&create_test_row("s1", Utc::now())).unwrap();

        assert!(db_path.exists());
        assert!(registry.get("s1").unwrap().is_some());
    }
}
