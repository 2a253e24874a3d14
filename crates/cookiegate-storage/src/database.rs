//! Database connection and operations

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::kv::PersistentKv;
use crate::migrations::run_migrations;
use crate::Result;

/// One row of the consent audit trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub id: i64,
    pub decision: String,
    /// Serialized consent map
    pub consents: String,
    pub recorded_at: DateTime<Utc>,
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for better concurrent performance
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Append a saved decision to the audit trail
    pub fn append_history(&self, decision: &str, consents: &str) -> Result<i64> {
        let recorded_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO consent_history (decision, consents, recorded_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![decision, consents, recorded_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Most recent entries first
    pub fn history(&self, limit: usize) -> Result<Vec<HistoryRow>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, decision, consents, recorded_at FROM consent_history
                 ORDER BY id DESC LIMIT ?1",
            )?;

            let rows: Vec<HistoryRow> = stmt
                .query_map([limit as i64], |row| {
                    let recorded_str: String = row.get(3)?;
                    let recorded_at = DateTime::parse_from_rfc3339(&recorded_str)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now());

                    Ok(HistoryRow {
                        id: row.get(0)?,
                        decision: row.get(1)?,
                        consents: row.get(2)?,
                        recorded_at,
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();

            Ok(rows)
        })
    }
}

impl PersistentKv for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.transaction(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            let count: i32 =
                conn.query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_kv_set_get_remove() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.get("consent").unwrap(), None);

        db.set("consent", "v1").unwrap();
        db.set("consent", "v2").unwrap();
        assert_eq!(db.get("consent").unwrap().as_deref(), Some("v2"));

        db.remove("consent").unwrap();
        db.remove("consent").unwrap();
        assert_eq!(db.get("consent").unwrap(), None);
    }

    #[test]
    fn test_history_newest_first() {
        let db = Database::open_in_memory().unwrap();
        db.append_history("rejected-all", r#"{"essential":true}"#)
            .unwrap();
        db.append_history("accepted-all", r#"{"essential":true}"#)
            .unwrap();

        let rows = db.history(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].decision, "accepted-all");
        assert_eq!(rows[1].decision, "rejected-all");

        assert_eq!(db.history(1).unwrap().len(), 1);
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consent.db");

        {
            let db = Database::open(&path).unwrap();
            db.set("consent", "stored").unwrap();
        }

        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.get("consent").unwrap().as_deref(), Some("stored"));
    }
}
