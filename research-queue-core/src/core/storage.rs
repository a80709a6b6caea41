//! Local key/value cache backed by a single SQLite file.

use crate::Result;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

/// String-keyed local store holding one JSON document per key.
///
/// Reads and writes are synchronous; the store is owned by the single
/// session that uses it.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens (creating if needed) the cache database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    /// A throwaway store that lives only as long as the value.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    /// Raw value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Inserts or replaces the value under `key`.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO cache_entries (key, value, modified_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, modified_at = excluded.modified_at",
            rusqlite::params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    /// Deletes `key`; returns whether it existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM cache_entries WHERE key = ?1", [key])?;
        Ok(changed > 0)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_creates_table() {
        let temp = NamedTempFile::new().unwrap();
        let storage = Storage::open(temp.path()).unwrap();

        let tables: Vec<String> = storage
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"cache_entries".to_string()));
    }

    #[test]
    fn test_set_get_overwrite_remove() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "[1]").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("[1]"));

        storage.set("k", "[2]").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("[2]"));

        assert!(storage.remove("k").unwrap());
        assert!(!storage.remove("k").unwrap());
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_values_persist_across_open() {
        let temp = NamedTempFile::new().unwrap();
        {
            let storage = Storage::open(temp.path()).unwrap();
            storage.set("research-queue-2024-Q1", "[]").unwrap();
        }
        let storage = Storage::open(temp.path()).unwrap();
        assert_eq!(
            storage.get("research-queue-2024-Q1").unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn test_open_rejects_non_database_file() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "not a database, just some text padding it out").unwrap();
        assert!(Storage::open(temp.path()).is_err());
    }
}
