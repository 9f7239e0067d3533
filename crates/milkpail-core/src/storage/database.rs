//! SQLite-backed key-value store.
//!
//! Holds the play history as a flat JSON list under [`RECORDS_KEY`]. The
//! history is always read and written as a whole.

use std::path::Path;

use rusqlite::{params, Connection};

use super::data_dir;
use super::records::{decode_records, encode_records, PlayRecord};
use crate::error::{DatabaseError, Result};

pub const RECORDS_KEY: &str = "records";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/milkpail.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("milkpail.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store.
    pub fn kv_remove(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Load the whole play history. Missing or corrupt history reads as empty.
    pub fn load_records(&self) -> Result<Vec<PlayRecord>> {
        let raw = self.kv_get(RECORDS_KEY)?.unwrap_or_else(|| "[]".to_string());
        Ok(decode_records(&raw))
    }

    /// Append one record to the history.
    pub fn append_record(&self, record: &PlayRecord) -> Result<()> {
        let mut records = self.load_records()?;
        records.push(record.clone());
        self.save_records(&records)?;
        tracing::info!(total = records.len(), count = record.count, "record saved");
        Ok(())
    }

    /// Drop the whole history.
    pub fn clear_records(&self) -> Result<()> {
        self.kv_remove(RECORDS_KEY)?;
        tracing::info!("records cleared");
        Ok(())
    }

    fn save_records(&self, records: &[PlayRecord]) -> Result<()> {
        let json = encode_records(records)?;
        self.kv_set(RECORDS_KEY, &json)?;
        Ok(())
    }
}
