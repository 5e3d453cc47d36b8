//! SQLite snapshot cache for the parsed catalog

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use super::concept::ConceptRecord;
use super::store::{StoreError, StoreResult};

/// Holds at most one catalog snapshot, tagged with its source and the time
/// it was written.
pub struct CatalogCache {
    conn: Mutex<Connection>,
}

impl CatalogCache {
    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS catalog_snapshot (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                source TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                concept_count INTEGER NOT NULL,
                records_json TEXT NOT NULL
            );

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Replace the snapshot with `records`, stamped now.
    pub fn store(&self, source: &str, records: &[ConceptRecord]) -> StoreResult<()> {
        self.store_at(source, records, Utc::now())
    }

    /// Replace the snapshot with an explicit timestamp.
    pub fn store_at(
        &self,
        source: &str,
        records: &[ConceptRecord],
        cached_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let records_json = serde_json::to_string(records)?;
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM catalog_snapshot", [])?;
        tx.execute(
            r#"
            INSERT INTO catalog_snapshot (id, source, cached_at, concept_count, records_json)
            VALUES (1, ?1, ?2, ?3, ?4)
            "#,
            params![source, cached_at.to_rfc3339(), records.len() as i64, records_json],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Source and timestamp of the current snapshot, if any.
    pub fn snapshot_info(&self) -> StoreResult<Option<(String, DateTime<Utc>)>> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT source, cached_at FROM catalog_snapshot WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        match row {
            Some((source, cached_at)) => Ok(Some((source, parse_timestamp(&cached_at)?))),
            None => Ok(None),
        }
    }

    /// The cached records if they came from `source` and are younger than `ttl`.
    pub fn load_fresh(&self, source: &str, ttl: Duration) -> StoreResult<Option<Vec<ConceptRecord>>> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT source, cached_at, records_json FROM catalog_snapshot WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((cached_source, cached_at, records_json)) = row else {
            return Ok(None);
        };
        if cached_source != source {
            return Ok(None);
        }
        let age = Utc::now().signed_duration_since(parse_timestamp(&cached_at)?);
        // A timestamp in the future fails to_std and counts as stale
        match age.to_std() {
            Ok(age) if age < ttl => Ok(Some(serde_json::from_str(&records_json)?)),
            _ => Ok(None),
        }
    }

    pub fn clear(&self) -> StoreResult<()> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        conn.execute("DELETE FROM catalog_snapshot", [])?;
        Ok(())
    }
}

fn parse_timestamp(value: &str) -> StoreResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| StoreError::DateParse(e.to_string()))?
        .with_timezone(&Utc))
}
