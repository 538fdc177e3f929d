use chrono::{SecondsFormat, Utc};
use log::info;
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{BridgeError, BridgeResult};

// ================================================================================================
// SQLITE SCHEMA
// ================================================================================================

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS claim_store (
    id            TEXT PRIMARY KEY,
    member_id     TEXT,
    claim_id      TEXT,
    current_stage TEXT,
    last_payload  TEXT,
    history       TEXT NOT NULL DEFAULT '[]',
    version       INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);
";

const SELECT_COLUMNS: &str =
    "id, member_id, claim_id, current_stage, last_payload, history, version, created_at, updated_at";

// ================================================================================================
// RECORDS
// ================================================================================================

/// One note in a record's append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ts: String,
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

/// A long-lived claim tracking record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub id: String,
    pub member_id: Option<String>,
    pub claim_id: Option<String>,
    pub current_stage: Option<String>,
    pub last_payload: Option<Value>,
    pub history: Vec<HistoryEntry>,
    /// Incremented on every write
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ClaimRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let history: Value = row.get(5)?;
        let history = serde_json::from_value(history)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
        Ok(Self {
            id: row.get(0)?,
            member_id: row.get(1)?,
            claim_id: row.get(2)?,
            current_stage: row.get(3)?,
            last_payload: row.get(4)?,
            history,
            version: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

/// Fields accepted when creating (or overwriting) a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewClaimRecord {
    pub id: String,
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub claim_id: Option<String>,
    #[serde(default)]
    pub current_stage: Option<String>,
    #[serde(default)]
    pub last_payload: Option<Value>,
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimUpdate {
    #[serde(default)]
    pub current_stage: Option<String>,
    #[serde(default)]
    pub last_payload: Option<Value>,
    #[serde(default)]
    pub note: Option<String>,
}

fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ================================================================================================
// STORE
// ================================================================================================

/// SQLite-backed claim tracking store.
///
/// Independent of the matching core: records are keyed by an external id
/// and carry the workflow position plus a note history.
#[derive(Debug)]
pub struct ClaimStore {
    db: Mutex<Connection>,
}

impl ClaimStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open(path: &Path) -> BridgeResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        info!("Opened claim store at {}", path.display());
        Self::with_connection(conn)
    }

    /// Store backed by a private in-memory database.
    pub fn in_memory() -> BridgeResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> BridgeResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { db: Mutex::new(conn) })
    }

    /// Insert a record, or overwrite the fields of an existing one.
    ///
    /// New records start at version 1 with a single `created` note. An
    /// existing id keeps its history and creation time and gets version + 1.
    pub fn create(&self, record: NewClaimRecord) -> BridgeResult<ClaimRecord> {
        let now = now_ts();
        let history = serde_json::to_value(vec![HistoryEntry {
            ts: now.clone(),
            note: "created".to_string(),
            stage: None,
        }])?;

        let conn = self.db.lock();
        conn.execute(
            "INSERT INTO claim_store
                 (id, member_id, claim_id, current_stage, last_payload, history, version, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
             ON CONFLICT(id) DO UPDATE SET
                 member_id = excluded.member_id,
                 claim_id = excluded.claim_id,
                 current_stage = excluded.current_stage,
                 last_payload = excluded.last_payload,
                 updated_at = excluded.updated_at,
                 version = claim_store.version + 1",
            params![
                record.id,
                record.member_id,
                record.claim_id,
                record.current_stage,
                record.last_payload,
                history,
                now,
            ],
        )?;

        fetch(&conn, &record.id)?.ok_or(BridgeError::RecordNotFound(record.id))
    }

    pub fn get(&self, id: &str) -> BridgeResult<Option<ClaimRecord>> {
        let conn = self.db.lock();
        fetch(&conn, id)
    }

    /// Resume tracking a claim; same as [`get`](Self::get).
    pub fn resume(&self, id: &str) -> BridgeResult<Option<ClaimRecord>> {
        self.get(id)
    }

    /// Coalescing update with optional history note.
    ///
    /// Runs in a transaction so concurrent notes are never lost.
    pub fn update(&self, id: &str, update: ClaimUpdate) -> BridgeResult<ClaimRecord> {
        let mut conn = self.db.lock();
        let tx = conn.transaction()?;

        let history: Option<Value> = tx
            .query_row("SELECT history FROM claim_store WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        let Some(history) = history else {
            return Err(BridgeError::RecordNotFound(id.to_string()));
        };

        let now = now_ts();
        let mut history: Vec<HistoryEntry> = serde_json::from_value(history)?;
        if let Some(note) = update.note.filter(|note| !note.is_empty()) {
            history.push(HistoryEntry {
                ts: now.clone(),
                note,
                stage: update.current_stage.clone(),
            });
        }

        tx.execute(
            "UPDATE claim_store SET
                 current_stage = COALESCE(?1, current_stage),
                 last_payload = COALESCE(?2, last_payload),
                 history = ?3,
                 updated_at = ?4,
                 version = version + 1
             WHERE id = ?5",
            params![update.current_stage, update.last_payload, serde_json::to_value(&history)?, now, id],
        )?;
        let record = fetch(&tx, id)?.ok_or_else(|| BridgeError::RecordNotFound(id.to_string()))?;
        tx.commit()?;
        Ok(record)
    }

    pub fn count(&self) -> BridgeResult<usize> {
        let conn = self.db.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM claim_store", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn fetch(conn: &Connection, id: &str) -> BridgeResult<Option<ClaimRecord>> {
    let sql = format!("SELECT {} FROM claim_store WHERE id = ?1", SELECT_COLUMNS);
    Ok(conn.query_row(&sql, params![id], ClaimRecord::from_row).optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn new_record(id: &str) -> NewClaimRecord {
        NewClaimRecord {
            id: id.to_string(),
            member_id: Some("784-1987-1234567-1".to_string()),
            claim_id: Some("CLM-ELG-0001".to_string()),
            current_stage: Some("eligibility".to_string()),
            last_payload: Some(json!({"Claim": {"ID": "CLM-ELG-0001"}})),
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = ClaimStore::in_memory().unwrap();
        let record = store.create(new_record("TRK-1")).unwrap();

        assert_eq!(record.version, 1);
        assert_eq!(record.history.len(), 1);
        assert_eq!(record.history[0].note, "created");
        assert_eq!(record.last_payload, Some(json!({"Claim": {"ID": "CLM-ELG-0001"}})));

        let fetched = store.get("TRK-1").unwrap().unwrap();
        assert_eq!(fetched, record);
        assert!(store.get("TRK-missing").unwrap().is_none());
    }

    #[test]
    fn test_create_conflict_overwrites_and_bumps_version() {
        let store = ClaimStore::in_memory().unwrap();
        store.create(new_record("TRK-1")).unwrap();

        let mut again = new_record("TRK-1");
        again.current_stage = Some("claims_submission".to_string());
        again.last_payload = None;
        let record = store.create(again).unwrap();

        assert_eq!(record.version, 2);
        assert_eq!(record.current_stage.as_deref(), Some("claims_submission"));
        assert_eq!(record.last_payload, None);
        assert_eq!(record.history.len(), 1);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_update_coalesces_and_appends_note() {
        let store = ClaimStore::in_memory().unwrap();
        store.create(new_record("TRK-1")).unwrap();

        let record = store
            .update(
                "TRK-1",
                ClaimUpdate {
                    current_stage: Some("prior_authorization".to_string()),
                    last_payload: None,
                    note: Some("moved to prior auth".to_string()),
                },
            )
            .unwrap();

        assert_eq!(record.version, 2);
        assert_eq!(record.current_stage.as_deref(), Some("prior_authorization"));
        assert_eq!(record.last_payload, Some(json!({"Claim": {"ID": "CLM-ELG-0001"}})));
        assert_eq!(record.history.len(), 2);
        assert_eq!(record.history[1].stage.as_deref(), Some("prior_authorization"));

        let record = store.update("TRK-1", ClaimUpdate::default()).unwrap();
        assert_eq!(record.version, 3);
        assert_eq!(record.history.len(), 2);
        assert_eq!(record.current_stage.as_deref(), Some("prior_authorization"));
    }

    #[test]
    fn test_update_missing_record() {
        let store = ClaimStore::in_memory().unwrap();
        let err = store.update("TRK-404", ClaimUpdate::default()).unwrap_err();
        assert!(matches!(err, BridgeError::RecordNotFound(id) if id == "TRK-404"));
    }

    #[test]
    fn test_malformed_history_is_an_error_not_a_reset() {
        let store = ClaimStore::in_memory().unwrap();
        store.create(new_record("TRK-1")).unwrap();
        let foreign = r#"[{"note":"created"},{"note":"escalated","stage":"denial_management"}]"#;
        store
            .db
            .lock()
            .execute("UPDATE claim_store SET history = ?1 WHERE id = ?2", params![foreign, "TRK-1"])
            .unwrap();

        let err = store
            .update(
                "TRK-1",
                ClaimUpdate {
                    note: Some("appeal filed".to_string()),
                    ..ClaimUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, BridgeError::Serialization(_)));
        assert!(matches!(store.get("TRK-1"), Err(BridgeError::Sqlite(_))));

        let (history, version): (String, i64) = store
            .db
            .lock()
            .query_row("SELECT history, version FROM claim_store WHERE id = ?1", params!["TRK-1"], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(history, foreign);
        assert_eq!(version, 1);
    }

    #[test]
    fn test_records_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("claims.db");

        {
            let store = ClaimStore::open(&path).unwrap();
            store.create(new_record("TRK-1")).unwrap();
        }

        let store = ClaimStore::open(&path).unwrap();
        let record = store.resume("TRK-1").unwrap().unwrap();
        assert_eq!(record.claim_id.as_deref(), Some("CLM-ELG-0001"));
    }
}
