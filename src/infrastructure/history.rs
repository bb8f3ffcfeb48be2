//! History store adapter
//!
//! Persistent record of which migrations are currently applied, kept in a
//! named collection inside the target database itself. A record exists iff
//! that migration's upgrade has been applied and not yet reverted.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::domain::key::SequenceKey;
use crate::error::StoreError;
use crate::infrastructure::arango::Database;

/// Adapter around the migration history collection
#[derive(Debug, Clone)]
pub struct HistoryStore {
    db: Database,
    collection: String,
}

impl HistoryStore {
    /// Open the history collection, creating it if it does not exist yet.
    pub async fn open(db: &Database, collection: &str) -> Result<Self, StoreError> {
        if !db.has_collection(collection).await? {
            db.create_collection(collection, false).await?;
            info!(collection, db = db.name(), "created history collection");
        }

        Ok(Self {
            db: db.clone(),
            collection: collection.to_string(),
        })
    }

    /// Every applied migration key currently recorded in the store.
    /// Fresh round trip on every call; the store is the source of truth.
    pub async fn all_applied(&self) -> Result<BTreeSet<SequenceKey>, StoreError> {
        let rows = self
            .db
            .query(
                "FOR m IN @@collection RETURN m._key",
                json!({ "@collection": self.collection }),
            )
            .await?;
        Ok(parse_applied_keys(&rows))
    }

    /// The highest applied key, or `0000` when nothing has been applied.
    pub async fn latest_applied(&self) -> Result<SequenceKey, StoreError> {
        let rows = self
            .db
            .query(
                "FOR m IN @@collection SORT m._key DESC LIMIT 1 RETURN m._key",
                json!({ "@collection": self.collection }),
            )
            .await?;

        match rows.first() {
            None => Ok(SequenceKey::ZERO),
            Some(value) => value
                .as_str()
                .and_then(SequenceKey::parse)
                .ok_or_else(|| StoreError::UnexpectedResponse {
                    message: format!("history record key is not a sequence key: {}", value),
                }),
        }
    }

    /// Record a migration as applied
    pub async fn insert(&self, key: SequenceKey, timestamp: &str) -> Result<(), StoreError> {
        let doc = json!({ "_key": key.to_string(), "ts": timestamp });
        self.db.insert_document(&self.collection, &doc).await
    }

    /// Remove the record for a reverted migration. A missing record is
    /// tolerated so a re-run after a partial forward failure still completes.
    pub async fn remove(&self, key: SequenceKey) -> Result<(), StoreError> {
        let deleted = self
            .db
            .delete_document(&self.collection, &key.to_string())
            .await?;
        if !deleted {
            warn!(%key, "no history record to remove");
        }
        Ok(())
    }

    /// Applied timestamps keyed by migration, for status reporting.
    pub async fn applied_timestamps(
        &self,
    ) -> Result<Vec<(SequenceKey, String)>, StoreError> {
        let rows = self
            .db
            .query(
                "FOR m IN @@collection SORT m._key ASC RETURN { key: m._key, ts: m.ts }",
                json!({ "@collection": self.collection }),
            )
            .await?;

        let mut applied = Vec::with_capacity(rows.len());
        for row in &rows {
            let key = row.get("key").and_then(Value::as_str);
            match key.and_then(SequenceKey::parse) {
                Some(key) => {
                    let ts = row
                        .get("ts")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    applied.push((key, ts));
                }
                None => warn!(?row, "skipping malformed history record"),
            }
        }
        Ok(applied)
    }
}

/// ISO-8601 UTC timestamp with millisecond precision and a literal `Z`
pub fn generate_timestamp() -> String {
    format_timestamp(Utc::now())
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse record keys, skipping anything that is not a sequence key - the
/// collection is shared remote state and may have been touched by hand.
fn parse_applied_keys(rows: &[Value]) -> BTreeSet<SequenceKey> {
    let mut keys = BTreeSet::new();
    for row in rows {
        match row.as_str().and_then(SequenceKey::parse) {
            Some(key) => {
                keys.insert(key);
            }
            None => warn!(?row, "skipping malformed history record key"),
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2026, 8, 4, 9, 30, 5).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(format_timestamp(at), "2026-08-04T09:30:05.042Z");
    }

    #[test]
    fn test_generated_timestamp_shape() {
        let ts = generate_timestamp();
        let re = regex::Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$").unwrap();
        assert!(re.is_match(&ts), "unexpected timestamp: {}", ts);
    }

    #[test]
    fn test_parse_applied_keys_skips_malformed_records() {
        let rows = vec![
            json!("0002"),
            json!("0001"),
            json!("not-a-key"),
            json!(17),
        ];
        let keys = parse_applied_keys(&rows);
        let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, vec!["0001", "0002"]);
    }
}
