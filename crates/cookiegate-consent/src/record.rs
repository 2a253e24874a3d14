//! Consent record persistence
//!
//! Stored format (versionless, must stay readable by older writers):
//!
//! ```json
//! {
//!   "consents": {"essential": true, "marketing": false, "analytics": true, "functional": false},
//!   "decision": "custom",
//!   "updatedAt": "2024-05-01T12:00:00.000Z"
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use cookiegate_storage::{PersistentKv, StorageError};
use cookiegate_taxonomy::{ConsentCategory, ConsentDecision, ConsentMap};

use crate::error::RecordError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConsentRecord {
    pub consents: ConsentMap,
    pub decision: ConsentDecision,
    /// Absent only on records written without a timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredConsentRecord {
    pub fn new(consents: ConsentMap, decision: ConsentDecision) -> Self {
        Self {
            consents,
            decision,
            updated_at: Some(Utc::now()),
        }
    }

    pub fn to_json(&self) -> String {
        let mut value = serde_json::json!({
            "consents": self.consents,
            "decision": self.decision,
        });

        if let Some(updated_at) = self.updated_at {
            value["updatedAt"] =
                Value::String(updated_at.to_rfc3339_opts(SecondsFormat::Millis, true));
        }

        value.to_string()
    }

    /// Parse and validate a stored record. Nothing from a record that fails
    /// validation is used.
    pub fn from_json(raw: &str) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_str(raw)?;
        let object = value.as_object().ok_or(RecordError::NotAnObject)?;

        let consents_obj = object
            .get("consents")
            .and_then(Value::as_object)
            .ok_or(RecordError::MissingConsents)?;

        let mut consents = ConsentMap::essential_only();
        for category in ConsentCategory::ALL {
            match consents_obj.get(category.as_str()) {
                None => {}
                Some(Value::Bool(allowed)) => consents.set(category, *allowed),
                Some(_) => return Err(RecordError::NonBoolean(category)),
            }
        }

        let decision = match object.get("decision") {
            None | Some(Value::Null) => ConsentDecision::Custom,
            Some(Value::String(s)) => s
                .parse::<ConsentDecision>()
                .map_err(|_| RecordError::InvalidDecision(s.clone()))?,
            Some(other) => return Err(RecordError::InvalidDecision(other.to_string())),
        };

        let updated_at = match object.get("updatedAt") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| RecordError::InvalidTimestamp(s.clone()))?,
            ),
            Some(other) => return Err(RecordError::InvalidTimestamp(other.to_string())),
        };

        Ok(Self {
            consents,
            decision,
            updated_at,
        })
    }
}

/// Result of a save. The record is always produced; persistence may not be.
#[derive(Debug)]
pub struct SaveOutcome {
    pub record: StoredConsentRecord,
    pub persist_error: Option<StorageError>,
}

impl SaveOutcome {
    pub fn persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// Sole reader and writer of the consent record
pub struct ConsentRecordStore {
    kv: Arc<dyn PersistentKv>,
    key: String,
}

impl ConsentRecordStore {
    pub fn new(kv: Arc<dyn PersistentKv>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored record, or `None` when absent, unreadable or invalid
    pub fn load(&self) -> Option<StoredConsentRecord> {
        let raw = match self.kv.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read consent record");
                return None;
            }
        };

        match StoredConsentRecord::from_json(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Discarding invalid consent record");
                None
            }
        }
    }

    pub fn save(&self, consents: ConsentMap, decision: ConsentDecision) -> SaveOutcome {
        let consents = consents.with(ConsentCategory::Essential, true);
        let record = StoredConsentRecord::new(consents, decision);

        let persist_error = match self.kv.set(&self.key, &record.to_json()) {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(
                    key = %self.key,
                    decision = %decision,
                    error = %e,
                    "Failed to persist consent record"
                );
                Some(e)
            }
        };

        SaveOutcome {
            record,
            persist_error,
        }
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookiegate_storage::MemoryKv;

    const KEY: &str = "test.cookie-consent";

    fn store_with(kv: MemoryKv) -> ConsentRecordStore {
        ConsentRecordStore::new(Arc::new(kv), KEY)
    }

    #[test]
    fn test_round_trip() {
        let store = store_with(MemoryKv::new());
        let consents = ConsentMap::essential_only().with(ConsentCategory::Analytics, true);

        let outcome = store.save(consents, ConsentDecision::Custom);
        assert!(outcome.persisted());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.consents, consents);
        assert_eq!(loaded.decision, ConsentDecision::Custom);
        assert!(loaded.updated_at.is_some());
    }

    #[test]
    fn test_corrupt_records_load_as_absent() {
        let kv = MemoryKv::new();
        let store = store_with(kv.clone());

        for raw in [
            "not json",
            "[]",
            r#"{"decision":"custom"}"#,
            r#"{"consents":null}"#,
            r#"{"consents":{"marketing":"yes"}}"#,
            r#"{"consents":{},"decision":"maybe"}"#,
            r#"{"consents":{},"updatedAt":"yesterday"}"#,
        ] {
            kv.set(KEY, raw).unwrap();
            assert!(store.load().is_none(), "accepted corrupt record {raw}");
        }
    }

    #[test]
    fn test_lenient_fields() {
        let kv = MemoryKv::new();
        let store = store_with(kv.clone());

        kv.set(KEY, r#"{"consents":{"essential":false,"analytics":true}}"#)
            .unwrap();
        let record = store.load().unwrap();

        assert!(record.consents.get(ConsentCategory::Essential));
        assert!(record.consents.get(ConsentCategory::Analytics));
        assert!(!record.consents.get(ConsentCategory::Marketing));
        assert_eq!(record.decision, ConsentDecision::Custom);
        assert_eq!(record.updated_at, None);
    }

    #[test]
    fn test_written_format() {
        let kv = MemoryKv::new();
        let store = store_with(kv.clone());
        store.save(ConsentMap::all(true), ConsentDecision::AcceptedAll);

        let raw = kv.get(KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["decision"], "accepted-all");
        assert_eq!(value["consents"]["functional"], true);
        let updated_at = value["updatedAt"].as_str().unwrap();
        assert!(updated_at.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(updated_at).is_ok());
    }

    #[test]
    fn test_persist_failure_still_returns_record() {
        let store = store_with(MemoryKv::with_quota(10));

        let outcome = store.save(ConsentMap::all(false), ConsentDecision::RejectedAll);

        assert!(!outcome.persisted());
        assert!(matches!(
            outcome.persist_error,
            Some(StorageError::QuotaExceeded { .. })
        ));
        assert_eq!(outcome.record.decision, ConsentDecision::RejectedAll);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_clear() {
        let store = store_with(MemoryKv::new());
        store.save(ConsentMap::all(true), ConsentDecision::AcceptedAll);
        store.clear().unwrap();
        assert!(store.load().is_none());
    }
}
