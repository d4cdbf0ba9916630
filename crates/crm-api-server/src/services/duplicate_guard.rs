use std::sync::Arc;

use uuid::Uuid;

use crate::database::RecordStore;
use crate::models::{JsonMap, RecordType};
use crate::utils::EngineError;

/// Natural-key pre-check before insert. The check-then-insert sequence is
/// not atomic; the store's unique indexes plus conflict-as-skip inserts
/// close the race, this guard exists to report duplicates by name.
pub struct DuplicateGuard {
    store: Arc<dyn RecordStore>,
}

impl DuplicateGuard {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// The natural-key values of a sanitized record, only when every key
    /// field is present and non-null. A partial key means no check.
    pub fn key_values(record_type: RecordType, record: &JsonMap) -> Option<JsonMap> {
        let key = record_type.natural_key();
        if key.is_empty() {
            return None;
        }
        let mut out = JsonMap::new();
        for field in key {
            let value = record.get(*field)?;
            if value.is_null() {
                return None;
            }
            out.insert((*field).to_string(), value.clone());
        }
        Some(out)
    }

    /// Fingerprint of a complete natural key, used to catch collisions
    /// between rows of the same import job before any of them is flushed.
    pub fn fingerprint(key: &JsonMap) -> String {
        key.iter()
            .map(|(_, v)| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .collect::<Vec<_>>()
            .join("\u{1f}")
    }

    pub async fn exists(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        key: &JsonMap,
    ) -> Result<bool, EngineError> {
        let rows = self.store.select(tenant_id, record_type, key).await?;
        Ok(!rows.is_empty())
    }
}
