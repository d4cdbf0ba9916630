use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::duplicate_guard::DuplicateGuard;
use super::schema_filter::{FilterMode, SchemaFilter};
use crate::database::RecordStore;
use crate::models::{JsonMap, RecordType, StoredRecord};
use crate::utils::EngineError;

/// Interactive single-record CRUD. Every create and update runs through
/// the schema filter; creates additionally run the duplicate guard, and a
/// hit is a hard stop here (unlike bulk import, where it is a skip).
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    filter: SchemaFilter,
    guard: DuplicateGuard,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>, filter: SchemaFilter) -> Self {
        let guard = DuplicateGuard::new(store.clone());
        Self { store, filter, guard }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
    ) -> Result<Vec<StoredRecord>, EngineError> {
        self.store.select(tenant_id, record_type, &JsonMap::new()).await
    }

    pub async fn get(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, EngineError> {
        self.store.get(tenant_id, record_type, id).await
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        raw: &JsonMap,
    ) -> Result<StoredRecord, EngineError> {
        let record = self
            .filter
            .filter(tenant_id, record_type, FilterMode::Create, raw)
            .await?;

        let identifier = record_type
            .identifier_field()
            .ok_or_else(|| {
                EngineError::Validation(format!("{record_type} records cannot be created here"))
            })?;
        let Some(name) = record.get(identifier).and_then(|v| v.as_str()) else {
            return Err(EngineError::Validation(format!("{identifier} is required")));
        };
        let name = name.to_string();

        if let Some(key) = DuplicateGuard::key_values(record_type, &record) {
            if self.guard.exists(tenant_id, record_type, &key).await? {
                return Err(EngineError::DuplicateRecord(format!(
                    "a {record_type} named \"{name}\" already exists"
                )));
            }
        }

        let mut inserted = self.store.insert(tenant_id, record_type, vec![record]).await?;
        // The store skips natural-key conflicts, so a concurrent create can
        // still leave us empty-handed here.
        let record = inserted.pop().ok_or_else(|| {
            EngineError::DuplicateRecord(format!(
                "a {record_type} named \"{name}\" already exists"
            ))
        })?;

        info!("Created {} {} for tenant {}", record_type, record.id, tenant_id);
        Ok(record)
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        id: Uuid,
        raw: &JsonMap,
    ) -> Result<Option<StoredRecord>, EngineError> {
        let patch = self
            .filter
            .filter(tenant_id, record_type, FilterMode::Update, raw)
            .await?;
        self.store.update(tenant_id, record_type, id, patch).await
    }

    pub async fn delete(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        id: Uuid,
    ) -> Result<bool, EngineError> {
        let removed = self.store.delete(tenant_id, record_type, id).await?;
        Ok(removed > 0)
    }
}
