use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use uuid::Uuid;

use crate::models::{
    FieldConfigInput, FieldConfigUpdate, FieldDefinition, JsonMap, RecordType, StoredRecord,
};
use crate::utils::EngineError;

pub type StoreResult<T> = Result<T, EngineError>;

/// The record store. Every call is scoped by an explicit tenant id; no
/// multi-statement transaction primitive is assumed.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows matching every key/value pair in `filter` (equality only).
    async fn select(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        filter: &JsonMap,
    ) -> StoreResult<Vec<StoredRecord>>;

    /// Bulk insert. Rows colliding with the record type's natural-key
    /// uniqueness constraint are silently skipped; the returned list holds
    /// only the rows actually inserted.
    async fn insert(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        rows: Vec<JsonMap>,
    ) -> StoreResult<Vec<StoredRecord>>;

    /// Merge `patch` into the record's data. Keys with a JSON null value
    /// overwrite the stored value with null. Returns `None` when no record
    /// matches the id within the tenant.
    async fn update(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        id: Uuid,
        patch: JsonMap,
    ) -> StoreResult<Option<StoredRecord>>;

    async fn get(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        id: Uuid,
    ) -> StoreResult<Option<StoredRecord>>;

    /// Returns the number of rows removed.
    async fn delete(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        id: Uuid,
    ) -> StoreResult<u64>;
}

/// Field configuration persistence. Read fresh on every write-path call;
/// nothing here is cached across requests.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FieldConfigStore: Send + Sync {
    /// All configurations for the tenant and record type, ordered by
    /// `(field_section, display_order)`.
    async fn list(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
    ) -> StoreResult<Vec<FieldDefinition>>;

    async fn get(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        field_name: &str,
    ) -> StoreResult<Option<FieldDefinition>>;

    async fn upsert(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        input: FieldConfigInput,
    ) -> StoreResult<FieldDefinition>;

    /// Apply one bulk-update item. Fails when the field does not exist.
    async fn apply_update(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        update: FieldConfigUpdate,
    ) -> StoreResult<FieldDefinition>;

    async fn set_enabled(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        field_name: &str,
        enabled: bool,
    ) -> StoreResult<()>;

    /// Provision the built-in default field set for every configurable
    /// record type. Idempotent; returns the number of rows created.
    async fn seed_defaults(&self, tenant_id: Uuid) -> StoreResult<u64>;
}
