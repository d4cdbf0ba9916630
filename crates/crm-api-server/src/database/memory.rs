//! In-memory store used by unit tests in place of the Postgres repository.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::store::{FieldConfigStore, RecordStore, StoreResult};
use crate::models::{
    FieldConfigInput, FieldConfigUpdate, FieldDefinition, JsonMap, RecordType, StoredRecord,
};
use crate::services::defaults::default_fields;
use crate::utils::EngineError;

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<(Uuid, RecordType), Vec<StoredRecord>>>,
    fields: Mutex<Vec<FieldDefinition>>,
    insert_calls: Mutex<usize>,
    fail_insert_calls: Mutex<HashSet<usize>>,
    fail_deletes: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the n-th insert call (1-based, across all record types) fail.
    pub fn fail_insert_call(&self, n: usize) {
        self.fail_insert_calls.lock().unwrap().insert(n);
    }

    pub fn fail_deletes(&self) {
        *self.fail_deletes.lock().unwrap() = true;
    }

    pub fn count(&self, tenant_id: Uuid, record_type: RecordType) -> usize {
        self.records
            .lock()
            .unwrap()
            .get(&(tenant_id, record_type))
            .map_or(0, Vec::len)
    }

    fn matches(record: &StoredRecord, filter: &JsonMap) -> bool {
        filter
            .iter()
            .all(|(k, v)| record.data.get(k) == Some(v))
    }

    fn natural_key_collision(existing: &[StoredRecord], record_type: RecordType, row: &JsonMap) -> bool {
        let key = record_type.natural_key();
        if key.is_empty() {
            return false;
        }
        let complete = key
            .iter()
            .all(|f| row.get(*f).is_some_and(|v| !v.is_null()));
        if !complete {
            return false;
        }
        existing
            .iter()
            .any(|r| key.iter().all(|f| r.data.get(*f) == row.get(*f)))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        filter: &JsonMap,
    ) -> StoreResult<Vec<StoredRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .get(&(tenant_id, record_type))
            .map(|rows| {
                rows.iter()
                    .filter(|r| Self::matches(r, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        rows: Vec<JsonMap>,
    ) -> StoreResult<Vec<StoredRecord>> {
        let call = {
            let mut calls = self.insert_calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if self.fail_insert_calls.lock().unwrap().contains(&call) {
            return Err(EngineError::StoreUnavailable(
                "injected store failure".to_string(),
            ));
        }

        let mut records = self.records.lock().unwrap();
        let bucket = records.entry((tenant_id, record_type)).or_default();

        let mut inserted = Vec::new();
        for row in rows {
            if Self::natural_key_collision(bucket, record_type, &row) {
                continue;
            }
            let record = StoredRecord {
                id: Uuid::new_v4(),
                tenant_id,
                data: row,
                created_at: Utc::now(),
            };
            bucket.push(record.clone());
            inserted.push(record);
        }
        Ok(inserted)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        id: Uuid,
        patch: JsonMap,
    ) -> StoreResult<Option<StoredRecord>> {
        let mut records = self.records.lock().unwrap();
        let bucket = records.entry((tenant_id, record_type)).or_default();
        for record in bucket.iter_mut() {
            if record.id == id {
                for (k, v) in patch {
                    record.data.insert(k, v);
                }
                return Ok(Some(record.clone()));
            }
        }
        Ok(None)
    }

    async fn get(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        id: Uuid,
    ) -> StoreResult<Option<StoredRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .get(&(tenant_id, record_type))
            .and_then(|rows| rows.iter().find(|r| r.id == id).cloned()))
    }

    async fn delete(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        id: Uuid,
    ) -> StoreResult<u64> {
        if *self.fail_deletes.lock().unwrap() {
            return Err(EngineError::StoreUnavailable(
                "injected delete failure".to_string(),
            ));
        }
        let mut records = self.records.lock().unwrap();
        let bucket = records.entry((tenant_id, record_type)).or_default();
        let before = bucket.len();
        bucket.retain(|r| r.id != id);
        Ok((before - bucket.len()) as u64)
    }
}

#[async_trait]
impl FieldConfigStore for MemoryStore {
    async fn list(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
    ) -> StoreResult<Vec<FieldDefinition>> {
        let fields = self.fields.lock().unwrap();
        let mut out: Vec<FieldDefinition> = fields
            .iter()
            .filter(|f| f.tenant_id == tenant_id && f.record_type == record_type)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            (a.field_section.as_str(), a.display_order)
                .cmp(&(b.field_section.as_str(), b.display_order))
        });
        Ok(out)
    }

    async fn get(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        field_name: &str,
    ) -> StoreResult<Option<FieldDefinition>> {
        let fields = self.fields.lock().unwrap();
        Ok(fields
            .iter()
            .find(|f| {
                f.tenant_id == tenant_id
                    && f.record_type == record_type
                    && f.field_name == field_name
            })
            .cloned())
    }

    async fn upsert(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        input: FieldConfigInput,
    ) -> StoreResult<FieldDefinition> {
        let def = FieldDefinition {
            tenant_id,
            record_type,
            field_name: input.field_name.clone(),
            field_label: input.field_label,
            field_type: input.field_type,
            field_options: input.field_options,
            is_enabled: input.is_enabled,
            is_mandatory: input.is_mandatory,
            display_order: input.display_order,
            field_section: input.field_section,
            placeholder: input.placeholder,
            help_text: input.help_text,
        };
        let mut fields = self.fields.lock().unwrap();
        if let Some(existing) = fields.iter_mut().find(|f| {
            f.tenant_id == tenant_id
                && f.record_type == record_type
                && f.field_name == input.field_name
        }) {
            *existing = def.clone();
        } else {
            fields.push(def.clone());
        }
        Ok(def)
    }

    async fn apply_update(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        update: FieldConfigUpdate,
    ) -> StoreResult<FieldDefinition> {
        let mut fields = self.fields.lock().unwrap();
        let Some(field) = fields.iter_mut().find(|f| {
            f.tenant_id == tenant_id
                && f.record_type == record_type
                && f.field_name == update.field_name
        }) else {
            return Err(EngineError::Validation(format!(
                "unknown field '{}' for {}",
                update.field_name, record_type
            )));
        };

        if let Some(enabled) = update.is_enabled {
            field.is_enabled = enabled;
        }
        if let Some(order) = update.display_order {
            field.display_order = order;
        }
        if let Some(label) = update.field_label {
            field.field_label = label;
        }
        if update.placeholder.is_some() {
            field.placeholder = update.placeholder;
        }
        if update.help_text.is_some() {
            field.help_text = update.help_text;
        }
        Ok(field.clone())
    }

    async fn set_enabled(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        field_name: &str,
        enabled: bool,
    ) -> StoreResult<()> {
        let mut fields = self.fields.lock().unwrap();
        let Some(field) = fields.iter_mut().find(|f| {
            f.tenant_id == tenant_id
                && f.record_type == record_type
                && f.field_name == field_name
        }) else {
            return Err(EngineError::Validation(format!(
                "unknown field '{field_name}' for {record_type}"
            )));
        };
        field.is_enabled = enabled;
        Ok(())
    }

    async fn seed_defaults(&self, tenant_id: Uuid) -> StoreResult<u64> {
        let mut created = 0u64;
        let mut fields = self.fields.lock().unwrap();
        for record_type in RecordType::configurable() {
            for (order, field) in default_fields(*record_type).iter().enumerate() {
                let exists = fields.iter().any(|f| {
                    f.tenant_id == tenant_id
                        && f.record_type == *record_type
                        && f.field_name == field.field_name
                });
                if exists {
                    continue;
                }
                fields.push(FieldDefinition {
                    tenant_id,
                    record_type: *record_type,
                    field_name: field.field_name.to_string(),
                    field_label: field.field_label.to_string(),
                    field_type: field.field_type,
                    field_options: field
                        .field_options
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                    is_enabled: true,
                    is_mandatory: field.is_mandatory,
                    display_order: order as i32,
                    field_section: field.field_section.to_string(),
                    placeholder: None,
                    help_text: None,
                });
                created += 1;
            }
        }
        Ok(created)
    }
}
