use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::database::FieldConfigStore;
use crate::models::{FieldDefinition, JsonMap, RecordType};
use crate::utils::EngineError;

/// Structural multi-value fields honored regardless of configuration. They
/// belong to a record sub-type (distributor accounts carry an industry tag
/// list), not to the configurable attribute set.
pub const EXEMPT_MULTI_VALUE_FIELDS: &[&str] = &["industries"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Create,
    Update,
}

/// Sanitizes raw input against the tenant's enabled field set.
///
/// Two modes on purpose: with configuration rows present the filter is a
/// strict allowlist; on update with no rows at all it degrades to keep
/// everything (still null-normalizing), so a tenant whose configuration was
/// never seeded can still mutate records.
pub struct SchemaFilter {
    fields: Arc<dyn FieldConfigStore>,
}

impl SchemaFilter {
    pub fn new(fields: Arc<dyn FieldConfigStore>) -> Self {
        Self { fields }
    }

    pub async fn filter(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        mode: FilterMode,
        raw: &JsonMap,
    ) -> Result<JsonMap, EngineError> {
        let defs = self.fields.list(tenant_id, record_type).await?;
        if defs.is_empty() {
            debug!(
                "No field configuration for tenant {} / {}, mode {:?}",
                tenant_id, record_type, mode
            );
        }
        let record = filter_record(&defs, mode, raw);
        if mode == FilterMode::Create {
            require_mandatory(&defs, &record)?;
        }
        Ok(record)
    }
}

/// Interactive creates must carry a value for every enabled mandatory
/// field. Bulk import deliberately does not go through this: a blank
/// identifying field there is a skip, not an error.
pub fn require_mandatory(defs: &[FieldDefinition], record: &JsonMap) -> Result<(), EngineError> {
    for def in defs.iter().filter(|d| d.is_enabled && d.is_mandatory) {
        let present = record
            .get(&def.field_name)
            .is_some_and(|v| !v.is_null());
        if !present {
            return Err(EngineError::Validation(format!(
                "{} is required",
                def.field_label
            )));
        }
    }
    Ok(())
}

pub fn filter_record(defs: &[FieldDefinition], mode: FilterMode, raw: &JsonMap) -> JsonMap {
    let enabled: HashSet<&str> = defs
        .iter()
        .filter(|d| d.is_enabled)
        .map(|d| d.field_name.as_str())
        .collect();

    // Compatibility fallback: an update from a tenant with no configuration
    // rows keeps every field rather than dropping the whole payload.
    let permissive = defs.is_empty() && mode == FilterMode::Update;

    let mut out = JsonMap::new();
    for (key, value) in raw {
        let exempt = EXEMPT_MULTI_VALUE_FIELDS.contains(&key.as_str());
        if !permissive && !exempt && !enabled.contains(key.as_str()) {
            continue;
        }
        if exempt {
            out.insert(key.clone(), coerce_list(value));
        } else {
            out.insert(key.clone(), normalize_value(value));
        }
    }
    out
}

/// Empty and whitespace-only strings become null; everything else passes
/// through unchanged.
fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) if s.trim().is_empty() => Value::Null,
        other => other.clone(),
    }
}

fn coerce_list(value: &Value) -> Value {
    match value {
        Value::Array(_) => value.clone(),
        _ => Value::Array(Vec::new()),
    }
}
