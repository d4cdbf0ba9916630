use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use tracing::debug;
use uuid::Uuid;

use super::pool::DbPool;
use super::store::{FieldConfigStore, RecordStore, StoreResult};
use crate::models::{
    FieldConfigInput, FieldConfigUpdate, FieldDefinition, FieldType, JsonMap, RecordType,
    StoredRecord,
};
use crate::services::defaults::default_fields;
use crate::utils::EngineError;

pub struct Repository {
    pub pool: DbPool,
}

impl Repository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(self.pool.get_pool()).await?;
        Ok(())
    }

    fn record_from_row(row: &PgRow) -> StoredRecord {
        let data: serde_json::Value = row.get("data");
        StoredRecord {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            data: data.as_object().cloned().unwrap_or_default(),
            created_at: row.get("created_at"),
        }
    }

    /// Conflict clause matching the natural-key unique index of the table,
    /// so colliding rows are dropped instead of failing the whole insert.
    fn conflict_clause(record_type: RecordType) -> String {
        let key = record_type.natural_key();
        if key.is_empty() {
            return String::new();
        }
        let exprs = key
            .iter()
            .map(|f| format!("(data->>'{f}')"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("ON CONFLICT (tenant_id, {exprs}) DO NOTHING")
    }
}

#[async_trait]
impl RecordStore for Repository {
    async fn select(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        filter: &JsonMap,
    ) -> StoreResult<Vec<StoredRecord>> {
        let sql = format!(
            "SELECT id, tenant_id, data, created_at FROM {} \
             WHERE tenant_id = $1 AND data @> $2::jsonb \
             ORDER BY created_at DESC",
            record_type.table()
        );

        let rows = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(serde_json::Value::Object(filter.clone()))
            .fetch_all(self.pool.get_pool())
            .await?;

        Ok(rows.iter().map(Self::record_from_row).collect())
    }

    async fn insert(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        rows: Vec<JsonMap>,
    ) -> StoreResult<Vec<StoredRecord>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "INSERT INTO {} (tenant_id, data) \
             SELECT $1, t.value FROM jsonb_array_elements($2::jsonb) AS t(value) \
             {} \
             RETURNING id, tenant_id, data, created_at",
            record_type.table(),
            Self::conflict_clause(record_type),
        );

        let payload = serde_json::Value::Array(
            rows.into_iter().map(serde_json::Value::Object).collect(),
        );

        let inserted = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(payload)
            .fetch_all(self.pool.get_pool())
            .await?;

        debug!(
            "Inserted {} {} rows for tenant {}",
            inserted.len(),
            record_type,
            tenant_id
        );

        Ok(inserted.iter().map(Self::record_from_row).collect())
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        id: Uuid,
        patch: JsonMap,
    ) -> StoreResult<Option<StoredRecord>> {
        let sql = format!(
            "UPDATE {} SET data = data || $3::jsonb \
             WHERE tenant_id = $1 AND id = $2 \
             RETURNING id, tenant_id, data, created_at",
            record_type.table()
        );

        let row = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(id)
            .bind(serde_json::Value::Object(patch))
            .fetch_optional(self.pool.get_pool())
            .await?;

        Ok(row.as_ref().map(Self::record_from_row))
    }

    async fn get(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        id: Uuid,
    ) -> StoreResult<Option<StoredRecord>> {
        let sql = format!(
            "SELECT id, tenant_id, data, created_at FROM {} \
             WHERE tenant_id = $1 AND id = $2",
            record_type.table()
        );

        let row = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(self.pool.get_pool())
            .await?;

        Ok(row.as_ref().map(Self::record_from_row))
    }

    async fn delete(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        id: Uuid,
    ) -> StoreResult<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE tenant_id = $1 AND id = $2",
            record_type.table()
        );

        let result = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(id)
            .execute(self.pool.get_pool())
            .await?;

        Ok(result.rows_affected())
    }
}

#[derive(FromRow)]
struct FieldRow {
    tenant_id: Uuid,
    record_type: String,
    field_name: String,
    field_label: String,
    field_type: String,
    field_options: serde_json::Value,
    is_enabled: bool,
    is_mandatory: bool,
    display_order: i32,
    field_section: String,
    placeholder: Option<String>,
    help_text: Option<String>,
}

impl FieldRow {
    fn into_definition(self) -> StoreResult<FieldDefinition> {
        let record_type = RecordType::from_key(&self.record_type).ok_or_else(|| {
            EngineError::StoreUnavailable(format!(
                "unknown record type '{}' in field configuration",
                self.record_type
            ))
        })?;
        let field_type = FieldType::from_str(&self.field_type).ok_or_else(|| {
            EngineError::StoreUnavailable(format!(
                "unknown field type '{}' for field '{}'",
                self.field_type, self.field_name
            ))
        })?;
        let field_options: Vec<String> =
            serde_json::from_value(self.field_options).unwrap_or_default();

        Ok(FieldDefinition {
            tenant_id: self.tenant_id,
            record_type,
            field_name: self.field_name,
            field_label: self.field_label,
            field_type,
            field_options,
            is_enabled: self.is_enabled,
            is_mandatory: self.is_mandatory,
            display_order: self.display_order,
            field_section: self.field_section,
            placeholder: self.placeholder,
            help_text: self.help_text,
        })
    }
}

const FIELD_COLUMNS: &str = "tenant_id, record_type, field_name, field_label, field_type, \
     field_options, is_enabled, is_mandatory, display_order, field_section, placeholder, help_text";

#[async_trait]
impl FieldConfigStore for Repository {
    async fn list(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
    ) -> StoreResult<Vec<FieldDefinition>> {
        let sql = format!(
            "SELECT {FIELD_COLUMNS} FROM field_configurations \
             WHERE tenant_id = $1 AND record_type = $2 \
             ORDER BY field_section ASC, display_order ASC"
        );

        let rows = sqlx::query_as::<_, FieldRow>(&sql)
            .bind(tenant_id)
            .bind(record_type.key())
            .fetch_all(self.pool.get_pool())
            .await?;

        rows.into_iter().map(FieldRow::into_definition).collect()
    }

    async fn get(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        field_name: &str,
    ) -> StoreResult<Option<FieldDefinition>> {
        let sql = format!(
            "SELECT {FIELD_COLUMNS} FROM field_configurations \
             WHERE tenant_id = $1 AND record_type = $2 AND field_name = $3"
        );

        let row = sqlx::query_as::<_, FieldRow>(&sql)
            .bind(tenant_id)
            .bind(record_type.key())
            .bind(field_name)
            .fetch_optional(self.pool.get_pool())
            .await?;

        row.map(FieldRow::into_definition).transpose()
    }

    async fn upsert(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        input: FieldConfigInput,
    ) -> StoreResult<FieldDefinition> {
        let sql = format!(
            "INSERT INTO field_configurations \
             ({FIELD_COLUMNS}, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now()) \
             ON CONFLICT (tenant_id, record_type, field_name) DO UPDATE SET \
                field_label = EXCLUDED.field_label, \
                field_type = EXCLUDED.field_type, \
                field_options = EXCLUDED.field_options, \
                is_enabled = EXCLUDED.is_enabled, \
                is_mandatory = EXCLUDED.is_mandatory, \
                display_order = EXCLUDED.display_order, \
                field_section = EXCLUDED.field_section, \
                placeholder = EXCLUDED.placeholder, \
                help_text = EXCLUDED.help_text, \
                updated_at = now() \
             RETURNING {FIELD_COLUMNS}"
        );

        let row = sqlx::query_as::<_, FieldRow>(&sql)
            .bind(tenant_id)
            .bind(record_type.key())
            .bind(&input.field_name)
            .bind(&input.field_label)
            .bind(input.field_type.as_str())
            .bind(serde_json::json!(input.field_options))
            .bind(input.is_enabled)
            .bind(input.is_mandatory)
            .bind(input.display_order)
            .bind(&input.field_section)
            .bind(&input.placeholder)
            .bind(&input.help_text)
            .fetch_one(self.pool.get_pool())
            .await?;

        row.into_definition()
    }

    async fn apply_update(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        update: FieldConfigUpdate,
    ) -> StoreResult<FieldDefinition> {
        let sql = format!(
            "UPDATE field_configurations SET \
                is_enabled = COALESCE($4, is_enabled), \
                display_order = COALESCE($5, display_order), \
                field_label = COALESCE($6, field_label), \
                placeholder = COALESCE($7, placeholder), \
                help_text = COALESCE($8, help_text), \
                updated_at = now() \
             WHERE tenant_id = $1 AND record_type = $2 AND field_name = $3 \
             RETURNING {FIELD_COLUMNS}"
        );

        let row = sqlx::query_as::<_, FieldRow>(&sql)
            .bind(tenant_id)
            .bind(record_type.key())
            .bind(&update.field_name)
            .bind(update.is_enabled)
            .bind(update.display_order)
            .bind(&update.field_label)
            .bind(&update.placeholder)
            .bind(&update.help_text)
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => row.into_definition(),
            None => Err(EngineError::Validation(format!(
                "unknown field '{}' for {}",
                update.field_name, record_type
            ))),
        }
    }

    async fn set_enabled(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        field_name: &str,
        enabled: bool,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE field_configurations SET is_enabled = $4, updated_at = now() \
             WHERE tenant_id = $1 AND record_type = $2 AND field_name = $3",
        )
        .bind(tenant_id)
        .bind(record_type.key())
        .bind(field_name)
        .bind(enabled)
        .execute(self.pool.get_pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(EngineError::Validation(format!(
                "unknown field '{field_name}' for {record_type}"
            )));
        }
        Ok(())
    }

    async fn seed_defaults(&self, tenant_id: Uuid) -> StoreResult<u64> {
        let mut created = 0u64;

        for record_type in RecordType::configurable() {
            for (order, field) in default_fields(*record_type).iter().enumerate() {
                let result = sqlx::query(
                    "INSERT INTO field_configurations \
                     (tenant_id, record_type, field_name, field_label, field_type, \
                      field_options, is_enabled, is_mandatory, display_order, field_section, \
                      placeholder, help_text, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, true, $7, $8, $9, NULL, NULL, now()) \
                     ON CONFLICT (tenant_id, record_type, field_name) DO NOTHING",
                )
                .bind(tenant_id)
                .bind(record_type.key())
                .bind(field.field_name)
                .bind(field.field_label)
                .bind(field.field_type.as_str())
                .bind(serde_json::json!(field.field_options))
                .bind(field.is_mandatory)
                .bind(order as i32)
                .bind(field.field_section)
                .execute(self.pool.get_pool())
                .await?;

                created += result.rows_affected();
            }
        }

        debug!("Seeded {} field configurations for tenant {}", created, tenant_id);
        Ok(created)
    }
}
