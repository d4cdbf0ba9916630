use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::duplicate_guard::DuplicateGuard;
use super::normalize;
use crate::database::{FieldConfigStore, RecordStore};
use crate::models::{
    BatchError, FieldDefinition, ImportResult, JsonMap, RecordType, StoredRecord,
};
use crate::spreadsheet::mapper::{
    self, MappedRows, PRODUCT_NAMES_FIELD, PRODUCT_QUANTITIES_FIELD,
};
use crate::spreadsheet::parser;
use crate::utils::EngineError;

/// Bulk spreadsheet import. Rows are processed strictly in file order and
/// flushed to the store in bounded batches; one batch failing is recorded
/// and never aborts the batches after it.
pub struct ImportService {
    store: Arc<dyn RecordStore>,
    fields: Arc<dyn FieldConfigStore>,
    guard: DuplicateGuard,
    batch_size: usize,
}

impl ImportService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        fields: Arc<dyn FieldConfigStore>,
        batch_size: usize,
    ) -> Self {
        let guard = DuplicateGuard::new(store.clone());
        Self {
            store,
            fields,
            guard,
            batch_size: batch_size.max(1),
        }
    }

    /// Decode, map and load one uploaded file. Parse-stage failures abort
    /// the whole job; from the first batch on, failures only accumulate in
    /// the result.
    pub async fn import_file(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        filename: &str,
        bytes: &[u8],
    ) -> Result<ImportResult, EngineError> {
        if record_type.identifier_field().is_none() {
            return Err(EngineError::Validation(format!(
                "{record_type} records cannot be imported from a file"
            )));
        }

        let defs = self.fields.list(tenant_id, record_type).await?;
        let raw = parser::decode_rows(filename, bytes)?;
        let mapped = mapper::map_rows(&defs, record_type, &raw)?;

        info!(
            "Importing {} rows ({} dropped as empty) of {} for tenant {}",
            mapped.rows.len(),
            mapped.dropped,
            record_type,
            tenant_id
        );

        self.load(tenant_id, record_type, &defs, mapped).await
    }

    pub async fn load(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        defs: &[FieldDefinition],
        mapped: MappedRows,
    ) -> Result<ImportResult, EngineError> {
        let identifier = record_type.identifier_field().ok_or_else(|| {
            EngineError::Validation(format!(
                "{record_type} records cannot be imported from a file"
            ))
        })?;

        let mut result = ImportResult {
            total: mapped.rows.len() + mapped.dropped,
            skipped: mapped.dropped,
            ..Default::default()
        };

        let mut pending: Vec<JsonMap> = Vec::new();
        let mut pending_lines: HashMap<String, Vec<JsonMap>> = HashMap::new();
        // Keys already claimed by earlier rows of this job, so rows in the
        // same file collide with each other before anything is flushed.
        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut batch_no = 0usize;

        for mut row in mapped.rows {
            let name = row
                .get(identifier)
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            let Some(name) = name else {
                result.skipped += 1;
                continue;
            };
            row.insert(identifier.to_string(), Value::String(name.clone()));

            normalize::derive_row(defs, record_type, &mut row);

            if record_type == RecordType::Lead {
                let lines = extract_product_lines(&mut row);
                if !lines.is_empty() {
                    pending_lines.insert(name.clone(), lines);
                }
            }

            if let Some(key) = DuplicateGuard::key_values(record_type, &row) {
                let fingerprint = DuplicateGuard::fingerprint(&key);
                let duplicate = seen_keys.contains(&fingerprint)
                    || match self.guard.exists(tenant_id, record_type, &key).await {
                        Ok(hit) => hit,
                        Err(e) => {
                            // The unique index catches it at insert time
                            warn!("Duplicate pre-check failed, deferring to insert: {}", e);
                            false
                        }
                    };
                if duplicate {
                    result.duplicates.push(name);
                    result.skipped += 1;
                    continue;
                }
                seen_keys.insert(fingerprint);
            }

            pending.push(row);
            if pending.len() >= self.batch_size {
                self.flush(
                    tenant_id,
                    record_type,
                    identifier,
                    &mut pending,
                    batch_no,
                    &mut pending_lines,
                    &mut result,
                )
                .await;
                batch_no += 1;
            }
        }

        if !pending.is_empty() {
            self.flush(
                tenant_id,
                record_type,
                identifier,
                &mut pending,
                batch_no,
                &mut pending_lines,
                &mut result,
            )
            .await;
        }

        info!(
            "Import of {} for tenant {} finished: {}/{} imported, {} skipped, {} duplicates, {} batch errors",
            record_type,
            tenant_id,
            result.imported,
            result.total,
            result.skipped,
            result.duplicates.len(),
            result.errors.len()
        );

        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    async fn flush(
        &self,
        tenant_id: Uuid,
        record_type: RecordType,
        identifier: &str,
        pending: &mut Vec<JsonMap>,
        batch_no: usize,
        pending_lines: &mut HashMap<String, Vec<JsonMap>>,
        result: &mut ImportResult,
    ) {
        let rows = std::mem::take(pending);
        let attempted: Vec<String> = rows
            .iter()
            .map(|r| {
                r.get(identifier)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();

        match self.store.insert(tenant_id, record_type, rows).await {
            Ok(inserted) => {
                result.imported += inserted.len();

                // Rows the store dropped on a natural-key conflict lost the
                // race against a concurrent job; count them as duplicates.
                if inserted.len() < attempted.len() {
                    let inserted_names: HashSet<&str> = inserted
                        .iter()
                        .filter_map(|r| r.field_str(identifier))
                        .collect();
                    for name in &attempted {
                        if !inserted_names.contains(name.as_str()) {
                            result.duplicates.push(name.clone());
                            result.skipped += 1;
                        }
                    }
                }

                if record_type == RecordType::Lead && !pending_lines.is_empty() {
                    self.insert_lead_lines(tenant_id, identifier, &inserted, pending_lines, batch_no, result)
                        .await;
                }
            }
            Err(e) => {
                error!("Batch {} insert failed: {}", batch_no, e);
                result.errors.push(BatchError {
                    batch: batch_no,
                    message: EngineError::BatchInsertFailed(e.to_string()).to_string(),
                });
            }
        }
    }

    /// Child rows for the product associations of just-inserted leads, in
    /// one bulk call. The leads themselves stay imported even if this
    /// fails; the failure is recorded against the batch.
    async fn insert_lead_lines(
        &self,
        tenant_id: Uuid,
        identifier: &str,
        inserted: &[StoredRecord],
        pending_lines: &mut HashMap<String, Vec<JsonMap>>,
        batch_no: usize,
        result: &mut ImportResult,
    ) {
        let mut lines = Vec::new();
        for lead in inserted {
            let Some(name) = lead.field_str(identifier) else {
                continue;
            };
            if let Some(rows) = pending_lines.remove(name) {
                for mut line in rows {
                    line.insert("lead_id".to_string(), Value::String(lead.id.to_string()));
                    lines.push(line);
                }
            }
        }
        if lines.is_empty() {
            return;
        }

        if let Err(e) = self.store.insert(tenant_id, RecordType::LeadProduct, lines).await {
            error!("Lead product lines for batch {} failed: {}", batch_no, e);
            result.errors.push(BatchError {
                batch: batch_no,
                message: format!("lead product lines: {e}"),
            });
        }
    }
}

/// Split the two synthetic comma-separated columns off a mapped lead row
/// into child rows. The Nth name pairs with the Nth quantity; a missing
/// quantity defaults to 1.
fn extract_product_lines(row: &mut JsonMap) -> Vec<JsonMap> {
    let names = take_string(row, PRODUCT_NAMES_FIELD);
    let quantities = take_string(row, PRODUCT_QUANTITIES_FIELD);
    let Some(names) = names else {
        return Vec::new();
    };

    let quantities: Vec<String> = quantities
        .as_deref()
        .map(split_cell)
        .unwrap_or_default();

    split_cell(&names)
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let quantity = quantities
                .get(i)
                .and_then(|q| q.parse::<i64>().ok())
                .unwrap_or(1);
            [
                ("product_name".to_string(), Value::String(name)),
                ("quantity".to_string(), Value::Number(quantity.into())),
            ]
            .into_iter()
            .collect()
        })
        .collect()
}

fn split_cell(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn take_string(row: &mut JsonMap, key: &str) -> Option<String> {
    match row.remove(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::models::RecordType;
    use crate::spreadsheet::template::generate_template;

    fn setup(batch_size: usize) -> (Uuid, Arc<MemoryStore>, ImportService) {
        let tenant = Uuid::new_v4();
        let store = Arc::new(MemoryStore::new());
        let service = ImportService::new(store.clone(), store.clone(), batch_size);
        (tenant, store, service)
    }

    fn account_csv(names: &[&str]) -> Vec<u8> {
        let mut out = String::from("Account Name,Billing City\n");
        for name in names {
            out.push_str(&format!("{name},Pune\n"));
        }
        out.into_bytes()
    }

    #[tokio::test]
    async fn generated_template_imports_as_exactly_one_row() {
        let (tenant, store, service) = setup(50);
        store.seed_defaults(tenant).await.unwrap();

        let defs = store.list(tenant, RecordType::Product).await.unwrap();
        let today = chrono::Utc::now().date_naive();
        let bytes = generate_template(&defs, RecordType::Product, today).unwrap();

        let result = service
            .import_file(tenant, RecordType::Product, "template.csv", &bytes)
            .await
            .unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 0);
        assert!(result.errors.is_empty());
        assert!(result.duplicates.is_empty());

        let rows = store
            .select(tenant, RecordType::Product, &JsonMap::new())
            .await
            .unwrap();
        assert_eq!(rows[0].field_str("product_name"), Some("Sample Product Name"));
        assert_eq!(rows[0].field_str("category"), Some("Instrument"));
    }

    #[tokio::test]
    async fn importing_the_same_file_twice_skips_every_row() {
        let (tenant, store, service) = setup(50);
        store.seed_defaults(tenant).await.unwrap();

        let bytes = account_csv(&["Acme Labs", "Borealis Foods", "Cetus Diagnostics"]);

        let first = service
            .import_file(tenant, RecordType::Account, "accounts.csv", &bytes)
            .await
            .unwrap();
        assert_eq!(first.imported, 3);

        let second = service
            .import_file(tenant, RecordType::Account, "accounts.csv", &bytes)
            .await
            .unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.duplicates.len(), 3);
        assert_eq!(second.skipped, 3);
        assert_eq!(store.count(tenant, RecordType::Account), 3);
    }

    #[tokio::test]
    async fn a_failed_batch_never_aborts_the_batches_after_it() {
        let (tenant, store, service) = setup(50);
        store.seed_defaults(tenant).await.unwrap();

        let names: Vec<String> = (1..=120).map(|i| format!("Account {i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let bytes = account_csv(&refs);

        // Batches 0 and 1 carry 50 rows each, batch 2 the final 20; the
        // third insert call is the one that fails.
        store.fail_insert_call(3);

        let result = service
            .import_file(tenant, RecordType::Account, "accounts.csv", &bytes)
            .await
            .unwrap();

        assert_eq!(result.total, 120);
        assert_eq!(result.imported, 100);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].batch, 2);
        assert_eq!(store.count(tenant, RecordType::Account), 100);
    }

    #[tokio::test]
    async fn a_middle_batch_failure_leaves_later_batches_running() {
        let (tenant, store, service) = setup(1);
        store.seed_defaults(tenant).await.unwrap();

        let bytes = account_csv(&["Acme Labs", "Borealis Foods", "Cetus Diagnostics"]);
        store.fail_insert_call(2);

        let result = service
            .import_file(tenant, RecordType::Account, "accounts.csv", &bytes)
            .await
            .unwrap();

        assert_eq!(result.imported, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].batch, 1);
        assert_eq!(store.count(tenant, RecordType::Account), 2);
    }

    #[tokio::test]
    async fn rows_without_the_identifying_field_are_skipped_not_errors() {
        let (tenant, store, service) = setup(50);
        store.seed_defaults(tenant).await.unwrap();

        let bytes = b"Account Name,Billing City\nAcme Labs,Pune\n,Mumbai\n".to_vec();
        let result = service
            .import_file(tenant, RecordType::Account, "accounts.csv", &bytes)
            .await
            .unwrap();

        assert_eq!(result.total, 2);
        assert_eq!(result.imported, 1);
        assert_eq!(result.skipped, 1);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn duplicate_rows_within_one_file_collide_before_any_flush() {
        let (tenant, store, service) = setup(50);
        store.seed_defaults(tenant).await.unwrap();

        let bytes = account_csv(&["Acme Labs", "Acme Labs"]);
        let result = service
            .import_file(tenant, RecordType::Account, "accounts.csv", &bytes)
            .await
            .unwrap();

        assert_eq!(result.imported, 1);
        assert_eq!(result.duplicates, vec!["Acme Labs".to_string()]);
    }

    #[tokio::test]
    async fn lead_rows_fan_out_into_product_lines() {
        let (tenant, store, service) = setup(50);
        store.seed_defaults(tenant).await.unwrap();

        let bytes = format!(
            "Lead Name,Assigned To,{},{}\nSpectrometer enquiry,Asha,\"Headphones, Mouse\",\"2, 5\"\n",
            mapper::PRODUCT_NAMES_LABEL, mapper::PRODUCT_QUANTITIES_LABEL
        )
        .into_bytes();

        let result = service
            .import_file(tenant, RecordType::Lead, "leads.csv", &bytes)
            .await
            .unwrap();
        assert_eq!(result.imported, 1);

        let leads = store
            .select(tenant, RecordType::Lead, &JsonMap::new())
            .await
            .unwrap();
        assert!(!leads[0].data.contains_key(PRODUCT_NAMES_FIELD));

        let lines = store
            .select(tenant, RecordType::LeadProduct, &JsonMap::new())
            .await
            .unwrap();
        assert_eq!(lines.len(), 2);
        let lead_id = leads[0].id.to_string();
        for line in &lines {
            assert_eq!(line.field_str("lead_id"), Some(lead_id.as_str()));
        }
        let quantities: Vec<i64> = lines
            .iter()
            .map(|l| l.data.get("quantity").and_then(|v| v.as_i64()).unwrap())
            .collect();
        assert_eq!(quantities, vec![2, 5]);
    }

    #[tokio::test]
    async fn header_only_and_empty_files_abort_before_loading() {
        let (tenant, store, service) = setup(50);
        store.seed_defaults(tenant).await.unwrap();

        let err = service
            .import_file(tenant, RecordType::Account, "a.csv", b"Account Name,Billing City\n")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyFile));

        let err = service
            .import_file(
                tenant,
                RecordType::Account,
                "a.csv",
                b"Account Name,Billing City\n,\n",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NoValidRows));
    }
}
