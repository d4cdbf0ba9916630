use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::database::RecordStore;
use crate::models::{JsonMap, RecordType, StoredRecord};
use crate::utils::EngineError;

/// Composite create for stock movements: a header row plus its item lines.
/// The store has no multi-row transaction, so the header is compensated
/// away by hand when the line insert fails. A header must never stay
/// observable without lines.
pub struct StockEntryService {
    store: Arc<dyn RecordStore>,
}

impl StockEntryService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<StoredRecord>, EngineError> {
        self.store
            .select(tenant_id, RecordType::StockEntry, &JsonMap::new())
            .await
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        mut header: JsonMap,
        items: Vec<JsonMap>,
    ) -> Result<(StoredRecord, Vec<StoredRecord>), EngineError> {
        if items.is_empty() {
            return Err(EngineError::Validation(
                "at least one item is required".to_string(),
            ));
        }

        let entry_number = generate_entry_number(&header);
        header.insert("entry_number".to_string(), Value::String(entry_number));

        // Header first, so the generated id can tag the lines
        let mut inserted = self
            .store
            .insert(tenant_id, RecordType::StockEntry, vec![header])
            .await?;
        let header = inserted.pop().ok_or_else(|| {
            EngineError::StoreUnavailable("header insert returned no row".to_string())
        })?;

        let lines: Vec<JsonMap> = items
            .into_iter()
            .map(|mut item| {
                item.insert(
                    "stock_entry_id".to_string(),
                    Value::String(header.id.to_string()),
                );
                item
            })
            .collect();

        match self
            .store
            .insert(tenant_id, RecordType::StockEntryItem, lines)
            .await
        {
            Ok(inserted_lines) => {
                info!(
                    "Created stock entry {} with {} lines for tenant {}",
                    header.id,
                    inserted_lines.len(),
                    tenant_id
                );
                Ok((header, inserted_lines))
            }
            Err(line_err) => {
                warn!(
                    "Line insert for stock entry {} failed, rolling back header: {}",
                    header.id, line_err
                );
                match self
                    .store
                    .delete(tenant_id, RecordType::StockEntry, header.id)
                    .await
                {
                    Ok(_) => Err(EngineError::BatchInsertFailed(format!(
                        "stock entry items: {line_err}"
                    ))),
                    Err(delete_err) => {
                        // Compensation itself failed; this must not be
                        // silently folded into the line failure.
                        error!(
                            "Header {} could not be removed after line failure: {}",
                            header.id, delete_err
                        );
                        Err(EngineError::OrphanedHeader(header.id))
                    }
                }
            }
        }
    }
}

/// Entry numbers carry a type prefix and a short unique suffix.
fn generate_entry_number(header: &JsonMap) -> String {
    let prefix = match header.get("entry_type").and_then(|v| v.as_str()) {
        Some("inward") => "IN",
        Some("outward") => "OUT",
        _ => "SE",
    };
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &suffix[..8].to_uppercase())
}
