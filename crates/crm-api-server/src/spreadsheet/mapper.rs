use std::collections::HashMap;

use serde_json::Value;

use crate::models::{FieldDefinition, JsonMap, RecordType};
use crate::utils::EngineError;

/// Lead rows denormalize their product associations into two synthetic
/// columns, positionally correlated: the Nth name pairs with the Nth
/// quantity.
pub const PRODUCT_NAMES_FIELD: &str = "product_names";
pub const PRODUCT_QUANTITIES_FIELD: &str = "product_quantities";
pub const PRODUCT_NAMES_LABEL: &str = "Product Names (comma-separated)";
pub const PRODUCT_QUANTITIES_LABEL: &str = "Product Quantities (comma-separated)";

/// Rows mapped back onto field names, plus how many raw rows were dropped
/// for being entirely empty.
#[derive(Debug)]
pub struct MappedRows {
    pub rows: Vec<JsonMap>,
    pub dropped: usize,
}

/// Reverse map from lower-cased column label to field name, over the
/// tenant's enabled fields.
pub fn label_map(defs: &[FieldDefinition], record_type: RecordType) -> HashMap<String, String> {
    let mut map: HashMap<String, String> = defs
        .iter()
        .filter(|d| d.is_enabled)
        .map(|d| (d.field_label.to_lowercase(), d.field_name.clone()))
        .collect();

    if record_type == RecordType::Lead {
        map.insert(
            PRODUCT_NAMES_LABEL.to_lowercase(),
            PRODUCT_NAMES_FIELD.to_string(),
        );
        map.insert(
            PRODUCT_QUANTITIES_LABEL.to_lowercase(),
            PRODUCT_QUANTITIES_FIELD.to_string(),
        );
    }
    map
}

/// Map raw cell rows onto field names using the column labels in the first
/// row. Headers without a known mapping are ignored, which keeps templates
/// carrying extra descriptive columns importable.
pub fn map_rows(
    defs: &[FieldDefinition],
    record_type: RecordType,
    raw: &[Vec<String>],
) -> Result<MappedRows, EngineError> {
    if raw.len() < 2 {
        return Err(EngineError::EmptyFile);
    }

    let labels = label_map(defs, record_type);
    let headers: Vec<String> = raw[0].iter().map(|h| h.trim().to_lowercase()).collect();

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for cells in &raw[1..] {
        if cells.iter().all(|c| c.trim().is_empty()) {
            dropped += 1;
            continue;
        }

        let mut row = JsonMap::new();
        for (i, header) in headers.iter().enumerate() {
            let Some(field_name) = labels.get(header) else {
                continue;
            };
            let Some(cell) = cells.get(i) else {
                continue;
            };
            if cell.trim().is_empty() {
                continue;
            }
            row.insert(field_name.clone(), Value::String(cell.clone()));
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(EngineError::NoValidRows);
    }

    Ok(MappedRows { rows, dropped })
}
