use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;

use super::mapper::{
    PRODUCT_NAMES_FIELD, PRODUCT_NAMES_LABEL, PRODUCT_QUANTITIES_FIELD, PRODUCT_QUANTITIES_LABEL,
};
use crate::models::{FieldDefinition, FieldType, RecordType, StoredRecord, SYSTEM_ID_FIELDS};

/// Enabled fields an importer is expected to fill, in display order.
/// System-derived identifier fields never appear in exchange files.
pub fn template_fields(defs: &[FieldDefinition]) -> Vec<&FieldDefinition> {
    let mut fields: Vec<&FieldDefinition> = defs
        .iter()
        .filter(|d| d.is_enabled && !SYSTEM_ID_FIELDS.contains(&d.field_name.as_str()))
        .collect();
    fields.sort_by_key(|d| d.display_order);
    fields
}

/// Render the import template for a tenant's current schema: one header row
/// of labels and one illustrative sample row.
pub fn generate_template(
    defs: &[FieldDefinition],
    record_type: RecordType,
    today: NaiveDate,
) -> Result<Vec<u8>> {
    let fields = template_fields(defs);

    let mut headers: Vec<String> = fields.iter().map(|d| d.field_label.clone()).collect();
    let mut sample: Vec<String> = fields.iter().map(|d| sample_value(d, today)).collect();

    if record_type == RecordType::Lead {
        headers.push(PRODUCT_NAMES_LABEL.to_string());
        headers.push(PRODUCT_QUANTITIES_LABEL.to_string());
        sample.push(sample_for_synthetic(PRODUCT_NAMES_FIELD));
        sample.push(sample_for_synthetic(PRODUCT_QUANTITIES_FIELD));
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&headers).context("write header row")?;
    writer.write_record(&sample).context("write sample row")?;
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush template bytes: {e}"))
}

pub fn template_filename(record_type: RecordType, today: NaiveDate) -> String {
    format!(
        "{}_import_template_{}.csv",
        record_type.plural(),
        today.format("%Y-%m-%d")
    )
}

fn sample_value(def: &FieldDefinition, today: NaiveDate) -> String {
    match def.field_type {
        FieldType::Select => def
            .field_options
            .first()
            .cloned()
            .unwrap_or_else(|| format!("Sample {}", def.field_label)),
        FieldType::Email => "example@company.com".to_string(),
        FieldType::Phone => "+91 98765 43210".to_string(),
        FieldType::Number => "0".to_string(),
        FieldType::Date => today.format("%Y-%m-%d").to_string(),
        FieldType::Text => format!("Sample {}", def.field_label),
    }
}

fn sample_for_synthetic(field: &str) -> String {
    match field {
        PRODUCT_NAMES_FIELD => "Headphones, Mouse, Keyboard".to_string(),
        _ => "2, 5, 3".to_string(),
    }
}

/// Render stored records as a download matching the tenant's current
/// schema: columns are the enabled fields in display order.
pub fn export_records(
    defs: &[FieldDefinition],
    record_type: RecordType,
    records: &[StoredRecord],
    today: NaiveDate,
) -> Result<(String, Vec<u8>)> {
    let fields = template_fields(defs);
    let headers: Vec<String> = fields.iter().map(|d| d.field_label.clone()).collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&headers).context("write header row")?;

    for record in records {
        let row: Vec<String> = fields
            .iter()
            .map(|d| cell_text(record.data.get(&d.field_name)))
            .collect();
        writer.write_record(&row).context("write data row")?;
    }

    let filename = format!(
        "{}_export_{}.csv",
        record_type.plural(),
        today.format("%Y-%m-%d")
    );
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush export bytes: {e}"))?;
    Ok((filename, bytes))
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}
