//! Row-level value derivation applied during bulk import: legacy industry
//! names, spreadsheet date formats, phone spacing and numeric strings.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{FieldDefinition, FieldType, JsonMap, RecordType};

/// Free-text industry values seen in legacy spreadsheets, mapped to the
/// canonical industry names.
static INDUSTRY_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Educational institutions", "Education"),
        ("Educational institution", "Education"),
        ("Biotech Company", "Biotechnology"),
        ("Diagnostics", "Healthcare"),
        ("Diagnostic", "Healthcare"),
        ("Dairy", "Food & Beverage"),
        ("Distillery", "Food & Beverage"),
        ("Environmental", "Environmental Services"),
        ("Food Testing", "Food & Beverage"),
        ("Instrumentation", "Manufacturing"),
        ("Research Institute", "Research"),
    ])
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

pub fn map_industry(industry: &str) -> &str {
    INDUSTRY_MAP.get(industry).copied().unwrap_or(industry)
}

/// `DD/MM/YYYY` to ISO `YYYY-MM-DD`. Anything else passes through.
pub fn normalize_date(date: &str) -> String {
    let parts: Vec<&str> = date.split('/').collect();
    if parts.len() == 3 {
        let (day, month, year) = (parts[0], parts[1], parts[2]);
        return format!("{year}-{month:0>2}-{day:0>2}");
    }
    date.to_string()
}

pub fn clean_phone(phone: &str) -> String {
    WHITESPACE.replace_all(phone, " ").trim().to_string()
}

/// Type-directed cell cleanup for one mapped row, in place. Spreadsheet
/// cells arrive as strings; date, phone and number fields get rewritten
/// into their canonical shape.
pub fn derive_row(defs: &[FieldDefinition], record_type: RecordType, row: &mut JsonMap) {
    if record_type == RecordType::Account {
        if let Some(Value::String(industry)) = row.get("industry") {
            let mapped = map_industry(industry).to_string();
            row.insert("industry".to_string(), Value::String(mapped));
        }
    }

    for def in defs {
        let Some(Value::String(s)) = row.get(&def.field_name) else {
            continue;
        };
        let replacement = match def.field_type {
            FieldType::Date => Some(Value::String(normalize_date(s))),
            FieldType::Phone => Some(Value::String(clean_phone(s))),
            FieldType::Number => parse_number(s),
            _ => None,
        };
        if let Some(value) = replacement {
            row.insert(def.field_name.clone(), value);
        }
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::defaults::testutil::seeded;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn maps_legacy_industry_names() {
        assert_eq!(map_industry("Educational institutions"), "Education");
        assert_eq!(map_industry("Dairy"), "Food & Beverage");
        assert_eq!(map_industry("Pharmaceuticals"), "Pharmaceuticals");
    }

    #[test]
    fn rewrites_day_first_dates_to_iso() {
        assert_eq!(normalize_date("05/03/2024"), "2024-03-05");
        assert_eq!(normalize_date("5/3/2024"), "2024-03-05");
        assert_eq!(normalize_date("2024-03-05"), "2024-03-05");
    }

    #[test]
    fn collapses_phone_whitespace() {
        assert_eq!(clean_phone("  +91  98765   43210 "), "+91 98765 43210");
    }

    #[test]
    fn derives_typed_cells_in_place() {
        let tenant = Uuid::new_v4();
        let defs = seeded(tenant, RecordType::Lead);
        let mut row: JsonMap = [
            ("lead_name".to_string(), json!("Spectrometer enquiry")),
            ("lead_date".to_string(), json!("15/08/2025")),
            ("phone".to_string(), json!("+91   98765 43210")),
            ("budget".to_string(), json!("150000")),
        ]
        .into_iter()
        .collect();

        derive_row(&defs, RecordType::Lead, &mut row);

        assert_eq!(row.get("lead_date"), Some(&json!("2025-08-15")));
        assert_eq!(row.get("phone"), Some(&json!("+91 98765 43210")));
        assert_eq!(row.get("budget"), Some(&json!(150000)));
    }

    #[test]
    fn account_industry_goes_through_lookup() {
        let tenant = Uuid::new_v4();
        let defs = seeded(tenant, RecordType::Account);
        let mut row: JsonMap = [
            ("account_name".to_string(), json!("Acme Labs")),
            ("industry".to_string(), json!("Biotech Company")),
        ]
        .into_iter()
        .collect();

        derive_row(&defs, RecordType::Account, &mut row);

        assert_eq!(row.get("industry"), Some(&json!("Biotechnology")));
    }
}
