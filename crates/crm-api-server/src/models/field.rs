use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RecordType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Phone,
    Number,
    Date,
    Select,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Select => "select",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(FieldType::Text),
            "email" => Some(FieldType::Email),
            "phone" | "tel" => Some(FieldType::Phone),
            "number" => Some(FieldType::Number),
            "date" => Some(FieldType::Date),
            "select" => Some(FieldType::Select),
            _ => None,
        }
    }
}

/// Per-tenant, per-record-type field configuration row.
/// `(tenant_id, record_type, field_name)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub tenant_id: Uuid,
    pub record_type: RecordType,
    pub field_name: String,
    pub field_label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub field_options: Vec<String>,
    pub is_enabled: bool,
    pub is_mandatory: bool,
    pub display_order: i32,
    pub field_section: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
}

/// Upsert payload for a single field configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfigInput {
    pub field_name: String,
    pub field_label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub field_options: Vec<String>,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_section")]
    pub field_section: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_section() -> String {
    "general".to_string()
}

/// One item of a bulk configuration update. Absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfigUpdate {
    pub field_name: String,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub field_label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
}

/// Per-field outcome of a bulk update. One field failing never rolls back
/// the others, so the caller gets the whole list.
#[derive(Debug, Clone, Serialize)]
pub struct FieldUpdateOutcome {
    pub field_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
