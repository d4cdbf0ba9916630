use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw and sanitized record payloads are field_name -> JSON value maps.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Fields that are system-derived identifiers. Importers never supply them,
/// so templates leave them out.
pub const SYSTEM_ID_FIELDS: &[&str] = &["account_id", "contact_id", "lead_id", "product_id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Account,
    Contact,
    Lead,
    Product,
    StockEntry,
    StockEntryItem,
    LeadProduct,
}

impl RecordType {
    /// Physical table backing this record type.
    pub fn table(&self) -> &'static str {
        match self {
            RecordType::Account => "accounts",
            RecordType::Contact => "contacts",
            RecordType::Lead => "leads",
            RecordType::Product => "products",
            RecordType::StockEntry => "stock_entries",
            RecordType::StockEntryItem => "stock_entry_items",
            RecordType::LeadProduct => "lead_products",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            RecordType::Account => "account",
            RecordType::Contact => "contact",
            RecordType::Lead => "lead",
            RecordType::Product => "product",
            RecordType::StockEntry => "stock_entry",
            RecordType::StockEntryItem => "stock_entry_item",
            RecordType::LeadProduct => "lead_product",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        match s {
            "account" => Some(RecordType::Account),
            "contact" => Some(RecordType::Contact),
            "lead" => Some(RecordType::Lead),
            "product" => Some(RecordType::Product),
            "stock_entry" => Some(RecordType::StockEntry),
            "stock_entry_item" => Some(RecordType::StockEntryItem),
            "lead_product" => Some(RecordType::LeadProduct),
            _ => None,
        }
    }

    /// Plural form used in URL paths and download filenames.
    pub fn plural(&self) -> &'static str {
        match self {
            RecordType::Account => "accounts",
            RecordType::Contact => "contacts",
            RecordType::Lead => "leads",
            RecordType::Product => "products",
            RecordType::StockEntry => "stock_entries",
            RecordType::StockEntryItem => "stock_entry_items",
            RecordType::LeadProduct => "lead_products",
        }
    }

    /// Resolve a URL path segment ("accounts", "leads", ...) to a record type
    /// that has a configurable field set.
    pub fn from_path(s: &str) -> Option<Self> {
        match s {
            "accounts" => Some(RecordType::Account),
            "contacts" => Some(RecordType::Contact),
            "leads" => Some(RecordType::Lead),
            "products" => Some(RecordType::Product),
            _ => None,
        }
    }

    /// Record types a tenant can configure, import and export.
    pub fn configurable() -> &'static [RecordType] {
        &[
            RecordType::Account,
            RecordType::Contact,
            RecordType::Lead,
            RecordType::Product,
        ]
    }

    /// Fields composing the natural key used for duplicate detection.
    /// Empty for child and header types that have no natural key.
    pub fn natural_key(&self) -> &'static [&'static str] {
        match self {
            RecordType::Account => &["account_name", "billing_city"],
            RecordType::Contact => &["email"],
            RecordType::Lead => &["lead_name"],
            RecordType::Product => &["product_name"],
            _ => &[],
        }
    }

    /// The field a row must carry to be worth importing at all.
    pub fn identifier_field(&self) -> Option<&'static str> {
        match self {
            RecordType::Account => Some("account_name"),
            RecordType::Contact => Some("email"),
            RecordType::Lead => Some("lead_name"),
            RecordType::Product => Some("product_name"),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A row as the record store returns it.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub data: JsonMap,
    pub created_at: DateTime<Utc>,
}

impl StoredRecord {
    /// String value of a data field, if present and non-null.
    pub fn field_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(|v| v.as_str())
    }
}
