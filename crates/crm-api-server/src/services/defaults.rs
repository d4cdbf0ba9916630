//! Built-in field sets seeded for a tenant at provisioning time.

use crate::models::{FieldType, RecordType};

pub struct DefaultField {
    pub field_name: &'static str,
    pub field_label: &'static str,
    pub field_type: FieldType,
    pub field_options: &'static [&'static str],
    pub is_mandatory: bool,
    pub field_section: &'static str,
}

const fn field(
    field_name: &'static str,
    field_label: &'static str,
    field_type: FieldType,
    field_options: &'static [&'static str],
    is_mandatory: bool,
    field_section: &'static str,
) -> DefaultField {
    DefaultField {
        field_name,
        field_label,
        field_type,
        field_options,
        is_mandatory,
        field_section,
    }
}

const ACCOUNT_FIELDS: &[DefaultField] = &[
    field("account_name", "Account Name", FieldType::Text, &[], true, "basic"),
    field(
        "account_type",
        "Account Type",
        FieldType::Select,
        &["Customer", "Distributor", "Partner", "Vendor"],
        false,
        "basic",
    ),
    field(
        "industry",
        "Industry",
        FieldType::Select,
        &[
            "Biotechnology",
            "Education",
            "Environmental Services",
            "Food & Beverage",
            "Healthcare",
            "Manufacturing",
            "Pharmaceuticals",
            "Research",
        ],
        false,
        "basic",
    ),
    field("website", "Website", FieldType::Text, &[], false, "basic"),
    field("phone", "Billing Phone", FieldType::Phone, &[], false, "basic"),
    field("description", "Description", FieldType::Text, &[], false, "basic"),
    field("billing_street", "Billing Address", FieldType::Text, &[], false, "billing"),
    field("billing_city", "Billing City", FieldType::Text, &[], false, "billing"),
    field("billing_state", "Billing State/Province", FieldType::Text, &[], false, "billing"),
    field("billing_country", "Billing Country", FieldType::Text, &[], false, "billing"),
    field("billing_postal_code", "Billing Zip/PostalCode", FieldType::Text, &[], false, "billing"),
    field("shipping_street", "Shipping Address", FieldType::Text, &[], false, "shipping"),
    field("shipping_city", "Shipping City", FieldType::Text, &[], false, "shipping"),
    field("shipping_state", "Shipping State/Province", FieldType::Text, &[], false, "shipping"),
    field("shipping_country", "Shipping Country", FieldType::Text, &[], false, "shipping"),
    field("shipping_postal_code", "Shipping Zip/PostalCode", FieldType::Text, &[], false, "shipping"),
    field("turnover_range", "TurnOver", FieldType::Text, &[], false, "business"),
    field("credit_days", "Credit Days", FieldType::Number, &[], false, "business"),
    field("credit_amount", "Credit Amount", FieldType::Number, &[], false, "business"),
    field("gstin", "GSTIN", FieldType::Text, &[], false, "tax"),
    field("pan_number", "PAN No", FieldType::Text, &[], false, "tax"),
];

const CONTACT_FIELDS: &[DefaultField] = &[
    field("first_name", "First Name", FieldType::Text, &[], true, "basic"),
    field("last_name", "Last Name", FieldType::Text, &[], false, "basic"),
    field("email", "Email", FieldType::Email, &[], true, "basic"),
    field("phone", "Phone", FieldType::Phone, &[], false, "basic"),
    field("department", "Department", FieldType::Text, &[], false, "work"),
    field("job_title", "Job Title", FieldType::Text, &[], false, "work"),
    field("account_name", "Account Name", FieldType::Text, &[], false, "work"),
    field("city", "City", FieldType::Text, &[], false, "address"),
    field("state", "State", FieldType::Text, &[], false, "address"),
    field("country", "Country", FieldType::Text, &[], false, "address"),
    field("birthday", "Birthday", FieldType::Date, &[], false, "personal"),
    field("notes", "Notes", FieldType::Text, &[], false, "personal"),
];

const LEAD_FIELDS: &[DefaultField] = &[
    field("lead_name", "Lead Name", FieldType::Text, &[], true, "basic"),
    field("account_name", "Account Name", FieldType::Text, &[], false, "basic"),
    field("contact_name", "Contact Name", FieldType::Text, &[], false, "basic"),
    field("phone", "Phone", FieldType::Phone, &[], false, "basic"),
    field("email", "Email", FieldType::Email, &[], false, "basic"),
    field(
        "lead_source",
        "Lead Source",
        FieldType::Select,
        &["Website", "Referral", "Exhibition", "Cold Call", "Campaign"],
        false,
        "qualification",
    ),
    field(
        "lead_status",
        "Lead Status",
        FieldType::Select,
        &["New", "Contacted", "Qualified", "Proposal", "Won", "Lost"],
        false,
        "qualification",
    ),
    field(
        "priority",
        "Priority",
        FieldType::Select,
        &["High", "Medium", "Low"],
        false,
        "qualification",
    ),
    field("assigned_to", "Assigned To", FieldType::Text, &[], true, "qualification"),
    field("lead_date", "Lead Date", FieldType::Date, &[], false, "schedule"),
    field("expected_closing_date", "Expected Closing Date", FieldType::Date, &[], false, "schedule"),
    field("next_followup_date", "Next Followup Date", FieldType::Date, &[], false, "schedule"),
    field("budget", "Budget", FieldType::Number, &[], false, "commercial"),
    field("city", "City", FieldType::Text, &[], false, "commercial"),
    field("notes", "Notes", FieldType::Text, &[], false, "commercial"),
];

const PRODUCT_FIELDS: &[DefaultField] = &[
    field("product_name", "Product Name", FieldType::Text, &[], true, "basic"),
    field("product_reference_no", "Product Reference No", FieldType::Text, &[], false, "basic"),
    field(
        "category",
        "Category",
        FieldType::Select,
        &["Instrument", "Consumable", "Reagent", "Service", "Spare"],
        false,
        "basic",
    ),
    field("description", "Description", FieldType::Text, &[], false, "basic"),
    field("price", "Price", FieldType::Number, &[], false, "commercial"),
    field("stock_quantity", "Stock Quantity", FieldType::Number, &[], false, "commercial"),
    field("unit", "Unit", FieldType::Text, &[], false, "commercial"),
    field("launch_date", "Launch Date", FieldType::Date, &[], false, "commercial"),
];

pub fn default_fields(record_type: RecordType) -> &'static [DefaultField] {
    match record_type {
        RecordType::Account => ACCOUNT_FIELDS,
        RecordType::Contact => CONTACT_FIELDS,
        RecordType::Lead => LEAD_FIELDS,
        RecordType::Product => PRODUCT_FIELDS,
        _ => &[],
    }
}

#[cfg(test)]
pub mod testutil {
    //! Helpers for building field configurations in unit tests.

    use uuid::Uuid;

    use super::default_fields;
    use crate::models::{FieldDefinition, RecordType};

    pub fn seeded(tenant_id: Uuid, record_type: RecordType) -> Vec<FieldDefinition> {
        default_fields(record_type)
            .iter()
            .enumerate()
            .map(|(order, f)| FieldDefinition {
                tenant_id,
                record_type,
                field_name: f.field_name.to_string(),
                field_label: f.field_label.to_string(),
                field_type: f.field_type,
                field_options: f.field_options.iter().map(|s| s.to_string()).collect(),
                is_enabled: true,
                is_mandatory: f.is_mandatory,
                display_order: order as i32,
                field_section: f.field_section.to_string(),
                placeholder: None,
                help_text: None,
            })
            .collect()
    }
}
