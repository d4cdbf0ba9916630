pub mod fields;
pub mod health;
pub mod import;
pub mod records;
pub mod stock_entries;

use crate::models::RecordType;
use crate::utils::ApiError;

/// Resolve a `{record_type}` path segment or 404.
pub(crate) fn record_type_from_path(segment: &str) -> Result<RecordType, ApiError> {
    RecordType::from_path(segment)
        .ok_or_else(|| ApiError::NotFound(format!("unknown record type '{segment}'")))
}
