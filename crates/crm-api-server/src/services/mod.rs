pub mod defaults;
pub mod duplicate_guard;
pub mod field_service;
pub mod import_service;
pub mod normalize;
pub mod record_service;
pub mod schema_filter;
pub mod stock_entry_service;

pub use duplicate_guard::DuplicateGuard;
pub use field_service::FieldService;
pub use import_service::ImportService;
pub use record_service::RecordService;
pub use schema_filter::{FilterMode, SchemaFilter};
pub use stock_entry_service::StockEntryService;
