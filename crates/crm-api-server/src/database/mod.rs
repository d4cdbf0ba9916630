pub mod pool;
pub mod repository;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use pool::DbPool;
pub use repository::Repository;
pub use store::{FieldConfigStore, RecordStore, StoreResult};
