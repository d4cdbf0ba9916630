pub mod field;
pub mod import;
pub mod record;

pub use field::*;
pub use import::*;
pub use record::*;
