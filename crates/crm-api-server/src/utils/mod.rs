pub mod error;

pub use error::{ApiError, EngineError};
