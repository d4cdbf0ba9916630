pub mod settings;

pub use settings::{DatabaseConfig, ImportConfig, ServerConfig, Settings};
