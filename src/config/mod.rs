mod tests;
mod logging_config;
mod schema_config;
pub mod config;

pub use config::{Config, ConfigError};
pub use logging_config::LoggingConfig;
pub use schema_config::SchemaConfig;
