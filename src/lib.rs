pub mod config;
pub mod describe;
pub mod error;
pub mod extract;
pub mod locate;
pub mod message;
pub mod schema;
pub mod session;
pub mod validate;

pub use error::{Hl7Error, Result};
pub use locate::{FieldLocation, FieldMatch, FindStep};
pub use message::{DelimiterSet, MessageModel};
pub use session::{SchemaSettings, Session};

use crate::config::{ConfigError, LoggingConfig};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// Logs go to stdout, and also to `log_file_path` when `log_to_file` is set.
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) -> std::result::Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|_| ConfigError::InvalidLogLevel(config.level.clone()))?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true);

    let file_layer = if config.log_to_file {
        let file = std::fs::File::create(&config.log_file_path).map_err(|source| ConfigError::Read {
            path: config.log_file_path.clone().into(),
            source,
        })?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))
}
