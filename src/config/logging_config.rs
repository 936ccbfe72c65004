use serde::Deserialize;

/// The `[logging]` section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub log_to_file: bool,
    #[serde(default = "default_log_file_path")]
    pub log_file_path: String,
    /// Default filter directive; `RUST_LOG` overrides it
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_to_file: false,
            log_file_path: default_log_file_path(),
            level: default_level(),
        }
    }
}

fn default_log_file_path() -> String {
    "./hl7tools.log".to_string()
}

fn default_level() -> String {
    "info".to_string()
}
