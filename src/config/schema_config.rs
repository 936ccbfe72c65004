use std::path::PathBuf;

use serde::Deserialize;

use crate::schema::DEFAULT_VERSION;

/// The `[schema]` section
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// Version used when a message does not declare a supported one
    #[serde(default = "default_version")]
    pub default_version: String,
    /// Directory of `<version>/segments.json` tables; the built-in tables are used when unset
    pub schema_dir: Option<PathBuf>,
    /// JSON file of extra (usually Z-) segment definitions
    pub custom_segment_schema: Option<PathBuf>,
    #[serde(default = "default_max_lines")]
    pub max_lines_for_descriptions: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            default_version: default_version(),
            schema_dir: None,
            custom_segment_schema: None,
            max_lines_for_descriptions: default_max_lines(),
        }
    }
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_max_lines() -> usize {
    200
}
