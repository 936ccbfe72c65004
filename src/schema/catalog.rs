use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use tracing::{debug, error, warn};

use super::{is_supported, DatatypeTable, SchemaDefinition};
use crate::error::Result;

/// Source of segment and datatype tables, keyed by HL7 version
pub trait SchemaCatalog: Send + Sync {
    fn segments(&self, version: &str) -> Option<SchemaDefinition>;

    fn datatypes(&self, version: &str) -> Option<DatatypeTable>;
}

static EMBEDDED_SEGMENTS: Lazy<Option<SchemaDefinition>> = Lazy::new(|| {
    SchemaDefinition::from_json(include_str!("data/segments.json"))
        .map_err(|e| error!("Built-in segment table is invalid: {}", e))
        .ok()
});

static EMBEDDED_DATATYPES: Lazy<Option<DatatypeTable>> = Lazy::new(|| {
    DatatypeTable::from_json(include_str!("data/datatypes.json"))
        .map_err(|e| error!("Built-in datatype table is invalid: {}", e))
        .ok()
});

/// Core segment and datatype tables compiled into the binary.
///
/// The same tables serve every supported version.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCatalog;

impl SchemaCatalog for EmbeddedCatalog {
    fn segments(&self, version: &str) -> Option<SchemaDefinition> {
        if !is_supported(version) {
            return None;
        }
        EMBEDDED_SEGMENTS.clone()
    }

    fn datatypes(&self, version: &str) -> Option<DatatypeTable> {
        if !is_supported(version) {
            return None;
        }
        EMBEDDED_DATATYPES.clone()
    }
}

/// Tables read from `<root>/<version>/segments.json` and
/// `<root>/<version>/datatypes.json`, falling back to the built-in ones
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read<T>(&self, version: &str, file: &str, parse: fn(&str) -> Result<T>) -> Option<T> {
        let path = self.root.join(version).join(file);
        if !path.is_file() {
            debug!("{} not found, using built-in table", path.display());
            return None;
        }

        let parsed = std::fs::read_to_string(&path)
            .map_err(Into::into)
            .and_then(|json| parse(&json));
        match parsed {
            Ok(table) => {
                debug!("Loaded {}", path.display());
                Some(table)
            }
            Err(e) => {
                warn!("Failed to load {}: {}; using built-in table", path.display(), e);
                None
            }
        }
    }
}

impl SchemaCatalog for DirectoryCatalog {
    fn segments(&self, version: &str) -> Option<SchemaDefinition> {
        self.read(version, "segments.json", SchemaDefinition::from_json)
            .or_else(|| EmbeddedCatalog.segments(version))
    }

    fn datatypes(&self, version: &str) -> Option<DatatypeTable> {
        self.read(version, "datatypes.json", DatatypeTable::from_json)
            .or_else(|| EmbeddedCatalog.datatypes(version))
    }
}
