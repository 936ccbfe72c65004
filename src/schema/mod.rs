//! Versioned segment and datatype definitions
//!
//! Lookups never fail: a segment, field or datatype that is not defined is an
//! explicit `None` and renders as an empty description.

mod catalog;
mod version;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Hl7Error, Result};

pub use catalog::{DirectoryCatalog, EmbeddedCatalog, SchemaCatalog};
pub use version::{detect_version, is_supported, resolve_version, DEFAULT_VERSION, SUPPORTED_VERSIONS};

/// Usage of a field within its segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optionality {
    Optional,
    Required,
    Conditional,
    NotUsed,
}

impl Optionality {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Optionality::Optional),
            2 => Some(Optionality::Required),
            3 => Some(Optionality::Conditional),
            4 => Some(Optionality::NotUsed),
            _ => None,
        }
    }
}

fn default_opt() -> u8 {
    1
}

fn default_rep() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub datatype: String,
    /// 1 optional, 2 required, 3 conditional, 4 backward compatible
    #[serde(default = "default_opt", alias = "optionality")]
    pub opt: u8,
    /// 1 non-repeating, anything larger repeats
    #[serde(default = "default_rep", alias = "repeatability")]
    pub rep: u32,
}

impl FieldDefinition {
    pub fn optionality(&self) -> Option<Optionality> {
        Optionality::from_code(self.opt)
    }

    pub fn is_required(&self) -> bool {
        self.optionality() == Some(Optionality::Required)
    }

    pub fn is_repeating(&self) -> bool {
        self.rep > 1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDefinition {
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl SegmentDefinition {
    /// Definition of field `n` (1-based)
    pub fn field(&self, n: usize) -> Option<&FieldDefinition> {
        n.checked_sub(1).and_then(|i| self.fields.get(i))
    }
}

/// Segment name to definition. Names are stored upper case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDefinition {
    segments: BTreeMap<String, SegmentDefinition>,
}

impl SchemaDefinition {
    /// Parse a `{ "PID": { "desc": ..., "fields": [...] } }` table
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, SegmentDefinition> = serde_json::from_str(json)?;
        Ok(Self {
            segments: raw
                .into_iter()
                .map(|(name, definition)| (name.to_ascii_uppercase(), definition))
                .collect(),
        })
    }

    pub fn segment(&self, name: &str) -> Option<&SegmentDefinition> {
        self.segments.get(&name.to_ascii_uppercase())
    }

    pub fn field(&self, segment: &str, n: usize) -> Option<&FieldDefinition> {
        self.segment(segment).and_then(|s| s.field(n))
    }

    /// Description of `segment`-`n`, empty when undefined
    pub fn field_description(&self, segment: &str, n: usize) -> &str {
        self.field(segment, n).map(|f| f.desc.as_str()).unwrap_or_default()
    }

    pub fn insert(&mut self, name: &str, definition: SegmentDefinition) {
        self.segments.insert(name.to_ascii_uppercase(), definition);
    }

    /// Merge `overlay` into this table; overlay entries replace existing ones
    pub fn merge(&mut self, overlay: SchemaDefinition) {
        for (name, definition) in overlay.segments {
            if self.segments.insert(name.clone(), definition).is_some() {
                debug!("Custom definition replaces built-in segment {}", name);
            }
        }
    }

    pub fn segment_names(&self) -> impl Iterator<Item = &str> {
        self.segments.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatatypeDefinition {
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub subfields: Vec<FieldDefinition>,
}

/// Composite datatype to component definitions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatatypeTable {
    datatypes: BTreeMap<String, DatatypeDefinition>,
}

impl DatatypeTable {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn get(&self, datatype: &str) -> Option<&DatatypeDefinition> {
        self.datatypes.get(datatype)
    }

    /// Description of component `c` (1-based) of `datatype`
    pub fn component(&self, datatype: &str, c: usize) -> Option<&FieldDefinition> {
        self.get(datatype)
            .and_then(|d| c.checked_sub(1).and_then(|i| d.subfields.get(i)))
    }
}

/// The resolved schema a session works against
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub version: String,
    pub segments: SchemaDefinition,
    pub datatypes: DatatypeTable,
}

impl Schema {
    /// Load `version` from `catalog`, then apply the custom overlay
    pub fn load(catalog: &dyn SchemaCatalog, version: &str, overlay: Option<&SchemaDefinition>) -> Self {
        let mut segments = catalog.segments(version).unwrap_or_default();
        if let Some(overlay) = overlay {
            segments.merge(overlay.clone());
        }
        let datatypes = catalog.datatypes(version).unwrap_or_default();

        debug!(
            "Loaded schema v{} with {} segment definitions",
            version,
            segments.len()
        );

        Self {
            version: version.to_string(),
            segments,
            datatypes,
        }
    }

    /// The built-in tables for `version`
    pub fn embedded(version: &str) -> Self {
        Self::load(&EmbeddedCatalog, version, None)
    }
}

/// Read a custom segment table (typically Z-segments) from a JSON file
pub fn load_custom_segments(path: impl AsRef<Path>) -> Result<SchemaDefinition> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| {
        Hl7Error::schema(format!("cannot read custom segments '{}': {}", path.display(), e))
    })?;
    let definition = SchemaDefinition::from_json(&json)?;
    info!(
        "Loaded {} custom segment definitions from {}",
        definition.len(),
        path.display()
    );
    Ok(definition)
}
