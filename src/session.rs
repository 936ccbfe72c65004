//! Per-document context: the text snapshot and everything derived from it

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::SchemaConfig;
use crate::describe::{field_descriptions, FieldDescription};
use crate::error::{Hl7Error, Result};
use crate::locate::{locate, FieldLocation, FieldMatch, FindStep, SearchState};
use crate::message::{DelimiterSet, MessageModel};
use crate::schema::{
    detect_version, load_custom_segments, resolve_version, DirectoryCatalog, EmbeddedCatalog, Schema,
    SchemaCatalog, SchemaDefinition, DEFAULT_VERSION,
};
use crate::validate::{missing_required_fields, Violation};

/// Where a session gets its schema from
#[derive(Clone)]
pub struct SchemaSettings {
    pub catalog: Arc<dyn SchemaCatalog>,
    /// Used when the message declares no supported version
    pub default_version: String,
    pub custom_segments: Option<SchemaDefinition>,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            catalog: Arc::new(EmbeddedCatalog),
            default_version: DEFAULT_VERSION.to_string(),
            custom_segments: None,
        }
    }
}

impl std::fmt::Debug for SchemaSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaSettings")
            .field("default_version", &self.default_version)
            .field("custom_segments", &self.custom_segments.as_ref().map(|s| s.len()))
            .finish_non_exhaustive()
    }
}

impl SchemaSettings {
    /// Build settings from the `[schema]` config section, reading the
    /// custom segment file if one is configured
    pub fn from_config(config: &SchemaConfig) -> Result<Self> {
        let catalog: Arc<dyn SchemaCatalog> = match &config.schema_dir {
            Some(dir) => Arc::new(DirectoryCatalog::new(dir)),
            None => Arc::new(EmbeddedCatalog),
        };
        let custom_segments = config
            .custom_segment_schema
            .as_ref()
            .map(load_custom_segments)
            .transpose()?;

        Ok(Self {
            catalog,
            default_version: config.default_version.clone(),
            custom_segments,
        })
    }
}

/// One open document.
///
/// Every text change bumps the revision and rebuilds the delimiters, the
/// segment model and (when the declared version changes) the schema. A search
/// remembers the revision it ran against and is recomputed by
/// [`Session::find_next`] when that is no longer current.
#[derive(Debug)]
pub struct Session {
    text: String,
    revision: u64,
    delimiters: DelimiterSet,
    model: MessageModel,
    schema: Schema,
    settings: SchemaSettings,
    search: Option<SearchState>,
    warnings: Vec<Hl7Error>,
}

impl Session {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_settings(text, SchemaSettings::default())
    }

    pub fn with_settings(text: impl Into<String>, settings: SchemaSettings) -> Self {
        let mut session = Self {
            text: String::new(),
            revision: 0,
            delimiters: DelimiterSet::default(),
            model: MessageModel::default(),
            schema: Schema::default(),
            settings,
            search: None,
            warnings: Vec::new(),
        };
        session.rebuild(text.into());
        session
    }

    /// Replace the document text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.revision += 1;
        self.rebuild(text.into());
    }

    fn rebuild(&mut self, text: String) {
        let mut warnings = Vec::new();

        self.delimiters = match DelimiterSet::detect(&text) {
            Ok(delimiters) => delimiters,
            Err(e) => {
                warn!("{}; using default delimiters", e);
                warnings.push(e);
                DelimiterSet::default()
            }
        };
        self.model = MessageModel::parse(&text, &self.delimiters);

        let detected = detect_version(&self.model, &text);
        let (version, warning) = resolve_version(detected.as_deref(), &self.settings.default_version);
        if let Some(warning) = warning {
            warn!("{}", warning);
            warnings.push(warning);
        }
        if version != self.schema.version {
            self.schema = Schema::load(
                self.settings.catalog.as_ref(),
                &version,
                self.settings.custom_segments.as_ref(),
            );
        }

        self.text = text;
        self.warnings = warnings;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn delimiters(&self) -> &DelimiterSet {
        &self.delimiters
    }

    pub fn model(&self) -> &MessageModel {
        &self.model
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn search(&self) -> Option<&SearchState> {
        self.search.as_ref()
    }

    /// Fallbacks taken while building the current revision
    pub fn warnings(&self) -> &[Hl7Error] {
        &self.warnings
    }

    /// Every range `query` resolves to. Does not touch the search state.
    pub fn locate_all(&self, query: &str) -> Vec<FieldMatch> {
        self.locate(&FieldLocation::parse(query))
    }

    fn locate(&self, location: &FieldLocation) -> Vec<FieldMatch> {
        locate(&self.model, &self.text, &self.schema.segments, location)
    }

    /// Start a new search and return its first match
    pub fn find(&mut self, query: &str) -> Result<FieldMatch> {
        let location = FieldLocation::parse(query);
        let matches = self.locate(&location);
        let state = SearchState::new(location, matches, self.revision);
        let first = state.current().cloned();
        self.search = Some(state);

        first.ok_or_else(|| Hl7Error::NoFieldMatch(query.trim().to_string()))
    }

    /// Move to the next match of the current search, wrapping at the end
    pub fn find_next(&mut self) -> Result<(FieldMatch, FindStep)> {
        let revision = self.revision;
        let Some(state) = self.search.as_ref() else {
            return Err(Hl7Error::NoSearchDefined);
        };

        if state.is_stale(revision) {
            debug!("Text changed since the last search, recomputing '{}'", state.query());
            let matches = self.locate(state.query());
            if let Some(state) = self.search.as_mut() {
                state.refresh(matches, revision);
            }
        }

        let state = self.search.as_mut().ok_or(Hl7Error::NoSearchDefined)?;
        let query = state.query().to_string();
        state
            .advance()
            .map(|(m, step)| (m.clone(), step))
            .ok_or(Hl7Error::NoFieldMatch(query))
    }

    pub fn missing_required_fields(&self) -> Vec<Violation> {
        missing_required_fields(&self.model, &self.schema.segments)
    }

    pub fn field_descriptions(&self, max_lines: usize) -> Vec<FieldDescription> {
        field_descriptions(&self.model, &self.schema.segments, max_lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORU: &str = "MSH|^~\\&|LAB|H|EMR|H|20230101||ORU^R01|42|P|2.5\rPID|1||12345||Doe^John\rOBX|1|NM|GLU||5.4||||||F\rOBX|2|NM|K||4.1||||||F\rOBX|3|NM|NA||140||||||F\r";

    #[test]
    fn test_version_detected_from_message() {
        let session = Session::new(ORU);
        assert_eq!(session.schema().version, "2.5");
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn test_warnings_recorded_for_fallbacks() {
        let session = Session::new("PID|1||12345\r");
        assert_eq!(session.schema().version, DEFAULT_VERSION);
        assert_eq!(session.warnings().len(), 2);
        assert!(session.warnings().iter().all(|w| w.is_warning()));
    }

    #[test]
    fn test_find_next_without_find() {
        let mut session = Session::new(ORU);
        assert!(matches!(session.find_next(), Err(Hl7Error::NoSearchDefined)));
    }

    #[test]
    fn test_find_and_wrap() {
        let mut session = Session::new(ORU);
        let first = session.find("OBX-5").unwrap();
        assert_eq!(first.span.text(session.text()), "5.4");

        let (second, step) = session.find_next().unwrap();
        assert_eq!((second.span.text(session.text()), step), ("4.1", FindStep::Next));
        let (third, _) = session.find_next().unwrap();
        assert_eq!(third.span.text(session.text()), "140");
        let (wrapped, step) = session.find_next().unwrap();
        assert_eq!((wrapped.span.text(session.text()), step), ("5.4", FindStep::WrappedToStart));
    }

    #[test]
    fn test_find_with_no_matches() {
        let mut session = Session::new(ORU);
        assert!(matches!(session.find("ZZZ-1"), Err(Hl7Error::NoFieldMatch(_))));
        assert!(matches!(session.find_next(), Err(Hl7Error::NoFieldMatch(_))));
    }

    #[test]
    fn test_find_next_recomputes_after_edit() {
        let mut session = Session::new(ORU);
        session.find("OBX-5").unwrap();

        let edited = ORU.replace("OBX|1|NM|GLU||5.4||||||F\r", "");
        session.set_text(edited);
        assert_eq!(session.revision(), 1);

        let (m, step) = session.find_next().unwrap();
        assert_eq!((m.span.text(session.text()), step), ("140", FindStep::Next));
        assert_eq!(session.search().unwrap().revision(), 1);
    }

    #[test]
    fn test_locate_all_leaves_search_alone() {
        let session = Session::new(ORU);
        assert_eq!(session.locate_all("OBX-3").len(), 3);
        assert!(session.search().is_none());
    }

    #[test]
    fn test_custom_segments_apply() {
        let custom = SchemaDefinition::from_json(r#"{"ZPD": {"fields": [{"desc": "Loyalty Number", "opt": 2}]}}"#).unwrap();
        let settings = SchemaSettings {
            custom_segments: Some(custom),
            ..Default::default()
        };
        let session = Session::with_settings(format!("{}ZPD|\r", ORU), settings);
        let violations = session.missing_required_fields();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location, "ZPD-1");
        assert_eq!(violations[0].line_number, 6);
    }
}
