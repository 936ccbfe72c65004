use serde::Serialize;
use tracing::debug;

use super::location::{FieldLocation, FieldPath};
use crate::message::{FieldSpan, MessageModel, Segment};
use crate::schema::SchemaDefinition;

/// One range a query resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMatch {
    /// 0-based line number
    pub line: usize,
    /// Address of the match, e.g. `PID-5` or `PID-5.1`
    pub location: String,
    pub span: FieldSpan,
}

/// Resolve `location` against `model`, in document order.
///
/// `text` must be the snapshot `model` was parsed from.
pub fn locate(
    model: &MessageModel,
    text: &str,
    schema: &SchemaDefinition,
    location: &FieldLocation,
) -> Vec<FieldMatch> {
    let matches = match location {
        FieldLocation::Structured(path) => locate_path(model, text, path),
        FieldLocation::FreeText(query) => locate_description(model, schema, query),
    };
    debug!("'{}' resolved to {} range(s)", location, matches.len());
    matches
}

fn locate_path(model: &MessageModel, text: &str, path: &FieldPath) -> Vec<FieldMatch> {
    let delimiters = model.delimiters();
    let location = path.to_string();
    let mut matches = Vec::new();

    for segment in model.segments_named(&path.segment) {
        let Some(field) = segment.field(path.field) else {
            continue;
        };

        let Some(component) = path.component else {
            matches.push(field_match(segment, &location, field));
            continue;
        };

        if segment.is_encoding_field(path.field) {
            continue;
        }

        for repetition in field.split(text, delimiters.repetition) {
            let Some(component) = component
                .checked_sub(1)
                .and_then(|i| repetition.split(text, delimiters.component).get(i).copied())
            else {
                continue;
            };

            match path.subcomponent {
                None => matches.push(field_match(segment, &location, component)),
                Some(sub) => {
                    let spans = component.split(text, delimiters.subcomponent);
                    if let Some(span) = sub.checked_sub(1).and_then(|i| spans.get(i)) {
                        matches.push(field_match(segment, &location, *span));
                    }
                }
            }
        }
    }

    matches
}

fn locate_description(model: &MessageModel, schema: &SchemaDefinition, query: &str) -> Vec<FieldMatch> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for segment in model.segments() {
        let Some(definition) = schema.segment(&segment.name) else {
            continue;
        };

        for (i, field) in definition.fields.iter().enumerate() {
            let n = i + 1;
            if !field.desc.to_lowercase().contains(&query) {
                continue;
            }
            if let Some(span) = segment.field(n) {
                let location = format!("{}-{}", segment.name.to_ascii_uppercase(), n);
                matches.push(field_match(segment, &location, span));
            }
        }
    }

    matches
}

fn field_match(segment: &Segment, location: &str, span: FieldSpan) -> FieldMatch {
    FieldMatch {
        line: segment.line,
        location: location.to_string(),
        span,
    }
}
