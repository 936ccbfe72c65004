//! Human-readable field descriptions

use std::fmt::Write;

use serde::Serialize;

use crate::error::{Hl7Error, Result};
use crate::message::{segment_name, DelimiterSet, FieldSpan, MessageModel, Segment};
use crate::schema::{DatatypeTable, SchemaDefinition};

/// Description of one field occurrence, for hover text and the like
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescription {
    pub line: usize,
    pub span: FieldSpan,
    /// e.g. `PID-5`
    pub location: String,
    /// Empty when the schema has no definition
    pub description: String,
}

/// Describe every field of every segment on the first `max_lines` lines
pub fn field_descriptions(model: &MessageModel, schema: &SchemaDefinition, max_lines: usize) -> Vec<FieldDescription> {
    model
        .segments()
        .iter()
        .take_while(|segment| segment.line < max_lines)
        .flat_map(|segment| {
            let name = segment.name.to_ascii_uppercase();
            (1..=segment.field_count()).filter_map(move |n| {
                segment.field(n).map(|span| FieldDescription {
                    line: segment.line,
                    span,
                    location: format!("{}-{}", name, n),
                    description: schema.field_description(&name, n).to_string(),
                })
            })
        })
        .collect()
}

/// Render one segment line as a field tree:
///
/// ```text
/// PID  Patient Identification
///   PID-5  Patient Name: Doe^John
///     PID-5.1  Family Name: Doe
///     PID-5.2  Given Name: John
/// ```
///
/// Components are listed for fields whose datatype is a known composite.
pub fn describe_segment(
    line: &str,
    delimiters: &DelimiterSet,
    schema: &SchemaDefinition,
    datatypes: &DatatypeTable,
) -> Result<String> {
    if segment_name(line, delimiters.field).is_none() {
        return Err(Hl7Error::InvalidSegmentSyntax(line.to_string()));
    }

    let segment = Segment::decompose(line, 0, 0, delimiters);
    let name = segment.name.to_ascii_uppercase();
    let definition = schema.segment(&name);

    let mut tree = String::new();
    let _ = writeln!(
        tree,
        "{}  {}",
        name,
        definition.map(|d| d.desc.as_str()).unwrap_or_default()
    );

    for n in 1..=segment.field_count() {
        let Some(span) = segment.field(n) else {
            continue;
        };
        let field = definition.and_then(|d| d.field(n));
        let _ = writeln!(
            tree,
            "  {}-{}  {}: {}",
            name,
            n,
            field.map(|f| f.desc.as_str()).unwrap_or_default(),
            span.text(line)
        );

        let Some(composite) = field.and_then(|f| datatypes.get(&f.datatype)) else {
            continue;
        };
        if segment.is_encoding_field(n) || !span.text(line).contains(delimiters.component) {
            continue;
        }

        for repetition in span.split(line, delimiters.repetition) {
            for (i, component) in repetition.split(line, delimiters.component).iter().enumerate() {
                let description = composite
                    .subfields
                    .get(i)
                    .map(|c| c.desc.as_str())
                    .unwrap_or_default();
                let _ = writeln!(
                    tree,
                    "    {}-{}.{}  {}: {}",
                    name,
                    n,
                    i + 1,
                    description,
                    component.text(line)
                );
            }
        }
    }

    Ok(tree)
}
