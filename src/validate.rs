//! Required-field presence check

use serde::Serialize;
use tracing::debug;

use crate::message::MessageModel;
use crate::schema::SchemaDefinition;

/// A required field that is absent or empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// 1-based line number
    pub line_number: usize,
    /// e.g. `PID-3`
    pub location: String,
    pub description: String,
}

/// Every required field (`opt == 2`) of every defined segment that is missing
/// or empty, in document order.
///
/// Segments without a definition are skipped. Conditional fields and datatypes
/// are not checked.
pub fn missing_required_fields(model: &MessageModel, schema: &SchemaDefinition) -> Vec<Violation> {
    let mut violations = Vec::new();

    for segment in model.segments() {
        let Some(definition) = schema.segment(&segment.name) else {
            continue;
        };

        for (i, field) in definition.fields.iter().enumerate() {
            let n = i + 1;
            if !field.is_required() {
                continue;
            }

            let present = segment.field(n).is_some_and(|span| !span.is_empty());
            if !present {
                violations.push(Violation {
                    line_number: segment.line + 1,
                    location: format!("{}-{}", segment.name.to_ascii_uppercase(), n),
                    description: field.desc.clone(),
                });
            }
        }
    }

    debug!("{} required field(s) missing", violations.len());
    violations
}
