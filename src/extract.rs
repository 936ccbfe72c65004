//! Pulling segments, messages and field values out of a document, and
//! repairing documents whose segments were run together on one line

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Hl7Error, Result};
use crate::locate::{locate, FieldLocation, FieldPath};
use crate::message::{lines, segment_name, DelimiterSet, LineTerminator, MessageModel};
use crate::schema::SchemaDefinition;

/// Every line of `text` with the same segment name as line `reference_line`
/// (0-based), each followed by the document's line terminator.
pub fn extract_segments(text: &str, reference_line: usize) -> Result<String> {
    let delimiters = DelimiterSet::from_text(text);
    let reference = lines(text)
        .nth(reference_line)
        .map(|line| line.text)
        .unwrap_or_default();

    let name = segment_name(reference, delimiters.field)
        .map(|name| name.chars().take(3).collect::<String>())
        .ok_or_else(|| Hl7Error::InvalidSegmentSyntax(reference.to_string()))?;

    let eol = LineTerminator::detect(text).as_str();
    let mut extracted = String::new();
    for line in lines(text) {
        let token = line.text.split(delimiters.field).next().unwrap_or_default();
        if line.text.contains(delimiters.field) && token.eq_ignore_ascii_case(&name) {
            extracted.push_str(line.text);
            extracted.push_str(eol);
        }
    }

    debug!("Extracted {} segments", name);
    Ok(extracted)
}

/// The text of every range `path` resolves to, in document order
pub fn extract_field_values(text: &str, path: &FieldPath) -> Vec<String> {
    let model = MessageModel::parse(text, &DelimiterSet::from_text(text));
    let location = FieldLocation::Structured(path.clone());
    locate(&model, text, &SchemaDefinition::default(), &location)
        .into_iter()
        .map(|m| m.span.text(text).to_string())
        .collect()
}

fn default_header_token() -> String {
    "MSH".to_string()
}

fn default_split_threshold() -> usize {
    100
}

/// Splits a batch file into its messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSplitter {
    #[serde(default = "default_header_token")]
    pub header_token: String,
    /// Above this many messages the caller should confirm before acting
    #[serde(default = "default_split_threshold", rename = "split_threshold")]
    pub threshold: usize,
}

impl Default for BatchSplitter {
    fn default() -> Self {
        Self {
            header_token: default_header_token(),
            threshold: default_split_threshold(),
        }
    }
}

/// Messages found by [`BatchSplitter::split`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSplit {
    pub messages: Vec<String>,
    pub requires_confirmation: bool,
}

impl BatchSplit {
    pub fn count(&self) -> usize {
        self.messages.len()
    }
}

impl BatchSplitter {
    /// Split `text` at every line starting with the header token and the
    /// field delimiter. Text before the first header is dropped; batch and
    /// file trailers stay attached to the last message.
    pub fn split(&self, text: &str, delimiters: &DelimiterSet) -> BatchSplit {
        let marker = format!("{}{}", self.header_token, delimiters.field);

        let starts: Vec<usize> = lines(text)
            .filter(|line| {
                line.text
                    .get(..marker.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(&marker))
            })
            .map(|line| line.offset)
            .collect();

        let messages: Vec<String> = starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(text.len());
                format!("{}{}", marker, &text[start + marker.len()..end])
            })
            .collect();

        let requires_confirmation = messages.len() > self.threshold;
        info!(
            "Batch contains {} message(s){}",
            messages.len(),
            if requires_confirmation { ", confirmation required" } else { "" }
        );

        BatchSplit {
            messages,
            requires_confirmation,
        }
    }
}

/// Put each segment on its own line.
///
/// A line break is inserted before every known segment name (or a Z-segment
/// preceded by whitespace) that is followed by the field delimiter and is not
/// already at the start of a line. Blank lines are removed and every line ends
/// with `eol`.
pub fn add_segment_linebreaks(
    text: &str,
    delimiters: &DelimiterSet,
    schema: &SchemaDefinition,
    eol: LineTerminator,
) -> String {
    let names: Vec<&str> = schema.segment_names().collect();
    let eol = eol.as_str();
    let mut output = String::with_capacity(text.len() + text.len() / 16);
    let mut inserted = 0;

    for line in lines(text).filter(|line| !line.text.is_empty()) {
        let mut previous: Option<char> = None;
        for (i, c) in line.text.char_indices() {
            if i > 0 && starts_segment(&line.text[i..], previous, &names, delimiters.field) {
                output.push_str(eol);
                inserted += 1;
            }
            output.push(c);
            previous = Some(c);
        }
        output.push_str(eol);
    }

    let ends_with_break = text.ends_with(['\r', '\n']);
    if !ends_with_break && output.ends_with(eol) {
        output.truncate(output.len() - eol.len());
    }

    debug!("Inserted {} line break(s)", inserted);
    output
}

fn starts_segment(rest: &str, previous: Option<char>, names: &[&str], field: char) -> bool {
    let Some(name) = rest.get(..3) else {
        return false;
    };
    if !rest[3..].starts_with(field) {
        return false;
    }

    if names.contains(&name) {
        return true;
    }

    let mut chars = name.chars();
    previous.is_some_and(char::is_whitespace)
        && chars.next() == Some('Z')
        && chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.next().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}
