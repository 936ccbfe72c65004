//! HL7 delimiter characters

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Hl7Error, Result};
use crate::message::lines;

/// Segments whose first field is the field delimiter itself
pub const HEADER_SEGMENTS: [&str; 3] = ["MSH", "FHS", "BHS"];

/// The five delimiter characters of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimiterSet {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: char,
    pub subcomponent: char,
}

impl Default for DelimiterSet {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
        }
    }
}

impl DelimiterSet {
    /// Read the delimiters from the first MSH, FHS or BHS line in `text`.
    ///
    /// The character after the segment name is the field delimiter; the
    /// characters up to the next field delimiter are component, repetition,
    /// escape and subcomponent. Missing trailing characters keep their
    /// defaults.
    pub fn detect(text: &str) -> Result<Self> {
        let header = lines(text)
            .map(|line| line.text)
            .find(|line| is_header_line(line))
            .ok_or_else(|| {
                Hl7Error::MalformedDelimiterHeader("no MSH, FHS or BHS segment found".into())
            })?;

        let mut chars = header.chars().skip(3);
        let field = chars.next().ok_or_else(|| {
            Hl7Error::MalformedDelimiterHeader(format!("header '{}' has no field delimiter", header))
        })?;

        let encoding: Vec<char> = chars.take_while(|&c| c != field).take(4).collect();
        let defaults = Self::default();
        let delimiters = Self {
            field,
            component: encoding.first().copied().unwrap_or(defaults.component),
            repetition: encoding.get(1).copied().unwrap_or(defaults.repetition),
            escape: encoding.get(2).copied().unwrap_or(defaults.escape),
            subcomponent: encoding.get(3).copied().unwrap_or(defaults.subcomponent),
        };

        delimiters.validate()?;
        Ok(delimiters)
    }

    /// Like [`DelimiterSet::detect`], falling back to the standard delimiters
    pub fn from_text(text: &str) -> Self {
        Self::detect(text).unwrap_or_else(|e| {
            warn!("{}; using default delimiters", e);
            Self::default()
        })
    }

    /// All five characters in header order: field, component, repetition, escape, subcomponent
    pub fn as_array(&self) -> [char; 5] {
        [
            self.field,
            self.component,
            self.repetition,
            self.escape,
            self.subcomponent,
        ]
    }

    /// The encoding characters as written in MSH-2
    pub fn encoding_characters(&self) -> String {
        [self.component, self.repetition, self.escape, self.subcomponent]
            .iter()
            .collect()
    }

    fn validate(&self) -> Result<()> {
        let chars = self.as_array();
        if let Some(c) = chars
            .iter()
            .find(|c| c.is_alphanumeric() || c.is_whitespace())
        {
            return Err(Hl7Error::MalformedDelimiterHeader(format!(
                "'{}' cannot be used as a delimiter",
                c.escape_debug()
            )));
        }

        for (i, c) in chars.iter().enumerate() {
            if chars[i + 1..].contains(c) {
                return Err(Hl7Error::MalformedDelimiterHeader(format!(
                    "delimiter '{}' is used more than once",
                    c
                )));
            }
        }

        Ok(())
    }
}

/// Whether `name` is MSH, FHS or BHS (case-insensitive)
pub fn is_header_segment(name: &str) -> bool {
    HEADER_SEGMENTS
        .iter()
        .any(|header| header.eq_ignore_ascii_case(name))
}

fn is_header_line(line: &str) -> bool {
    line.len() > 3 && line.is_char_boundary(3) && is_header_segment(&line[..3])
}
