use std::fmt;

use serde::Serialize;

/// A `SEG-F[.C[.S]]` address. All indices are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldPath {
    pub segment: String,
    pub field: usize,
    pub component: Option<usize>,
    pub subcomponent: Option<usize>,
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.segment, self.field)?;
        if let Some(component) = self.component {
            write!(f, ".{}", component)?;
        }
        if let Some(subcomponent) = self.subcomponent {
            write!(f, ".{}", subcomponent)?;
        }
        Ok(())
    }
}

/// What a user asked to find
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum FieldLocation {
    Structured(FieldPath),
    /// Matched against field descriptions
    FreeText(String),
}

impl FieldLocation {
    /// Parse a query. Anything that is not a well-formed structured address
    /// (including one with a zero index) is free text.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match parse_path(input) {
            Some(path) => FieldLocation::Structured(path),
            None => FieldLocation::FreeText(input.to_string()),
        }
    }

    pub fn as_path(&self) -> Option<&FieldPath> {
        match self {
            FieldLocation::Structured(path) => Some(path),
            FieldLocation::FreeText(_) => None,
        }
    }
}

impl From<&str> for FieldLocation {
    fn from(input: &str) -> Self {
        Self::parse(input)
    }
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldLocation::Structured(path) => path.fmt(f),
            FieldLocation::FreeText(query) => f.write_str(query),
        }
    }
}

fn parse_path(input: &str) -> Option<FieldPath> {
    let (segment, indices) = input.split_once('-')?;

    let mut chars = segment.chars();
    let valid_segment = segment.len() == 3
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric());
    if !valid_segment {
        return None;
    }

    let mut parts = indices.split('.');
    let field = parse_index(parts.next()?)?;
    let component = match parts.next() {
        Some(part) => Some(parse_index(part)?),
        None => None,
    };
    let subcomponent = match parts.next() {
        Some(part) => Some(parse_index(part)?),
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }

    Some(FieldPath {
        segment: segment.to_ascii_uppercase(),
        field,
        component,
        subcomponent,
    })
}

/// A non-empty run of ASCII digits with a non-zero value
fn parse_index(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&n| n > 0)
}
