//! Message text model: delimiters, lines and segment/field decomposition

pub mod delimiters;
pub mod model;

pub use delimiters::{is_header_segment, DelimiterSet};
pub use model::{FieldSpan, MessageModel, Segment};

/// One line of a document, without its terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 0-based line number
    pub index: usize,
    /// Byte offset of the first character within the document
    pub offset: usize,
    pub text: &'a str,
}

/// Iterator over the lines of a document. `\r`, `\n` and `\r\n` all end a line.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    text: &'a str,
    pos: usize,
    index: usize,
}

/// Iterate the lines of `text`. A trailing terminator does not start an extra line.
pub fn lines(text: &str) -> Lines<'_> {
    Lines {
        text,
        pos: 0,
        index: 0,
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Line<'a>> {
        if self.pos >= self.text.len() {
            return None;
        }

        let rest = &self.text[self.pos..];
        let (len, terminator) = match rest.find(['\r', '\n']) {
            Some(i) if rest[i..].starts_with("\r\n") => (i, 2),
            Some(i) => (i, 1),
            None => (rest.len(), 0),
        };

        let line = Line {
            index: self.index,
            offset: self.pos,
            text: &rest[..len],
        };
        self.pos += len + terminator;
        self.index += 1;
        Some(line)
    }
}

/// Line terminator convention of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineTerminator {
    #[default]
    Cr,
    Lf,
    CrLf,
}

impl LineTerminator {
    /// The terminator used by `text`: the first one found, `\r` when there is none
    pub fn detect(text: &str) -> Self {
        match text.find(['\r', '\n']) {
            Some(i) if text[i..].starts_with("\r\n") => LineTerminator::CrLf,
            Some(i) if text[i..].starts_with('\n') => LineTerminator::Lf,
            _ => LineTerminator::Cr,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineTerminator::Cr => "\r",
            LineTerminator::Lf => "\n",
            LineTerminator::CrLf => "\r\n",
        }
    }
}

/// The segment name of `line` if it starts like a segment: a letter, two or
/// three letters or digits, then the field delimiter.
pub fn segment_name(line: &str, field: char) -> Option<&str> {
    let end = line.find(field)?;
    let name = &line[..end];
    let mut chars = name.chars();
    let valid = (3..=4).contains(&name.len())
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric());
    valid.then_some(name)
}

/// Whether `text` looks like an HL7 v2 message: its first non-empty line is a segment
pub fn looks_like_hl7(text: &str) -> bool {
    let delimiters = DelimiterSet::detect(text).unwrap_or_default();
    lines(text)
        .find(|line| !line.text.trim().is_empty())
        .is_some_and(|line| segment_name(line.text, delimiters.field).is_some())
}
