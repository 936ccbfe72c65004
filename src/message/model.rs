//! Segment and field decomposition over an immutable text snapshot
//!
//! The model is rebuilt wholesale whenever the text changes. A full rescan is
//! linear in the document size and keeps every span consistent with the
//! snapshot it was computed from.

use std::ops::Range;

use serde::Serialize;

use crate::message::delimiters::{is_header_segment, DelimiterSet};
use crate::message::{lines, segment_name};

/// Byte range of a field (or component) within the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FieldSpan {
    pub start: usize,
    pub end: usize,
}

impl FieldSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The text covered by this span
    pub fn text<'a>(&self, document: &'a str) -> &'a str {
        &document[self.range()]
    }

    /// Split this span on `delimiter`, yielding one sub-span per piece
    pub fn split(&self, document: &str, delimiter: char) -> Vec<FieldSpan> {
        split_spans(self.text(document), self.start, delimiter)
    }
}

/// One segment line decomposed into fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Segment name as written in the document
    pub name: String,
    /// 0-based line number
    pub line: usize,
    /// Byte offset of the start of the line
    pub offset: usize,
    /// Byte length of the line, excluding its terminator
    pub len: usize,
    /// Index 0 is the name token; index N is field N
    pub fields: Vec<FieldSpan>,
}

impl Segment {
    /// Decompose a segment line in a single left-to-right scan.
    ///
    /// `offset` is the byte position of the line in the document, so every span
    /// is absolute. For MSH, FHS and BHS the field delimiter itself is field 1.
    pub fn decompose(line: &str, line_index: usize, offset: usize, delimiters: &DelimiterSet) -> Self {
        let mut fields = split_spans(line, offset, delimiters.field);
        let name = line[..fields[0].len()].to_string();

        if is_header_segment(&name) && fields.len() > 1 {
            let delimiter_start = fields[0].end;
            let delimiter_end = delimiter_start + delimiters.field.len_utf8();
            fields.insert(1, FieldSpan::new(delimiter_start, delimiter_end));
        }

        Self {
            name,
            line: line_index,
            offset,
            len: line.len(),
            fields,
        }
    }

    /// Span of field `n` (1-based), if the segment has that many fields
    pub fn field(&self, n: usize) -> Option<FieldSpan> {
        if n == 0 {
            return None;
        }
        self.fields.get(n).copied()
    }

    /// Number of fields, not counting the name token
    pub fn field_count(&self) -> usize {
        self.fields.len().saturating_sub(1)
    }

    pub fn is_header(&self) -> bool {
        is_header_segment(&self.name)
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Whether field `n` holds delimiter characters rather than data (MSH-1, MSH-2)
    pub fn is_encoding_field(&self, n: usize) -> bool {
        self.is_header() && (n == 1 || n == 2)
    }

    /// Span of the whole line
    pub fn span(&self) -> FieldSpan {
        FieldSpan::new(self.offset, self.offset + self.len)
    }
}

/// The segments of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageModel {
    delimiters: DelimiterSet,
    segments: Vec<Segment>,
}

impl MessageModel {
    /// Decompose every segment line of `text`; other lines are skipped
    pub fn parse(text: &str, delimiters: &DelimiterSet) -> Self {
        let segments = lines(text)
            .filter(|line| segment_name(line.text, delimiters.field).is_some())
            .map(|line| Segment::decompose(line.text, line.index, line.offset, delimiters))
            .collect();

        Self {
            delimiters: *delimiters,
            segments,
        }
    }

    pub fn delimiters(&self) -> &DelimiterSet {
        &self.delimiters
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segments with the given name (case-insensitive), in document order
    pub fn segments_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Segment> + 'a {
        self.segments.iter().filter(move |s| s.is_named(name))
    }

    /// The segment on 0-based line `line`
    pub fn segment_at_line(&self, line: usize) -> Option<&Segment> {
        self.segments.iter().find(|s| s.line == line)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Split `text` (located at byte `offset` in the document) on `delimiter`
fn split_spans(text: &str, offset: usize, delimiter: char) -> Vec<FieldSpan> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == delimiter {
            spans.push(FieldSpan::new(offset + start, offset + i));
            start = i + c.len_utf8();
        }
    }
    spans.push(FieldSpan::new(offset + start, offset + text.len()));
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = "MSH|^~\\&|A|B|C|D|20230101||ADT^A01|1|P|2.3\rPID|1||12345||Doe^John\r";

    fn model() -> MessageModel {
        MessageModel::parse(MESSAGE, &DelimiterSet::default())
    }

    #[test]
    fn test_field_count_matches_delimiter_count() {
        for line in lines(MESSAGE) {
            let segment = Segment::decompose(line.text, line.index, line.offset, &DelimiterSet::default());
            let delimiters = line.text.matches('|').count();
            let extra = usize::from(segment.is_header());
            assert_eq!(segment.fields.len(), delimiters + 1 + extra, "{}", line.text);
        }
    }

    #[test]
    fn test_header_field_one_is_the_delimiter() {
        let model = model();
        let msh = &model.segments()[0];
        assert_eq!(msh.name, "MSH");
        assert_eq!(msh.field(1).unwrap().text(MESSAGE), "|");
        assert_eq!(msh.field(2).unwrap().text(MESSAGE), "^~\\&");
        assert_eq!(msh.field(9).unwrap().text(MESSAGE), "ADT^A01");
        assert_eq!(msh.field(12).unwrap().text(MESSAGE), "2.3");
        assert!(msh.is_encoding_field(2));
    }

    #[test]
    fn test_spans_are_absolute() {
        let model = model();
        let pid = &model.segments()[1];
        assert_eq!(pid.line, 1);
        assert_eq!(pid.field(3).unwrap().text(MESSAGE), "12345");
        assert_eq!(pid.field(5).unwrap().text(MESSAGE), "Doe^John");
        assert!(pid.field(2).unwrap().is_empty());
        assert_eq!(pid.field(6), None);
        assert_eq!(pid.field(0), None);
        assert_eq!(pid.field_count(), 5);
    }

    #[test]
    fn test_component_split() {
        let model = model();
        let name = model.segments()[1].field(5).unwrap();
        let components: Vec<_> = name
            .split(MESSAGE, '^')
            .iter()
            .map(|s| s.text(MESSAGE))
            .collect();
        assert_eq!(components, vec!["Doe", "John"]);
    }

    #[test]
    fn test_non_segment_lines_skipped() {
        let text = "FILE HEADER\r\rPID|1\r";
        let model = MessageModel::parse(text, &DelimiterSet::default());
        assert_eq!(model.len(), 1);
        assert_eq!(model.segments()[0].line, 2);
    }

    #[test]
    fn test_segments_named_is_case_insensitive() {
        let text = "OBX|1\robx|2\rPID|1\r";
        let model = MessageModel::parse(text, &DelimiterSet::default());
        assert_eq!(model.segments_named("OBX").count(), 2);
        assert!(model.segment_at_line(2).is_some_and(|s| s.is_named("pid")));
    }
}
