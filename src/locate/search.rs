use super::location::FieldLocation;
use super::locator::FieldMatch;

/// How a find-next step moved through the match list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindStep {
    Next,
    /// Passed the last match and restarted at the first
    WrappedToStart,
}

/// The result list of the last find, and where the cursor is in it
#[derive(Debug, Clone)]
pub struct SearchState {
    query: FieldLocation,
    matches: Vec<FieldMatch>,
    index: usize,
    revision: u64,
}

impl SearchState {
    pub fn new(query: FieldLocation, matches: Vec<FieldMatch>, revision: u64) -> Self {
        Self {
            query,
            matches,
            index: 0,
            revision,
        }
    }

    pub fn query(&self) -> &FieldLocation {
        &self.query
    }

    pub fn matches(&self) -> &[FieldMatch] {
        &self.matches
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn current(&self) -> Option<&FieldMatch> {
        self.matches.get(self.index)
    }

    /// Whether the matches were computed against an older text
    pub fn is_stale(&self, revision: u64) -> bool {
        self.revision != revision
    }

    /// Replace the matches after the text changed. The index is kept as is.
    pub fn refresh(&mut self, matches: Vec<FieldMatch>, revision: u64) {
        self.matches = matches;
        self.revision = revision;
    }

    /// Move to the next match, wrapping to the first after the last.
    /// `None` when there are no matches.
    pub fn advance(&mut self) -> Option<(&FieldMatch, FindStep)> {
        if self.matches.is_empty() {
            return None;
        }

        let next = self.index + 1;
        let step = if next >= self.matches.len() {
            self.index = 0;
            FindStep::WrappedToStart
        } else {
            self.index = next;
            FindStep::Next
        };

        self.matches.get(self.index).map(|m| (m, step))
    }
}
