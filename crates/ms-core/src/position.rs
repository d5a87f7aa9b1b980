use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A location inside a script's text. Comparison, equality and hashing use
/// the byte offset only; the line index is carried for diagnostics and must
/// never participate in ordering.
///
/// Positions are handed out by a cursor as it reads; a cursor only accepts
/// seeks to Positions it previously produced.
#[derive(Debug, Clone, Copy)]
pub struct Position {
    offset: usize,
    line: usize,
}

impl Position {
    pub fn new(offset: usize, line: usize) -> Self {
        Self { offset, line }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 1-based logical line number the position points at.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}

impl Eq for Position {}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset.cmp(&other.offset)
    }
}

impl Hash for Position {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.offset.hash(state);
    }
}
