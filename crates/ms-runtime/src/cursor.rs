use std::collections::HashSet;

use ms_core::{MatScriptError, Position};

/// Seekable, line-counting read cursor over a script's text.
///
/// The cursor hands out Positions as it reads and only accepts seeks back to
/// an offset it has already produced, so a Position can never point into the
/// middle of a line.
pub struct ScriptCursor {
    text: String,
    offset: usize,
    line: usize,
    lines_read: u64,
    seen: HashSet<usize>,
}

impl ScriptCursor {
    pub fn new(text: impl Into<String>) -> Self {
        let mut seen = HashSet::new();
        seen.insert(0);
        Self {
            text: text.into(),
            offset: 0,
            line: 1,
            lines_read: 0,
            seen,
        }
    }

    pub fn current_position(&self) -> Position {
        Position::new(self.offset, self.line)
    }

    pub fn at_end(&self) -> bool {
        self.offset >= self.text.len()
    }

    /// Total number of lines yielded so far, across seeks. Used to observe
    /// whether a scan touched the text at all.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Repositions the cursor at a previously observed Position. The line
    /// index is restored from the Position itself.
    pub fn seek(&mut self, position: Position) -> Result<(), MatScriptError> {
        if !self.seen.contains(&position.offset()) {
            return Err(MatScriptError::new(
                "CURSOR_SEEK_UNSEEN",
                format!("cannot seek to unobserved offset {}", position.offset()),
            ));
        }
        self.offset = position.offset();
        self.line = position.line();
        Ok(())
    }

    /// Returns the next logical line without its trailing newline, or None at
    /// end of input. Advances the line index by exactly one per yielded line,
    /// empty lines included.
    pub fn next_line(&mut self) -> Option<String> {
        if self.offset >= self.text.len() {
            return None;
        }
        let rest = &self.text[self.offset..];
        let (content, consumed) = match rest.find('\n') {
            Some(index) => (&rest[..index], index + 1),
            None => (rest, rest.len()),
        };
        let content = content.strip_suffix('\r').unwrap_or(content).to_string();
        self.offset += consumed;
        self.line += 1;
        self.lines_read += 1;
        self.seen.insert(self.offset);
        Some(content)
    }
}
