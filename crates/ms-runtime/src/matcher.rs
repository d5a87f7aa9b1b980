use std::collections::HashMap;

use ms_core::{MatScriptError, Position};

use crate::cursor::ScriptCursor;
use crate::keywords::{first_token, is_initiator, strip_keyword, KW_END, KW_FUNCTION};

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionEntry {
    /// Header text after the `function` keyword.
    pub signature: String,
    /// Position of the first body line, just past the signature.
    pub body_start: Position,
    /// Position of the matching `end` line.
    pub end: Position,
}

/// Locates block terminators for a cursor positioned just after a block
/// initiator, skipping nested blocks. Scanned initiator→`end` pairs are
/// memoized for the lifetime of one script run; function signatures
/// encountered while skipping are collected in a registry (populated for
/// future invocation support, currently never consulted).
#[derive(Debug, Default)]
pub struct BlockMatcher {
    end_cache: HashMap<Position, Position>,
    functions: HashMap<String, FunctionEntry>,
}

impl BlockMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans forward for the first shallow line whose first token matches
    /// `key` by prefix (`elseif` satisfies `else`). Nested blocks are
    /// skipped wholesale, so the match always belongs to the current scope.
    ///
    /// `boundary` bounds the scan for the optional terminators; reaching it
    /// yields `Ok(None)`. An exhausted scan for `end` is a syntax error,
    /// never `None`. The cursor is restored to its starting Position on
    /// every outcome.
    pub fn find_keyword(
        &mut self,
        cursor: &mut ScriptCursor,
        key: &str,
        boundary: Option<Position>,
    ) -> Result<Option<Position>, MatScriptError> {
        let start = cursor.current_position();
        if key == KW_END {
            if let Some(found) = self.end_cache.get(&start) {
                return Ok(Some(*found));
            }
        }

        let outcome = self.scan(cursor, key, boundary, start);
        cursor.seek(start)?;
        let found = outcome?;

        if key == KW_END {
            if let Some(found_position) = found {
                self.end_cache.insert(start, found_position);
            }
        }
        Ok(found)
    }

    fn scan(
        &mut self,
        cursor: &mut ScriptCursor,
        key: &str,
        boundary: Option<Position>,
        start: Position,
    ) -> Result<Option<Position>, MatScriptError> {
        loop {
            let line_start = cursor.current_position();
            if let Some(limit) = boundary {
                if line_start >= limit {
                    break;
                }
            }
            let Some(line) = cursor.next_line() else {
                break;
            };
            let Some(first) = first_token(&line) else {
                continue;
            };

            if is_initiator(first) {
                let Some(nested_end) = self.find_keyword(cursor, KW_END, boundary)? else {
                    break;
                };
                if first == KW_FUNCTION {
                    let body_start = cursor.current_position();
                    self.register_function(&line, body_start, nested_end);
                }
                cursor.seek(nested_end)?;
                cursor.next_line();
                continue;
            }

            if first.starts_with(key) {
                return Ok(Some(line_start));
            }
        }

        if key == KW_END {
            Err(MatScriptError::with_line(
                "SYNTAX_END_MISSING",
                "block `end` not found",
                start.line(),
            ))
        } else {
            Ok(None)
        }
    }

    pub(crate) fn register_function(
        &mut self,
        header: &str,
        body_start: Position,
        end: Position,
    ) {
        let signature = strip_keyword(header, KW_FUNCTION);
        let callee = signature
            .split_once('=')
            .map(|(_, rhs)| rhs)
            .unwrap_or(signature);
        let name = callee.split('(').next().unwrap_or("").trim();
        if name.is_empty() {
            return;
        }
        self.functions.insert(
            name.to_string(),
            FunctionEntry {
                signature: signature.to_string(),
                body_start,
                end,
            },
        );
    }

    pub fn function_entry(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(name)
    }
}
