use thiserror::Error;

/// Code emitted by an `Evaluator` whose backend process is gone. The runner
/// propagates it unchanged; restarting the backend is the caller's concern.
pub const EVAL_BACKEND_TERMINATED: &str = "EVAL_BACKEND_TERMINATED";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct MatScriptError {
    pub code: String,
    pub message: String,
    /// Logical line number of the offending script line, when known.
    pub line: Option<usize>,
    /// Text of the offending script line, when known.
    pub line_text: Option<String>,
}

impl MatScriptError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            line: None,
            line_text: None,
        }
    }

    pub fn with_line(code: impl Into<String>, message: impl Into<String>, line: usize) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            line: Some(line),
            line_text: None,
        }
    }

    /// Attaches a line number without clobbering one recorded closer to the
    /// failure site.
    pub fn at_line(mut self, line: usize) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        self
    }

    /// Attaches the offending line's number and text, without clobbering
    /// context recorded closer to the failure site.
    pub fn at_source(mut self, line: usize, text: &str) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        if self.line_text.is_none() {
            self.line_text = Some(text.to_string());
        }
        self
    }

    pub fn is_backend_terminated(&self) -> bool {
        self.code == EVAL_BACKEND_TERMINATED
    }
}
