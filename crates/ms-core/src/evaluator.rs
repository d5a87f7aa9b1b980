use crate::error::MatScriptError;
use crate::value::MsValue;

/// Expression/statement backend consumed by the script runner. The runner
/// never parses arithmetic itself; everything beyond block keywords is
/// delegated through this capability.
///
/// An implementation whose backing process has died must fail every call
/// with the `EVAL_BACKEND_TERMINATED` code so the runner can surface the
/// condition without mistaking it for an ordinary evaluation error.
pub trait Evaluator {
    /// Boolean-context evaluation, used for `if`/`while` conditions and
    /// `switch` case matching.
    fn eval_condition(&mut self, expr: &str) -> Result<bool, MatScriptError>;

    /// Evaluates a `for` header range expression once, yielding the finite,
    /// ordered sequence of loop values.
    fn eval_range(&mut self, expr: &str) -> Result<Vec<MsValue>, MatScriptError>;

    /// Runs one statement with side effects on the workspace, returning its
    /// captured output (possibly empty).
    fn run_statement(&mut self, line: &str) -> Result<String, MatScriptError>;

    fn bind_variable(&mut self, name: &str, value: MsValue) -> Result<(), MatScriptError>;

    fn variable_names(&mut self) -> Result<Vec<String>, MatScriptError>;

    fn variable_value(&mut self, name: &str) -> Result<Option<MsValue>, MatScriptError>;
}
