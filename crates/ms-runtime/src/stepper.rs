use ms_core::{Evaluator, MatScriptError};

use crate::console::Console;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepSignal {
    /// Execute exactly one further line, then pause again.
    Step,
    /// Clear the pause and run to completion or the next breakpoint toggle.
    Continue,
    /// Abort the whole run.
    Abort,
}

/// Blocking command loop entered while execution is suspended at a line.
/// Unrecognized input repeats the prompt; control returns to the executor
/// only through `step`, `continue` or `exit`.
pub(crate) fn debug_prompt_loop(
    console: &mut dyn Console,
    evaluator: &mut dyn Evaluator,
) -> Result<StepSignal, MatScriptError> {
    loop {
        let raw = console.prompt("dbg >>> ")?;
        let mut tokens = raw.split_whitespace();
        match tokens.next() {
            Some("exit") => return Ok(StepSignal::Abort),
            Some("step") => return Ok(StepSignal::Step),
            Some("continue") | Some("c") => return Ok(StepSignal::Continue),
            Some("watch") => match tokens.next() {
                Some(name) => match evaluator.variable_value(name)? {
                    Some(value) => {
                        console.print(&format!("{} = {}", name, value.to_display_text()));
                    }
                    None => console.print(&format!("Undefined variable: {}", name)),
                },
                None => {
                    for name in evaluator.variable_names()? {
                        if let Some(value) = evaluator.variable_value(&name)? {
                            console.print(&format!("{} = {}", name, value.to_display_text()));
                        }
                    }
                }
            },
            _ => {}
        }
    }
}
