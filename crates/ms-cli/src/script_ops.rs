use std::fs;
use std::path::PathBuf;

use ms_core::Evaluator;
use ms_runtime::{Console, ScriptSession, SessionOptions};

use crate::CliError;

/// Loads and runs one script file against the given workspace. Quitting the
/// debug stepper with `exit` ends the run without being treated as a
/// failure; the workspace keeps whatever state the script built up.
pub(crate) fn run_script_file(
    path: &str,
    interactive: bool,
    debug: bool,
    evaluator: &mut dyn Evaluator,
    console: &mut dyn Console,
) -> Result<(), CliError> {
    let source = fs::read_to_string(path).map_err(|source| CliError::ReadScript {
        path: PathBuf::from(path),
        source,
    })?;

    let outcome = {
        let mut session = ScriptSession::new(
            source,
            evaluator,
            console,
            SessionOptions {
                debug_mode: debug,
                interactive,
            },
        );
        session.run()
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(error) if error.code == "RUN_DEBUG_EXIT" => {
            console.print("Debug session ended.");
            Ok(())
        }
        Err(error) => Err(CliError::Engine(error)),
    }
}
