use std::io::{self, Write};

use ms_core::MatScriptError;
use ms_runtime::Console;

/// Console over stdin/stdout, used by the prompt and by script runs.
pub(crate) struct StdConsole;

impl Console for StdConsole {
    fn prompt(&mut self, prompt: &str) -> Result<String, MatScriptError> {
        print!("{}", prompt);
        io::stdout()
            .flush()
            .map_err(|error| MatScriptError::new("CLI_IO", error.to_string()))?;
        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .map_err(|error| MatScriptError::new("CLI_IO", error.to_string()))?;
        Ok(input.trim_end_matches(&['\r', '\n'][..]).to_string())
    }

    fn print(&mut self, text: &str) {
        println!("{}", text);
    }
}
