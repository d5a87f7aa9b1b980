use std::io;
use std::iter;

use clap::Parser;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use ms_core::{Evaluator, MatScriptError};
use ms_eval::RhaiEvaluator;
use ms_runtime::Console;

use crate::cli_args::ScriptRunArgs;
use crate::console::StdConsole;
use crate::script_ops::run_script_file;
use crate::CliError;

const PROMPT: &str = ">>> ";

/// Interactive prompt. One workspace lives for the whole session; script
/// files dispatched from the prompt run against it, so their variables stay
/// visible afterwards. Script and evaluation failures are reported and the
/// prompt continues; only `exit` and I/O failure end the loop.
pub(crate) fn run_repl() -> Result<i32, CliError> {
    let mut evaluator = RhaiEvaluator::new();
    let mut console = StdConsole;

    loop {
        let raw = console.prompt(PROMPT).map_err(CliError::Engine)?;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "exit" | "exit()" => return Ok(0),
            "clc" | "clc()" => {
                clear_screen()?;
                continue;
            }
            _ => {}
        }

        let first = line.split_whitespace().next().unwrap_or_default();
        if first.ends_with(".m") {
            match ScriptRunArgs::try_parse_from(iter::once("run").chain(line.split_whitespace())) {
                Ok(args) => {
                    if let Err(error) = run_script_file(
                        &args.script,
                        args.interactive,
                        args.debug,
                        &mut evaluator,
                        &mut console,
                    ) {
                        println!("{}", error);
                    }
                }
                Err(error) => println!("{}", error),
            }
            continue;
        }

        match evaluator.run_statement(line) {
            Ok(output) => {
                if !output.is_empty() {
                    println!("{}", output);
                }
            }
            Err(error) => report(&error),
        }
    }
}

fn report(error: &MatScriptError) {
    match error.line {
        Some(line) => println!("line {}: {}", line, error),
        None => println!("{}", error),
    }
    if let Some(text) = &error.line_text {
        println!("    {}", text);
    }
}

fn clear_screen() -> Result<(), CliError> {
    execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0)).map_err(CliError::Terminal)
}
