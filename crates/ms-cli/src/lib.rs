use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use ms_core::MatScriptError;
use ms_eval::RhaiEvaluator;
use thiserror::Error;

mod cli_args;
mod console;
mod repl;
mod script_ops;

pub(crate) use cli_args::{Cli, Mode, ScriptRunArgs};
pub(crate) use console::StdConsole;
pub(crate) use repl::run_repl;
pub(crate) use script_ops::run_script_file;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read script {path}: {source}")]
    ReadScript {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Terminal error: {0}")]
    Terminal(std::io::Error),
    #[error("Engine error: {0}")]
    Engine(#[from] MatScriptError),
}

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, CliError> {
    match cli.command {
        Mode::Repl => run_repl(),
        Mode::Run(args) => run_script(args),
    }
}

fn run_script(args: ScriptRunArgs) -> Result<i32, CliError> {
    let mut evaluator = RhaiEvaluator::new();
    let mut console = StdConsole;
    run_script_file(
        &args.script,
        args.interactive,
        args.debug,
        &mut evaluator,
        &mut console,
    )?;
    Ok(0)
}

fn emit_error(error: CliError) -> i32 {
    println!("RESULT:ERROR");
    match &error {
        CliError::Engine(engine) => {
            println!("ERROR_CODE:{}", engine.code);
            if let Some(line) = engine.line {
                println!("ERROR_LINE:{}", line);
            }
            if let Some(text) = &engine.line_text {
                println!(
                    "ERROR_LINE_TEXT_JSON:{}",
                    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
                );
            }
            println!(
                "ERROR_MSG_JSON:{}",
                serde_json::to_string(&engine.message)
                    .unwrap_or_else(|_| "\"Unknown error\"".to_string())
            );
        }
        CliError::ReadScript { .. } => {
            println!("ERROR_CODE:CLI_SOURCE_READ");
            println!(
                "ERROR_MSG_JSON:{}",
                serde_json::to_string(&error.to_string())
                    .unwrap_or_else(|_| "\"Unknown error\"".to_string())
            );
        }
        CliError::Terminal(_) => {
            println!("ERROR_CODE:CLI_TERMINAL");
            println!(
                "ERROR_MSG_JSON:{}",
                serde_json::to_string(&error.to_string())
                    .unwrap_or_else(|_| "\"Unknown error\"".to_string())
            );
        }
    }
    1
}
