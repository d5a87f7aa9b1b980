use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "matscript")]
#[command(about = "Interactive runner for MATLAB-style scripts")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Interactive prompt backed by a persistent workspace.
    Repl,
    /// Run one script file to completion.
    Run(ScriptRunArgs),
}

/// Arguments of the `run` subcommand. Also parsed standalone when a `.m`
/// file is dispatched from the interactive prompt, so the prompt accepts
/// the same flags the subcommand does.
#[derive(Debug, Parser)]
#[command(name = "run")]
pub(crate) struct ScriptRunArgs {
    /// Path of the script file.
    pub(crate) script: String,
    /// Block on `pause` lines until Enter is pressed.
    #[arg(short, long)]
    pub(crate) interactive: bool,
    /// Honor `dbg` breakpoint toggles and enter the stepping prompt.
    #[arg(short, long)]
    pub(crate) debug: bool,
}
