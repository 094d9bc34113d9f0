use clap::Parser;

use crate::output::OutputMode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project file to use
    #[arg(short = 'f', long = "file", default_value = "stubsmith.toml")]
    pub file: String,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Show which steps would run without running them
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// How to display tool output in the terminal
    #[arg(long = "output", value_enum)]
    pub output: Option<OutputMode>,

    /// Commands to run in order, lists the available commands if empty
    pub commands: Vec<String>,
}
