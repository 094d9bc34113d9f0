use clap::Parser;
use std::process;

use stubsmith::cli::Cli;
use stubsmith::commands::project_commands;
use stubsmith::error::Result;
use stubsmith::{Pipeline, load_project};

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    if let Err(e) = run_stubsmith(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run_stubsmith(args: Cli) -> Result<()> {
    if args.commands.is_empty() {
        print!("{}", project_commands().usage());
        return Ok(());
    }

    let mut project = load_project(&args.file)?;
    project.verbose = args.verbose;
    project.dry_run = args.dry_run;
    if let Some(output) = args.output {
        project.output = output;
    }

    if args.dry_run {
        println!("Dry run mode - showing what would be executed:");
    }

    let pipeline = Pipeline::new(&project);
    project_commands().dispatch(&pipeline, &args.commands).await
}
