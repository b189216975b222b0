mod commands;
mod script;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{init, run, show, InitArgs, RunArgs, ShowArgs};
use quire_editor::EditorConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Quire CLI - drive the rich-text editing core from the terminal
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a config file and the default document
    Init(InitArgs),

    /// Print the persisted document
    Show(ShowArgs),

    /// Apply a command script to the persisted document
    Run(RunArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = execute(cli).await {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let cwd = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let config = EditorConfig::load(&cwd);
    let level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config?;
    match cli.command {
        Command::Init(args) => init(args, &cwd, &config),
        Command::Show(args) => show(args, &cwd, &config),
        Command::Run(args) => run(args, &cwd, &config).await,
    }
}
