mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{edit, init, show, EditArgs, InitArgs, ShowArgs};
use tracing_subscriber::EnvFilter;

/// Campaign CLI - edit and inspect multi-screen campaigns
#[derive(Parser, Debug)]
#[command(name = "campaign")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new campaign project
    Init(InitArgs),

    /// Print a campaign, or list all of them
    Show(ShowArgs),

    /// Apply a JSON mutation script to a campaign and save it
    Edit(EditArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match std::env::current_dir() {
        Ok(cwd) => match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Show(args) => show(args, &cwd).await,
            Command::Edit(args) => edit(args, &cwd).await,
        },
        Err(err) => Err(anyhow::anyhow!("Cannot get current directory: {}", err)),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
