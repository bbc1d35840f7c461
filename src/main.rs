mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use filefetch::config::Settings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match cli.config {
        Some(path) => Settings::load_from_path(path)?,
        None => Settings::load()?,
    };

    match cli.command {
        Commands::Fetch(args) => commands::fetch(&settings, args).await?,
        Commands::Status(args) => commands::status(&settings, args)?,
        Commands::List => commands::list(&settings)?,
    }

    Ok(())
}
