// ABOUTME: Entry point for the slipway CLI application.
// ABOUTME: Parses arguments, loads settings, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Action;
use slipway::config::{self, Settings};
use slipway::error::Result;
use slipway::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = OutputMode::from_flags(cli.quiet, cli.json);

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string(), e.kind());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    let cwd = env::current_dir()?;

    if let Commands::Init { force } = cli.command {
        let path = config::init_config(&cwd, force)?;
        output.success(&format!("Created {}", path.display()));
        return Ok(());
    }

    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::discover(&cwd)?,
    }
    .with_env_overrides();

    let app = commands::connect(settings, &output).await?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Create { manifest } => commands::create(&app, &manifest, output).await,
        Commands::Notify { token } => commands::notify(&app, &token, output).await,
        Commands::List => commands::list(&app, output).await,
        Commands::Show { name } => commands::show(&app, &name, output).await,
        Commands::Delete { name } => commands::delete(&app, &name, output).await,
        Commands::Start { name } => commands::lifecycle(&app, Action::Start, &name, output).await,
        Commands::Stop { name } => commands::lifecycle(&app, Action::Stop, &name, output).await,
        Commands::Restart { name } => {
            commands::lifecycle(&app, Action::Restart, &name, output).await
        }
        Commands::Pause { name } => commands::lifecycle(&app, Action::Pause, &name, output).await,
        Commands::Unpause { name } => {
            commands::lifecycle(&app, Action::Unpause, &name, output).await
        }
        Commands::RotateToken { name } => commands::rotate_token(&app, &name, output).await,
        Commands::Logs {
            name,
            lines,
            timestamps,
        } => commands::logs(&app, &name, lines.as_deref(), timestamps, output).await,
        Commands::Orphans { remove } => commands::orphans(&app, remove, output).await,
    }
}
