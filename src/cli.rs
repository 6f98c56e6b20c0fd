// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slipway")]
#[command(about = "Build, run and redeploy git-sourced applications on Docker or Podman")]
#[command(version)]
pub struct Cli {
    /// Settings file (defaults to slipway.yml discovery in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a slipway.yml settings file with the defaults
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Register an application from a manifest and run its first deployment
    Create {
        /// Application manifest (YAML)
        manifest: PathBuf,
    },

    /// List applications with their live status
    List,

    /// Show one application with its live status
    Show { name: String },

    /// Remove an application and its container
    Delete { name: String },

    /// Start an application's container
    Start { name: String },

    /// Stop an application's container
    Stop { name: String },

    /// Restart an application's container
    Restart { name: String },

    /// Pause an application's container
    Pause { name: String },

    /// Unpause an application's container
    Unpause { name: String },

    /// Replace an application's webhook token
    RotateToken { name: String },

    /// Print recent container logs
    Logs {
        name: String,

        /// Number of lines from the end (non-numeric or zero uses the default)
        #[arg(short = 'n', long)]
        lines: Option<String>,

        /// Prefix lines with engine timestamps
        #[arg(short, long)]
        timestamps: bool,
    },

    /// Redeploy the application owning a webhook token
    Notify { token: String },

    /// List managed containers no application refers to
    Orphans {
        /// Stop and remove them
        #[arg(long)]
        remove: bool,
    },
}
