use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gallery")]
#[command(about = "Upload event photos and keep each event's photo manifest in sync")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "GALLERY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Clone)]
pub struct RemoteArgs {
    /// Target repository as owner/name (overrides configuration)
    #[arg(long)]
    pub repo: Option<String>,

    /// Branch to read from and commit to (overrides configuration)
    #[arg(long)]
    pub branch: Option<String>,

    /// Access token with contents write permission
    #[arg(long, env = "GALLERY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload photos to an event and update its manifest
    Upload {
        /// Event identifier
        #[arg(long)]
        event: String,

        /// Read the manifest and log every write without performing it
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        #[command(flatten)]
        remote: RemoteArgs,

        /// Photos to upload, in order
        files: Vec<PathBuf>,
    },
    /// List the events in the site's catalog
    Events {
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Show an event's current manifest
    Manifest {
        /// Event identifier
        #[arg(long)]
        event: String,

        #[command(flatten)]
        remote: RemoteArgs,
    },
}
