//! Stratus CLI - synchronize a local directory with a remote Drive folder
//!
//! Provides commands for:
//! - Initializing a sync root (`init`)
//! - Refreshing the sync state from the remote tree (`fetch`)
//! - Propagating local changes to the remote (`push`)
//! - Propagating remote changes to the local tree (`pull`)
//! - Inspecting the sync root (`info`, `depth`)
//! - Ad hoc remote browsing (`remote list/info/move/trash`)

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod progress;

use commands::{
    depth::DepthCommand, fetch::FetchCommand, info::InfoCommand, init::InitCommand,
    pull::PullCommand, push::PushCommand, remote::RemoteCommand,
};

#[derive(Debug, Parser)]
#[command(name = "stratus", version, about = "Directory synchronization for Drive-style cloud storage")]
pub struct Cli {
    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use an alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize the current directory as a sync root
    Init(InitCommand),
    /// Refresh the sync state from the live remote tree
    Fetch(FetchCommand),
    /// Apply local changes to the remote tree
    Push(PushCommand),
    /// Apply remote changes to the local tree
    Pull(PullCommand),
    /// Show sync root details
    Info(InfoCommand),
    /// Show or change the tracked depth
    Depth(DepthCommand),
    /// Browse and manipulate the remote tree directly
    #[command(subcommand)]
    Remote(RemoteCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Init(cmd) => cmd.execute(&config).await,
        Commands::Fetch(cmd) => cmd.execute(&config).await,
        Commands::Push(cmd) => cmd.execute(&config).await,
        Commands::Pull(cmd) => cmd.execute(&config).await,
        Commands::Info(cmd) => cmd.execute(&config).await,
        Commands::Depth(cmd) => cmd.execute(&config).await,
        Commands::Remote(cmd) => cmd.execute(&config).await,
    }
}
