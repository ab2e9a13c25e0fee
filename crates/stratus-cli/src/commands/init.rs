//! `stratus init` - pair the current directory with a remote folder

use anyhow::{Context, Result};
use clap::Args;

use stratus_core::config::Config;
use stratus_core::domain::{RemoteItem, SyncError};
use stratus_sync::SyncState;

use crate::commands::{build_provider, open_cache, validate_depth};
use crate::output::HumanOutput;

#[derive(Debug, Args)]
pub struct InitCommand {
    /// Remote folder id to pair with (defaults to the drive root)
    #[arg(default_value = "root")]
    pub folder_id: String,

    /// Maximum nesting depth to track
    #[arg(long)]
    pub depth: Option<i64>,
}

impl InitCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        let output = HumanOutput;

        let depth = match self.depth {
            Some(value) => validate_depth(value)?,
            None => config.sync.default_depth,
        };

        // Resolve the id up front so a typo fails here, not mid-fetch
        let provider = build_provider()?;
        let cache = open_cache(config, provider).await?;
        let item = cache.get_item(&self.folder_id).await?;
        let folder = match item {
            RemoteItem::Folder(folder) => folder,
            RemoteItem::File(file) => return Err(SyncError::NotAFolder(file.id).into()),
        };

        let cwd = std::env::current_dir().context("cannot determine the current directory")?;
        SyncState::init(&cwd, &folder.id, depth)?;

        output.success(&format!(
            "Initialized sync root for remote folder \"{}\" (depth {})",
            folder.name, depth
        ));
        output.info("Run `stratus fetch` to record the remote tree.");
        Ok(())
    }
}
