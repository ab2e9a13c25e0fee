//! `stratus info` - show sync root details

use anyhow::Result;
use clap::Args;

use stratus_core::config::Config;
use stratus_sync::{count_local, state::STATE_FILE_NAME};

use crate::commands::load_workspace;
use crate::output::HumanOutput;

#[derive(Debug, Args)]
pub struct InfoCommand {}

impl InfoCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        let output = HumanOutput;
        let workspace = load_workspace(config)?;

        output.success(&format!("Sync root: {}", workspace.root.display()));
        output.info(&format!(
            "State file:      {}",
            workspace.root.join(STATE_FILE_NAME).display()
        ));
        output.info(&format!(
            "Remote folder:   {}",
            workspace.state.structure.folder_id
        ));
        output.info(&format!("Tracked depth:   {}", workspace.state.depth));
        output.info(&format!("Tracked files:   {}", workspace.state.count()));

        match count_local(&workspace.state, &workspace.root, &workspace.matcher) {
            Ok(local) => output.info(&format!("Local files:     {}", local)),
            Err(err) => output.warn(&format!("could not count local files: {}", err)),
        }

        Ok(())
    }
}
