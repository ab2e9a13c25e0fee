//! `stratus depth` - show or change the tracked depth

use anyhow::Result;
use clap::Args;

use stratus_core::config::Config;

use crate::commands::{load_workspace, validate_depth};
use crate::output::HumanOutput;

#[derive(Debug, Args)]
pub struct DepthCommand {
    /// New depth bound; omit to show the current one
    pub value: Option<i64>,
}

impl DepthCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        let output = HumanOutput;
        let mut workspace = load_workspace(config)?;

        match self.value {
            None => {
                output.success(&format!("Tracked depth: {}", workspace.state.depth));
            }
            Some(value) => {
                let depth = validate_depth(value)?;
                workspace.state.depth = depth;
                workspace.state.save(&workspace.root)?;
                output.success(&format!("Tracked depth set to {}", depth));
                output.info("Run `stratus fetch` to apply the new bound.");
            }
        }
        Ok(())
    }
}
