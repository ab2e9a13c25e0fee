//! `stratus fetch` - refresh the sync state from the remote tree

use anyhow::Result;
use clap::Args;

use stratus_core::config::Config;
use stratus_sync::{fetch, ProgressCounter};

use crate::commands::{build_provider, load_workspace, open_cache};
use crate::output::HumanOutput;
use crate::progress::TerminalProgress;

#[derive(Debug, Args)]
pub struct FetchCommand {}

impl FetchCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        let output = HumanOutput;
        let mut workspace = load_workspace(config)?;
        let provider = build_provider()?;
        let cache = open_cache(config, provider).await?;

        let sink = TerminalProgress::new("fetching");
        let mut progress = ProgressCounter::new(workspace.state.count(), &sink);

        let edited = fetch(
            &mut workspace.state,
            &cache,
            &workspace.matcher,
            &mut progress,
        )
        .await?;
        progress.finish();

        if edited {
            workspace.state.save(&workspace.root)?;
            output.success(&format!(
                "Sync state updated ({} files tracked)",
                workspace.state.count()
            ));
        } else {
            output.success("Already up to date");
        }
        Ok(())
    }
}
