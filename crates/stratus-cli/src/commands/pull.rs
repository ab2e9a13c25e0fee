//! `stratus pull` - apply remote changes to the local tree

use anyhow::Result;
use clap::Args;

use stratus_core::config::Config;
use stratus_sync::{plan_pull, OperationExecutor, ProgressCounter};

use crate::commands::{build_provider, load_workspace, open_cache};
use crate::output::HumanOutput;
use crate::progress::TerminalProgress;

#[derive(Debug, Args)]
pub struct PullCommand {
    /// Apply without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl PullCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        let output = HumanOutput;
        let mut workspace = load_workspace(config)?;
        let provider = build_provider()?;
        let cache = open_cache(config, provider.clone()).await?;

        let sink = TerminalProgress::new("comparing");
        let mut progress = ProgressCounter::new(workspace.state.count(), &sink);
        let (plan, _) = plan_pull(
            &mut workspace.state,
            &workspace.root,
            &cache,
            &workspace.matcher,
            &mut progress,
        )
        .await?;
        progress.finish();

        if plan.is_empty() {
            output.success("Already up to date");
            return Ok(());
        }

        let executor = OperationExecutor::new(provider, self.yes);
        let sink = TerminalProgress::new("pulling");
        let executed = executor
            .run(plan, &mut workspace.state, &cache, &sink)
            .await?;

        if executed {
            workspace.state.save(&workspace.root)?;
            output.success("Pull complete");
        } else {
            output.info("Nothing pulled.");
        }
        Ok(())
    }
}
