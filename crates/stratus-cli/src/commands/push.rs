//! `stratus push` - apply local changes to the remote tree

use anyhow::Result;
use clap::Args;

use stratus_core::config::Config;
use stratus_sync::{count_local, fetch, plan_push, OperationExecutor, ProgressCounter};

use crate::commands::{build_provider, load_workspace, open_cache};
use crate::output::HumanOutput;
use crate::progress::TerminalProgress;

#[derive(Debug, Args)]
pub struct PushCommand {
    /// Skip the fetch that normally precedes the push
    #[arg(long)]
    pub no_fetch: bool,

    /// Apply without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl PushCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        let output = HumanOutput;
        let mut workspace = load_workspace(config)?;
        let provider = build_provider()?;
        let cache = open_cache(config, provider.clone()).await?;

        // Refresh the reference tree first so the diff runs against the
        // actual remote state, not last run's
        if !self.no_fetch {
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
            }
        }

        let total = count_local(&workspace.state, &workspace.root, &workspace.matcher)?;
        let sink = TerminalProgress::new("comparing");
        let mut progress = ProgressCounter::new(total, &sink);
        let (plan, _) = plan_push(
            &mut workspace.state,
            &workspace.root,
            &workspace.matcher,
            &mut progress,
        )?;
        progress.finish();

        if plan.is_empty() {
            output.success("Already up to date");
            return Ok(());
        }

        let executor = OperationExecutor::new(provider, self.yes);
        let sink = TerminalProgress::new("pushing");
        let executed = executor
            .run(plan, &mut workspace.state, &cache, &sink)
            .await?;

        if executed {
            workspace.state.save(&workspace.root)?;
            output.success("Push complete");
        } else {
            output.info("Nothing pushed.");
        }
        Ok(())
    }
}
