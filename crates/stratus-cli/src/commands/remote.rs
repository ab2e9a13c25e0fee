//! `stratus remote` - ad hoc remote browsing and manipulation

use anyhow::Result;
use clap::{Args, Subcommand};

use stratus_core::config::Config;
use stratus_core::domain::{RemoteItem, RemoteListing};

use crate::commands::{build_provider, describe_size};
use crate::output::HumanOutput;

#[derive(Debug, Subcommand)]
pub enum RemoteCommand {
    /// List the children of a remote folder
    List(RemoteListCommand),
    /// Show one remote item
    Info(RemoteInfoCommand),
    /// Move a remote item under a new parent folder
    Move(RemoteMoveCommand),
    /// Trash an item, list the trash, or empty it
    Trash(RemoteTrashCommand),
}

#[derive(Debug, Args)]
pub struct RemoteListCommand {
    /// Folder id to list (defaults to the drive root)
    #[arg(default_value = "root")]
    pub folder_id: String,
}

#[derive(Debug, Args)]
pub struct RemoteInfoCommand {
    /// Item id to resolve
    pub id: String,
}

#[derive(Debug, Args)]
pub struct RemoteMoveCommand {
    /// Item id to move
    pub id: String,
    /// New parent folder id
    pub parent_id: String,
}

#[derive(Debug, Args)]
pub struct RemoteTrashCommand {
    /// Item id to move to trash; omit to list the trash contents
    pub id: Option<String>,

    /// Permanently delete everything in the trash
    #[arg(long, conflicts_with = "id")]
    pub empty: bool,
}

impl RemoteCommand {
    pub async fn execute(&self, _config: &Config) -> Result<()> {
        let output = HumanOutput;
        let provider = build_provider()?;

        match self {
            RemoteCommand::List(cmd) => {
                let listing = provider.list_children(&cmd.folder_id).await?;
                print_listing(&output, &listing);
            }
            RemoteCommand::Info(cmd) => {
                let item = provider.get_item(&cmd.id).await?;
                print_item(&output, &item);
            }
            RemoteCommand::Move(cmd) => {
                let item = provider.move_item(&cmd.id, &cmd.parent_id).await?;
                output.success(&format!(
                    "Moved \"{}\" under folder {}",
                    item.name(),
                    cmd.parent_id
                ));
            }
            RemoteCommand::Trash(cmd) => {
                if cmd.empty {
                    provider.empty_trash().await?;
                    output.success("Trash emptied");
                } else if let Some(id) = &cmd.id {
                    provider.trash_item(id).await?;
                    output.success(&format!("Moved {} to trash", id));
                } else {
                    let listing = provider.list_trash().await?;
                    print_listing(&output, &listing);
                }
            }
        }
        Ok(())
    }
}

fn print_listing(output: &HumanOutput, listing: &RemoteListing) {
    if listing.files.is_empty() && listing.folders.is_empty() {
        output.info("(empty)");
        return;
    }
    for folder in &listing.folders {
        output.info(&format!("{}  {}/", folder.id, folder.name));
    }
    for file in &listing.files {
        output.info(&format!(
            "{}  {}  {}  {}",
            file.id,
            file.name,
            describe_size(file.size),
            file.modified.format("%Y-%m-%d %H:%M")
        ));
    }
}

fn print_item(output: &HumanOutput, item: &RemoteItem) {
    match item {
        RemoteItem::Folder(folder) => {
            output.success(&format!("Folder \"{}\"", folder.name));
            output.info(&format!("id: {}", folder.id));
        }
        RemoteItem::File(file) => {
            output.success(&format!("File \"{}\"", file.name));
            output.info(&format!("id:       {}", file.id));
            output.info(&format!("size:     {}", describe_size(file.size)));
            output.info(&format!(
                "modified: {}",
                file.modified.format("%Y-%m-%d %H:%M:%S")
            ));
        }
    }
}
