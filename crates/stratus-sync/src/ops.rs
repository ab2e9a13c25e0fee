//! Planned operations and their executor
//!
//! Push and pull walks detect differences and emit [`PlannedOp`]s instead
//! of mutating anything; the [`OperationExecutor`] then prints the plan,
//! asks for confirmation, and applies the operations in create → update →
//! delete order. Each successful operation's effect on the sync-state
//! tree is folded in immediately, and the cache entry of every mutated
//! remote id is invalidated before any later read could observe stale
//! data.
//!
//! Operations are plain data, not closures: the action enum names exactly
//! what will happen, which keeps the plan printable and the executor the
//! single authority over tree mutation.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use stratus_cache::ListingCache;
use stratus_core::domain::SyncError;
use stratus_core::ports::{IProgressSink, IRemoteProvider};

use crate::state::{FileRecord, FolderNode, SyncState};

/// Operation category, also the execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OpKind::Create => "create",
            OpKind::Update => "update",
            OpKind::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

/// What a planned operation will do when executed
///
/// `tree_path` is the chain of nest names from the sync root to the
/// folder node the operation belongs to; the executor resolves it at
/// execution time, so folder ids created earlier in the same run are
/// visible to later operations.
#[derive(Debug, Clone)]
pub enum OpAction {
    /// Upload a local file that has no mapping yet
    UploadNew {
        local: PathBuf,
        tree_path: Vec<String>,
        name: String,
    },
    /// Re-upload a local file over its mapped remote id
    UploadChanged {
        local: PathBuf,
        file_id: String,
        tree_path: Vec<String>,
        name: String,
    },
    /// Trash the mapped remote file of a locally deleted file
    TrashRemoteFile {
        file_id: String,
        tree_path: Vec<String>,
        name: String,
    },
    /// Create a remote folder for a new local directory; fills in the
    /// placeholder nest id under the parent at `tree_path`
    CreateRemoteFolder {
        tree_path: Vec<String>,
        name: String,
    },
    /// Trash the remote folder of a locally deleted directory
    TrashRemoteFolder {
        folder_id: String,
        tree_path: Vec<String>,
        name: String,
    },
    /// Download a remote file that is missing locally
    DownloadNew {
        file_id: String,
        local: PathBuf,
        tree_path: Vec<String>,
        name: String,
    },
    /// Re-download a remote file over its stale local copy
    DownloadChanged {
        file_id: String,
        local: PathBuf,
        tree_path: Vec<String>,
        name: String,
    },
    /// Delete a local file whose remote counterpart disappeared
    DeleteLocalFile {
        local: PathBuf,
        tree_path: Vec<String>,
        name: String,
    },
    /// Create a local directory for a remote folder
    CreateLocalDir { local: PathBuf },
    /// Remove a local directory whose remote folder disappeared
    RemoveLocalDir {
        local: PathBuf,
        tree_path: Vec<String>,
        name: String,
    },
}

/// One pending operation: a kind, a human-readable line, and the action
#[derive(Debug, Clone)]
pub struct PlannedOp {
    pub kind: OpKind,
    pub description: String,
    pub action: OpAction,
}

/// The ordered set of operations a walk produced
#[derive(Debug, Default)]
pub struct OperationPlan {
    ops: Vec<PlannedOp>,
}

impl OperationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: PlannedOp) {
        self.ops.push(op);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Operations of one kind, in the order the walk emitted them
    pub fn of_kind(&self, kind: OpKind) -> impl Iterator<Item = &PlannedOp> {
        self.ops.iter().filter(move |op| op.kind == kind)
    }

    /// Consumes the plan into execution order: create, update, delete,
    /// each preserving walk (depth-first) order so parent folder creates
    /// precede the uploads beneath them
    pub fn into_ordered(self) -> Vec<PlannedOp> {
        let mut ordered = Vec::with_capacity(self.ops.len());
        for kind in [OpKind::Create, OpKind::Update, OpKind::Delete] {
            ordered.extend(self.ops.iter().filter(|op| op.kind == kind).cloned());
        }
        ordered
    }
}

/// Applies an [`OperationPlan`], gated by interactive confirmation
pub struct OperationExecutor {
    provider: Arc<dyn IRemoteProvider>,
    skip_confirmation: bool,
}

impl OperationExecutor {
    pub fn new(provider: Arc<dyn IRemoteProvider>, skip_confirmation: bool) -> Self {
        Self {
            provider,
            skip_confirmation,
        }
    }

    /// Prints the plan, confirms, and applies every operation
    ///
    /// Returns `Ok(false)` when the user declined (nothing was executed)
    /// and `Ok(true)` after every operation ran. The first failure aborts
    /// the remaining operations and surfaces the underlying error; the
    /// caller must not persist the sync state in that case.
    pub async fn run(
        &self,
        plan: OperationPlan,
        state: &mut SyncState,
        cache: &ListingCache,
        sink: &dyn IProgressSink,
    ) -> Result<bool, SyncError> {
        if plan.is_empty() {
            return Ok(false);
        }

        self.print_plan(&plan);

        if !self.skip_confirmation && !prompt_confirmation()? {
            info!("Aborted by user, no operations executed");
            return Ok(false);
        }

        let ops = plan.into_ordered();
        let total = ops.len();

        for (index, op) in ops.into_iter().enumerate() {
            debug!(kind = %op.kind, description = %op.description, "Executing operation");

            // Map this operation's 0..1 transfer progress into its slice
            // of the overall run
            let base = index as f64 / total as f64;
            let span = 1.0 / total as f64;
            let transfer = |fraction: f64| {
                sink.report((base + fraction.clamp(0.0, 1.0) * span) * 100.0);
            };

            self.apply(op, state, cache, &transfer).await?;
            sink.report(((index + 1) as f64 / total as f64) * 100.0);
        }

        sink.finish();
        Ok(true)
    }

    /// Prints pending operations grouped by kind
    fn print_plan(&self, plan: &OperationPlan) {
        println!("Pending operations:");
        for (kind, marker) in [
            (OpKind::Create, '+'),
            (OpKind::Update, '~'),
            (OpKind::Delete, '-'),
        ] {
            let ops: Vec<&PlannedOp> = plan.of_kind(kind).collect();
            if ops.is_empty() {
                continue;
            }
            println!("  {}:", kind);
            for op in ops {
                println!("    {} {}", marker, op.description);
            }
        }
    }

    /// Applies one operation and folds its effect into the tree
    async fn apply(
        &self,
        op: PlannedOp,
        state: &mut SyncState,
        cache: &ListingCache,
        transfer: &(dyn Fn(f64) + Send + Sync),
    ) -> Result<(), SyncError> {
        match op.action {
            OpAction::UploadNew {
                local,
                tree_path,
                name,
            } => {
                let folder_id = folder_id_at(state, &tree_path)?;
                let file = self.provider.create_file(&folder_id, &local, transfer).await?;
                let now = Utc::now();
                set_file_mtime(&local, now)?;
                node_mut(state, &tree_path)?.mappings.insert(
                    name,
                    FileRecord {
                        file_id: file.id.clone(),
                        last_synced: now,
                    },
                );
                cache.invalidate(&folder_id).await;
                cache.invalidate(&file.id).await;
            }
            OpAction::UploadChanged {
                local,
                file_id,
                tree_path,
                name,
            } => {
                let folder_id = folder_id_at(state, &tree_path)?;
                let file = self.provider.update_file(&file_id, &local, transfer).await?;
                let now = Utc::now();
                set_file_mtime(&local, now)?;
                if let Some(record) = node_mut(state, &tree_path)?.mappings.get_mut(&name) {
                    record.file_id = file.id;
                    record.last_synced = now;
                }
                cache.invalidate(&file_id).await;
                cache.invalidate(&folder_id).await;
            }
            OpAction::TrashRemoteFile {
                file_id,
                tree_path,
                name,
            } => {
                let folder_id = folder_id_at(state, &tree_path)?;
                self.provider.trash_item(&file_id).await?;
                node_mut(state, &tree_path)?.mappings.remove(&name);
                cache.invalidate(&file_id).await;
                cache.invalidate(&folder_id).await;
            }
            OpAction::CreateRemoteFolder { tree_path, name } => {
                let parent_id = folder_id_at(state, &tree_path)?;
                let folder = self.provider.create_folder(&parent_id, &name).await?;
                let parent = node_mut(state, &tree_path)?;
                match parent.nests.get_mut(&name) {
                    Some(nest) => nest.folder_id = folder.id,
                    None => {
                        parent.nests.insert(name, FolderNode::new(folder.id));
                    }
                }
                cache.invalidate(&parent_id).await;
            }
            OpAction::TrashRemoteFolder {
                folder_id,
                tree_path,
                name,
            } => {
                let parent_id = folder_id_at(state, &tree_path)?;
                self.provider.trash_item(&folder_id).await?;
                node_mut(state, &tree_path)?.nests.remove(&name);
                cache.invalidate(&folder_id).await;
                cache.invalidate(&parent_id).await;
            }
            OpAction::DownloadNew {
                file_id,
                local,
                tree_path,
                name,
            }
            | OpAction::DownloadChanged {
                file_id,
                local,
                tree_path,
                name,
            } => {
                if let Some(parent) = local.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| SyncError::persistence(parent, e))?;
                }
                self.provider.download_file(&file_id, &local, transfer).await?;
                let now = Utc::now();
                set_file_mtime(&local, now)?;
                node_mut(state, &tree_path)?.mappings.insert(
                    name,
                    FileRecord {
                        file_id,
                        last_synced: now,
                    },
                );
            }
            OpAction::DeleteLocalFile {
                local,
                tree_path,
                name,
            } => {
                match std::fs::remove_file(&local) {
                    Ok(()) => {}
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => return Err(SyncError::persistence(&local, err)),
                }
                node_mut(state, &tree_path)?.mappings.remove(&name);
            }
            OpAction::CreateLocalDir { local } => {
                std::fs::create_dir_all(&local).map_err(|e| SyncError::persistence(&local, e))?;
            }
            OpAction::RemoveLocalDir {
                local,
                tree_path,
                name,
            } => {
                match std::fs::remove_dir_all(&local) {
                    Ok(()) => {}
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => return Err(SyncError::persistence(&local, err)),
                }
                node_mut(state, &tree_path)?.nests.remove(&name);
            }
        }

        Ok(())
    }
}

/// Resolves the folder node a tree path points at
fn node_mut<'s>(state: &'s mut SyncState, path: &[String]) -> Result<&'s mut FolderNode, SyncError> {
    state.structure.node_at_mut(path).ok_or_else(|| {
        SyncError::InvalidArgument(format!(
            "planned operation references untracked folder \"{}\"",
            path.join("/")
        ))
    })
}

/// Resolves the remote folder id a tree path points at
///
/// An empty id means the parent `CreateRemoteFolder` never ran, which the
/// execution order rules out; it is still checked rather than assumed.
fn folder_id_at(state: &mut SyncState, path: &[String]) -> Result<String, SyncError> {
    let node = node_mut(state, path)?;
    if node.folder_id.is_empty() {
        return Err(SyncError::InvalidArgument(format!(
            "folder \"{}\" has not been created remotely yet",
            path.join("/")
        )));
    }
    Ok(node.folder_id.clone())
}

/// Resets a file's modification time to the given instant
///
/// Run after every upload and download so the file's mtime equals the
/// recorded mapping timestamp; without this, filesystem timestamp
/// resolution and clock skew would re-detect the file as changed on the
/// next run.
fn set_file_mtime(path: &Path, instant: DateTime<Utc>) -> Result<(), SyncError> {
    let file = std::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| SyncError::persistence(path, e))?;
    file.set_modified(std::time::SystemTime::from(instant))
        .map_err(|e| SyncError::persistence(path, e))
}

/// Asks on stdin whether the printed plan should be applied
fn prompt_confirmation() -> Result<bool, SyncError> {
    print!("Proceed? [y/N] ");
    io::stdout()
        .flush()
        .map_err(|e| SyncError::persistence("<stdout>", e))?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| SyncError::persistence("<stdin>", e))?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(kind: OpKind, description: &str) -> PlannedOp {
        PlannedOp {
            kind,
            description: description.to_string(),
            action: OpAction::CreateLocalDir {
                local: PathBuf::from("/tmp/x"),
            },
        }
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(OpKind::Create.to_string(), "create");
        assert_eq!(OpKind::Update.to_string(), "update");
        assert_eq!(OpKind::Delete.to_string(), "delete");
    }

    #[test]
    fn test_plan_groups_by_kind() {
        let mut plan = OperationPlan::new();
        plan.push(op(OpKind::Delete, "d1"));
        plan.push(op(OpKind::Create, "c1"));
        plan.push(op(OpKind::Update, "u1"));
        plan.push(op(OpKind::Create, "c2"));

        assert_eq!(plan.len(), 4);
        let creates: Vec<&str> = plan
            .of_kind(OpKind::Create)
            .map(|o| o.description.as_str())
            .collect();
        assert_eq!(creates, vec!["c1", "c2"]);
    }

    #[test]
    fn test_into_ordered_runs_creates_then_updates_then_deletes() {
        let mut plan = OperationPlan::new();
        plan.push(op(OpKind::Delete, "d1"));
        plan.push(op(OpKind::Create, "c1"));
        plan.push(op(OpKind::Update, "u1"));
        plan.push(op(OpKind::Create, "c2"));

        let ordered: Vec<String> = plan
            .into_ordered()
            .into_iter()
            .map(|o| o.description)
            .collect();
        assert_eq!(ordered, vec!["c1", "c2", "u1", "d1"]);
    }

    #[test]
    fn test_node_mut_unknown_path_rejected() {
        let mut state = SyncState::new("root", 2);
        let err = node_mut(&mut state, &["missing".to_string()]).unwrap_err();
        assert!(matches!(err, SyncError::InvalidArgument(_)));
    }

    #[test]
    fn test_folder_id_at_placeholder_rejected() {
        let mut state = SyncState::new("root", 2);
        state
            .structure
            .nests
            .insert("fresh".to_string(), FolderNode::new(""));
        let err = folder_id_at(&mut state, &["fresh".to_string()]).unwrap_err();
        assert!(matches!(err, SyncError::InvalidArgument(_)));
    }
}
