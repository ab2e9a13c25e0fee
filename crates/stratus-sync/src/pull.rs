//! Pull - plan local changes so the local tree matches the remote one
//!
//! The mirror image of push: the remote tree (read through the listing
//! cache) is authoritative, the local filesystem is the target, and the
//! timestamp comparison runs the other way around - a local file is stale
//! when its modification time is at or before the remote one. Nest
//! entries for newly seen remote folders carry their real ids from the
//! listing, so no placeholders are needed.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use stratus_cache::ListingCache;
use stratus_core::domain::SyncError;

use crate::ignore::IgnoreMatcher;
use crate::ops::{OpAction, OpKind, OperationPlan, PlannedOp};
use crate::progress::ProgressCounter;
use crate::push::file_mtime;
use crate::state::{FolderNode, SyncState};

/// Walks the remote tree and plans the operations pull would apply
pub async fn plan_pull(
    state: &mut SyncState,
    root: &Path,
    cache: &ListingCache,
    matcher: &IgnoreMatcher,
    progress: &mut ProgressCounter<'_>,
) -> Result<(OperationPlan, bool), SyncError> {
    let mut plan = OperationPlan::new();
    let max_depth = state.depth;
    let edited = plan_pull_dir(
        &mut state.structure,
        root.to_path_buf(),
        PathBuf::new(),
        Vec::new(),
        0,
        max_depth,
        cache,
        matcher,
        &mut plan,
        progress,
    )
    .await?;
    Ok((plan, edited))
}

#[allow(clippy::too_many_arguments)]
fn plan_pull_dir<'a, 'b: 'a>(
    node: &'a mut FolderNode,
    dir: PathBuf,
    rel: PathBuf,
    tree_path: Vec<String>,
    depth: u32,
    max_depth: u32,
    cache: &'a ListingCache,
    matcher: &'a IgnoreMatcher,
    plan: &'a mut OperationPlan,
    progress: &'a mut ProgressCounter<'b>,
) -> Pin<Box<dyn Future<Output = Result<bool, SyncError>> + Send + 'a>> {
    Box::pin(async move {
        let listing = cache.get_children(&node.folder_id).await?;
        let mut edited = false;

        // Remote files: download what is new or newer than the last sync
        for file in &listing.files {
            if node.is_ignored(&file.name) || matcher.matches(&rel.join(&file.name)) {
                continue;
            }
            progress.tick();

            let local = dir.join(&file.name);
            let rel_child = rel.join(&file.name);

            match node.mappings.get(&file.name) {
                Some(record) => {
                    if file.modified > record.last_synced {
                        plan.push(PlannedOp {
                            kind: OpKind::Update,
                            description: format!(
                                "download changed file \"{}\"",
                                rel_child.display()
                            ),
                            action: OpAction::DownloadChanged {
                                file_id: file.id.clone(),
                                local,
                                tree_path: tree_path.clone(),
                                name: file.name.clone(),
                            },
                        });
                        edited = true;
                    } else if !local.is_file() {
                        // The mapping exists but the local copy is gone;
                        // the remote side is authoritative, restore it
                        plan.push(PlannedOp {
                            kind: OpKind::Create,
                            description: format!("download new file \"{}\"", rel_child.display()),
                            action: OpAction::DownloadNew {
                                file_id: file.id.clone(),
                                local,
                                tree_path: tree_path.clone(),
                                name: file.name.clone(),
                            },
                        });
                        edited = true;
                    }
                }
                None => {
                    if local.is_file() {
                        // Untracked on both sides: overwrite only a stale
                        // local copy (mtime at or before the remote's),
                        // leave a newer one for push to resolve
                        if file_mtime(&local)? <= file.modified {
                            plan.push(PlannedOp {
                                kind: OpKind::Update,
                                description: format!(
                                    "download changed file \"{}\"",
                                    rel_child.display()
                                ),
                                action: OpAction::DownloadChanged {
                                    file_id: file.id.clone(),
                                    local,
                                    tree_path: tree_path.clone(),
                                    name: file.name.clone(),
                                },
                            });
                            edited = true;
                        }
                    } else {
                        plan.push(PlannedOp {
                            kind: OpKind::Create,
                            description: format!("download new file \"{}\"", rel_child.display()),
                            action: OpAction::DownloadNew {
                                file_id: file.id.clone(),
                                local,
                                tree_path: tree_path.clone(),
                                name: file.name.clone(),
                            },
                        });
                        edited = true;
                    }
                }
            }
        }

        // Mappings whose remote file disappeared: delete the local copy
        let stale: Vec<String> = node
            .mappings
            .iter()
            .filter(|(name, record)| {
                !node.is_ignored(name)
                    && !matcher.matches(&rel.join(name.as_str()))
                    && !listing.contains_file_id(&record.file_id)
            })
            .map(|(name, _)| name.clone())
            .collect();
        for name in stale {
            plan.push(PlannedOp {
                kind: OpKind::Delete,
                description: format!("delete local file \"{}\"", rel.join(&name).display()),
                action: OpAction::DeleteLocalFile {
                    local: dir.join(&name),
                    tree_path: tree_path.clone(),
                    name,
                },
            });
            edited = true;
        }

        if depth < max_depth {
            // Nests whose remote folder disappeared: remove the local
            // directory tree
            let stale: Vec<String> = node
                .nests
                .iter()
                .filter(|(name, nest)| {
                    !node.is_ignored(name)
                        && !matcher.matches(&rel.join(name.as_str()))
                        && !listing.contains_folder_id(&nest.folder_id)
                })
                .map(|(name, _)| name.clone())
                .collect();
            for name in stale {
                plan.push(PlannedOp {
                    kind: OpKind::Delete,
                    description: format!(
                        "remove local directory \"{}\"",
                        rel.join(&name).display()
                    ),
                    action: OpAction::RemoveLocalDir {
                        local: dir.join(&name),
                        tree_path: tree_path.clone(),
                        name,
                    },
                });
                edited = true;
            }

            // New remote folders: record the nest (the id is known) and
            // make sure a local directory will exist
            for folder in &listing.folders {
                if node.is_ignored(&folder.name) || matcher.matches(&rel.join(&folder.name)) {
                    continue;
                }
                progress.tick();

                if !node.nests.contains_key(&folder.name) {
                    node.nests
                        .insert(folder.name.clone(), FolderNode::new(&folder.id));
                    edited = true;
                }

                let local_dir = dir.join(&folder.name);
                if !local_dir.is_dir() {
                    plan.push(PlannedOp {
                        kind: OpKind::Create,
                        description: format!(
                            "create local directory \"{}\"",
                            rel.join(&folder.name).display()
                        ),
                        action: OpAction::CreateLocalDir { local: local_dir },
                    });
                    edited = true;
                }
            }

            // Recurse into every nest that is still live remotely
            let ignore = node.ignore.clone();
            for (name, nest) in node.nests.iter_mut() {
                if ignore.contains(name) {
                    continue;
                }
                let child_rel = rel.join(name);
                if matcher.matches(&child_rel) {
                    continue;
                }
                if !listing.contains_folder_id(&nest.folder_id) {
                    continue;
                }
                let mut child_path = tree_path.clone();
                child_path.push(name.clone());
                edited |= plan_pull_dir(
                    nest,
                    dir.join(name),
                    child_rel,
                    child_path,
                    depth + 1,
                    max_depth,
                    cache,
                    matcher,
                    plan,
                    progress,
                )
                .await?;
            }
        }

        Ok(edited)
    })
}
