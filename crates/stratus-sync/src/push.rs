//! Push - plan remote changes so the remote tree matches the local one
//!
//! The walk compares the live local filesystem against the sync-state
//! tree (the last-known common state) and emits planned operations; it
//! performs no remote calls itself. New local directories get a
//! placeholder nest entry immediately so recursion below them stays
//! consistent; the executor fills in the real folder id when the create
//! operation runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use stratus_core::domain::SyncError;

use crate::ignore::IgnoreMatcher;
use crate::ops::{OpAction, OpKind, OperationPlan, PlannedOp};
use crate::progress::ProgressCounter;
use crate::state::{FolderNode, SyncState};

/// Walks the local tree and plans the operations push would apply
///
/// Returns the plan and whether any difference was detected. The state
/// tree is only touched for placeholder nests; plan-only runs are never
/// persisted, so placeholders never reach disk.
pub fn plan_push(
    state: &mut SyncState,
    root: &Path,
    matcher: &IgnoreMatcher,
    progress: &mut ProgressCounter<'_>,
) -> Result<(OperationPlan, bool), SyncError> {
    let mut plan = OperationPlan::new();
    let max_depth = state.depth;
    let edited = plan_push_dir(
        &mut state.structure,
        root,
        Path::new(""),
        &[],
        0,
        max_depth,
        matcher,
        &mut plan,
        progress,
    )?;
    Ok((plan, edited))
}

#[allow(clippy::too_many_arguments)]
fn plan_push_dir(
    node: &mut FolderNode,
    dir: &Path,
    rel: &Path,
    tree_path: &[String],
    depth: u32,
    max_depth: u32,
    matcher: &IgnoreMatcher,
    plan: &mut OperationPlan,
    progress: &mut ProgressCounter<'_>,
) -> Result<bool, SyncError> {
    let mut edited = false;

    // Snapshot the directory once, ignores already applied
    let mut local_files: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut local_dirs: BTreeMap<String, PathBuf> = BTreeMap::new();

    let entries = std::fs::read_dir(dir).map_err(|e| SyncError::persistence(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| SyncError::persistence(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if node.is_ignored(&name) || matcher.matches(&rel.join(&name)) {
            continue;
        }
        let file_type = entry
            .file_type()
            .map_err(|e| SyncError::persistence(entry.path(), e))?;
        if file_type.is_file() {
            local_files.insert(name, entry.path());
        } else if file_type.is_dir() {
            local_dirs.insert(name, entry.path());
        }
    }

    // Local files: new ones are created remotely, newer ones updated
    for (name, path) in &local_files {
        progress.tick();
        let rel_child = rel.join(name);

        match node.mappings.get(name) {
            Some(record) => {
                if file_mtime(path)? > record.last_synced {
                    plan.push(PlannedOp {
                        kind: OpKind::Update,
                        description: format!("upload changed file \"{}\"", rel_child.display()),
                        action: OpAction::UploadChanged {
                            local: path.clone(),
                            file_id: record.file_id.clone(),
                            tree_path: tree_path.to_vec(),
                            name: name.clone(),
                        },
                    });
                    edited = true;
                }
            }
            None => {
                plan.push(PlannedOp {
                    kind: OpKind::Create,
                    description: format!("upload new file \"{}\"", rel_child.display()),
                    action: OpAction::UploadNew {
                        local: path.clone(),
                        tree_path: tree_path.to_vec(),
                        name: name.clone(),
                    },
                });
                edited = true;
            }
        }
    }

    // Mappings whose local file disappeared: trash the remote copy
    let gone: Vec<String> = node
        .mappings
        .keys()
        .filter(|name| {
            !local_files.contains_key(*name)
                && !node.is_ignored(name)
                && !matcher.matches(&rel.join(name))
        })
        .cloned()
        .collect();
    for name in gone {
        if let Some(record) = node.mappings.get(&name) {
            plan.push(PlannedOp {
                kind: OpKind::Delete,
                description: format!("trash remote file \"{}\"", rel.join(&name).display()),
                action: OpAction::TrashRemoteFile {
                    file_id: record.file_id.clone(),
                    tree_path: tree_path.to_vec(),
                    name: name.clone(),
                },
            });
            edited = true;
        }
    }

    if depth < max_depth {
        // New local directories become remote folders; the nest entry is
        // inserted now (with an empty id) so the subtree can be planned
        for name in local_dirs.keys() {
            if !node.nests.contains_key(name) {
                plan.push(PlannedOp {
                    kind: OpKind::Create,
                    description: format!("create remote folder \"{}\"", rel.join(name).display()),
                    action: OpAction::CreateRemoteFolder {
                        tree_path: tree_path.to_vec(),
                        name: name.clone(),
                    },
                });
                node.nests.insert(name.clone(), FolderNode::new(""));
                edited = true;
            }
        }

        let nest_names: Vec<String> = node.nests.keys().cloned().collect();
        for name in nest_names {
            if node.is_ignored(&name) || matcher.matches(&rel.join(&name)) {
                continue;
            }
            if let Some(local_dir) = local_dirs.get(&name) {
                let mut child_path = tree_path.to_vec();
                child_path.push(name.clone());
                if let Some(nest) = node.nests.get_mut(&name) {
                    edited |= plan_push_dir(
                        nest,
                        local_dir,
                        &rel.join(&name),
                        &child_path,
                        depth + 1,
                        max_depth,
                        matcher,
                        plan,
                        progress,
                    )?;
                }
            } else if let Some(nest) = node.nests.get(&name) {
                // Local directory removed: trash the whole remote folder
                plan.push(PlannedOp {
                    kind: OpKind::Delete,
                    description: format!("trash remote folder \"{}\"", rel.join(&name).display()),
                    action: OpAction::TrashRemoteFolder {
                        folder_id: nest.folder_id.clone(),
                        tree_path: tree_path.to_vec(),
                        name: name.clone(),
                    },
                });
                edited = true;
            }
        }
    }

    Ok(edited)
}

/// Reads a file's modification time as a UTC instant
pub(crate) fn file_mtime(path: &Path) -> Result<DateTime<Utc>, SyncError> {
    let metadata = std::fs::metadata(path).map_err(|e| SyncError::persistence(path, e))?;
    let modified = metadata
        .modified()
        .map_err(|e| SyncError::persistence(path, e))?;
    Ok(DateTime::<Utc>::from(modified))
}
