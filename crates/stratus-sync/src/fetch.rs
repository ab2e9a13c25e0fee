//! Fetch - refresh the sync-state tree from the live remote tree
//!
//! Fetch never touches the local filesystem: it walks the remote tree
//! through the listing cache, reconciles each folder level's mappings and
//! nests with what the remote reports, and returns whether anything
//! changed. The caller persists the state only when it did.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tracing::debug;

use stratus_cache::ListingCache;
use stratus_core::domain::SyncError;

use crate::ignore::IgnoreMatcher;
use crate::progress::ProgressCounter;
use crate::state::{FileRecord, FolderNode, SyncState};

/// Refreshes `state` against the live remote tree
///
/// Returns `true` when the tree was edited and needs persisting. A
/// failure anywhere in the walk unwinds immediately; the caller must not
/// persist the partially updated in-memory tree in that case.
pub async fn fetch(
    state: &mut SyncState,
    cache: &ListingCache,
    matcher: &IgnoreMatcher,
    progress: &mut ProgressCounter<'_>,
) -> Result<bool, SyncError> {
    let max_depth = state.depth;
    fetch_node(
        &mut state.structure,
        PathBuf::new(),
        0,
        max_depth,
        cache,
        matcher,
        progress,
    )
    .await
}

/// Reconciles one folder level and recurses into its nests
fn fetch_node<'a, 'b: 'a>(
    node: &'a mut FolderNode,
    rel: PathBuf,
    depth: u32,
    max_depth: u32,
    cache: &'a ListingCache,
    matcher: &'a IgnoreMatcher,
    progress: &'a mut ProgressCounter<'b>,
) -> Pin<Box<dyn Future<Output = Result<bool, SyncError>> + Send + 'a>> {
    Box::pin(async move {
        let listing = cache.get_children(&node.folder_id).await?;
        let mut edited = false;

        let tracked = |node: &FolderNode, name: &str, rel: &Path| {
            !node.is_ignored(name) && !matcher.matches(&rel.join(name))
        };

        // Remote deletions: drop mappings whose file id is no longer live
        let stale: Vec<String> = node
            .mappings
            .iter()
            .filter(|(name, record)| {
                tracked(node, name, &rel) && !listing.contains_file_id(&record.file_id)
            })
            .map(|(name, _)| name.clone())
            .collect();
        for name in stale {
            debug!(name = %name, rel = %rel.display(), "Mapping removed (file gone remotely)");
            node.mappings.remove(&name);
            edited = true;
        }

        // Live files: refresh or create mappings by name
        for file in &listing.files {
            if !tracked(node, &file.name, &rel) {
                continue;
            }
            progress.tick();

            match node.mappings.get_mut(&file.name) {
                Some(record) => {
                    if record.file_id != file.id {
                        record.file_id = file.id.clone();
                        edited = true;
                    }
                    if file.modified > record.last_synced {
                        record.last_synced = file.modified;
                        edited = true;
                    }
                }
                None => {
                    node.mappings.insert(
                        file.name.clone(),
                        FileRecord {
                            file_id: file.id.clone(),
                            last_synced: file.modified,
                        },
                    );
                    edited = true;
                }
            }
        }

        if depth < max_depth {
            // Mirror the mapping logic for nests against live folders
            let stale: Vec<String> = node
                .nests
                .iter()
                .filter(|(name, nest)| {
                    tracked(node, name, &rel) && !listing.contains_folder_id(&nest.folder_id)
                })
                .map(|(name, _)| name.clone())
                .collect();
            for name in stale {
                debug!(name = %name, rel = %rel.display(), "Nest removed (folder gone remotely)");
                node.nests.remove(&name);
                edited = true;
            }

            for folder in &listing.folders {
                if !tracked(node, &folder.name, &rel) {
                    continue;
                }
                progress.tick();

                if !node.nests.contains_key(&folder.name) {
                    node.nests
                        .insert(folder.name.clone(), FolderNode::new(&folder.id));
                    edited = true;
                }
            }

            let ignore = &node.ignore;
            for (name, nest) in node.nests.iter_mut() {
                if ignore.contains(name) {
                    continue;
                }
                let child_rel = rel.join(name);
                if matcher.matches(&child_rel) {
                    continue;
                }
                edited |= fetch_node(
                    nest,
                    child_rel,
                    depth + 1,
                    max_depth,
                    cache,
                    matcher,
                    progress,
                )
                .await?;
            }
        } else if !node.nests.is_empty() {
            // Trim policy: structure beyond the depth bound is forgotten
            debug!(rel = %rel.display(), "Trimming nests beyond depth bound");
            node.nests.clear();
            edited = true;
        }

        Ok(edited)
    })
}
