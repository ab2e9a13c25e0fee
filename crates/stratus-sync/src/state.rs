//! The persisted sync-state tree
//!
//! One [`SyncState`] per sync root, stored as `.stratus.json` in the root
//! directory. The tree records, per folder level, which file names map to
//! which remote file ids (and when the two sides last matched) and which
//! directory names nest into which remote folders. Structure deeper than
//! the recorded depth bound is intentionally forgotten, not tracked.
//!
//! Loading searches upward through parent directories so any command can
//! run from inside the tree, the way version-control tools locate their
//! repository root.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use stratus_core::domain::SyncError;

use crate::ignore::IgnoreMatcher;

/// File name of the persisted sync state, one per sync root
pub const STATE_FILE_NAME: &str = ".stratus.json";

/// File name of the per-root ignore pattern list
pub const IGNORE_FILE_NAME: &str = ".stratusignore";

/// The last point at which the local and remote copies of a named file
/// were known to match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRecord {
    /// Remote id of the file
    #[serde(rename = "fileId")]
    pub file_id: String,
    /// Instant of the last successful synchronization
    #[serde(rename = "timestamp")]
    pub last_synced: DateTime<Utc>,
}

/// One directory level of the sync-state tree
///
/// `mappings` and `nests` are BTree maps so serialization is
/// deterministic: saving an unchanged tree reproduces the file
/// byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolderNode {
    /// Remote id of the folder this level is paired with
    #[serde(rename = "folderId")]
    pub folder_id: String,
    /// File name -> sync record
    #[serde(default)]
    pub mappings: BTreeMap<String, FileRecord>,
    /// Directory name -> nested folder level
    #[serde(default)]
    pub nests: BTreeMap<String, FolderNode>,
    /// Names excluded from synchronization at this level only
    #[serde(default)]
    pub ignore: BTreeSet<String>,
}

impl FolderNode {
    pub fn new(folder_id: impl Into<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            mappings: BTreeMap::new(),
            nests: BTreeMap::new(),
            ignore: BTreeSet::new(),
        }
    }

    /// True when `name` is excluded at this level
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.contains(name)
    }

    /// Counts non-ignored mapped files in this node and every nest below it
    pub fn count_files(&self) -> usize {
        let own = self
            .mappings
            .keys()
            .filter(|name| !self.is_ignored(name))
            .count();
        let nested: usize = self
            .nests
            .iter()
            .filter(|(name, _)| !self.is_ignored(name))
            .map(|(_, nest)| nest.count_files())
            .sum();
        own + nested
    }

    /// Navigates to the node at the given nest-name path
    pub fn node_at(&self, path: &[String]) -> Option<&FolderNode> {
        let mut node = self;
        for name in path {
            node = node.nests.get(name)?;
        }
        Some(node)
    }

    /// Mutable variant of [`FolderNode::node_at`]
    pub fn node_at_mut(&mut self, path: &[String]) -> Option<&mut FolderNode> {
        let mut node = self;
        for name in path {
            node = node.nests.get_mut(name)?;
        }
        Some(node)
    }
}

/// The persisted aggregate: a depth bound plus the root folder node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncState {
    /// Maximum nesting depth tracked below the root (root itself is depth 0)
    pub depth: u32,
    /// The root folder level
    pub structure: FolderNode,
}

impl SyncState {
    pub fn new(root_folder_id: impl Into<String>, depth: u32) -> Self {
        Self {
            depth,
            structure: FolderNode::new(root_folder_id),
        }
    }

    /// Total non-ignored mapped files across the tree
    pub fn count(&self) -> usize {
        self.structure.count_files()
    }

    /// Path of the state file under a given sync root
    pub fn file_path(root: &Path) -> PathBuf {
        root.join(STATE_FILE_NAME)
    }

    /// Locates and loads the nearest sync state at or above `dir`
    ///
    /// Searches at most `search_depth` parent levels. Returns the state
    /// together with the directory that owns it (the sync root).
    ///
    /// # Errors
    ///
    /// `NotInitialized` when no state file is found within the bound;
    /// `CorruptState` when a file is found but does not parse as a valid
    /// tree.
    pub fn load(dir: &Path, search_depth: u32) -> Result<(SyncState, PathBuf), SyncError> {
        let mut current = dir.to_path_buf();
        for _ in 0..=search_depth {
            let candidate = Self::file_path(&current);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "Found sync state");
                let state = Self::read_file(&candidate)?;
                return Ok((state, current));
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }
        Err(SyncError::NotInitialized)
    }

    /// Parses a state file, rejecting structurally invalid trees up front
    fn read_file(path: &Path) -> Result<SyncState, SyncError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SyncError::persistence(path, e))?;
        serde_json::from_str(&content).map_err(|e| SyncError::CorruptState {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Serializes and atomically replaces the state file under `root`
    ///
    /// Writes to a temporary sibling first and renames over the target, so
    /// a crash mid-write can never leave a half-written state behind.
    pub fn save(&self, root: &Path) -> Result<(), SyncError> {
        let target = Self::file_path(root);
        let tmp = root.join(format!("{}.tmp", STATE_FILE_NAME));

        let mut content = serde_json::to_string_pretty(self).map_err(|e| {
            SyncError::persistence(
                &target,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        content.push('\n');

        std::fs::write(&tmp, content).map_err(|e| SyncError::persistence(&tmp, e))?;
        std::fs::rename(&tmp, &target).map_err(|e| SyncError::persistence(&target, e))?;

        debug!(path = %target.display(), "Saved sync state");
        Ok(())
    }

    /// Creates a fresh state file in `root` for `stratus init`
    ///
    /// # Errors
    ///
    /// `AlreadyInitialized` when the directory already has a state file.
    pub fn init(root: &Path, root_folder_id: &str, depth: u32) -> Result<SyncState, SyncError> {
        let target = Self::file_path(root);
        if target.exists() {
            return Err(SyncError::AlreadyInitialized(target));
        }
        let state = SyncState::new(root_folder_id, depth);
        state.save(root)?;
        Ok(state)
    }
}

/// Counts live local files the way [`SyncState::count`] counts mapped ones
///
/// Walks the filesystem below `root` to the state's depth bound, skipping
/// names the matcher or the corresponding node's ignore set excludes.
/// Below a directory the tree does not know yet there is no node-level
/// ignore set, so everything the matcher allows is counted.
pub fn count_local(
    state: &SyncState,
    root: &Path,
    matcher: &IgnoreMatcher,
) -> Result<usize, SyncError> {
    count_local_dir(
        Some(&state.structure),
        root,
        Path::new(""),
        state.depth,
        matcher,
    )
}

fn count_local_dir(
    node: Option<&FolderNode>,
    dir: &Path,
    rel: &Path,
    depth_left: u32,
    matcher: &IgnoreMatcher,
) -> Result<usize, SyncError> {
    let mut total = 0;

    let entries = std::fs::read_dir(dir).map_err(|e| SyncError::persistence(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| SyncError::persistence(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel_child = rel.join(&name);

        if matcher.matches(&rel_child) {
            continue;
        }
        if node.is_some_and(|n| n.is_ignored(&name)) {
            continue;
        }

        let file_type = entry
            .file_type()
            .map_err(|e| SyncError::persistence(entry.path(), e))?;
        if file_type.is_file() {
            total += 1;
        } else if file_type.is_dir() && depth_left > 0 {
            let child_node = node.and_then(|n| n.nests.get(&name));
            total += count_local_dir(child_node, &entry.path(), &rel_child, depth_left - 1, matcher)?;
        }
    }

    Ok(total)
}
