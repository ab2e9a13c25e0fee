//! Typed remote items
//!
//! The provider boundary decides once whether a remote entry is a file or
//! a folder and hands the engine a tagged [`RemoteItem`]; nothing past the
//! adapter ever inspects MIME strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::SyncError;

/// A file as reported by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Provider-assigned item id
    pub id: String,
    /// File name within its parent folder
    pub name: String,
    /// Last modification instant reported by the remote
    pub modified: DateTime<Utc>,
    /// Size in bytes
    pub size: u64,
}

/// A folder as reported by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFolder {
    /// Provider-assigned item id
    pub id: String,
    /// Folder name within its parent folder
    pub name: String,
}

/// A remote item, typed at the provider boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemoteItem {
    File(RemoteFile),
    Folder(RemoteFolder),
}

impl RemoteItem {
    /// The provider-assigned id, regardless of kind
    pub fn id(&self) -> &str {
        match self {
            RemoteItem::File(f) => &f.id,
            RemoteItem::Folder(f) => &f.id,
        }
    }

    /// The item name, regardless of kind
    pub fn name(&self) -> &str {
        match self {
            RemoteItem::File(f) => &f.name,
            RemoteItem::Folder(f) => &f.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, RemoteItem::Folder(_))
    }

    /// Unwraps the file payload, or fails with `NotAFile`
    pub fn into_file(self) -> Result<RemoteFile, SyncError> {
        match self {
            RemoteItem::File(f) => Ok(f),
            RemoteItem::Folder(f) => Err(SyncError::NotAFile(f.id)),
        }
    }

    /// Unwraps the folder payload, or fails with `NotAFolder`
    pub fn into_folder(self) -> Result<RemoteFolder, SyncError> {
        match self {
            RemoteItem::Folder(f) => Ok(f),
            RemoteItem::File(f) => Err(SyncError::NotAFolder(f.id)),
        }
    }
}

/// The children of one remote folder, partitioned by type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteListing {
    pub files: Vec<RemoteFile>,
    pub folders: Vec<RemoteFolder>,
}

impl RemoteListing {
    /// Looks up a child file by name
    pub fn file_named(&self, name: &str) -> Option<&RemoteFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Looks up a child folder by name
    pub fn folder_named(&self, name: &str) -> Option<&RemoteFolder> {
        self.folders.iter().find(|f| f.name == name)
    }

    /// True when a file with the given id is present
    pub fn contains_file_id(&self, id: &str) -> bool {
        self.files.iter().any(|f| f.id == id)
    }

    /// True when a folder with the given id is present
    pub fn contains_folder_id(&self, id: &str) -> bool {
        self.folders.iter().any(|f| f.id == id)
    }

    /// Splits the listing back into a flat item vector (used by the cache
    /// to write one row per child)
    pub fn items(&self) -> impl Iterator<Item = RemoteItem> + '_ {
        self.files
            .iter()
            .cloned()
            .map(RemoteItem::File)
            .chain(self.folders.iter().cloned().map(RemoteItem::Folder))
    }
}
