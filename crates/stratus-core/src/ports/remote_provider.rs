//! Remote provider port (driven/secondary port)
//!
//! The interface for all interactions with the cloud storage backend.
//! Implementations own the provider-specific API calls, authentication
//! headers and error mapping; transient-failure retry belongs inside the
//! adapter, so the engine may assume a call either succeeds or raises a
//! terminal [`SyncError`].

use std::path::Path;

use crate::domain::{RemoteFile, RemoteFolder, RemoteItem, RemoteListing, SyncError};

/// Fractional progress callback for transfers, called with values in 0.0..=1.0
pub type TransferProgress<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// Port trait for remote storage operations
///
/// Transfers are whole-file: `create_file` and `update_file` read the local
/// path and replace the remote content entirely, `download_file` replaces
/// the local file. Deletion is always a move to the provider trash, never a
/// permanent delete, so a bad run remains recoverable on the remote side.
#[async_trait::async_trait]
pub trait IRemoteProvider: Send + Sync {
    /// Lists the direct children of a remote folder, partitioned by type
    async fn list_children(&self, folder_id: &str) -> Result<RemoteListing, SyncError>;

    /// Resolves a single item by id; `RemoteNotFound` if the id is unknown
    async fn get_item(&self, id: &str) -> Result<RemoteItem, SyncError>;

    /// Uploads a new file into `folder_id`, returning the created item
    async fn create_file(
        &self,
        folder_id: &str,
        local_path: &Path,
        progress: TransferProgress<'_>,
    ) -> Result<RemoteFile, SyncError>;

    /// Replaces the content of an existing remote file
    async fn update_file(
        &self,
        file_id: &str,
        local_path: &Path,
        progress: TransferProgress<'_>,
    ) -> Result<RemoteFile, SyncError>;

    /// Downloads a remote file's content to `local_path`, replacing it
    async fn download_file(
        &self,
        file_id: &str,
        local_path: &Path,
        progress: TransferProgress<'_>,
    ) -> Result<(), SyncError>;

    /// Creates an empty remote folder under `parent_id`
    async fn create_folder(&self, parent_id: &str, name: &str)
        -> Result<RemoteFolder, SyncError>;

    /// Moves an item (file or folder) to the provider trash
    async fn trash_item(&self, id: &str) -> Result<(), SyncError>;

    /// Reparents an item under `new_parent_id`
    async fn move_item(&self, id: &str, new_parent_id: &str) -> Result<RemoteItem, SyncError>;

    /// Lists the current contents of the provider trash
    async fn list_trash(&self) -> Result<RemoteListing, SyncError>;

    /// Permanently deletes everything in the provider trash
    async fn empty_trash(&self) -> Result<(), SyncError>;
}
