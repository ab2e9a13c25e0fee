//! The remote provider implementation over the Drive API
//!
//! [`DriveProvider`] translates every port call into one or two HTTP
//! requests and decides once, at this boundary, whether each returned
//! item is a file or a folder; the rest of the workspace only ever sees
//! the typed [`RemoteItem`] union. Transfers are whole-file: the progress
//! callback reports 0.0 when a transfer starts and 1.0 when it completes.

use std::path::Path;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use stratus_core::domain::{RemoteFile, RemoteFolder, RemoteItem, RemoteListing, SyncError};
use stratus_core::ports::remote_provider::TransferProgress;
use stratus_core::ports::IRemoteProvider;

use crate::client::{transport_error, DriveClient};

/// MIME type the service uses to mark folders
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Metadata fields requested on every item response
const ITEM_FIELDS: &str = "id,name,mimeType,modifiedTime,size";

// ============================================================================
// Wire types
// ============================================================================

/// One item as the API returns it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveItem {
    id: String,
    name: String,
    mime_type: String,
    modified_time: Option<String>,
    /// The API reports sizes as decimal strings
    size: Option<String>,
}

/// Response shape of a file listing request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveItem>,
    next_page_token: Option<String>,
}

/// Response shape of a parents lookup
#[derive(Debug, Deserialize)]
struct ParentsOnly {
    #[serde(default)]
    parents: Vec<String>,
}

impl DriveItem {
    /// Decides the item's type once, at the adapter boundary
    fn into_remote_item(self) -> RemoteItem {
        if self.mime_type == FOLDER_MIME_TYPE {
            RemoteItem::Folder(RemoteFolder {
                id: self.id,
                name: self.name,
            })
        } else {
            let modified = self
                .modified_time
                .as_deref()
                .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            let size = self
                .size
                .as_deref()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            RemoteItem::File(RemoteFile {
                id: self.id,
                name: self.name,
                modified,
                size,
            })
        }
    }
}

fn partition(items: Vec<DriveItem>) -> RemoteListing {
    let mut listing = RemoteListing::default();
    for item in items {
        match item.into_remote_item() {
            RemoteItem::File(file) => listing.files.push(file),
            RemoteItem::Folder(folder) => listing.folders.push(folder),
        }
    }
    listing
}

// ============================================================================
// Provider
// ============================================================================

/// [`IRemoteProvider`] implementation backed by a [`DriveClient`]
pub struct DriveProvider {
    client: DriveClient,
}

impl DriveProvider {
    pub fn new(client: DriveClient) -> Self {
        Self { client }
    }

    /// Runs one listing query, following page tokens until exhausted
    async fn list_query(&self, query: &str, context: &str) -> Result<RemoteListing, SyncError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let fields = format!("files({}),nextPageToken", ITEM_FIELDS);

        loop {
            let mut request = self.client.request(Method::GET, "/files").query(&[
                ("q", query),
                ("fields", fields.as_str()),
                ("pageSize", "1000"),
            ]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| transport_error(context, e))?;
            let page: FileList = DriveClient::check(response, context)
                .await?
                .json()
                .await
                .map_err(|e| transport_error(context, e))?;

            items.extend(page.files);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(context, items = items.len(), "Listing query complete");
        Ok(partition(items))
    }

    /// Extracts the file name an upload should use
    fn upload_name(local_path: &Path) -> Result<String, SyncError> {
        local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                SyncError::InvalidArgument(format!(
                    "cannot upload {}: path has no file name",
                    local_path.display()
                ))
            })
    }
}

#[async_trait::async_trait]
impl IRemoteProvider for DriveProvider {
    async fn list_children(&self, folder_id: &str) -> Result<RemoteListing, SyncError> {
        let query = format!("'{}' in parents and trashed = false", folder_id);
        self.list_query(&query, folder_id).await
    }

    async fn get_item(&self, id: &str) -> Result<RemoteItem, SyncError> {
        let response = self
            .client
            .request(Method::GET, &format!("/files/{}", id))
            .query(&[("fields", ITEM_FIELDS)])
            .send()
            .await
            .map_err(|e| transport_error(id, e))?;

        let item: DriveItem = DriveClient::check(response, id)
            .await?
            .json()
            .await
            .map_err(|e| transport_error(id, e))?;

        Ok(item.into_remote_item())
    }

    async fn create_file(
        &self,
        folder_id: &str,
        local_path: &Path,
        progress: TransferProgress<'_>,
    ) -> Result<RemoteFile, SyncError> {
        let name = Self::upload_name(local_path)?;
        let content = tokio::fs::read(local_path)
            .await
            .map_err(|e| SyncError::persistence(local_path, e))?;

        debug!(name = %name, folder_id, bytes = content.len(), "Uploading new file");
        progress(0.0);

        let metadata = serde_json::json!({
            "name": name,
            "parents": [folder_id],
        });
        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")
                    .map_err(|e| transport_error(&name, e))?,
            )
            .part(
                "media",
                reqwest::multipart::Part::bytes(content).file_name(name.clone()),
            );

        let response = self
            .client
            .upload_request(Method::POST, "/files")
            .query(&[("uploadType", "multipart"), ("fields", ITEM_FIELDS)])
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(&name, e))?;

        let item: DriveItem = DriveClient::check(response, &name)
            .await?
            .json()
            .await
            .map_err(|e| transport_error(&name, e))?;

        progress(1.0);
        item.into_remote_item().into_file()
    }

    async fn update_file(
        &self,
        file_id: &str,
        local_path: &Path,
        progress: TransferProgress<'_>,
    ) -> Result<RemoteFile, SyncError> {
        let content = tokio::fs::read(local_path)
            .await
            .map_err(|e| SyncError::persistence(local_path, e))?;

        debug!(file_id, bytes = content.len(), "Replacing file content");
        progress(0.0);

        let response = self
            .client
            .upload_request(Method::PATCH, &format!("/files/{}", file_id))
            .query(&[("uploadType", "media"), ("fields", ITEM_FIELDS)])
            .body(content)
            .send()
            .await
            .map_err(|e| transport_error(file_id, e))?;

        let item: DriveItem = DriveClient::check(response, file_id)
            .await?
            .json()
            .await
            .map_err(|e| transport_error(file_id, e))?;

        progress(1.0);
        item.into_remote_item().into_file()
    }

    async fn download_file(
        &self,
        file_id: &str,
        local_path: &Path,
        progress: TransferProgress<'_>,
    ) -> Result<(), SyncError> {
        debug!(file_id, target = %local_path.display(), "Downloading file");
        progress(0.0);

        let response = self
            .client
            .request(Method::GET, &format!("/files/{}", file_id))
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| transport_error(file_id, e))?;

        let bytes = DriveClient::check(response, file_id)
            .await?
            .bytes()
            .await
            .map_err(|e| transport_error(file_id, e))?;

        tokio::fs::write(local_path, &bytes)
            .await
            .map_err(|e| SyncError::persistence(local_path, e))?;

        progress(1.0);
        Ok(())
    }

    async fn create_folder(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<RemoteFolder, SyncError> {
        debug!(name, parent_id, "Creating remote folder");

        let body = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent_id],
        });

        let response = self
            .client
            .request(Method::POST, "/files")
            .query(&[("fields", ITEM_FIELDS)])
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(name, e))?;

        let item: DriveItem = DriveClient::check(response, name)
            .await?
            .json()
            .await
            .map_err(|e| transport_error(name, e))?;

        item.into_remote_item().into_folder()
    }

    async fn trash_item(&self, id: &str) -> Result<(), SyncError> {
        debug!(id, "Moving item to trash");

        let response = self
            .client
            .request(Method::PATCH, &format!("/files/{}", id))
            .json(&serde_json::json!({ "trashed": true }))
            .send()
            .await
            .map_err(|e| transport_error(id, e))?;

        DriveClient::check(response, id).await?;
        Ok(())
    }

    async fn move_item(&self, id: &str, new_parent_id: &str) -> Result<RemoteItem, SyncError> {
        // The API models moves as a parent swap, so the current parents
        // have to be read first
        let response = self
            .client
            .request(Method::GET, &format!("/files/{}", id))
            .query(&[("fields", "parents")])
            .send()
            .await
            .map_err(|e| transport_error(id, e))?;

        let parents: ParentsOnly = DriveClient::check(response, id)
            .await?
            .json()
            .await
            .map_err(|e| transport_error(id, e))?;

        debug!(id, new_parent_id, "Moving item");

        let response = self
            .client
            .request(Method::PATCH, &format!("/files/{}", id))
            .query(&[
                ("addParents", new_parent_id),
                ("removeParents", parents.parents.join(",").as_str()),
                ("fields", ITEM_FIELDS),
            ])
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| transport_error(id, e))?;

        let item: DriveItem = DriveClient::check(response, id)
            .await?
            .json()
            .await
            .map_err(|e| transport_error(id, e))?;

        Ok(item.into_remote_item())
    }

    async fn list_trash(&self) -> Result<RemoteListing, SyncError> {
        self.list_query("trashed = true", "trash").await
    }

    async fn empty_trash(&self) -> Result<(), SyncError> {
        let response = self
            .client
            .request(Method::DELETE, "/files/trash")
            .send()
            .await
            .map_err(|e| transport_error("trash", e))?;

        DriveClient::check(response, "trash").await?;
        Ok(())
    }
}
