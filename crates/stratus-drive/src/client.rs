//! Drive API HTTP client
//!
//! A typed wrapper over `reqwest::Client` that owns the base URLs, the
//! bearer token, and response status mapping into the [`SyncError`]
//! taxonomy. The base URLs are overridable so tests can point the client
//! at a mock server.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};

use stratus_core::domain::SyncError;

/// Base URL for metadata and listing requests
const API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Base URL for content upload requests
const UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";

/// HTTP client for Drive API calls
pub struct DriveClient {
    client: Client,
    base_url: String,
    upload_base_url: String,
    access_token: String,
}

impl DriveClient {
    /// Creates a client with the production base URLs
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_urls(access_token, API_BASE_URL, UPLOAD_BASE_URL)
    }

    /// Creates a client with custom base URLs (useful for testing)
    pub fn with_base_urls(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
        upload_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            upload_base_url: upload_base_url.into(),
            access_token: access_token.into(),
        }
    }

    /// Authenticated request builder against the API base URL
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
    }

    /// Authenticated request builder against the upload base URL
    pub fn upload_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.upload_base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
    }

    /// Maps a response's status into the error taxonomy
    ///
    /// `context` names the id or operation the call was about, so a 404
    /// becomes a `RemoteNotFound` carrying something useful.
    pub async fn check(response: Response, context: &str) -> Result<Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(SyncError::RemoteNotFound(context.to_string()));
        }
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::RemoteOperationFailed(format!(
            "{}: HTTP {} {}",
            context,
            status.as_u16(),
            body
        )))
    }
}

/// Maps transport-level failures into the error taxonomy
pub(crate) fn transport_error(context: &str, err: reqwest::Error) -> SyncError {
    SyncError::RemoteOperationFailed(format!("{}: {}", context, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builds_authenticated_url() {
        let client = DriveClient::with_base_urls("tok", "http://localhost:9", "http://localhost:9/up");
        let request = client.request(Method::GET, "/files/abc").build().unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:9/files/abc");
        let auth = request.headers().get("authorization").unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer tok");
    }

    #[test]
    fn test_upload_request_uses_upload_base() {
        let client = DriveClient::with_base_urls("tok", "http://a", "http://b");
        let request = client
            .upload_request(Method::PATCH, "/files/abc")
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://b/files/abc");
    }
}
