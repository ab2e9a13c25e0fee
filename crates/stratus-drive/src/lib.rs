//! Stratus Drive - REST adapter for the remote provider port
//!
//! Implements [`stratus_core::ports::IRemoteProvider`] against a
//! Drive-style HTTP API: listing by parent folder, metadata lookups,
//! whole-file uploads and downloads, metadata-only folder creation, and
//! trash semantics for deletion. Token acquisition and refresh are out of
//! scope; the client is handed a ready access token.

pub mod client;
pub mod provider;

pub use client::DriveClient;
pub use provider::DriveProvider;
