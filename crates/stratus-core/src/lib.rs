//! Stratus Core - domain types and port definitions
//!
//! This crate contains the shared vocabulary of the Stratus workspace:
//! - **Domain types** - `RemoteItem`, `RemoteListing`, the `SyncError` taxonomy
//! - **Port definitions** - traits implemented by adapter crates:
//!   `IRemoteProvider` (cloud storage), `IProgressSink` (progress reporting)
//! - **Configuration** - the typed YAML configuration file
//!
//! # Architecture
//!
//! Stratus follows a ports & adapters layout. This crate has no I/O beyond
//! config loading; the reconciliation engine (`stratus-sync`) depends only
//! on the traits defined here, and concrete adapters (`stratus-drive`,
//! `stratus-cache`, the CLI progress bar) are injected at the command
//! dispatch boundary.

pub mod config;
pub mod domain;
pub mod ports;
