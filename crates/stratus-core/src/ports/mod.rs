//! Port definitions (adapter interfaces)
//!
//! Ports are the traits the engine depends on; their implementations live
//! in adapter crates and are injected at the command-dispatch boundary.
//!
//! - [`IRemoteProvider`] - remote storage operations (list/get/transfer/trash)
//! - [`IProgressSink`] - progress reporting to whatever front end is attached

pub mod progress;
pub mod remote_provider;

pub use progress::{IProgressSink, NullProgressSink};
pub use remote_provider::IRemoteProvider;
