//! Stratus Sync - the reconciliation engine
//!
//! Implements the three tree walks that keep a local directory and a
//! remote folder in step:
//!
//! - **Fetch** refreshes the persisted sync-state tree from the live
//!   remote tree without touching local files ([`fetch`]).
//! - **Push** makes the remote tree match the local filesystem, using the
//!   sync-state tree as the last-known reference ([`push`]).
//! - **Pull** makes the local filesystem match the remote tree ([`pull`]).
//!
//! Push and pull first produce an [`ops::OperationPlan`]; the
//! [`ops::OperationExecutor`] prints it, asks for confirmation and applies
//! it in create → update → delete order, folding each successful
//! operation's effect back into the sync-state tree.
//!
//! All walks are depth-first, sequential, and bounded by the depth
//! recorded in the sync state; state deeper than the bound is trimmed,
//! never tracked.

pub mod fetch;
pub mod ignore;
pub mod ops;
pub mod progress;
pub mod pull;
pub mod push;
pub mod state;

pub use fetch::fetch;
pub use ignore::IgnoreMatcher;
pub use ops::{OpKind, OperationExecutor, OperationPlan, PlannedOp};
pub use progress::ProgressCounter;
pub use pull::plan_pull;
pub use push::plan_push;
pub use state::{count_local, FileRecord, FolderNode, SyncState};
