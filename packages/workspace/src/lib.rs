//! # Atelier Workspace
//!
//! Synchronization of the live project tree with its version-controlled
//! fragment storage.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ editor: gate + live ProjectTree             │
//! └─────────────────────────────────────────────┘
//!                     ↓ split / ↑ rebuild
//! ┌─────────────────────────────────────────────┐
//! │ workspace: SyncOrchestrator                 │
//! │  - Resolve working copy (fresh clone)       │
//! │  - Split tree into fragment files, commit   │
//! │  - Pull remote state (merge at storage)     │
//! │  - Rebuild tree, re-lock created elements   │
//! │  - Notify observers                         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ transport: clone/commit/pull (external)     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The transport and notification layers are consumed through narrow
//! traits; this crate never talks to a VCS or a UI directly.

mod notify;
mod orchestrator;
mod transport;

pub use notify::{EventLog, NotificationSink, NullSink, SinkHook, TeamworkItem};
pub use orchestrator::{
    CycleState, SyncConfig, SyncError, SyncOrchestrator, SYNC_COMMIT_MESSAGE,
};
pub use transport::{CommitIdentity, LogProgress, MockTransport, ProgressSink, TransportError, VcsTransport};
