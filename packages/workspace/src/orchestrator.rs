//! # Synchronization Orchestrator
//!
//! Drives one update cycle: resolve the working copy, split the live tree
//! into fragment files, commit, pull, rebuild, notify.
//!
//! ## Design
//!
//! - Steps run strictly in sequence; a second cycle request while one is in
//!   flight is rejected, never interleaved.
//! - A commit or pull failure ends the cycle before the live model is
//!   touched: the tree stays whatever it was, the error is reported once
//!   through the sink, and the user retries manually.
//! - The rebuild is trusted synchronization traffic: the gate's lock bypass
//!   is armed once right before the rebuilt tree is adopted.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use atelier_common::{CommonError, FragmentFiles};
use atelier_editor::OperationGate;
use atelier_model::{assemble, AssemblyError, FragmentStore, ProjectTree};

use crate::notify::NotificationSink;
use crate::transport::{CommitIdentity, LogProgress, TransportError, VcsTransport};

/// Fixed message for synchronization commits
pub const SYNC_COMMIT_MESSAGE: &str = "Committing local changes";

/// Where the update cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    ResolvingWorkdir,
    Committing,
    Pulling,
    Merging,
    Rebuilding,
    Notifying,
    /// Terminal for the cycle; the next run starts over
    Failed,
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("a synchronization cycle is already in flight")]
    CycleInFlight,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("fragment storage error: {0}")]
    Storage(#[from] CommonError),
}

/// Settings for one collaborator's working session
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base reference remote projects live under
    pub remote_base: String,
    /// Directory local working copies live under
    pub workdir_root: PathBuf,
    /// Acting collaborator
    pub user: String,
}

impl SyncConfig {
    fn remote_ref(&self, project: &str) -> String {
        format!("{}/{}", self.remote_base.trim_end_matches('/'), project)
    }

    fn workdir(&self, project: &str) -> PathBuf {
        self.workdir_root.join(project)
    }
}

/// Sequences commit/pull/merge/rebuild around the live model
pub struct SyncOrchestrator {
    config: SyncConfig,
    transport: Box<dyn VcsTransport>,
    files: Box<dyn FragmentFiles>,
    sink: Box<dyn NotificationSink>,
    state: CycleState,
}

impl SyncOrchestrator {
    pub fn new(
        config: SyncConfig,
        transport: Box<dyn VcsTransport>,
        files: Box<dyn FragmentFiles>,
        sink: Box<dyn NotificationSink>,
    ) -> Self {
        Self {
            config,
            transport,
            files,
            sink,
            state: CycleState::Idle,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Run one full update cycle for the named project.
    ///
    /// On success the rebuilt tree replaces `tree` and observers are
    /// notified. On failure the tree is untouched and the error has been
    /// reported once through the sink.
    pub fn run_sync_cycle(
        &mut self,
        project: &str,
        tree: &mut ProjectTree,
        gate: &mut OperationGate,
    ) -> Result<(), SyncError> {
        if !matches!(self.state, CycleState::Idle | CycleState::Failed) {
            return Err(SyncError::CycleInFlight);
        }

        match self.cycle(project, tree, gate) {
            Ok(()) => {
                self.state = CycleState::Idle;
                Ok(())
            }
            Err(err) => {
                self.state = CycleState::Failed;
                self.sink
                    .sync_failed(project, &self.config.user, &err.to_string());
                Err(err)
            }
        }
    }

    fn cycle(
        &mut self,
        project: &str,
        tree: &mut ProjectTree,
        gate: &mut OperationGate,
    ) -> Result<(), SyncError> {
        let workdir = self.config.workdir(project);

        self.state = CycleState::ResolvingWorkdir;
        info!(project, workdir = %workdir.display(), "resolving working copy");
        self.transport
            .clone_repo(&self.config.remote_ref(project), &workdir)?;

        self.state = CycleState::Committing;
        let pending = gate.take_pending_changes();
        debug!(project, pending = pending.len(), "splitting project into fragments");
        self.split(tree, &workdir)?;
        let identity = CommitIdentity::for_user(&self.config.user);
        self.transport
            .commit(&workdir, &identity, SYNC_COMMIT_MESSAGE)?;

        self.state = CycleState::Pulling;
        let merged = self.transport.pull(&workdir, &LogProgress)?;

        // Any three-way merging happened inside the pull, at the storage
        // layer; from here on only the merged content matters.
        self.state = CycleState::Merging;

        self.state = CycleState::Rebuilding;
        let raw = self.files.list_fragment_files(&merged)?;
        let store = FragmentStore::from_raw(raw)?;

        // Elements authored locally this session lose their is_new mark in
        // the rebuild; re-claim them so the author can keep editing.
        let created: Vec<String> = tree
            .iter()
            .filter(|n| n.is_new)
            .map(|n| n.id.clone())
            .collect();

        let mut rebuilt = assemble(&store)?;
        rebuilt.adopt();
        // Adopting the rebuilt tree triggers view/selection bookkeeping in
        // the editing layer; that first post-sync operation is trusted
        // synchronization traffic and must not hit lock checks. The gate's
        // bypass is single-slot, so exactly one operation is exempt.
        gate.set_ignore_locks(true);
        *tree = rebuilt;
        for id in created {
            if tree.contains(&id) {
                gate.locks_mut().lock(&id, &self.config.user);
            }
        }
        info!(project, nodes = tree.node_count(), "project tree rebuilt");

        self.state = CycleState::Notifying;
        self.sink.project_updated(project, &self.config.user);
        Ok(())
    }

    /// Flatten the live tree into one fragment file per element
    fn split(&self, tree: &ProjectTree, workdir: &Path) -> Result<(), SyncError> {
        for fragment in tree.to_fragments() {
            let raw = serde_json::to_string_pretty(&fragment).map_err(CommonError::from)?;
            self.files
                .write_fragment_file(workdir, &fragment.id, &raw)?;
        }
        Ok(())
    }
}
