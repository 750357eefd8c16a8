//! # Version-Control Transport
//!
//! The synchronization cycle consumes the backend through this narrow
//! trait: clone, commit, pull. Whatever three-way merging the backend does
//! during a pull happens at the storage layer; the cycle only consumes
//! success or failure.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;
use tracing::info;

/// Failure surfaced by the backend
#[derive(Error, Debug, Clone, PartialEq)]
#[error("transport error: {cause}")]
pub struct TransportError {
    pub cause: String,
}

impl TransportError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// Receiver for pull progress messages
pub trait ProgressSink {
    fn progress(&self, message: &str);
}

/// Progress sink that logs instead of driving a dialog
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn progress(&self, message: &str) {
        info!(target: "atelier::sync", "{}", message);
    }
}

/// Identity used for synchronization commits
#[derive(Debug, Clone, PartialEq)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

impl CommitIdentity {
    /// Fixed synchronization identity for a collaborator
    pub fn for_user(name: &str) -> Self {
        Self {
            name: name.to_string(),
            email: format!("{}@noreply.com", name),
        }
    }
}

/// The version-control primitives the cycle needs
pub trait VcsTransport {
    /// Clone the project into a local working copy
    fn clone_repo(&self, remote_ref: &str, local: &Path) -> Result<(), TransportError>;

    /// Commit the working copy locally
    fn commit(
        &self,
        local: &Path,
        identity: &CommitIdentity,
        message: &str,
    ) -> Result<(), TransportError>;

    /// Merge the remote's latest state into the working copy and return the
    /// merged path
    fn pull(&self, local: &Path, progress: &dyn ProgressSink) -> Result<PathBuf, TransportError>;
}

/// Scripted transport for tests: records calls, injects failures, and can
/// run a closure at pull time to simulate remote changes landing in the
/// working copy.
#[derive(Default)]
pub struct MockTransport {
    fail_commit: bool,
    fail_pull: bool,
    on_pull: Option<Box<dyn Fn()>>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn failing_pull(mut self) -> Self {
        self.fail_pull = true;
        self
    }

    /// Run the closure whenever a pull succeeds
    pub fn with_on_pull(mut self, f: impl Fn() + 'static) -> Self {
        self.on_pull = Some(Box::new(f));
        self
    }

    /// Shared handle onto the recorded call names
    pub fn call_log(&self) -> Rc<RefCell<Vec<String>>> {
        self.calls.clone()
    }
}

impl VcsTransport for MockTransport {
    fn clone_repo(&self, remote_ref: &str, _local: &Path) -> Result<(), TransportError> {
        self.calls.borrow_mut().push(format!("clone {}", remote_ref));
        Ok(())
    }

    fn commit(
        &self,
        _local: &Path,
        identity: &CommitIdentity,
        message: &str,
    ) -> Result<(), TransportError> {
        self.calls
            .borrow_mut()
            .push(format!("commit {} {}", identity.name, message));
        if self.fail_commit {
            return Err(TransportError::new("commit refused"));
        }
        Ok(())
    }

    fn pull(&self, local: &Path, progress: &dyn ProgressSink) -> Result<PathBuf, TransportError> {
        self.calls.borrow_mut().push("pull".to_string());
        if self.fail_pull {
            return Err(TransportError::new("remote unreachable"));
        }
        progress.progress("Connecting to server...");
        if let Some(on_pull) = &self.on_pull {
            on_pull();
        }
        Ok(local.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_identity_email() {
        let identity = CommitIdentity::for_user("alice");
        assert_eq!(identity.email, "alice@noreply.com");
    }

    #[test]
    fn test_mock_transport_records_calls() {
        let transport = MockTransport::new();
        let calls = transport.call_log();

        transport
            .clone_repo("https://example.com/projects/demo", Path::new("/tmp/demo"))
            .unwrap();
        transport
            .commit(
                Path::new("/tmp/demo"),
                &CommitIdentity::for_user("alice"),
                "Committing local changes",
            )
            .unwrap();

        assert_eq!(calls.borrow().len(), 2);
        assert!(calls.borrow()[0].starts_with("clone"));
    }

    #[test]
    fn test_mock_transport_failure_injection() {
        let transport = MockTransport::new().failing_pull();
        let err = transport
            .pull(Path::new("/tmp/demo"), &LogProgress)
            .unwrap_err();
        assert_eq!(err, TransportError::new("remote unreachable"));
    }
}
