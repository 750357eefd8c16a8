//! # Notifications
//!
//! Fire-and-forget events for the UI/session layers: project updates,
//! element creation, synchronization failures. Consumers register a sink;
//! the core never drives a dialog itself.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Local};

use atelier_editor::GateHook;

/// Observer interface for session-level events
pub trait NotificationSink {
    fn project_updated(&self, _project: &str, _user: &str) {}
    fn elements_created(&self, _ids: &[String]) {}
    fn sync_failed(&self, _project: &str, _user: &str, _message: &str) {}
}

/// Sink that discards everything
pub struct NullSink;

impl NotificationSink for NullSink {}

/// One entry in the teamwork event feed
#[derive(Debug, Clone)]
pub struct TeamworkItem {
    pub title: String,
    pub message: String,
    pub time: DateTime<Local>,
    pub user: String,
}

/// Timestamped teamwork event feed
///
/// Cloning yields a handle onto the same feed, so a UI (or a test) can keep
/// reading while the orchestrator holds its own handle.
#[derive(Clone, Default)]
pub struct EventLog {
    items: Rc<RefCell<Vec<TeamworkItem>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, title: &str, message: &str, user: &str) {
        self.items.borrow_mut().push(TeamworkItem {
            title: title.to_string(),
            message: message.to_string(),
            time: Local::now(),
            user: user.to_string(),
        });
    }

    pub fn items(&self) -> Vec<TeamworkItem> {
        self.items.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl NotificationSink for EventLog {
    fn project_updated(&self, project: &str, user: &str) {
        self.add("Update Project", &format!("Project {} updated", project), user);
    }

    fn elements_created(&self, ids: &[String]) {
        self.add("Elements Created", &ids.join(", "), "");
    }

    fn sync_failed(&self, project: &str, user: &str, message: &str) {
        self.add("Error", &format!("{}: {}", project, message), user);
    }
}

/// Adapter wiring a notification sink onto the gate's hook seam, so
/// element-creation events reach observers without the gate knowing about
/// sinks.
pub struct SinkHook<S: NotificationSink> {
    sink: S,
}

impl<S: NotificationSink> SinkHook<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S: NotificationSink> GateHook for SinkHook<S> {
    fn elements_created(&self, ids: &[String]) {
        self.sink.elements_created(ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_records_items() {
        let log = EventLog::new();
        log.project_updated("demo", "alice");
        log.sync_failed("demo", "alice", "remote unreachable");

        let items = log.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Update Project");
        assert_eq!(items[0].user, "alice");
        assert_eq!(items[1].title, "Error");
    }

    #[test]
    fn test_event_log_shared_handle() {
        let log = EventLog::new();
        let handle = log.clone();
        log.add("Note", "hello", "alice");
        assert_eq!(handle.len(), 1);
    }
}
