//! # Lock Table
//!
//! Tracks which element identifiers are locked and by which collaborator.
//! Lock state lives for the working session only; persistence is the
//! backend's business.

use std::collections::HashMap;

/// Mapping of element identifier → owning collaborator
#[derive(Debug, Clone, Default)]
pub struct LockTable {
    locks: HashMap<String, String>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim an element for a collaborator, replacing any previous claim
    pub fn lock(&mut self, id: impl Into<String>, owner: impl Into<String>) {
        self.locks.insert(id.into(), owner.into());
    }

    pub fn unlock(&mut self, id: &str) {
        self.locks.remove(id);
    }

    pub fn is_locked(&self, id: &str) -> bool {
        self.locks.contains_key(id)
    }

    pub fn owner_of(&self, id: &str) -> Option<&str> {
        self.locks.get(id).map(String::as_str)
    }

    /// Identifiers currently locked, in no particular order
    pub fn locked_elements(&self) -> Vec<String> {
        self.locks.keys().cloned().collect()
    }

    /// Release every lock held by one collaborator (after a successful
    /// commit the committer's locks are no longer needed)
    pub fn unlock_owned(&mut self, owner: &str) {
        self.locks.retain(|_, o| o != owner);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
