//! # Operation Gate
//!
//! Intercepts every operation proposed against the live model and decides
//! accept/reject before any primitive edit is applied.
//!
//! ## Design
//!
//! - Ungoverned models (not a teamwork project) accept everything.
//! - `ignore_locks` is a single-slot bypass for trusted synchronization
//!   traffic: the next operation skips lock checks and the flag resets.
//!   Every code path leaves the flag false afterward.
//! - Lock checks run over the whole batch first, then structural
//!   validation, then application. A rejected batch applies nothing.
//! - "move views" operations skip the generic per-element check (views are
//!   repositioned without ownership semantics) but the primary target's
//!   container is still checked.
//! - No ambient event bus: the sync layer and notification sinks register
//!   for before/after/created callbacks through explicit hooks.

use std::collections::{BTreeSet, HashSet};

use serde_json::Value;
use tracing::{debug, warn};

use atelier_model::ProjectTree;

use crate::errors::{GateError, LockViolation};
use crate::locks::LockTable;
use crate::operations::{Operation, PrimitiveEdit};

/// Extension points fired around accepted operations
pub trait GateHook {
    /// The proposed operation, before any edit is applied
    fn before_apply(&self, _op: &Operation) {}

    /// An accepted operation and the element ids it touched
    fn after_apply(&self, _op: &Operation, _changed: &[String]) {}

    /// Elements materialized by an accepted operation
    fn elements_created(&self, _ids: &[String]) {}
}

/// Lock-gated interceptor for model operations
pub struct OperationGate {
    current_user: String,
    governed: bool,
    ignore_locks: bool,
    locks: LockTable,
    pending_changes: BTreeSet<String>,
    hooks: Vec<Box<dyn GateHook>>,
}

impl OperationGate {
    pub fn new(current_user: impl Into<String>) -> Self {
        Self {
            current_user: current_user.into(),
            governed: false,
            ignore_locks: false,
            locks: LockTable::new(),
            pending_changes: BTreeSet::new(),
            hooks: Vec::new(),
        }
    }

    /// Put the live model under collaborative-lock governance
    pub fn set_governed(&mut self, governed: bool) {
        self.governed = governed;
    }

    pub fn is_governed(&self) -> bool {
        self.governed
    }

    /// Arm the single-slot bypass for the next operation
    pub fn set_ignore_locks(&mut self, ignore: bool) {
        self.ignore_locks = ignore;
    }

    pub fn ignore_locks(&self) -> bool {
        self.ignore_locks
    }

    pub fn current_user(&self) -> &str {
        &self.current_user
    }

    pub fn locks(&self) -> &LockTable {
        &self.locks
    }

    pub fn locks_mut(&mut self) -> &mut LockTable {
        &mut self.locks
    }

    pub fn add_hook(&mut self, hook: Box<dyn GateHook>) {
        self.hooks.push(hook);
    }

    /// Drain the element ids touched by accepted operations since the last
    /// call; the sync layer flattens and commits these.
    pub fn take_pending_changes(&mut self) -> BTreeSet<String> {
        std::mem::take(&mut self.pending_changes)
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending_changes.is_empty()
    }

    /// Propose an operation against the live model.
    ///
    /// Returns the changed element ids on acceptance. On rejection the
    /// tree, the lock table and the pending-change set are untouched.
    pub fn propose(
        &mut self,
        tree: &mut ProjectTree,
        op: &Operation,
    ) -> Result<Vec<String>, GateError> {
        for hook in &self.hooks {
            hook.before_apply(op);
        }

        if !self.governed || self.ignore_locks {
            // Consume the bypass; the flag is false after every operation
            self.ignore_locks = false;
            return self.apply(tree, op);
        }

        if let Err(violation) = self.check_locks(tree, op) {
            warn!(operation = %op.name, %violation, "operation rejected");
            return Err(violation.into());
        }
        self.validate(tree, op)?;
        self.apply(tree, op)
    }

    /// Whole-batch lock check, nothing applied on failure
    fn check_locks(&self, tree: &ProjectTree, op: &Operation) -> Result<(), LockViolation> {
        let changed = op.changed_elements();

        // Views are collaboratively fluid: a move checks only the primary
        // target's container.
        if op.is_move_views() {
            if let Some(first) = changed.first() {
                if let Some(parent) = tree.parent_of(first) {
                    self.ensure_unblocked(tree, parent)?;
                }
            }
        }

        for edit in &op.ops {
            match edit {
                PrimitiveEdit::Insert { element } => {
                    if let Some(parent) = element.parent_id() {
                        self.ensure_unblocked(tree, parent)?;
                    }
                }
                PrimitiveEdit::FieldInsert { element_id, .. }
                | PrimitiveEdit::FieldRemove { element_id, .. } => {
                    self.ensure_unblocked(tree, element_id)?;
                }
                PrimitiveEdit::Remove { element_id } => {
                    if let Some(parent) = tree.parent_of(element_id) {
                        self.ensure_unblocked(tree, parent)?;
                    }
                }
                PrimitiveEdit::ReparentOldRef { old_parent, .. } => {
                    self.ensure_unblocked(tree, old_parent)?;
                }
                PrimitiveEdit::ReparentNewRef { new_parent, .. } => {
                    self.ensure_unblocked(tree, new_parent)?;
                }
                PrimitiveEdit::FieldAssign { .. } => {}
            }
        }

        if !op.is_move_views() {
            for id in &changed {
                self.ensure_unblocked(tree, id)?;
            }
        }
        Ok(())
    }

    /// An element is blocked when it exists and is neither newly authored
    /// nor locked, or when it is locked by another collaborator. Absent
    /// elements never block.
    fn ensure_unblocked(&self, tree: &ProjectTree, id: &str) -> Result<(), LockViolation> {
        let node = match tree.node(id) {
            Some(node) => node,
            None => return Ok(()),
        };

        if let Some(owner) = self.locks.owner_of(id) {
            if owner != self.current_user {
                return Err(LockViolation::LockedByOther {
                    element: id.to_string(),
                    owner: owner.to_string(),
                });
            }
        } else if !node.is_new {
            return Err(LockViolation::UnlockedNotNew {
                element: id.to_string(),
            });
        }
        Ok(())
    }

    /// Structural validation of the whole batch before application.
    /// Tracks the ids earlier edits materialize or consume, so a later edit
    /// targeting an element a prior removal already took out (directly or as
    /// part of its subtree) rejects the batch before anything is applied.
    fn validate(&self, tree: &ProjectTree, op: &Operation) -> Result<(), GateError> {
        let mut inserted = HashSet::new();
        let mut removed = HashSet::new();
        for edit in &op.ops {
            edit.validate(tree, &inserted, &removed)?;
            match edit {
                PrimitiveEdit::Insert { element } => {
                    inserted.insert(element.id.clone());
                }
                PrimitiveEdit::Remove { element_id } => {
                    removed.insert(element_id.clone());
                    removed.extend(tree.subtree_ids(element_id));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn apply(&mut self, tree: &mut ProjectTree, op: &Operation) -> Result<Vec<String>, GateError> {
        let mut created = Vec::new();
        for edit in &op.ops {
            edit.apply(tree)?;
            match edit {
                PrimitiveEdit::Insert { element } => created.push(element.id.clone()),
                PrimitiveEdit::FieldInsert { value, .. } => {
                    if let Some(id) = ref_target(value) {
                        if tree.contains(id) {
                            created.push(id.to_string());
                        }
                    }
                }
                _ => {}
            }
        }

        for id in &created {
            if let Some(node) = tree.node_mut(id) {
                node.is_new = true;
            }
        }

        let changed = op.changed_elements();
        self.pending_changes.extend(changed.iter().cloned());

        if !created.is_empty() {
            for hook in &self.hooks {
                hook.elements_created(&created);
            }
        }
        for hook in &self.hooks {
            hook.after_apply(op, &changed);
        }

        debug!(
            operation = %op.name,
            edits = op.ops.len(),
            changed = changed.len(),
            "operation applied"
        );
        Ok(changed)
    }
}

/// A `{"$ref": id}` payload names an existing element
fn ref_target(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}
