//! # Operations
//!
//! An operation is an atomic, named batch of primitive edits proposed
//! against the live model. Operations are the unit of interception: the
//! gate validates the whole batch before any primitive edit is applied.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

use atelier_model::{Fragment, ProjectTree};

/// Operation name carrying the view-repositioning exemption: views are
/// repositioned freely, only their container's lock is checked.
pub const MOVE_VIEWS: &str = "move views";

/// Atomic named batch of primitive edits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    pub name: String,
    pub ops: Vec<PrimitiveEdit>,
}

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ops: Vec::new(),
        }
    }

    pub fn with(mut self, edit: PrimitiveEdit) -> Self {
        self.ops.push(edit);
        self
    }

    pub fn is_move_views(&self) -> bool {
        self.name == MOVE_VIEWS
    }

    /// Target element ids in batch order, deduplicated
    pub fn changed_elements(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut changed = Vec::new();
        for edit in &self.ops {
            let id = edit.target_id();
            if seen.insert(id.to_string()) {
                changed.push(id.to_string());
            }
        }
        changed
    }
}

/// One primitive edit within an operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PrimitiveEdit {
    /// Materialize a new element under its parent reference
    Insert { element: Fragment },

    /// Remove an element and its descendants
    Remove { element_id: String },

    /// Append a value to an array-valued field
    FieldInsert {
        element_id: String,
        field: String,
        value: Value,
    },

    /// Remove the first matching value from an array-valued field
    FieldRemove {
        element_id: String,
        field: String,
        value: Value,
    },

    /// Assign a field value
    FieldAssign {
        element_id: String,
        field: String,
        value: Value,
    },

    /// Detach an element from its old container
    ReparentOldRef {
        element_id: String,
        old_parent: String,
    },

    /// Attach an element to its new container
    ReparentNewRef {
        element_id: String,
        new_parent: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("element not found: {0}")]
    NodeNotFound(String),

    #[error("parent not found: {0}")]
    ParentNotFound(String),

    #[error("inserted element {0} carries no parent reference")]
    MissingParentRef(String),

    #[error("field {field} on element {element} is not an array")]
    FieldNotAnArray { element: String, field: String },
}

impl PrimitiveEdit {
    /// The element this edit targets
    pub fn target_id(&self) -> &str {
        match self {
            PrimitiveEdit::Insert { element } => &element.id,
            PrimitiveEdit::Remove { element_id }
            | PrimitiveEdit::FieldInsert { element_id, .. }
            | PrimitiveEdit::FieldRemove { element_id, .. }
            | PrimitiveEdit::FieldAssign { element_id, .. }
            | PrimitiveEdit::ReparentOldRef { element_id, .. }
            | PrimitiveEdit::ReparentNewRef { element_id, .. } => element_id,
        }
    }

    /// Validate against the tree without applying.
    ///
    /// `inserted` holds ids materialized by earlier edits of the same batch
    /// and `removed` the ids (subtrees included) consumed by earlier edits,
    /// so an overlapping batch is decided as a whole before anything
    /// applies.
    pub fn validate(
        &self,
        tree: &ProjectTree,
        inserted: &HashSet<String>,
        removed: &HashSet<String>,
    ) -> Result<(), OperationError> {
        let known =
            |id: &str| (tree.contains(id) || inserted.contains(id)) && !removed.contains(id);

        match self {
            PrimitiveEdit::Insert { element } => {
                let parent_id = element
                    .parent_id()
                    .ok_or_else(|| OperationError::MissingParentRef(element.id.clone()))?;
                if !known(parent_id) {
                    return Err(OperationError::ParentNotFound(parent_id.to_string()));
                }
                Ok(())
            }
            PrimitiveEdit::Remove { element_id } => {
                if !known(element_id) {
                    return Err(OperationError::NodeNotFound(element_id.clone()));
                }
                Ok(())
            }
            PrimitiveEdit::FieldInsert { element_id, field, .. }
            | PrimitiveEdit::FieldRemove { element_id, field, .. } => {
                if !known(element_id) {
                    return Err(OperationError::NodeNotFound(element_id.clone()));
                }
                if let Some(node) = tree.node(element_id) {
                    if let Some(existing) = node.attributes.get(field) {
                        if !existing.is_array() {
                            return Err(OperationError::FieldNotAnArray {
                                element: element_id.clone(),
                                field: field.clone(),
                            });
                        }
                    }
                }
                Ok(())
            }
            PrimitiveEdit::FieldAssign { element_id, .. } => {
                if !known(element_id) {
                    return Err(OperationError::NodeNotFound(element_id.clone()));
                }
                Ok(())
            }
            PrimitiveEdit::ReparentOldRef { element_id, .. } => {
                if !known(element_id) {
                    return Err(OperationError::NodeNotFound(element_id.clone()));
                }
                Ok(())
            }
            PrimitiveEdit::ReparentNewRef { element_id, new_parent } => {
                if !known(element_id) {
                    return Err(OperationError::NodeNotFound(element_id.clone()));
                }
                if !known(new_parent) {
                    return Err(OperationError::ParentNotFound(new_parent.clone()));
                }
                Ok(())
            }
        }
    }

    /// Apply to the tree. Callers validate the whole batch first; failures
    /// here indicate a validation gap, not a user error.
    pub fn apply(&self, tree: &mut ProjectTree) -> Result<(), OperationError> {
        match self {
            PrimitiveEdit::Insert { element } => {
                if !tree.insert_fragment(element) {
                    let parent = element.parent_id().unwrap_or_default();
                    return Err(OperationError::ParentNotFound(parent.to_string()));
                }
                Ok(())
            }
            PrimitiveEdit::Remove { element_id } => {
                if tree.remove_subtree(element_id).is_empty() {
                    return Err(OperationError::NodeNotFound(element_id.clone()));
                }
                Ok(())
            }
            PrimitiveEdit::FieldInsert { element_id, field, value } => {
                let node = tree
                    .node_mut(element_id)
                    .ok_or_else(|| OperationError::NodeNotFound(element_id.clone()))?;
                let entry = node
                    .attributes
                    .entry(field.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                match entry.as_array_mut() {
                    Some(items) => {
                        items.push(value.clone());
                        Ok(())
                    }
                    None => Err(OperationError::FieldNotAnArray {
                        element: element_id.clone(),
                        field: field.clone(),
                    }),
                }
            }
            PrimitiveEdit::FieldRemove { element_id, field, value } => {
                let node = tree
                    .node_mut(element_id)
                    .ok_or_else(|| OperationError::NodeNotFound(element_id.clone()))?;
                match node.attributes.get_mut(field) {
                    Some(Value::Array(items)) => {
                        if let Some(pos) = items.iter().position(|v| v == value) {
                            items.remove(pos);
                        }
                        Ok(())
                    }
                    Some(_) => Err(OperationError::FieldNotAnArray {
                        element: element_id.clone(),
                        field: field.clone(),
                    }),
                    // Removing from an absent field is a no-op
                    None => Ok(()),
                }
            }
            PrimitiveEdit::FieldAssign { element_id, field, value } => {
                let node = tree
                    .node_mut(element_id)
                    .ok_or_else(|| OperationError::NodeNotFound(element_id.clone()))?;
                node.attributes.insert(field.clone(), value.clone());
                Ok(())
            }
            PrimitiveEdit::ReparentOldRef { element_id, old_parent } => {
                if !tree.contains(element_id) {
                    return Err(OperationError::NodeNotFound(element_id.clone()));
                }
                tree.detach_child(old_parent, element_id);
                Ok(())
            }
            PrimitiveEdit::ReparentNewRef { element_id, new_parent } => {
                if !tree.attach_child(new_parent, element_id) {
                    return Err(OperationError::ParentNotFound(new_parent.clone()));
                }
                Ok(())
            }
        }
    }
}
