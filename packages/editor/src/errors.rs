//! Error types for the editor

use thiserror::Error;

use crate::operations::OperationError;

/// Why a proposed operation was rejected by the gate.
///
/// The cause matters to the user: `UnlockedNotNew` means "lock the element
/// first", `LockedByOther` means "wait or contact the owner".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LockViolation {
    #[error("element {element} must be locked before it can be changed")]
    UnlockedNotNew { element: String },

    #[error("element {element} is locked by {owner}")]
    LockedByOther { element: String, owner: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    #[error("operation rejected: {0}")]
    Violation(#[from] LockViolation),

    #[error("operation invalid: {0}")]
    Operation(#[from] OperationError),
}
