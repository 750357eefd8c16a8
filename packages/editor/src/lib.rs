//! # Atelier Editor
//!
//! Lock-gated editing of the live project tree.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: fragments → ProjectTree              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: OperationGate + LockTable           │
//! │  - Intercept every proposed operation       │
//! │  - Accept/reject against lock state         │
//! │  - Apply primitive edits all-or-nothing     │
//! │  - Track pending local changes              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ workspace: commit/pull/rebuild cycle        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **All-or-nothing**: an operation is validated in full before any
//!    primitive edit touches the tree; a rejected operation has no effect
//! 2. **Named causes**: a rejection says whether the element must be locked
//!    first or is locked by another collaborator
//! 3. **Single-slot bypass**: trusted synchronization traffic sets
//!    `ignore_locks` once; the flag is false again after the next operation
//!    no matter what

mod errors;
mod gate;
mod locks;
mod operations;

pub use errors::{GateError, LockViolation};
pub use gate::{GateHook, OperationGate};
pub use locks::LockTable;
pub use operations::{Operation, OperationError, PrimitiveEdit, MOVE_VIEWS};
