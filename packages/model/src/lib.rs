//! # Atelier Model
//!
//! Fragment data model and project tree assembly.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ working copy: one JSON fragment per element │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ model: FragmentStore + assembly             │
//! │  - Parse fragment files                     │
//! │  - Classify container kinds                 │
//! │  - Link parent references into one tree     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: lock-gated operations on the tree   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Fragments are flat**: elements reference their container only by id
//! 2. **Assembly is all-or-nothing**: a dangling reference or a bad root
//!    count fails the whole load, no partial tree is returned
//! 3. **Deterministic ordering**: fragments are linked in identifier order,
//!    so the same batch always produces the same child ordering

mod assembler;
mod fragment;
mod store;
mod tree;

pub use assembler::{assemble, AssemblyError};
pub use fragment::{ContainerKind, Fragment, Ref};
pub use store::FragmentStore;
pub use tree::{ModelNode, ProjectTree};
