//! # Block Structuring
//!
//! Turns placeholder-bearing lines into an ordered sequence of [`Block`]s.
//!
//! ## Phases
//!
//! 1. **Line Classification** (`classify`): each line becomes a `LineClass` of
//!    local facts (indent, list marker, table row, rule, heading, setext underline)
//!
//! 2. **Block Construction** (`builder`): a `BlockBuilder` keeps the open lists
//!    and table and emits blocks as they open and close, looking one line ahead
//!    for setext headings and table alignment rows
//!
//! ## Modules
//!
//! - **`types`**: `Block`, `ListKind`, `Align`
//! - **`classify`**: `LineClassifier` produces `LineClass` for each line
//! - **`containers`**: `ListStack` and `TableState`
//! - **`builder`**: `BlockBuilder` and the `structure` entry point
//!
//! ## Key Invariants
//!
//! - Every `ListStart` has a matching `ListEnd` and they never cross
//! - List indentation strictly increases from the outermost list inwards
//! - Every row of a table has the header's cell count

pub mod builder;
pub mod classify;
pub mod containers;
pub mod types;

pub use builder::{BlockBuilder, structure};
pub use classify::{LineClass, LineClassifier, ListMarker};
pub use containers::{ListScope, ListStack, TableState};
pub use types::{Align, Block, ListKind};
