// src/state/mod.rs
//
// Declarative state layer for UI interaction.
//
// These structures describe the *desired* look. The UI edits them through
// Commands and `HdriLook` synchronizes them into the graph.
//
// Key principles:
// - All structures are serializable (for save/load)
// - Mutations happen through Commands or `HdriLook::apply`
// - A rejected change leaves the state untouched

mod command;
mod look;
mod param_info;
mod preferences;

pub use command::*;
pub use look::*;
pub use param_info::*;
pub use preferences::*;
