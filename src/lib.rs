// src/lib.rs
//
// Library entry point for Rust and FFI consumers.

pub mod catalog;
pub mod error;
pub mod graph;
pub mod look;
pub mod propagate;
pub mod stage;
pub mod stage_registry;
pub mod stages;
pub mod state;
pub mod topology;
pub mod wiring;

pub mod ffi;

// Re-export key types for Rust consumers
pub use catalog::{Catalog, CatalogContext, VariantRequest};
pub use error::{GafferError, Result};
pub use graph::{GraphStore, ShaderGraph};
pub use look::{HdriLook, LookState};
pub use stage::{SocketRef, SocketValue, Stage, StageId, StageKind, Variant};
pub use stage_registry::StageRegistry;
pub use stages::register_standard_stages;
pub use state::{Command, CommandResult, LookParam, LookParameters, ParamValue, Preferences};
pub use topology::{TopologyFlags, compute_flags};
