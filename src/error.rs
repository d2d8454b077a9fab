// src/error.rs
//
// Error taxonomy for graph synthesis, propagation, and image binding.

use std::fmt;
use std::path::PathBuf;

use crate::stage::StageId;

/// Error raised by any core operation.
#[derive(Debug)]
pub enum GafferError {
    /// A stage kind name did not parse, or the kind has no registered template.
    UnknownStageKind { kind: String },

    /// The requested image variant is not listed for that image name.
    VariantNotFound { name: String, variant: String },

    /// An authoritative destination socket was linked to an unexpected source.
    GraphInconsistent {
        stage: String,
        socket: String,
        found: String,
        expected: String,
    },

    /// A parameter name that the look does not know about.
    UnknownParameter { name: String },

    /// A parameter value of the wrong type or outside its range.
    InvalidParameterValue { name: String, reason: String },

    /// A stage id that is not present in the graph.
    StageNotFound { id: StageId },

    /// A stage of a registered kind has not been materialized in the graph.
    StageMissing { name: String },

    /// A socket index past the end of a stage's sockets.
    SocketOutOfRange {
        stage: String,
        index: usize,
        output: bool,
    },

    /// A socket default of a different type than the socket holds.
    SocketTypeMismatch { stage: String, socket: String },

    /// The graph contains a cycle.
    Cycle,

    /// An operation that needs a bound image was called on an unbound look.
    NotBound,

    Io { path: PathBuf, source: std::io::Error },

    Json(serde_json::Error),
}

impl fmt::Display for GafferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GafferError::UnknownStageKind { kind } => write!(f, "unknown stage kind '{}'", kind),
            GafferError::VariantNotFound { name, variant } => {
                write!(f, "variant '{}' not found for image '{}'", variant, name)
            }
            GafferError::GraphInconsistent {
                stage,
                socket,
                found,
                expected,
            } => write!(
                f,
                "{}.{} is linked from {} but the wiring table expects {}",
                stage, socket, found, expected
            ),
            GafferError::UnknownParameter { name } => write!(f, "unknown parameter '{}'", name),
            GafferError::InvalidParameterValue { name, reason } => {
                write!(f, "invalid value for '{}': {}", name, reason)
            }
            GafferError::StageNotFound { id } => write!(f, "stage {} not found", id),
            GafferError::StageMissing { name } => write!(f, "no stage named '{}' in the graph", name),
            GafferError::SocketOutOfRange {
                stage,
                index,
                output,
            } => write!(
                f,
                "{} has no {} socket {}",
                stage,
                if *output { "output" } else { "input" },
                index
            ),
            GafferError::SocketTypeMismatch { stage, socket } => {
                write!(f, "value type does not match socket {}.{}", stage, socket)
            }
            GafferError::Cycle => write!(f, "graph contains a cycle"),
            GafferError::NotBound => write!(f, "look has no bound image"),
            GafferError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            GafferError::Json(e) => write!(f, "json: {}", e),
        }
    }
}

impl std::error::Error for GafferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GafferError::Io { source, .. } => Some(source),
            GafferError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GafferError {
    fn from(e: serde_json::Error) -> Self {
        GafferError::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, GafferError>;
