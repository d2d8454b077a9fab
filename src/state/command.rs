// Commands from the UI to the look.
//
// Each UI control produces exactly one command. Commands never batch more
// than one parameter change.

use super::ParamValue;
use crate::catalog::VariantRequest;

/// A command from the UI to an `HdriLook`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Change one look parameter by its UI name.
    Apply { name: String, value: ParamValue },

    /// Enable the handler and bind an image from the catalog.
    Enable {
        image: String,
        variant: VariantRequest,
    },

    /// Bind a different image or variant. No topology change.
    SwapImage {
        image: String,
        variant: VariantRequest,
    },

    /// Disable the handler. The graph stays in place, muted.
    Disable,

    /// Restore every parameter to its neutral value.
    ResetLook,
}

/// Response from the look after processing a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Command succeeded.
    Ok,

    /// Command succeeded but the requested variant was missing; the
    /// smallest variant was bound instead.
    NeedsAttention { bound: String },

    /// Command failed.
    Error { message: String },
}
