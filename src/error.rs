//! Protocol Error Types
//!
//! One error type shared by the negotiation and transfer engines.
//! Codes are stable and appear verbatim in protocol error bodies.

use thiserror::Error;

/// Engine error
///
/// Every variant except `Transport`, `Store` and `Internal` is caller-correctable:
/// it carries the ids and expected/received values needed for a corrected retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Referenced pid, offer or agreement does not exist
    #[error("{kind} not found: {id}")]
    InvalidKey { kind: &'static str, id: String },

    /// Current state is not a legal predecessor for the operation
    #[error("{operation} not allowed for {pid} in state {actual} (expected one of {expected})")]
    StateConflict {
        operation: &'static str,
        pid: String,
        expected: String,
        actual: String,
    },

    /// A supplied id or party disagrees with the stored value
    #[error("{field} mismatch: expected {expected}, received {received}")]
    IdentityMismatch {
        field: &'static str,
        expected: String,
        received: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Counterpart response is malformed or inconsistent with what was sent
    #[error("Invalid acknowledgment: {0}")]
    InvalidAcknowledgment(String),

    #[error("Missing attribute: {0}")]
    MissingAttribute(&'static str),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Store failure: {0}")]
    Store(String),

    /// Local fault outside the store, such as a message that fails to encode
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProtocolError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        ProtocolError::InvalidKey {
            kind,
            id: id.into(),
        }
    }

    pub fn mismatch(
        field: &'static str,
        expected: impl Into<String>,
        received: impl Into<String>,
    ) -> Self {
        ProtocolError::IdentityMismatch {
            field,
            expected: expected.into(),
            received: received.into(),
        }
    }

    /// Get the error code for protocol error bodies
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::InvalidKey { .. } => "INVALID_KEY",
            ProtocolError::StateConflict { .. } => "STATE_CONFLICT",
            ProtocolError::IdentityMismatch { .. } => "IDENTITY_MISMATCH",
            ProtocolError::InvalidRequest(_) => "INVALID_REQUEST",
            ProtocolError::InvalidAcknowledgment(_) => "INVALID_ACKNOWLEDGMENT",
            ProtocolError::MissingAttribute(_) => "MISSING_ATTRIBUTE",
            ProtocolError::Transport(_) => "TRANSPORT_FAILURE",
            ProtocolError::Store(_) => "STORE_FAILURE",
            ProtocolError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            ProtocolError::InvalidKey { .. } => 404,
            ProtocolError::StateConflict { .. } => 409,
            ProtocolError::IdentityMismatch { .. }
            | ProtocolError::InvalidRequest(_)
            | ProtocolError::MissingAttribute(_) => 400,
            ProtocolError::InvalidAcknowledgment(_) | ProtocolError::Transport(_) => 502,
            ProtocolError::Store(_) | ProtocolError::Internal(_) => 500,
        }
    }

    #[inline]
    pub fn is_caller_correctable(&self) -> bool {
        !matches!(
            self,
            ProtocolError::Transport(_) | ProtocolError::Store(_) | ProtocolError::Internal(_)
        )
    }
}
