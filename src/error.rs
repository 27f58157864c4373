// ABOUTME: Errors returned when an SMS request cannot be turned into a modem command
// ABOUTME: Decoding failures of modem replies never surface here; they become result codes

use crate::codec::CodecError;
use crate::engine::Operation;
use std::collections::TryReserveError;
use thiserror::Error;

/// Reasons a request is rejected before anything is written to the modem
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Caller-supplied data violates a precondition
    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    /// The command buffer could not be allocated
    #[error("Out of memory while building command")]
    OutOfMemory,

    /// The modem class has no command for this operation
    #[error("Operation not supported: {0:?}")]
    NotSupported(Operation),

    /// Encoding of a payload failed
    #[error("Protocol error: {0}")]
    Protocol(#[from] CodecError),
}

impl RequestError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        RequestError::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }
}

impl From<TryReserveError> for RequestError {
    fn from(_: TryReserveError) -> Self {
        RequestError::OutOfMemory
    }
}
