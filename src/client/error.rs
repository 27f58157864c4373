// ABOUTME: Client error types covering transport failures and rejected requests
// ABOUTME: Modem-reported failures are not errors here; they arrive as result codes

use crate::error::RequestError;
use std::io;
use thiserror::Error;

/// Error type for SMS client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// I/O error on the modem channel
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),

    /// The request was rejected before anything was sent
    #[error("Request rejected: {0}")]
    Request(#[from] RequestError),

    /// The modem closed the channel mid-exchange
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    /// Nothing arrived within the allowed time
    #[error("Operation timeout")]
    Timeout,
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Sorts a transport error into a closed channel or a general I/O failure
    pub(crate) fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset => {
                ClientError::ConnectionClosed
            }
            _ => ClientError::Connection(err),
        }
    }
}
