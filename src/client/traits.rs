// ABOUTME: Transport trait the SMS client drives, using native async functions
// ABOUTME: Implemented by AtConnection and by scripted transports in tests

use crate::at::{AtRequest, AtResponse, UrcGroup};
use crate::connection::AtConnection;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};

/// A channel that carries one AT exchange at a time
pub trait AtTransport {
    /// Send a request and return everything up to its final result line.
    ///
    /// The client drops this future when its response timeout runs out. The
    /// transport must not attribute the late reply to the next request.
    async fn transact(&mut self, request: &AtRequest) -> io::Result<AtResponse>;

    /// Next unsolicited code group, `None` once the channel is closed
    async fn next_unsolicited(&mut self) -> io::Result<Option<UrcGroup>>;
}

impl<S: AsyncRead + AsyncWrite + Unpin> AtTransport for AtConnection<S> {
    async fn transact(&mut self, request: &AtRequest) -> io::Result<AtResponse> {
        AtConnection::transact(self, request).await
    }

    async fn next_unsolicited(&mut self) -> io::Result<Option<UrcGroup>> {
        AtConnection::next_unsolicited(self).await
    }
}
