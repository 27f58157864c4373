// ABOUTME: SMS client pairing an engine with a transport and driving exchanges to completion
// ABOUTME: Applies response timeouts and turns queued unsolicited codes into events

use crate::at::{AtRequest, AtResponse, ResponseArity};
use crate::client::config::ClientConfig;
use crate::client::error::{ClientError, ClientResult};
use crate::client::traits::AtTransport;
use crate::datatypes::{SmsPdu, StoredMessage};
use crate::engine::{Progress, SmsEngine, SmsRequest, SmsResponse};
use crate::notification::NotificationEvent;
use std::time::Duration;
use tracing::{debug, warn};

/// Drives SMS requests over one AT transport.
///
/// Exchanges run one at a time, each bounded by
/// [`ClientConfig::response_timeout`]. A timed out exchange is decoded as a
/// failed reply, so the request still completes with a result code.
pub struct SmsClient<T> {
    transport: T,
    engine: SmsEngine,
    config: ClientConfig,
}

impl<T: AtTransport> SmsClient<T> {
    pub fn new(transport: T, engine: SmsEngine, config: ClientConfig) -> Self {
        Self {
            transport,
            engine,
            config,
        }
    }

    pub fn engine(&self) -> &SmsEngine {
        &self.engine
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Run a request through every exchange it needs
    pub async fn execute(&mut self, request: &SmsRequest) -> ClientResult<SmsResponse> {
        let mut progress = self.engine.dispatch(request)?;
        loop {
            match progress {
                Progress::Complete(response) => {
                    debug!("{:?} finished with {:?}", request.operation(), response.result());
                    return Ok(response);
                }
                Progress::Send(exchange) => {
                    let reply = self.exchange(&exchange.request).await?;
                    progress = self.engine.on_response(exchange, &reply);
                }
            }
        }
    }

    /// Select PDU mode; required before any SMS command
    pub async fn select_pdu_mode(&mut self) -> ClientResult<bool> {
        let request = AtRequest {
            command: "AT+CMGF=0\r".to_string(),
            prefix: None,
            arity: ResponseArity::None,
        };
        let reply = self.exchange(&request).await?;
        if !reply.success {
            warn!("Modem refused PDU mode: {:?}", reply.final_response);
        }
        Ok(reply.success)
    }

    /// Next decoded notification. Unsolicited codes the engine does not
    /// understand are skipped; `None` means the channel closed.
    pub async fn next_event(&mut self) -> ClientResult<Option<NotificationEvent>> {
        loop {
            let group = self
                .transport
                .next_unsolicited()
                .await
                .map_err(ClientError::from_io)?;
            let Some(group) = group else {
                return Ok(None);
            };
            if let Some(event) = self.engine.on_notification(&group) {
                return Ok(Some(event));
            }
        }
    }

    /// Like [`next_event`](Self::next_event), giving up after `limit`
    pub async fn next_event_within(
        &mut self,
        limit: Duration,
    ) -> ClientResult<Option<NotificationEvent>> {
        tokio::time::timeout(limit, self.next_event())
            .await
            .map_err(|_| ClientError::Timeout)?
    }

    pub async fn send_message(&mut self, pdu: SmsPdu) -> ClientResult<SmsResponse> {
        self.execute(&SmsRequest::SendMessage { pdu }).await
    }

    pub async fn read_message(&mut self, index: u32) -> ClientResult<SmsResponse> {
        self.execute(&SmsRequest::ReadMessage { index }).await
    }

    pub async fn delete_message(&mut self, index: u32) -> ClientResult<SmsResponse> {
        self.execute(&SmsRequest::DeleteMessage { index }).await
    }

    /// Lists SIM storage and reads every stored message. Messages that fail
    /// to read are logged and skipped.
    pub async fn read_all(&mut self) -> ClientResult<Vec<StoredMessage>> {
        let listing = self.execute(&SmsRequest::GetStoredCount).await?;
        let SmsResponse::StoredCount { indices, result, .. } = listing else {
            return Ok(Vec::new());
        };
        if !result.is_success() {
            warn!("Listing stored messages failed: {:?}", result);
            return Ok(Vec::new());
        }

        let mut messages = Vec::with_capacity(indices.len());
        for index in indices {
            match self.read_message(index).await? {
                SmsResponse::Read {
                    message: Some(message),
                    ..
                } => messages.push(message),
                other => warn!("Reading {} gave {:?}", index, other.result()),
            }
        }
        Ok(messages)
    }

    async fn exchange(&mut self, request: &AtRequest) -> ClientResult<AtResponse> {
        match tokio::time::timeout(self.config.response_timeout, self.transport.transact(request))
            .await
        {
            Ok(reply) => reply.map_err(ClientError::from_io),
            Err(_) => {
                warn!("No final result for {:?}", request.command);
                Ok(AtResponse::timeout())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at::UrcGroup;
    use crate::config::EngineConfig;
    use crate::datatypes::{MessageStatus, SmsResultCode};
    use crate::error::RequestError;
    use std::collections::VecDeque;
    use std::io;

    /// Answers requests from a script and records what was sent
    #[derive(Default)]
    struct ScriptedTransport {
        replies: VecDeque<AtResponse>,
        unsolicited: VecDeque<UrcGroup>,
        sent: Vec<String>,
    }

    impl AtTransport for ScriptedTransport {
        async fn transact(&mut self, request: &AtRequest) -> io::Result<AtResponse> {
            self.sent.push(request.command.clone());
            self.replies
                .pop_front()
                .ok_or_else(|| io::ErrorKind::UnexpectedEof.into())
        }

        async fn next_unsolicited(&mut self) -> io::Result<Option<UrcGroup>> {
            Ok(self.unsolicited.pop_front())
        }
    }

    fn client(replies: Vec<AtResponse>) -> SmsClient<ScriptedTransport> {
        let transport = ScriptedTransport {
            replies: replies.into(),
            ..Default::default()
        };
        SmsClient::new(
            transport,
            SmsEngine::new(EngineConfig::default()),
            ClientConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_execute_runs_chain() {
        let mut client = client(vec![
            AtResponse::ok(["+CPMS: 1,30,1,30,1,30"]),
            AtResponse::ok(["+CMGL: 3,1,,5", "0001000A0B0C"]),
        ]);

        let response = client.execute(&SmsRequest::GetStoredCount).await.unwrap();
        assert_eq!(
            response,
            SmsResponse::StoredCount {
                used: 1,
                total: 30,
                indices: vec![2],
                result: SmsResultCode::Success,
            }
        );
        assert_eq!(
            client.transport_mut().sent,
            vec!["AT+CPMS=\"SM\",\"SM\",\"SM\"\r", "AT+CMGL=4\r"]
        );
    }

    #[tokio::test]
    async fn test_rejected_request_sends_nothing() {
        let mut client = client(Vec::new());
        let result = client
            .execute(&SmsRequest::SetMemoryStatus { status: 3 })
            .await;
        assert!(matches!(
            result,
            Err(ClientError::Request(RequestError::InvalidArgument { .. }))
        ));
        assert!(client.transport_mut().sent.is_empty());
    }

    #[tokio::test]
    async fn test_closed_transport() {
        let mut client = client(Vec::new());
        let result = client.delete_message(0).await;
        assert!(matches!(result, Err(ClientError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_read_all() {
        let mut client = client(vec![
            AtResponse::ok(["+CPMS: 1,30,1,30,1,30"]),
            AtResponse::ok(["+CMGL: 1,0,,5", "0001000A0B0C"]),
            AtResponse::ok(["+CMGR: 0,,6", "0001000A0B0C"]),
        ]);

        let messages = client.read_all().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sim_index, 0);
        assert_eq!(messages[0].status, MessageStatus::Unread);
        assert_eq!(messages[0].pdu.msg_length(), 5);
        assert_eq!(client.transport_mut().sent[2], "AT+CMGR=1\r");
    }

    #[tokio::test]
    async fn test_next_event_skips_unknown() {
        let mut client = client(Vec::new());
        client.transport_mut().unsolicited.extend([
            UrcGroup::new("+CREG", ["+CREG: 1"]),
            UrcGroup::new("+XSIM", ["+XSIM: 12"]),
        ]);

        let event = client.next_event().await.unwrap();
        assert_eq!(event, Some(NotificationEvent::DeviceReady(true)));
        assert_eq!(client.next_event().await.unwrap(), None);
    }
}
