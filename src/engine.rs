// ABOUTME: The operation table: maps SMS requests to AT exchanges and replies to results
// ABOUTME: Stateless between calls; chained operations carry their state in a Continuation

use crate::at::{AtRequest, AtResponse, UrcGroup};
use crate::command;
use crate::config::EngineConfig;
use crate::datatypes::{
    AddressInfo, CbConfig, MemoryStatus, MessageStatus, SmsParams, SmsPdu, SmsResultCode,
    StoredMessage,
};
use crate::error::RequestError;
use crate::fcp::FcpDescriptor;
use crate::notification::{NotificationEvent, NotificationRegistry};
use crate::response;
use tracing::{debug, warn};

/// Every operation the host can request
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    SendMessage,
    ReadMessage,
    SaveMessage,
    DeleteMessage,
    GetStoredCount,
    GetServiceCenter,
    SetServiceCenter,
    GetCbConfig,
    SetCbConfig,
    GetMemoryStatus,
    SetMemoryStatus,
    GetParams,
    SetParams,
    GetParamCount,
    SetMessageStatus,
    SetDeliveryReport,
    GetPreferredBearer,
    SetPreferredBearer,
}

/// A request from the host. Indices are zero-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SmsRequest {
    SendMessage { pdu: SmsPdu },
    ReadMessage { index: u32 },
    SaveMessage { status: MessageStatus, pdu: SmsPdu },
    DeleteMessage { index: u32 },
    GetStoredCount,
    GetServiceCenter,
    SetServiceCenter { address: AddressInfo },
    GetCbConfig,
    SetCbConfig { config: CbConfig },
    GetMemoryStatus,
    /// Raw status as supplied by the host, checked against [`MemoryStatus`]
    SetMemoryStatus { status: u8 },
    GetParams { index: u32 },
    SetParams { index: u32, params: SmsParams },
    GetParamCount,
    SetMessageStatus { index: u32, status: MessageStatus },
    SetDeliveryReport,
    GetPreferredBearer,
    SetPreferredBearer { bearer: u8 },
}

impl SmsRequest {
    pub fn set_memory_status(status: MemoryStatus) -> Self {
        SmsRequest::SetMemoryStatus {
            status: status as u8,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            SmsRequest::SendMessage { .. } => Operation::SendMessage,
            SmsRequest::ReadMessage { .. } => Operation::ReadMessage,
            SmsRequest::SaveMessage { .. } => Operation::SaveMessage,
            SmsRequest::DeleteMessage { .. } => Operation::DeleteMessage,
            SmsRequest::GetStoredCount => Operation::GetStoredCount,
            SmsRequest::GetServiceCenter => Operation::GetServiceCenter,
            SmsRequest::SetServiceCenter { .. } => Operation::SetServiceCenter,
            SmsRequest::GetCbConfig => Operation::GetCbConfig,
            SmsRequest::SetCbConfig { .. } => Operation::SetCbConfig,
            SmsRequest::GetMemoryStatus => Operation::GetMemoryStatus,
            SmsRequest::SetMemoryStatus { .. } => Operation::SetMemoryStatus,
            SmsRequest::GetParams { .. } => Operation::GetParams,
            SmsRequest::SetParams { .. } => Operation::SetParams,
            SmsRequest::GetParamCount => Operation::GetParamCount,
            SmsRequest::SetMessageStatus { .. } => Operation::SetMessageStatus,
            SmsRequest::SetDeliveryReport => Operation::SetDeliveryReport,
            SmsRequest::GetPreferredBearer => Operation::GetPreferredBearer,
            SmsRequest::SetPreferredBearer { .. } => Operation::SetPreferredBearer,
        }
    }
}

/// The single terminal result of a request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SmsResponse {
    Sent {
        message_ref: Option<u32>,
        result: SmsResultCode,
    },
    Read {
        index: u32,
        message: Option<StoredMessage>,
        result: SmsResultCode,
    },
    Saved {
        index: Option<u32>,
        result: SmsResultCode,
    },
    Deleted {
        index: u32,
        result: SmsResultCode,
    },
    StoredCount {
        used: u32,
        total: u32,
        indices: Vec<u32>,
        result: SmsResultCode,
    },
    ServiceCenter {
        address: Option<AddressInfo>,
        result: SmsResultCode,
    },
    CbConfig {
        config: Option<CbConfig>,
        result: SmsResultCode,
    },
    MemoryStatus {
        status: Option<MemoryStatus>,
        result: SmsResultCode,
    },
    Params {
        index: u32,
        params: Option<SmsParams>,
        result: SmsResultCode,
    },
    ParamCount {
        descriptor: Option<FcpDescriptor>,
        result: SmsResultCode,
    },
    MessageStatusSet {
        index: u32,
        result: SmsResultCode,
    },
    /// Set operations whose reply carries nothing but the outcome
    Ack {
        operation: Operation,
        result: SmsResultCode,
    },
}

impl SmsResponse {
    pub fn result(&self) -> SmsResultCode {
        match self {
            SmsResponse::Sent { result, .. }
            | SmsResponse::Read { result, .. }
            | SmsResponse::Saved { result, .. }
            | SmsResponse::Deleted { result, .. }
            | SmsResponse::StoredCount { result, .. }
            | SmsResponse::ServiceCenter { result, .. }
            | SmsResponse::CbConfig { result, .. }
            | SmsResponse::MemoryStatus { result, .. }
            | SmsResponse::Params { result, .. }
            | SmsResponse::ParamCount { result, .. }
            | SmsResponse::MessageStatusSet { result, .. }
            | SmsResponse::Ack { result, .. } => *result,
        }
    }
}

/// State a follow-up decoder needs, carried with the exchange that produces it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Continuation {
    None,
    /// Zero-based index the request addressed
    Index(u32),
    /// Counts from `+CPMS`, merged with the `+CMGL` listing
    StoredCount { used: u32, total: u32 },
    /// EF-SMS record being read so its status byte can be patched
    StatusRead { index: u32, status: MessageStatus },
    /// Patched EF-SMS record being written back
    StatusWrite { index: u32 },
}

/// One outstanding AT exchange
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingExchange {
    pub operation: Operation,
    pub request: AtRequest,
    pub continuation: Continuation,
}

impl PendingExchange {
    pub fn new(operation: Operation, request: AtRequest, continuation: Continuation) -> Self {
        Self {
            operation,
            request,
            continuation,
        }
    }
}

/// What the host does next
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Send this exchange and hand its reply to [`SmsEngine::on_response`]
    Send(PendingExchange),
    /// The request is finished
    Complete(SmsResponse),
}

/// SMS engine for one modem.
///
/// Holds configuration and the notification registry, both read-only after
/// construction, so one engine may be shared between tasks.
///
/// # Example
///
/// ```rust
/// use modem_sms::{AtResponse, EngineConfig, Progress, SmsEngine, SmsRequest};
///
/// let engine = SmsEngine::new(EngineConfig::default());
/// let Progress::Send(exchange) = engine.dispatch(&SmsRequest::DeleteMessage { index: 5 }).unwrap() else {
///     unreachable!()
/// };
/// assert_eq!(exchange.request.command, "AT+CMGD=6,0\r");
///
/// let progress = engine.on_response(exchange, &AtResponse::ok(Vec::<String>::new()));
/// assert!(matches!(progress, Progress::Complete(r) if r.result().is_success()));
/// ```
#[derive(Debug, Default)]
pub struct SmsEngine {
    config: EngineConfig,
    notifications: NotificationRegistry,
}

impl SmsEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            notifications: NotificationRegistry::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn notifications(&self) -> &NotificationRegistry {
        &self.notifications
    }

    /// Validate a request and build its first exchange.
    ///
    /// Operations that need no modem command complete immediately.
    pub fn dispatch(&self, request: &SmsRequest) -> Result<Progress, RequestError> {
        let operation = request.operation();
        debug!("Dispatching {:?}", operation);

        let (at, continuation) = match request {
            SmsRequest::SendMessage { pdu } => (command::send_message(pdu)?, Continuation::None),
            SmsRequest::ReadMessage { index } => {
                (command::read_message(*index)?, Continuation::Index(*index))
            }
            SmsRequest::SaveMessage { status, pdu } => {
                (command::save_message(*status, pdu)?, Continuation::None)
            }
            SmsRequest::DeleteMessage { index } => {
                (command::delete_message(*index)?, Continuation::Index(*index))
            }
            SmsRequest::GetStoredCount => (command::stored_count()?, Continuation::None),
            SmsRequest::GetServiceCenter => (command::get_service_center()?, Continuation::None),
            SmsRequest::SetServiceCenter { address } => {
                (command::set_service_center(address)?, Continuation::None)
            }
            SmsRequest::GetCbConfig => (command::get_cb_config()?, Continuation::None),
            SmsRequest::SetCbConfig { config } => (
                command::set_cb_config(config, self.config.max_cb_ids)?,
                Continuation::None,
            ),
            SmsRequest::GetMemoryStatus => (command::get_memory_status()?, Continuation::None),
            SmsRequest::SetMemoryStatus { status } => {
                (command::set_memory_status(*status)?, Continuation::None)
            }
            SmsRequest::GetParams { index } => (
                command::get_params(*index, self.config.sms_params_record_len)?,
                Continuation::Index(*index),
            ),
            SmsRequest::SetParams { index, params } => (
                command::set_params(*index, params)?,
                Continuation::Index(*index),
            ),
            SmsRequest::GetParamCount => (command::param_count()?, Continuation::None),
            SmsRequest::SetMessageStatus { index, status } => (
                command::read_message_record(*index)?,
                Continuation::StatusRead {
                    index: *index,
                    status: *status,
                },
            ),
            SmsRequest::SetDeliveryReport => {
                // The modem acknowledges network deliveries itself
                return Ok(Progress::Complete(SmsResponse::Ack {
                    operation,
                    result: SmsResultCode::Success,
                }));
            }
            SmsRequest::GetPreferredBearer | SmsRequest::SetPreferredBearer { .. } => {
                return Err(RequestError::NotSupported(operation));
            }
        };

        Ok(Progress::Send(PendingExchange::new(operation, at, continuation)))
    }

    /// Decode the reply to `exchange`, either finishing the request or
    /// producing the chained follow-up exchange.
    pub fn on_response(&self, exchange: PendingExchange, reply: &AtResponse) -> Progress {
        let PendingExchange {
            operation,
            continuation,
            ..
        } = exchange;

        let complete = Progress::Complete;

        match (operation, continuation) {
            (Operation::SendMessage, Continuation::None) => {
                complete(response::send_message(reply))
            }
            (Operation::ReadMessage, Continuation::Index(index)) => {
                complete(response::read_message(reply, index))
            }
            (Operation::SaveMessage, Continuation::None) => {
                complete(response::save_message(reply))
            }
            (Operation::DeleteMessage, Continuation::Index(index)) => {
                complete(response::delete_message(reply, index))
            }
            (Operation::GetStoredCount, Continuation::None) => response::stored_count(reply),
            (Operation::GetStoredCount, Continuation::StoredCount { used, total }) => complete(
                response::list_indices(reply, used, total, self.config.max_stored_messages),
            ),
            (Operation::GetServiceCenter, Continuation::None) => {
                complete(response::get_service_center(reply))
            }
            (Operation::GetCbConfig, Continuation::None) => {
                complete(response::get_cb_config(reply, self.config.max_cb_ids))
            }
            (Operation::SetCbConfig, Continuation::None) => {
                complete(response::set_cb_config(reply))
            }
            (Operation::GetMemoryStatus, Continuation::None) => {
                complete(response::get_memory_status(reply))
            }
            (Operation::GetParams, Continuation::Index(index)) => {
                complete(response::get_params(reply, index))
            }
            (Operation::SetParams, Continuation::Index(_)) => {
                complete(response::set_params(reply))
            }
            (Operation::GetParamCount, Continuation::None) => {
                complete(response::param_count(reply, self.config.sim_type))
            }
            (Operation::SetMessageStatus, Continuation::StatusRead { index, status }) => {
                response::message_record(reply, index, status)
            }
            (Operation::SetMessageStatus, Continuation::StatusWrite { index }) => {
                complete(response::message_status_written(reply, index))
            }
            (
                operation @ (Operation::SetServiceCenter | Operation::SetMemoryStatus),
                Continuation::None,
            ) => complete(response::acknowledge(reply, operation)),
            (operation, continuation) => {
                warn!(
                    "No decoder for {:?} with {:?}, failing the request",
                    operation, continuation
                );
                complete(SmsResponse::Ack {
                    operation,
                    result: SmsResultCode::DeviceFailure,
                })
            }
        }
    }

    /// Decode one unsolicited group into an event, if it is one this engine
    /// understands
    pub fn on_notification(&self, group: &UrcGroup) -> Option<NotificationEvent> {
        self.notifications.decode(group, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at::{FinalResponse, ResponseArity};

    fn send(progress: Progress) -> PendingExchange {
        match progress {
            Progress::Send(exchange) => exchange,
            Progress::Complete(response) => panic!("completed early: {response:?}"),
        }
    }

    fn complete(progress: Progress) -> SmsResponse {
        match progress {
            Progress::Complete(response) => response,
            Progress::Send(exchange) => panic!("unexpected exchange: {exchange:?}"),
        }
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SmsEngine>();
    }

    #[test]
    fn test_dispatch_carries_index() {
        let engine = SmsEngine::default();
        let exchange = send(engine.dispatch(&SmsRequest::ReadMessage { index: 3 }).unwrap());
        assert_eq!(exchange.operation, Operation::ReadMessage);
        assert_eq!(exchange.continuation, Continuation::Index(3));
        assert_eq!(exchange.request.command, "AT+CMGR=4\r");
    }

    #[test]
    fn test_delivery_report_completes_immediately() {
        let engine = SmsEngine::default();
        let response = complete(engine.dispatch(&SmsRequest::SetDeliveryReport).unwrap());
        assert_eq!(
            response,
            SmsResponse::Ack {
                operation: Operation::SetDeliveryReport,
                result: SmsResultCode::Success,
            }
        );
    }

    #[test]
    fn test_preferred_bearer_not_supported() {
        let engine = SmsEngine::default();
        assert_eq!(
            engine.dispatch(&SmsRequest::GetPreferredBearer),
            Err(RequestError::NotSupported(Operation::GetPreferredBearer))
        );
        assert!(matches!(
            engine.dispatch(&SmsRequest::SetPreferredBearer { bearer: 2 }),
            Err(RequestError::NotSupported(Operation::SetPreferredBearer))
        ));
    }

    #[test]
    fn test_invalid_memory_status_rejected() {
        let engine = SmsEngine::default();
        assert!(matches!(
            engine.dispatch(&SmsRequest::SetMemoryStatus { status: 2 }),
            Err(RequestError::InvalidArgument { .. })
        ));
        let exchange = send(
            engine
                .dispatch(&SmsRequest::set_memory_status(MemoryStatus::Full))
                .unwrap(),
        );
        assert_eq!(exchange.request.command, "AT+XTESM=1\r");
        assert_eq!(exchange.request.arity, ResponseArity::None);
    }

    #[test]
    fn test_set_acknowledged() {
        let engine = SmsEngine::default();
        let address = AddressInfo::international("447700900123").unwrap();
        let exchange = send(
            engine
                .dispatch(&SmsRequest::SetServiceCenter { address })
                .unwrap(),
        );
        let response = complete(engine.on_response(exchange.clone(), &AtResponse::ok(Vec::<&str>::new())));
        assert_eq!(response.result(), SmsResultCode::Success);

        let response = complete(
            engine.on_response(exchange, &AtResponse::failed(FinalResponse::CmsError(330))),
        );
        assert_eq!(
            response,
            SmsResponse::Ack {
                operation: Operation::SetServiceCenter,
                result: SmsResultCode::DeviceFailure,
            }
        );
    }

    #[test]
    fn test_timeout_treated_as_failure() {
        let engine = SmsEngine::default();
        let exchange = send(engine.dispatch(&SmsRequest::DeleteMessage { index: 1 }).unwrap());
        let response = complete(engine.on_response(exchange, &AtResponse::timeout()));
        assert_eq!(
            response,
            SmsResponse::Deleted {
                index: 1,
                result: SmsResultCode::DeviceFailure,
            }
        );
    }

    #[test]
    fn test_mismatched_continuation_fails() {
        let engine = SmsEngine::default();
        let exchange = send(engine.dispatch(&SmsRequest::ReadMessage { index: 3 }).unwrap());
        let exchange = PendingExchange::new(exchange.operation, exchange.request, Continuation::None);

        let response = complete(engine.on_response(exchange, &AtResponse::ok(Vec::<&str>::new())));
        assert_eq!(
            response,
            SmsResponse::Ack {
                operation: Operation::ReadMessage,
                result: SmsResultCode::DeviceFailure,
            }
        );
    }
}
