//! SMS over AT commands for cellular modems.
//!
//! The crate turns SMS operations into modem commands and modem replies
//! into results:
//!
//! * [`codec`] - hex transport encoding and the SMS PDU layout
//! * [`fcp`] - SIM file descriptors returned by restricted SIM access
//! * [`command`] - one request builder per operation
//! * [`response`] - one reply decoder per operation, including chained steps
//! * [`notification`] - unsolicited result codes decoded into events
//! * [`engine`] - [`SmsEngine`], the operation table tying these together
//!
//! The engine does no I/O. [`connection::AtConnection`] frames AT lines over
//! any async stream and [`client::SmsClient`] drives the engine over it.
//!
//! # Example
//!
//! ```rust
//! use modem_sms::{AtResponse, EngineConfig, Progress, SmsEngine, SmsRequest, SmsResponse};
//!
//! let engine = SmsEngine::new(EngineConfig::default());
//!
//! // Stored count chains a listing after the storage selection
//! let Ok(Progress::Send(cpms)) = engine.dispatch(&SmsRequest::GetStoredCount) else {
//!     unreachable!()
//! };
//! let Progress::Send(cmgl) = engine.on_response(cpms, &AtResponse::ok(["+CPMS: 0,30,0,30,0,30"])) else {
//!     unreachable!()
//! };
//! assert_eq!(cmgl.request.command, "AT+CMGL=4\r");
//!
//! let Progress::Complete(response) = engine.on_response(cmgl, &AtResponse::ok(Vec::<String>::new())) else {
//!     unreachable!()
//! };
//! assert!(matches!(response, SmsResponse::StoredCount { used: 0, total: 30, .. }));
//! assert!(response.result().is_success());
//! ```

pub mod at;
pub mod client;
pub mod codec;
pub mod command;
pub mod config;
pub mod connection;
pub mod datatypes;
pub mod engine;
pub mod error;
pub mod fcp;
pub mod notification;
pub mod response;


// Re-export the exchange types for direct access
pub use at::{AtRequest, AtResponse, FinalResponse, ResponseArity, UrcGroup};
pub use codec::{CodecError, Decodable, Encodable};
pub use config::{EngineConfig, SimType};
pub use engine::{
    Continuation, Operation, PendingExchange, Progress, SmsEngine, SmsRequest, SmsResponse,
};
pub use error::RequestError;
pub use fcp::{FcpDescriptor, FileType};
pub use notification::{NotificationEvent, NotificationRegistry, StoredKind};

// Re-export the main client API for easy access
pub use client::{AtTransport, ClientBuilder, ClientConfig, ClientError, ClientResult, SmsClient};
