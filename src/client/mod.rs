// ABOUTME: SMS client module driving the engine over an AT transport
// ABOUTME: Exports the transport trait, builder, client, configuration and error types

//! SMS Client Module
//!
//! The [`SmsEngine`](crate::SmsEngine) only builds commands and decodes
//! replies. This module adds the loop around it:
//!
//! * **Native async traits** - `AtTransport` uses async fn in traits
//! * **Sequential exchanges** - one command in flight per modem
//! * **Timeouts** - an exchange that runs out of time completes as a failure
//! * **Notifications** - unsolicited codes are decoded into events
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modem_sms::client::ClientBuilder;
//! use modem_sms::SmsRequest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = ClientBuilder::new().connect("localhost:7000").await?;
//!
//! let response = client.execute(&SmsRequest::GetServiceCenter).await?;
//! println!("{:?}", response);
//!
//! while let Some(event) = client.next_event().await? {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Transports
//!
//! Implement [`AtTransport`] to run the client over something other than
//! [`AtConnection`](crate::connection::AtConnection), for example a
//! scripted modem in tests.

pub mod builder;
pub mod config;
pub mod default;
pub mod error;
pub mod traits;

// Re-export the main types for easy access
pub use builder::ClientBuilder;
pub use config::ClientConfig;
pub use default::SmsClient;
pub use error::{ClientError, ClientResult};
pub use traits::AtTransport;
