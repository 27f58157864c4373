// ABOUTME: Builder for SMS clients over TCP or any other async byte stream
// ABOUTME: Combines engine and client configuration and prepares the modem for PDU mode

use crate::client::config::ClientConfig;
use crate::client::default::SmsClient;
use crate::client::error::{ClientError, ClientResult};
use crate::client::traits::AtTransport;
use crate::config::EngineConfig;
use crate::connection::AtConnection;
use crate::engine::SmsEngine;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Builds [`SmsClient`]s.
///
/// # Example
///
/// ```rust,no_run
/// use modem_sms::client::{ClientBuilder, ClientConfig};
/// use modem_sms::config::{EngineConfig, SimType};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut client = ClientBuilder::new()
///     .engine_config(EngineConfig::default().with_sim_type(SimType::Gsm))
///     .client_config(ClientConfig::default())
///     .connect("localhost:7000")
///     .await?;
///
/// for message in client.read_all().await? {
///     println!("{}: {:?}", message.sim_index, message.status);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone)]
pub struct ClientBuilder {
    engine_config: EngineConfig,
    client_config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine_config(mut self, config: EngineConfig) -> Self {
        self.engine_config = config;
        self
    }

    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    /// Connect to a modem exposed over TCP
    pub async fn connect<A: ToSocketAddrs>(
        self,
        addr: A,
    ) -> ClientResult<SmsClient<AtConnection<TcpStream>>> {
        let connection = AtConnection::connect(addr).await?;
        self.stream(connection).await
    }

    /// Use an already open stream, such as a serial port
    pub async fn stream<S>(self, connection: AtConnection<S>) -> ClientResult<SmsClient<AtConnection<S>>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let connection = connection
            .with_prompt_timeout(self.client_config.prompt_timeout)
            .with_resync_timeout(self.client_config.resync_timeout);
        self.transport(connection).await
    }

    /// Wrap any transport
    pub async fn transport<T: AtTransport>(self, transport: T) -> ClientResult<SmsClient<T>> {
        let select_pdu_mode = self.client_config.select_pdu_mode;
        let mut client = SmsClient::new(
            transport,
            SmsEngine::new(self.engine_config),
            self.client_config,
        );
        if select_pdu_mode && !client.select_pdu_mode().await? {
            return Err(ClientError::Connection(std::io::Error::other(
                "modem does not accept PDU mode",
            )));
        }
        Ok(client)
    }
}
