// ABOUTME: Timing configuration for the SMS client driving an AT connection
// ABOUTME: Response, prompt and resync timeouts, with builder-style setters over defaults

use std::time::Duration;

/// Configuration for [`SmsClient`](crate::client::SmsClient)
///
/// # Example
///
/// ```rust
/// use modem_sms::client::ClientConfig;
/// use std::time::Duration;
///
/// // Default configuration (30s response timeout, 5s prompt timeout)
/// let config = ClientConfig::default();
///
/// // Slow network, e.g. sending over a congested cell
/// let config = ClientConfig::new(Duration::from_secs(60))
///     .with_prompt_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Longest wait for the final result of one exchange (default: 30 seconds)
    ///
    /// Sending goes through the network before `+CMGS` is answered, so this
    /// should stay well above typical submission latency. An exchange that
    /// runs out of time is decoded as a failed reply.
    pub response_timeout: Duration,

    /// Longest wait for the `> ` prompt of a two-part command (default: 5 seconds)
    pub prompt_timeout: Duration,

    /// Longest wait for the late reply of a timed out exchange before the
    /// next command is written (default: 1 second)
    pub resync_timeout: Duration,

    /// Select PDU mode with `AT+CMGF=0` when connecting (default: true)
    pub select_pdu_mode: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(30),
            prompt_timeout: Duration::from_secs(5),
            resync_timeout: Duration::from_secs(1),
            select_pdu_mode: true,
        }
    }
}

impl ClientConfig {
    /// Create a configuration with a custom response timeout
    pub fn new(response_timeout: Duration) -> Self {
        Self {
            response_timeout,
            ..Default::default()
        }
    }

    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    pub fn with_resync_timeout(mut self, timeout: Duration) -> Self {
        self.resync_timeout = timeout;
        self
    }

    pub fn with_pdu_mode_selection(mut self, select: bool) -> Self {
        self.select_pdu_mode = select;
        self
    }
}
