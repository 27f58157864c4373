// ABOUTME: Engine configuration covering card type, notification policy and protocol limits
// ABOUTME: Builder-style setters over sensible defaults so hosts only override what they need

use crate::datatypes::{MAX_CB_IDS, SMSP_FIXED_LEN};

/// Card application in use, selecting the GET RESPONSE layout
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum SimType {
    /// 2G SIM, legacy fixed-offset file descriptor
    Gsm,
    /// 3G/4G USIM, FCP template
    #[default]
    Usim,
}

/// Configuration for an [`SmsEngine`](crate::SmsEngine)
///
/// # Example
///
/// ```rust
/// use modem_sms::config::{EngineConfig, SimType};
///
/// let config = EngineConfig::default()
///     .with_sim_type(SimType::Gsm)
///     .with_report_not_ready(true);
/// assert_eq!(config.max_cb_ids, 100);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Card type used when parsing file descriptors (default: USIM)
    pub sim_type: SimType,

    /// Emit `DeviceReady(false)` for non-ready SIM states (default: false)
    ///
    /// When false only the ready transition produces an event.
    pub report_not_ready: bool,

    /// Largest cell broadcast id list accepted by set-config (default: 100)
    pub max_cb_ids: usize,

    /// Cap on indices returned by the stored-message listing (default: 255)
    pub max_stored_messages: usize,

    /// Largest cell broadcast page forwarded as an event (default: 88)
    pub cb_page_size_max: usize,

    /// Record length requested when reading EF-SMSP (default: 28)
    pub sms_params_record_len: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sim_type: SimType::Usim,
            report_not_ready: false,
            max_cb_ids: MAX_CB_IDS,
            max_stored_messages: 255,
            cb_page_size_max: 88,
            sms_params_record_len: SMSP_FIXED_LEN as u8,
        }
    }
}

impl EngineConfig {
    pub fn with_sim_type(mut self, sim_type: SimType) -> Self {
        self.sim_type = sim_type;
        self
    }

    pub fn with_report_not_ready(mut self, report: bool) -> Self {
        self.report_not_ready = report;
        self
    }

    /// Set the cell broadcast id limit, clamped to 100
    pub fn with_max_cb_ids(mut self, max: usize) -> Self {
        self.max_cb_ids = max.min(MAX_CB_IDS);
        self
    }

    pub fn with_max_stored_messages(mut self, max: usize) -> Self {
        self.max_stored_messages = max;
        self
    }

    /// Set the EF-SMSP record length, for cards that carry an alpha identifier
    pub fn with_sms_params_record_len(mut self, len: u8) -> Self {
        self.sms_params_record_len = len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.sim_type, SimType::Usim);
        assert!(!config.report_not_ready);
        assert_eq!(config.max_stored_messages, 255);
        assert_eq!(config.cb_page_size_max, 88);
        assert_eq!(config.sms_params_record_len, 28);
    }

    #[test]
    fn test_cb_limit_clamped() {
        let config = EngineConfig::default().with_max_cb_ids(500);
        assert_eq!(config.max_cb_ids, 100);
    }
}
