use num_enum::TryFromPrimitive;

/// Outcome carried by every SMS response. Failures detected while decoding
/// modem data end up here rather than as errors.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum SmsResultCode {
    #[default]
    Success = 0x00,

    /// Modem rejected the command or replied with missing or unexpected data
    DeviceFailure = 0x01,

    /// Reply was structurally unusable (missing PDU, undecodable hex)
    PhoneFailure = 0x02,

    /// PDU lengths in the reply do not add up
    InvalidParameterFormat = 0x03,

    Unknown = 0x04,

    /// Network or SIM level error reported with a 3GPP cause
    ThreeGppError = 0x05,
}

impl SmsResultCode {
    pub fn is_success(&self) -> bool {
        *self == SmsResultCode::Success
    }
}
