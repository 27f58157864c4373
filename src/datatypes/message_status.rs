/// Status of a message held in SIM or modem storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageStatus {
    Unread,
    Read,
    Unsent,
    Sent,
    Delivered,
    DeliveryUnconfirmed,
    MessageReplaced,
    Reserved,
}

impl MessageStatus {
    /// Maps the `<stat>` field of a `+CMGR`/`+CMGL` reply in PDU mode.
    /// Values outside 0..=3 are reported as `Reserved`.
    pub fn from_stat(stat: u8) -> Self {
        match stat {
            0 => MessageStatus::Unread,
            1 => MessageStatus::Read,
            2 => MessageStatus::Unsent,
            3 => MessageStatus::Sent,
            _ => MessageStatus::Reserved,
        }
    }

    /// The `<stat>` value accepted by `+CMGW`; only the four storable states have one.
    pub fn to_stat(self) -> Option<u8> {
        match self {
            MessageStatus::Unread => Some(0),
            MessageStatus::Read => Some(1),
            MessageStatus::Unsent => Some(2),
            MessageStatus::Sent => Some(3),
            _ => None,
        }
    }

    /// First byte of an EF-SMS record (3GPP TS 31.102 4.2.25).
    pub fn to_record_status(self) -> u8 {
        match self {
            MessageStatus::Read => 0x01,
            MessageStatus::Unread => 0x03,
            MessageStatus::Unsent => 0x07,
            MessageStatus::Sent => 0x05,
            MessageStatus::Delivered => 0x1D,
            MessageStatus::DeliveryUnconfirmed => 0x0D,
            MessageStatus::MessageReplaced | MessageStatus::Reserved => 0x03,
        }
    }
}
