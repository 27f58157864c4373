use crate::datatypes::{MessageStatus, SmsPdu};

/// A message read back from SIM storage. Built once from modem data and
/// never modified; a re-read produces a new record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredMessage {
    /// Zero-based storage index
    pub sim_index: u32,
    pub status: MessageStatus,
    pub pdu: SmsPdu,
}
