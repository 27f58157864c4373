// ABOUTME: Turns unsolicited result code groups into typed SMS notification events
// ABOUTME: Decoders are looked up by URC name in a registry built once and never mutated

use crate::at::UrcGroup;
use crate::at::responses::{NumericReply, PduNoticeHeader, StorageNotice};
use crate::codec::{Decodable, hex_to_bytes};
use crate::config::EngineConfig;
use crate::datatypes::{MemoryStatus, SmsPdu, Storage};
use bytes::Bytes;
use std::collections::HashMap;
use tracing::{debug, warn};

/// `+XSIM` state reported once the SIM is initialised and SMS capable
pub const SIM_STATE_READY: u8 = 12;

/// What a storage notification announces
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StoredKind {
    /// `+CMTI`
    Message,
    /// `+CDSI`
    StatusReport,
    /// `+CBMI`
    Broadcast,
}

/// An event decoded from one unsolicited line group
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationEvent {
    /// The SIM became ready for SMS, or left that state
    DeviceReady(bool),
    /// A message delivered directly to the host
    IncomingMessage(SmsPdu),
    /// A status report delivered directly to the host
    IncomingStatusReport(SmsPdu),
    /// A message was written to storage; `index` is zero-based
    MessageStored {
        kind: StoredKind,
        storage: Storage,
        index: u32,
    },
    /// The modem's message storage filled up or has room again
    MemoryStatus(MemoryStatus),
    /// One cell broadcast page
    CellBroadcast { data: Bytes },
}

type DecoderFn = Box<dyn Fn(&UrcGroup, &EngineConfig) -> Option<NotificationEvent> + Send + Sync>;

/// Registry of URC decoders keyed by URC name
pub struct NotificationRegistry {
    decoders: HashMap<&'static str, DecoderFn>,
}

impl NotificationRegistry {
    /// Create a registry with every SMS related URC registered
    pub fn new() -> Self {
        let mut registry = Self {
            decoders: HashMap::new(),
        };

        registry.register("+XSIM", decode_sim_state);
        registry.register("+CMT", |group, _| {
            decode_pdu_notice(group, true).map(NotificationEvent::IncomingMessage)
        });
        registry.register("+CDS", |group, _| {
            decode_pdu_notice(group, false).map(NotificationEvent::IncomingStatusReport)
        });
        registry.register("+CMTI", |group, _| {
            decode_storage_notice(group, StoredKind::Message)
        });
        registry.register("+CDSI", |group, _| {
            decode_storage_notice(group, StoredKind::StatusReport)
        });
        registry.register("+CBMI", |group, _| {
            decode_storage_notice(group, StoredKind::Broadcast)
        });
        registry.register("+XSMSMMSTAT", decode_memory_status);
        registry.register("+CBM", decode_cell_broadcast);

        registry
    }

    fn register<F>(&mut self, name: &'static str, decoder: F)
    where
        F: Fn(&UrcGroup, &EngineConfig) -> Option<NotificationEvent> + Send + Sync + 'static,
    {
        self.decoders.insert(name, Box::new(decoder));
    }

    /// Decode a URC group. Unknown names and malformed groups yield `None`.
    pub fn decode(&self, group: &UrcGroup, config: &EngineConfig) -> Option<NotificationEvent> {
        match self.decoders.get(group.name.as_str()) {
            Some(decoder) => decoder(group, config),
            None => {
                debug!("No decoder registered for {}", group.name);
                None
            }
        }
    }

    /// Check if a URC name is registered
    pub fn is_registered(&self, name: &str) -> bool {
        self.decoders.contains_key(name)
    }

    /// Names the transport should treat as unsolicited
    pub fn registered_names(&self) -> Vec<&'static str> {
        self.decoders.keys().copied().collect()
    }
}

impl Default for NotificationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NotificationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRegistry")
            .field("names", &self.registered_names())
            .finish()
    }
}

fn expect_lines<'a>(group: &'a UrcGroup, count: usize) -> Option<&'a [String]> {
    if group.lines.len() != count {
        warn!(
            "{} carried {} lines, expected {}",
            group.name,
            group.lines.len(),
            count
        );
        return None;
    }
    Some(&group.lines)
}

fn decode_sim_state(group: &UrcGroup, config: &EngineConfig) -> Option<NotificationEvent> {
    let lines = expect_lines(group, 1)?;
    let Some(state) = NumericReply::parse(&lines[0]).value else {
        warn!("{} without a SIM state", group.name);
        return None;
    };

    if state == u32::from(SIM_STATE_READY) {
        debug!("SIM ready for SMS");
        Some(NotificationEvent::DeviceReady(true))
    } else if config.report_not_ready {
        debug!("SIM state {} is not ready", state);
        Some(NotificationEvent::DeviceReady(false))
    } else {
        None
    }
}

/// `+CMT`/`+CDS`: header with the TPDU length, then the hex PDU
fn decode_pdu_notice(group: &UrcGroup, with_alpha: bool) -> Option<SmsPdu> {
    let lines = expect_lines(group, 2)?;
    let header = PduNoticeHeader::parse(&lines[0], with_alpha);
    let Some(length) = header.length else {
        warn!("{} header without a length: {:?}", group.name, lines[0]);
        return None;
    };

    let pdu = match SmsPdu::from_hex(lines[1].trim()) {
        Ok(pdu) => pdu,
        Err(e) => {
            warn!("{} PDU rejected: {}", group.name, e);
            return None;
        }
    };

    if pdu.msg_length() != length {
        warn!(
            "{} declared {} TPDU octets but carried {}",
            group.name,
            length,
            pdu.msg_length()
        );
        return None;
    }

    debug!("{} with {} TPDU octets", group.name, length);
    Some(pdu)
}

fn decode_storage_notice(group: &UrcGroup, kind: StoredKind) -> Option<NotificationEvent> {
    let lines = expect_lines(group, 1)?;
    let notice = StorageNotice::parse(&lines[0]);
    match (notice.mem, notice.index) {
        (Some(mem), Some(index)) if index > 0 => Some(NotificationEvent::MessageStored {
            kind,
            storage: Storage::from_mem(&mem),
            index: index - 1,
        }),
        _ => {
            warn!("{} malformed: {:?}", group.name, lines[0]);
            None
        }
    }
}

fn decode_memory_status(group: &UrcGroup, _config: &EngineConfig) -> Option<NotificationEvent> {
    let lines = expect_lines(group, 1)?;
    match NumericReply::parse(&lines[0]).value {
        Some(0) => Some(NotificationEvent::MemoryStatus(MemoryStatus::Full)),
        Some(_) => Some(NotificationEvent::MemoryStatus(MemoryStatus::Available)),
        None => {
            warn!("{} without a status: {:?}", group.name, lines[0]);
            None
        }
    }
}

fn decode_cell_broadcast(group: &UrcGroup, config: &EngineConfig) -> Option<NotificationEvent> {
    let lines = expect_lines(group, 2)?;
    let length = PduNoticeHeader::parse(&lines[0], false).length.unwrap_or(0);
    if length == 0 || length > config.cb_page_size_max {
        warn!("{} length {} rejected", group.name, length);
        return None;
    }

    let data = match hex_to_bytes(lines[1].trim()) {
        Ok(data) => data,
        Err(e) => {
            warn!("{} page rejected: {}", group.name, e);
            return None;
        }
    };
    if length > data.len() {
        warn!(
            "{} declared {} octets but carried {}",
            group.name,
            length,
            data.len()
        );
        return None;
    }

    Some(NotificationEvent::CellBroadcast {
        data: data.slice(..length),
    })
}
