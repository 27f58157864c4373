mod address;
mod cb_config;
mod memory_status;
mod message_status;
mod numeric_plan_indicator;
mod result_code;
mod sms_params;
mod sms_pdu;
mod stored_message;
mod type_of_number;

pub use address::{AddressError, AddressInfo, MAX_DIGITS};
pub use cb_config::{CbConfig, CbSelection, MAX_CB_IDS, parse_mids};
pub use memory_status::MemoryStatus;
pub use message_status::MessageStatus;
pub use numeric_plan_indicator::NumericPlanIndicator;
pub use result_code::SmsResultCode;
pub use sms_params::{SMSP_ALPHA_MAX, SMSP_FIXED_LEN, SmsParams};
pub use sms_pdu::{SmsPdu, encode_sca};
pub use stored_message::StoredMessage;
pub use type_of_number::TypeOfNumber;

/// Which storage a message or notification refers to, the `<mem>` field of
/// `+CPMS` and the `+C*TI` notifications
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Storage {
    Sim,
    Modem,
    StatusReports,
    Broadcast,
    Other,
}

impl Storage {
    pub fn from_mem(mem: &str) -> Self {
        match mem {
            "SM" => Storage::Sim,
            "ME" | "MT" => Storage::Modem,
            "SR" => Storage::StatusReports,
            "BM" => Storage::Broadcast,
            _ => Storage::Other,
        }
    }
}
