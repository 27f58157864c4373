// ABOUTME: Builds the literal AT command for each SMS operation
// ABOUTME: Validates caller input first so a rejected request never produces wire bytes

use crate::at::{AtRequest, CTRL_Z, ResponseArity};
use crate::codec::{Encodable, MAX_SCA_SIZE, MAX_TPDU_SIZE, bytes_to_hex};
use crate::datatypes::{
    AddressInfo, CbConfig, CbSelection, MAX_CB_IDS, MemoryStatus, MessageStatus, SMSP_ALPHA_MAX,
    SMSP_FIXED_LEN, SmsParams, SmsPdu,
};
use crate::error::RequestError;
use std::fmt::{self, Write};
use tracing::debug;

/// EF-SMS, stored short messages
pub const EF_SMS: u16 = 0x6F3C;
/// EF-SMSP, short message service parameters
pub const EF_SMSP: u16 = 0x6F42;
/// Size of one EF-SMS record
pub const EF_SMS_RECORD_LEN: usize = 176;

const CRSM_READ_RECORD: u8 = 178;
const CRSM_UPDATE_RECORD: u8 = 220;
const CRSM_GET_RESPONSE: u8 = 192;
/// P2 for absolute record addressing
const RECORD_MODE_ABSOLUTE: u8 = 4;

/// `AT+CMGS=<len>\r<pdu>^Z\r`
pub fn send_message(pdu: &SmsPdu) -> Result<AtRequest, RequestError> {
    check_pdu(pdu)?;
    let hex = pdu.to_hex()?;
    let command = format_command(
        format_args!("AT+CMGS={}\r{hex}{CTRL_Z}\r", pdu.msg_length()),
        hex.len() + 16,
    )?;
    Ok(request(command, Some("+CMGS"), ResponseArity::SingleLine))
}

/// `AT+CMGR=<index+1>\r`
pub fn read_message(index: u32) -> Result<AtRequest, RequestError> {
    let command = format_command(format_args!("AT+CMGR={}\r", wire_index(index)?), 16)?;
    Ok(request(command, Some("+CMGR"), ResponseArity::SingleLine))
}

/// `AT+CMGW=<len>,<stat>\r<pdu>^Z\r`; only the four storable states are accepted
pub fn save_message(status: MessageStatus, pdu: &SmsPdu) -> Result<AtRequest, RequestError> {
    let stat = status.to_stat().ok_or_else(|| {
        RequestError::invalid("status", format!("{status:?} cannot be stored"))
    })?;
    check_pdu(pdu)?;
    let hex = pdu.to_hex()?;
    let command = format_command(
        format_args!("AT+CMGW={},{stat}\r{hex}{CTRL_Z}\r", pdu.msg_length()),
        hex.len() + 20,
    )?;
    Ok(request(command, Some("+CMGW"), ResponseArity::SingleLine))
}

/// `AT+CMGD=<index+1>,0\r`
///
/// Like every other storage command the wire index is the API index plus
/// one. Indices reported back by `+CMGW`, `+CMGL` and the `+C*TI` notices
/// are decoded as wire index minus one, so the two directions round trip.
pub fn delete_message(index: u32) -> Result<AtRequest, RequestError> {
    let command = format_command(format_args!("AT+CMGD={},0\r", wire_index(index)?), 16)?;
    Ok(request(command, None, ResponseArity::None))
}

/// Selects SIM storage for reading, writing and receiving, reporting its usage
pub fn stored_count() -> Result<AtRequest, RequestError> {
    let command = format_command(format_args!("AT+CPMS=\"SM\",\"SM\",\"SM\"\r"), 24)?;
    Ok(request(command, Some("+CPMS"), ResponseArity::SingleLine))
}

/// Lists every stored message, `4` being "all" in PDU mode
pub fn list_indices() -> Result<AtRequest, RequestError> {
    let command = format_command(format_args!("AT+CMGL=4\r"), 12)?;
    Ok(request(command, Some("+CMGL"), ResponseArity::MultiLine))
}

pub fn get_service_center() -> Result<AtRequest, RequestError> {
    let command = format_command(format_args!("AT+CSCA?\r"), 12)?;
    Ok(request(command, Some("+CSCA"), ResponseArity::SingleLine))
}

/// `AT+CSCA=<digits>,<toa>\r`
pub fn set_service_center(address: &AddressInfo) -> Result<AtRequest, RequestError> {
    if address.is_empty() {
        return Err(RequestError::invalid("address", "service centre address is empty"));
    }
    let command = format_command(
        format_args!(
            "AT+CSCA={},{}\r",
            address.as_str(),
            address.type_of_address()
        ),
        address.len() + 16,
    )?;
    Ok(request(command, None, ResponseArity::None))
}

pub fn get_cb_config() -> Result<AtRequest, RequestError> {
    let command = format_command(format_args!("AT+CSCB?\r"), 12)?;
    Ok(request(command, Some("+CSCB"), ResponseArity::SingleLine))
}

/// `AT+CSCB=0` disables, `AT+CSCB=1` accepts everything and
/// `AT+CSCB=0,"<mids>"` accepts the listed identifiers.
pub fn set_cb_config(config: &CbConfig, max_ids: usize) -> Result<AtRequest, RequestError> {
    let limit = config.max_id_count.min(max_ids);
    if config.max_id_count > MAX_CB_IDS {
        return Err(RequestError::invalid(
            "max_id_count",
            format!("{} exceeds {MAX_CB_IDS}", config.max_id_count),
        ));
    }

    let command = if config.is_off() {
        format_command(format_args!("AT+CSCB=0\r"), 12)?
    } else if config.selection == CbSelection::All {
        format_command(format_args!("AT+CSCB=1\r"), 12)?
    } else {
        if config.msg_ids.is_empty() {
            return Err(RequestError::invalid("msg_ids", "no identifiers selected"));
        }
        if config.msg_ids.len() > limit {
            return Err(RequestError::invalid(
                "msg_ids",
                format!("{} identifiers exceeds {limit}", config.msg_ids.len()),
            ));
        }
        for (i, id) in config.msg_ids.iter().enumerate() {
            if config.msg_ids[..i].contains(id) {
                return Err(RequestError::invalid("msg_ids", format!("duplicate id {id}")));
            }
        }
        let mids = config.mids_string();
        format_command(format_args!("AT+CSCB=0,\"{mids}\"\r"), mids.len() + 16)?
    };

    Ok(request(command, None, ResponseArity::None))
}

pub fn get_memory_status() -> Result<AtRequest, RequestError> {
    let command = format_command(format_args!("AT+XTESM?\r"), 12)?;
    Ok(request(command, Some("+XTESM"), ResponseArity::SingleLine))
}

/// Tells the modem whether the host can take more messages. `raw` is
/// checked against [`MemoryStatus`].
pub fn set_memory_status(raw: u8) -> Result<AtRequest, RequestError> {
    let status = MemoryStatus::try_from(raw)
        .map_err(|_| RequestError::invalid("status", format!("unknown memory status {raw}")))?;
    let command = format_command(format_args!("AT+XTESM={}\r", status as u8), 16)?;
    Ok(request(command, None, ResponseArity::None))
}

/// Reads one EF-SMSP record
pub fn get_params(index: u32, record_len: u8) -> Result<AtRequest, RequestError> {
    check_params_len(record_len as usize)?;
    crsm(
        CRSM_READ_RECORD,
        EF_SMSP,
        wire_index(index)?,
        record_len as usize,
        None,
    )
}

/// Writes one EF-SMSP record
pub fn set_params(index: u32, params: &SmsParams) -> Result<AtRequest, RequestError> {
    if params.alpha_id.len() > SMSP_ALPHA_MAX {
        return Err(RequestError::invalid(
            "alpha_id",
            format!("{} bytes exceeds {SMSP_ALPHA_MAX}", params.alpha_id.len()),
        ));
    }
    let hex = params.to_hex()?;
    crsm(
        CRSM_UPDATE_RECORD,
        EF_SMSP,
        wire_index(index)?,
        params.record_len(),
        Some(&hex),
    )
}

/// GET RESPONSE on EF-SMSP, answered with its file descriptor
pub fn param_count() -> Result<AtRequest, RequestError> {
    let command = format_command(
        format_args!("AT+CRSM={CRSM_GET_RESPONSE},{}\r", EF_SMSP),
        24,
    )?;
    Ok(request(command, Some("+CRSM"), ResponseArity::SingleLine))
}

/// Reads the EF-SMS record holding message `index`
pub fn read_message_record(index: u32) -> Result<AtRequest, RequestError> {
    crsm(
        CRSM_READ_RECORD,
        EF_SMS,
        wire_index(index)?,
        EF_SMS_RECORD_LEN,
        None,
    )
}

/// Writes back a full EF-SMS record
pub fn update_message_record(index: u32, record: &[u8]) -> Result<AtRequest, RequestError> {
    if record.len() != EF_SMS_RECORD_LEN {
        return Err(RequestError::invalid(
            "record",
            format!("{} bytes, expected {EF_SMS_RECORD_LEN}", record.len()),
        ));
    }
    let hex = bytes_to_hex(record);
    crsm(
        CRSM_UPDATE_RECORD,
        EF_SMS,
        wire_index(index)?,
        EF_SMS_RECORD_LEN,
        Some(&hex),
    )
}

fn crsm(
    command: u8,
    file_id: u16,
    record: u32,
    len: usize,
    data: Option<&str>,
) -> Result<AtRequest, RequestError> {
    let command = match data {
        Some(hex) => format_command(
            format_args!(
                "AT+CRSM={command},{file_id},{record},{RECORD_MODE_ABSOLUTE},{len},{hex}\r"
            ),
            hex.len() + 40,
        )?,
        None => format_command(
            format_args!("AT+CRSM={command},{file_id},{record},{RECORD_MODE_ABSOLUTE},{len}\r"),
            40,
        )?,
    };
    Ok(request(command, Some("+CRSM"), ResponseArity::SingleLine))
}

fn check_pdu(pdu: &SmsPdu) -> Result<(), RequestError> {
    if pdu.msg_length() == 0 || pdu.msg_length() > MAX_TPDU_SIZE {
        return Err(RequestError::invalid(
            "tpdu",
            format!("length {} outside 1-{MAX_TPDU_SIZE}", pdu.msg_length()),
        ));
    }
    if pdu.sca().len() > MAX_SCA_SIZE {
        return Err(RequestError::invalid(
            "sca",
            format!("{} octets exceeds {MAX_SCA_SIZE}", pdu.sca().len()),
        ));
    }
    Ok(())
}

fn check_params_len(len: usize) -> Result<(), RequestError> {
    if !(SMSP_FIXED_LEN..=SMSP_FIXED_LEN + SMSP_ALPHA_MAX).contains(&len) {
        return Err(RequestError::invalid(
            "record_len",
            format!(
                "{len} outside {SMSP_FIXED_LEN}-{}",
                SMSP_FIXED_LEN + SMSP_ALPHA_MAX
            ),
        ));
    }
    Ok(())
}

/// Storage indices are zero-based in the API and one-based on the wire
fn wire_index(index: u32) -> Result<u32, RequestError> {
    index
        .checked_add(1)
        .ok_or_else(|| RequestError::invalid("index", format!("{index} out of range")))
}

fn format_command(args: fmt::Arguments<'_>, capacity: usize) -> Result<String, RequestError> {
    let mut command = String::new();
    command.try_reserve(capacity)?;
    command
        .write_fmt(args)
        .map_err(|_| RequestError::OutOfMemory)?;
    Ok(command)
}

fn request(command: String, prefix: Option<&'static str>, arity: ResponseArity) -> AtRequest {
    debug!("built command {:?}", command);
    AtRequest {
        command,
        prefix,
        arity,
    }
}
