// ABOUTME: Decodes modem replies into SMS results, one decoder per operation
// ABOUTME: Malformed or missing data becomes a result code; chained steps return the next exchange

use crate::at::AtResponse;
use crate::at::responses::{
    CmglEntry, CmgrHeader, CpmsCounts, CrsmReply, CscaReply, CscbReply, NumericReply,
};
use crate::codec::{Decodable, hex_to_bytes};
use crate::command::{self, EF_SMS_RECORD_LEN};
use crate::config::SimType;
use crate::datatypes::{
    AddressInfo, CbConfig, MemoryStatus, MessageStatus, SmsParams, SmsPdu, SmsResultCode,
    StoredMessage, parse_mids,
};
use crate::engine::{Continuation, Operation, PendingExchange, Progress, SmsResponse};
use crate::fcp::FcpDescriptor;
use bytes::Bytes;
use tracing::{debug, warn};

/// EF-SMS status byte of an unused record
const RECORD_FREE: u8 = 0x00;

/// Outcome of a failed exchange.
///
/// The numeric cause of `+CMS ERROR`/`+CME ERROR` is logged but not mapped.
fn failure(reply: &AtResponse, what: &str) -> SmsResultCode {
    match reply.error_cause() {
        Some(cause) => warn!("{} failed with unmapped cause {}", what, cause),
        None => warn!("{} failed: {:?}", what, reply.final_response),
    }
    SmsResultCode::DeviceFailure
}

/// The first information line of a successful reply
fn first_line<'a>(reply: &'a AtResponse, what: &str) -> Result<&'a str, SmsResultCode> {
    if !reply.success {
        return Err(failure(reply, what));
    }
    reply.line(0).ok_or_else(|| {
        warn!("{} succeeded without an information line", what);
        SmsResultCode::DeviceFailure
    })
}

/// `+CMGS: <mr>`
pub fn send_message(reply: &AtResponse) -> SmsResponse {
    match first_line(reply, "send") {
        Ok(line) => match NumericReply::parse(line).value {
            Some(message_ref) => {
                debug!("Message sent, reference {}", message_ref);
                SmsResponse::Sent {
                    message_ref: Some(message_ref),
                    result: SmsResultCode::Success,
                }
            }
            None => SmsResponse::Sent {
                message_ref: None,
                result: SmsResultCode::DeviceFailure,
            },
        },
        Err(result) => SmsResponse::Sent {
            message_ref: None,
            result,
        },
    }
}

/// `+CMGR: <stat>,[<alpha>],<length>` followed by the hex PDU
pub fn read_message(reply: &AtResponse, index: u32) -> SmsResponse {
    let result = |result| SmsResponse::Read {
        index,
        message: None,
        result,
    };

    if !reply.success {
        return result(failure(reply, "read"));
    }
    let Some(header_line) = reply.line(0) else {
        warn!("Read of {} returned no lines", index);
        return result(SmsResultCode::PhoneFailure);
    };

    let header = CmgrHeader::parse(header_line);
    let (Some(stat), Some(length)) = (header.status, header.length) else {
        warn!("Read header incomplete: {:?}", header_line);
        return result(SmsResultCode::InvalidParameterFormat);
    };

    let Some(pdu_line) = reply.line(1) else {
        warn!("Read of {} returned no PDU", index);
        return result(SmsResultCode::PhoneFailure);
    };
    let bytes = match hex_to_bytes(pdu_line.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Read PDU is not hex: {}", e);
            return result(SmsResultCode::PhoneFailure);
        }
    };

    match SmsPdu::decode_with_length(&bytes, length) {
        Ok(pdu) => {
            debug!("Read {}: stat {}, {} TPDU octets", index, stat, pdu.msg_length());
            SmsResponse::Read {
                index,
                message: Some(StoredMessage {
                    sim_index: index,
                    status: MessageStatus::from_stat(stat),
                    pdu,
                }),
                result: SmsResultCode::Success,
            }
        }
        Err(e) => {
            warn!("Read PDU rejected: {}", e);
            result(SmsResultCode::InvalidParameterFormat)
        }
    }
}

/// `+CMGW: <index>`, reported one-based
pub fn save_message(reply: &AtResponse) -> SmsResponse {
    let line = match first_line(reply, "save") {
        Ok(line) => line,
        Err(result) => {
            return SmsResponse::Saved {
                index: None,
                result,
            };
        }
    };

    match NumericReply::parse(line).value {
        Some(wire) if wire > 0 => SmsResponse::Saved {
            index: Some(wire - 1),
            result: SmsResultCode::Success,
        },
        _ => {
            warn!("Save reply without a usable index: {:?}", line);
            SmsResponse::Saved {
                index: None,
                result: SmsResultCode::DeviceFailure,
            }
        }
    }
}

pub fn delete_message(reply: &AtResponse, index: u32) -> SmsResponse {
    let result = if reply.success {
        SmsResultCode::Success
    } else {
        failure(reply, "delete")
    };
    SmsResponse::Deleted { index, result }
}

/// First step of the stored count: `+CPMS` counts, then the `+CMGL` listing
pub fn stored_count(reply: &AtResponse) -> Progress {
    let fail = |result| {
        Progress::Complete(SmsResponse::StoredCount {
            used: 0,
            total: 0,
            indices: Vec::new(),
            result,
        })
    };

    let line = match first_line(reply, "storage selection") {
        Ok(line) => line,
        Err(result) => return fail(result),
    };
    let CpmsCounts {
        used: Some(used),
        total: Some(total),
    } = CpmsCounts::parse(line)
    else {
        warn!("Storage counts missing: {:?}", line);
        return fail(SmsResultCode::DeviceFailure);
    };

    match command::list_indices() {
        Ok(request) => {
            debug!("{} of {} stored, listing indices", used, total);
            Progress::Send(PendingExchange::new(
                Operation::GetStoredCount,
                request,
                Continuation::StoredCount { used, total },
            ))
        }
        Err(e) => {
            warn!("Could not build listing: {}", e);
            fail(SmsResultCode::DeviceFailure)
        }
    }
}

/// Second step of the stored count. Indices are reported zero-based and
/// capped at `max`.
pub fn list_indices(reply: &AtResponse, used: u32, total: u32, max: usize) -> SmsResponse {
    let response = |indices, result| SmsResponse::StoredCount {
        used,
        total,
        indices,
        result,
    };

    if !reply.success {
        return response(Vec::new(), failure(reply, "listing"));
    }

    // PDU lines follow each header in the listing; headers have a status field
    let indices: Vec<u32> = reply
        .lines
        .iter()
        .map(|line| CmglEntry::parse(line))
        .filter(|entry| entry.status.is_some())
        .filter_map(|entry| entry.index)
        .filter(|wire| *wire > 0)
        .map(|wire| wire - 1)
        .take(max)
        .collect();

    if indices.is_empty() && used > 0 {
        warn!("{} messages reported but none listed", used);
        return response(indices, SmsResultCode::DeviceFailure);
    }

    debug!("Listed {} stored messages", indices.len());
    response(indices, SmsResultCode::Success)
}

/// `+CSCA: "<sca>",<tosca>`
pub fn get_service_center(reply: &AtResponse) -> SmsResponse {
    let response = |address, result| SmsResponse::ServiceCenter { address, result };

    let line = match first_line(reply, "service centre query") {
        Ok(line) => line,
        Err(result) => return response(None, result),
    };
    let CscaReply {
        address: Some(digits),
        toa: Some(toa),
    } = CscaReply::parse(line)
    else {
        warn!("Service centre reply incomplete: {:?}", line);
        return response(None, SmsResultCode::DeviceFailure);
    };

    let (ton, npi) = AddressInfo::split_type_of_address(toa);
    match AddressInfo::new(&digits, ton, npi) {
        Ok(address) if !address.is_empty() => response(Some(address), SmsResultCode::Success),
        Ok(_) => response(None, SmsResultCode::DeviceFailure),
        Err(e) => {
            warn!("Service centre address rejected: {}", e);
            response(None, SmsResultCode::InvalidParameterFormat)
        }
    }
}

/// `+CSCB: <mode>,"<mids>","<dcss>"`
pub fn get_cb_config(reply: &AtResponse, max_ids: usize) -> SmsResponse {
    let response = |config, result| SmsResponse::CbConfig { config, result };

    let line = match first_line(reply, "broadcast query") {
        Ok(line) => line,
        Err(result) => return response(None, result),
    };
    let cscb = CscbReply::parse(line);
    let Some(mode) = cscb.mode else {
        warn!("Broadcast reply without a mode: {:?}", line);
        return response(None, SmsResultCode::DeviceFailure);
    };

    let mids = cscb.mids.unwrap_or_default();
    let mut config = if mids.is_empty() {
        if mode == 1 {
            CbConfig::all()
        } else {
            CbConfig::disabled()
        }
    } else {
        match parse_mids(&mids, max_ids) {
            Some(ids) if !ids.is_empty() => CbConfig::some(ids),
            _ => {
                warn!("Broadcast id list rejected: {:?}", mids);
                return response(None, SmsResultCode::InvalidParameterFormat);
            }
        }
    };
    config.max_id_count = max_ids;

    debug!("Broadcast config {:?}", config);
    response(Some(config), SmsResultCode::Success)
}

/// Broadcast configuration failures are reported as network errors
pub fn set_cb_config(reply: &AtResponse) -> SmsResponse {
    let result = if reply.success {
        SmsResultCode::Success
    } else {
        failure(reply, "broadcast configuration");
        SmsResultCode::ThreeGppError
    };
    SmsResponse::Ack {
        operation: Operation::SetCbConfig,
        result,
    }
}

/// `+XTESM: <0|1>`
pub fn get_memory_status(reply: &AtResponse) -> SmsResponse {
    let response = |status, result| SmsResponse::MemoryStatus { status, result };

    let line = match first_line(reply, "memory status query") {
        Ok(line) => line,
        Err(result) => return response(None, result),
    };
    let status = NumericReply::parse(line)
        .value
        .and_then(|v| u8::try_from(v).ok())
        .and_then(|v| MemoryStatus::try_from(v).ok());
    match status {
        Some(status) => response(Some(status), SmsResultCode::Success),
        None => {
            warn!("Memory status reply unusable: {:?}", line);
            response(None, SmsResultCode::DeviceFailure)
        }
    }
}

/// Checks the status words of a `+CRSM` reply
fn sim_reply(reply: &AtResponse, what: &str, file_access: bool) -> Result<CrsmReply, SmsResultCode> {
    let crsm = CrsmReply::parse(first_line(reply, what)?);
    let accepted = if file_access {
        crsm.is_access_success()
    } else {
        crsm.is_success()
    };
    if !accepted {
        warn!(
            "{} returned status words {:?}/{:?}",
            what, crsm.sw1, crsm.sw2
        );
        return Err(SmsResultCode::DeviceFailure);
    }
    Ok(crsm)
}

/// Hex payload of a successful `+CRSM` reply
fn sim_data(crsm: &CrsmReply, what: &str) -> Result<Bytes, SmsResultCode> {
    let Some(data) = crsm.data.as_deref() else {
        warn!("{} returned no data", what);
        return Err(SmsResultCode::DeviceFailure);
    };
    hex_to_bytes(data).map_err(|e| {
        warn!("{} data rejected: {}", what, e);
        SmsResultCode::InvalidParameterFormat
    })
}

pub fn get_params(reply: &AtResponse, index: u32) -> SmsResponse {
    let decoded = sim_reply(reply, "parameter read", false)
        .and_then(|crsm| sim_data(&crsm, "parameter read"))
        .and_then(|data| {
            SmsParams::decode(&mut std::io::Cursor::new(&data[..])).map_err(|e| {
                warn!("Parameter record rejected: {}", e);
                SmsResultCode::InvalidParameterFormat
            })
        });

    match decoded {
        Ok(params) => SmsResponse::Params {
            index,
            params: Some(params),
            result: SmsResultCode::Success,
        },
        Err(result) => SmsResponse::Params {
            index,
            params: None,
            result,
        },
    }
}

pub fn set_params(reply: &AtResponse) -> SmsResponse {
    let result = match sim_reply(reply, "parameter update", false) {
        Ok(_) => SmsResultCode::Success,
        Err(result) => result,
    };
    SmsResponse::Ack {
        operation: Operation::SetParams,
        result,
    }
}

/// The record count of EF-SMSP, taken from its file descriptor
pub fn param_count(reply: &AtResponse, sim_type: SimType) -> SmsResponse {
    let decoded = sim_reply(reply, "parameter file query", true)
        .and_then(|crsm| sim_data(&crsm, "parameter file query"))
        .and_then(|data| {
            FcpDescriptor::parse(&data, sim_type).map_err(|e| {
                warn!("Parameter file descriptor rejected: {}", e);
                SmsResultCode::InvalidParameterFormat
            })
        });

    match decoded {
        Ok(descriptor) => {
            debug!("EF-SMSP holds {} records", descriptor.record_count);
            SmsResponse::ParamCount {
                descriptor: Some(descriptor),
                result: SmsResultCode::Success,
            }
        }
        Err(result) => SmsResponse::ParamCount {
            descriptor: None,
            result,
        },
    }
}

/// First step of a status change: patch the status byte of the EF-SMS
/// record just read and write the record back.
pub fn message_record(reply: &AtResponse, index: u32, status: MessageStatus) -> Progress {
    let fail = |result| Progress::Complete(SmsResponse::MessageStatusSet { index, result });

    let record = match sim_reply(reply, "message record read", false)
        .and_then(|crsm| sim_data(&crsm, "message record read"))
    {
        Ok(record) => record,
        Err(result) => return fail(result),
    };
    if record.len() != EF_SMS_RECORD_LEN {
        warn!("Message record of {} bytes", record.len());
        return fail(SmsResultCode::InvalidParameterFormat);
    }
    if record[0] == RECORD_FREE {
        warn!("Message record {} is free", index);
        return fail(SmsResultCode::DeviceFailure);
    }

    let mut patched = record.to_vec();
    patched[0] = status.to_record_status();

    match command::update_message_record(index, &patched) {
        Ok(request) => {
            debug!("Record {} status {:#04x} -> {:#04x}", index, record[0], patched[0]);
            Progress::Send(PendingExchange::new(
                Operation::SetMessageStatus,
                request,
                Continuation::StatusWrite { index },
            ))
        }
        Err(e) => {
            warn!("Could not build record update: {}", e);
            fail(SmsResultCode::DeviceFailure)
        }
    }
}

pub fn message_status_written(reply: &AtResponse, index: u32) -> SmsResponse {
    let result = match sim_reply(reply, "message record update", false) {
        Ok(_) => SmsResultCode::Success,
        Err(result) => result,
    };
    SmsResponse::MessageStatusSet { index, result }
}

/// Operations whose reply is only a final result code
pub fn acknowledge(reply: &AtResponse, operation: Operation) -> SmsResponse {
    let result = if reply.success {
        SmsResultCode::Success
    } else {
        failure(reply, &format!("{operation:?}"))
    };
    SmsResponse::Ack { operation, result }
}
