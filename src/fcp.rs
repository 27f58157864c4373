// ABOUTME: Parser for SIM elementary-file descriptors returned by GET RESPONSE
// ABOUTME: Handles the USIM FCP template (ETSI TS 102 221) and the legacy GSM layout (TS 51.011)

use crate::codec::{CodecError, decode_bytes, decode_u8, decode_u16, peek_u8, skip};
use crate::config::SimType;
use bytes::{Buf, Bytes};
use std::io::Cursor;
use tracing::debug;

const TAG_FCP_TEMPLATE: u8 = 0x62;
const TAG_FILE_DESCRIPTOR: u8 = 0x82;
const TAG_FILE_IDENTIFIER: u8 = 0x83;
const TAG_PROPRIETARY: u8 = 0xA5;
const TAG_LIFE_CYCLE_STATUS: u8 = 0x8A;
const TAG_SECURITY_ATTRIBUTES: [u8; 4] = [0x86, 0x8B, 0x8C, 0xAB];
const TAG_FILE_SIZE: u8 = 0x80;
const TAG_TOTAL_FILE_SIZE: u8 = 0x81;
const TAG_SHORT_FILE_ID: u8 = 0x88;

/// GSM file type byte for an elementary file
const GSM_TYPE_EF: u8 = 0x04;
const GSM_RESPONSE_MIN_LEN: usize = 15;

/// Structure of an elementary file
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileType {
    Transparent,
    LinearFixed,
    Cyclic,
}

/// Decoded file descriptor. Record fields are zero for transparent files.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FcpDescriptor {
    pub file_id: u16,
    pub file_type: FileType,
    pub record_len: u16,
    pub record_count: u16,
    pub file_size: u16,
}

impl FcpDescriptor {
    /// Parses a GET RESPONSE payload in the layout used by the given card type
    pub fn parse(data: &[u8], sim_type: SimType) -> Result<Self, CodecError> {
        match sim_type {
            SimType::Usim => parse_usim(data),
            SimType::Gsm => parse_gsm(data),
        }
    }
}

/// Parses a USIM FCP template.
///
/// Mandatory tags must appear in order; optional tags are recognised where
/// they may occur and skipped by their own length.
pub fn parse_usim(data: &[u8]) -> Result<FcpDescriptor, CodecError> {
    let mut outer = Cursor::new(data);
    let template = read_tlv(&mut outer, TAG_FCP_TEMPLATE, "missing FCP template")?;
    let mut buf = Cursor::new(&template[..]);

    let descriptor = read_tlv(&mut buf, TAG_FILE_DESCRIPTOR, "missing file descriptor")?;
    let (file_type, record_len, record_count) = parse_file_descriptor(&descriptor)?;

    let identifier = read_tlv(&mut buf, TAG_FILE_IDENTIFIER, "missing file identifier")?;
    let file_id = decode_u16(&mut Cursor::new(&identifier[..]))
        .map_err(|_| CodecError::InvalidFcpStructure("short file identifier"))?;

    if peek_u8(&buf) == Some(TAG_PROPRIETARY) {
        read_tlv(&mut buf, TAG_PROPRIETARY, "truncated proprietary information")?;
    }

    if peek_u8(&buf) == Some(TAG_LIFE_CYCLE_STATUS) {
        let status = read_tlv(&mut buf, TAG_LIFE_CYCLE_STATUS, "truncated life cycle status")?;
        match status.first() {
            Some(0x05) | Some(0x07) => debug!("file {file_id:#06x} activated"),
            Some(0x04) | Some(0x06) => debug!("file {file_id:#06x} deactivated"),
            other => debug!("file {file_id:#06x} life cycle status {other:?}"),
        }
    }

    match peek_u8(&buf) {
        Some(tag) if TAG_SECURITY_ATTRIBUTES.contains(&tag) => {
            read_tlv(&mut buf, tag, "truncated security attributes")?;
        }
        _ => return Err(CodecError::InvalidFcpStructure("missing security attributes")),
    }

    let size = read_tlv(&mut buf, TAG_FILE_SIZE, "missing file size")?;
    let file_size = decode_u16(&mut Cursor::new(&size[..]))
        .map_err(|_| CodecError::InvalidFcpStructure("short file size"))?;

    if peek_u8(&buf) == Some(TAG_TOTAL_FILE_SIZE) {
        read_tlv(&mut buf, TAG_TOTAL_FILE_SIZE, "truncated total file size")?;
    }

    if peek_u8(&buf) == Some(TAG_SHORT_FILE_ID) {
        read_tlv(&mut buf, TAG_SHORT_FILE_ID, "truncated short file identifier")?;
    }

    let fcp = FcpDescriptor {
        file_id,
        file_type,
        record_len,
        record_count,
        file_size,
    };
    debug!("parsed FCP: {fcp:?}");
    Ok(fcp)
}

/// Parses a GSM (2G) GET RESPONSE. The record count is derived from the
/// file size; a zero record length yields zero records.
pub fn parse_gsm(data: &[u8]) -> Result<FcpDescriptor, CodecError> {
    if data.len() < GSM_RESPONSE_MIN_LEN {
        return Err(CodecError::InvalidFcpStructure("short GSM file response"));
    }

    let mut buf = Cursor::new(data);
    let gsm = |_| CodecError::InvalidFcpStructure("short GSM file response");
    skip(&mut buf, 2).map_err(gsm)?;
    let file_size = decode_u16(&mut buf).map_err(gsm)?;
    let file_id = decode_u16(&mut buf).map_err(gsm)?;
    let kind = decode_u8(&mut buf).map_err(gsm)?;
    if kind != GSM_TYPE_EF {
        return Err(CodecError::InvalidFcpStructure("not an elementary file"));
    }

    let file_type = match data[13] {
        0x00 => FileType::Transparent,
        0x01 => FileType::LinearFixed,
        0x03 => FileType::Cyclic,
        _ => return Err(CodecError::InvalidFcpStructure("file structure")),
    };
    let record_len = data[14] as u16;
    let record_count = if record_len == 0 {
        0
    } else {
        file_size / record_len
    };

    Ok(FcpDescriptor {
        file_id,
        file_type,
        record_len,
        record_count,
        file_size,
    })
}

fn parse_file_descriptor(value: &[u8]) -> Result<(FileType, u16, u16), CodecError> {
    let mut buf = Cursor::new(value);
    let short = |_| CodecError::InvalidFcpStructure("short file descriptor");
    let descriptor = decode_u8(&mut buf).map_err(short)?;
    match descriptor & 0x07 {
        0x01 => Ok((FileType::Transparent, 0, 0)),
        kind @ (0x02 | 0x06) => {
            // data coding byte
            skip(&mut buf, 1).map_err(short)?;
            let record_len = decode_u16(&mut buf).map_err(short)?;
            let record_count = decode_u8(&mut buf).map_err(short)? as u16;
            let file_type = if kind == 0x02 {
                FileType::LinearFixed
            } else {
                FileType::Cyclic
            };
            Ok((file_type, record_len, record_count))
        }
        _ => Err(CodecError::InvalidFcpStructure("unsupported file structure")),
    }
}

/// Reads one BER-TLV with the expected tag and returns its value
fn read_tlv(
    buf: &mut Cursor<&[u8]>,
    expected: u8,
    missing: &'static str,
) -> Result<Bytes, CodecError> {
    if buf.remaining() == 0 || peek_u8(buf) != Some(expected) {
        return Err(CodecError::InvalidFcpStructure(missing));
    }
    buf.advance(1);

    let truncated = |_| CodecError::InvalidFcpStructure(missing);
    let len = match decode_u8(buf).map_err(truncated)? {
        0x81 => decode_u8(buf).map_err(truncated)? as usize,
        len => len as usize,
    };
    decode_bytes(buf, len).map_err(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::hex_to_bytes;

    // EF-SMSP on a USIM: linear fixed, 2 records of 40 bytes
    const USIM_SMSP: &str = "621F8205422100280283026F42A5038001718A01058B036F0606800200508801D0";

    #[test]
    fn test_parse_usim_linear_fixed() {
        let data = hex_to_bytes(USIM_SMSP).unwrap();
        let fcp = parse_usim(&data).unwrap();
        assert_eq!(
            fcp,
            FcpDescriptor {
                file_id: 0x6F42,
                file_type: FileType::LinearFixed,
                record_len: 40,
                record_count: 2,
                file_size: 80,
            }
        );
    }

    #[test]
    fn test_parse_usim_transparent_minimal() {
        // no proprietary, life cycle, total size or SFI tags
        let data = hex_to_bytes("620F8202412183026F4686010080020010").unwrap();
        let fcp = parse_usim(&data).unwrap();
        assert_eq!(fcp.file_type, FileType::Transparent);
        assert_eq!(fcp.record_len, 0);
        assert_eq!(fcp.record_count, 0);
        assert_eq!(fcp.file_size, 16);
    }

    #[test]
    fn test_parse_usim_cyclic() {
        let data = hex_to_bytes("62128205462100100583026F3D8C010080020050").unwrap();
        let fcp = parse_usim(&data).unwrap();
        assert_eq!(fcp.file_type, FileType::Cyclic);
        assert_eq!(fcp.file_id, 0x6F3D);
        assert_eq!(fcp.record_len, 16);
        assert_eq!(fcp.record_count, 5);
    }

    #[test]
    fn test_truncated_after_template_tag() {
        let result = parse_usim(&[0x62]);
        assert!(matches!(result, Err(CodecError::InvalidFcpStructure(_))));

        let result = parse_usim(&[0x62, 0x1E]);
        assert!(matches!(result, Err(CodecError::InvalidFcpStructure(_))));
    }

    #[test]
    fn test_truncated_everywhere_never_panics() {
        let data = hex_to_bytes(USIM_SMSP).unwrap();
        for cut in 0..data.len() {
            assert!(parse_usim(&data[..cut]).is_err(), "cut at {cut}");
        }
    }

    #[test]
    fn test_out_of_order_mandatory_tag() {
        // file identifier before the descriptor
        let data = hex_to_bytes("620C83026F428205422100280286").unwrap();
        let result = parse_usim(&data);
        assert!(matches!(
            result,
            Err(CodecError::InvalidFcpStructure("missing file descriptor"))
        ));
    }

    #[test]
    fn test_missing_security_attributes() {
        let data = hex_to_bytes("620F8205422100280283026F4280020050").unwrap();
        let result = parse_usim(&data);
        assert!(matches!(
            result,
            Err(CodecError::InvalidFcpStructure("missing security attributes"))
        ));
    }

    #[test]
    fn test_parse_gsm_linear_fixed() {
        let data = hex_to_bytes("000000506F42040011FFBB010201281C").unwrap();
        let fcp = parse_gsm(&data).unwrap();
        assert_eq!(fcp.file_id, 0x6F42);
        assert_eq!(fcp.file_type, FileType::LinearFixed);
        assert_eq!(fcp.record_len, 0x28);
        assert_eq!(fcp.record_count, 2);
    }

    #[test]
    fn test_parse_gsm_zero_record_len() {
        let data = hex_to_bytes("000000506F42040011FFBB010200001C").unwrap();
        let fcp = parse_gsm(&data).unwrap();
        assert_eq!(fcp.file_type, FileType::Transparent);
        assert_eq!(fcp.record_count, 0);
    }

    #[test]
    fn test_parse_gsm_not_ef() {
        let data = hex_to_bytes("000000506F42020011FFBB010201281C").unwrap();
        assert!(parse_gsm(&data).is_err());
        assert!(parse_gsm(&data[..10]).is_err());
    }

    #[test]
    fn test_parse_gsm_structure_byte() {
        let cyclic = hex_to_bytes("000000506F42040011FFBB010203281C").unwrap();
        assert_eq!(parse_gsm(&cyclic).unwrap().file_type, FileType::Cyclic);

        let unknown = hex_to_bytes("000000506F42040011FFBB010207281C").unwrap();
        assert!(matches!(
            parse_gsm(&unknown),
            Err(CodecError::InvalidFcpStructure("file structure"))
        ));
    }
}
