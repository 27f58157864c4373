// ABOUTME: SMS parameter record stored in the SIM's EF-SMSP file (3GPP TS 31.102 4.2.27)
// ABOUTME: Decodes and encodes the 28 + Y byte layout with its presence indicator

use crate::codec::{CodecError, Decodable, Encodable, decode_bytes, decode_u8};
use crate::datatypes::AddressInfo;
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// Fixed part of an EF-SMSP record, excluding the alpha identifier
pub const SMSP_FIXED_LEN: usize = 28;

/// Longest alpha identifier a record may carry
pub const SMSP_ALPHA_MAX: usize = 128;

const ADDRESS_FIELD_LEN: usize = 12;
const ADDRESS_DIGIT_OCTETS: usize = 10;

const DEST_ABSENT: u8 = 0x01;
const SCA_ABSENT: u8 = 0x02;
const PID_ABSENT: u8 = 0x04;
const DCS_ABSENT: u8 = 0x08;
const VP_ABSENT: u8 = 0x10;

/// One EF-SMSP record. A field is `Some` exactly when its indicator bit is clear.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SmsParams {
    pub alpha_id: Vec<u8>,
    pub dest_addr: Option<AddressInfo>,
    pub service_center: Option<AddressInfo>,
    pub protocol_id: Option<u8>,
    pub dcs: Option<u8>,
    pub validity_period: Option<u8>,
}

impl SmsParams {
    /// Record length this value encodes to
    pub fn record_len(&self) -> usize {
        SMSP_FIXED_LEN + self.alpha_id.len()
    }

    /// Parameter indicator byte; unused high bits stay set
    pub fn indicator(&self) -> u8 {
        let mut indicator = 0xFF;
        if self.dest_addr.is_some() {
            indicator &= !DEST_ABSENT;
        }
        if self.service_center.is_some() {
            indicator &= !SCA_ABSENT;
        }
        if self.protocol_id.is_some() {
            indicator &= !PID_ABSENT;
        }
        if self.dcs.is_some() {
            indicator &= !DCS_ABSENT;
        }
        if self.validity_period.is_some() {
            indicator &= !VP_ABSENT;
        }
        indicator
    }
}

impl Decodable for SmsParams {
    /// The alpha identifier takes whatever precedes the final 28 bytes.
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let total = buf.remaining();
        if total < SMSP_FIXED_LEN {
            return Err(CodecError::Incomplete);
        }
        let alpha_len = total - SMSP_FIXED_LEN;
        if alpha_len > SMSP_ALPHA_MAX {
            return Err(CodecError::FieldValidation {
                field: "alpha_id",
                reason: format!("{alpha_len} bytes exceeds {SMSP_ALPHA_MAX}"),
            });
        }

        let alpha = decode_bytes(buf, alpha_len)?;
        let alpha_id = alpha.iter().take_while(|b| **b != 0xFF).copied().collect();

        let indicator = decode_u8(buf)?;
        let dest = decode_bytes(buf, ADDRESS_FIELD_LEN)?;
        let sca = decode_bytes(buf, ADDRESS_FIELD_LEN)?;
        let pid = decode_u8(buf)?;
        let dcs = decode_u8(buf)?;
        let vp = decode_u8(buf)?;

        let present = |bit: u8| indicator & bit == 0;

        Ok(Self {
            alpha_id,
            dest_addr: if present(DEST_ABSENT) {
                decode_dest_address(&dest)
            } else {
                None
            },
            service_center: if present(SCA_ABSENT) {
                decode_sca_address(&sca)
            } else {
                None
            },
            protocol_id: present(PID_ABSENT).then_some(pid),
            dcs: present(DCS_ABSENT).then_some(dcs),
            validity_period: present(VP_ABSENT).then_some(vp),
        })
    }
}

impl Encodable for SmsParams {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        if self.alpha_id.len() > SMSP_ALPHA_MAX {
            return Err(CodecError::FieldValidation {
                field: "alpha_id",
                reason: format!("{} bytes exceeds {SMSP_ALPHA_MAX}", self.alpha_id.len()),
            });
        }

        buf.put_slice(&self.alpha_id);
        buf.put_u8(self.indicator());

        // TS 23.040 address: length counts digits
        let mut dest = [0xFFu8; ADDRESS_FIELD_LEN];
        if let Some(addr) = &self.dest_addr {
            let digits = addr.to_semi_octets();
            dest[0] = addr.len() as u8;
            dest[1] = addr.type_of_address();
            dest[2..2 + digits.len()].copy_from_slice(&digits);
        }
        buf.put_slice(&dest);

        // TS 24.011 address: length counts octets, type-of-address included
        let mut sca = [0xFFu8; ADDRESS_FIELD_LEN];
        if let Some(addr) = &self.service_center {
            let digits = addr.to_semi_octets();
            sca[0] = digits.len() as u8 + 1;
            sca[1] = addr.type_of_address();
            sca[2..2 + digits.len()].copy_from_slice(&digits);
        }
        buf.put_slice(&sca);

        buf.put_u8(self.protocol_id.unwrap_or(0xFF));
        buf.put_u8(self.dcs.unwrap_or(0xFF));
        buf.put_u8(self.validity_period.unwrap_or(0xFF));
        Ok(())
    }
}

fn decode_dest_address(field: &[u8]) -> Option<AddressInfo> {
    let digits = field[0] as usize;
    if digits == 0 || field[0] == 0xFF {
        return None;
    }
    let octets = digits.div_ceil(2).min(ADDRESS_DIGIT_OCTETS);
    let (ton, npi) = AddressInfo::split_type_of_address(field[1]);
    let addr = AddressInfo::from_semi_octets(&field[2..2 + octets], ton, npi).ok()?;
    if addr.len() > digits {
        return AddressInfo::new(&addr.as_str()[..digits], ton, npi).ok();
    }
    Some(addr)
}

fn decode_sca_address(field: &[u8]) -> Option<AddressInfo> {
    let len = field[0] as usize;
    if len == 0 || field[0] == 0xFF {
        return None;
    }
    let octets = (len - 1).min(ADDRESS_DIGIT_OCTETS);
    let (ton, npi) = AddressInfo::split_type_of_address(field[1]);
    AddressInfo::from_semi_octets(&field[2..2 + octets], ton, npi).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::bytes_to_hex;

    fn sample() -> SmsParams {
        SmsParams {
            alpha_id: b"Home".to_vec(),
            dest_addr: None,
            service_center: Some(AddressInfo::international("447700900123").unwrap()),
            protocol_id: Some(0x00),
            dcs: Some(0x00),
            validity_period: Some(0xA7),
        }
    }

    #[test]
    fn test_indicator_bits() {
        assert_eq!(sample().indicator(), 0xE1);
        assert_eq!(SmsParams::default().indicator(), 0xFF);
    }

    #[test]
    fn test_encode_layout() {
        let hex = sample().to_hex().unwrap();
        assert_eq!(hex.len(), 32 * 2);
        assert!(hex.starts_with("486F6D65E1FFFFFFFFFFFFFFFFFFFFFFFF07914477000910"));
        assert!(hex.ends_with("0000A7"));
    }

    #[test]
    fn test_decode_round_trip() {
        let params = sample();
        let decoded = SmsParams::from_hex(&params.to_hex().unwrap()).unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn test_decode_dest_address() {
        let params = SmsParams {
            dest_addr: Some(AddressInfo::national("12345").unwrap()),
            ..Default::default()
        };
        let decoded = SmsParams::from_hex(&params.to_hex().unwrap()).unwrap();
        assert_eq!(decoded.dest_addr.unwrap().as_str(), "12345");
        assert_eq!(decoded.service_center, None);
    }

    #[test]
    fn test_alpha_stops_at_padding() {
        let mut record = vec![b'A', b'B', 0xFF, 0xFF];
        record.extend_from_slice(&[0xFF; SMSP_FIXED_LEN]);
        let decoded = SmsParams::from_hex(&bytes_to_hex(&record)).unwrap();
        assert_eq!(decoded.alpha_id, b"AB".to_vec());
        assert_eq!(decoded, SmsParams { alpha_id: b"AB".to_vec(), ..Default::default() });
    }

    #[test]
    fn test_short_record() {
        let result = SmsParams::from_hex(&bytes_to_hex(&[0xFF; 27]));
        assert!(matches!(result, Err(CodecError::Incomplete)));
    }
}
