// ABOUTME: SMS PDU as exchanged with the modem: service centre prefix followed by the TPDU
// ABOUTME: Handles the length-prefixed SCA layout on both the decode and the encode path

use crate::codec::{
    CodecError, Decodable, Encodable, MAX_SCA_SIZE, MAX_TPDU_SIZE, decode_bytes, decode_u8,
};
use crate::datatypes::AddressInfo;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// An SMS PDU split into its service centre prefix and TPDU.
///
/// `sca` holds the raw prefix including its leading length octet, so a PDU
/// that relies on the modem's default service centre has `sca == [0x00]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmsPdu {
    sca: Bytes,
    tpdu: Bytes,
}

impl SmsPdu {
    /// Builds a PDU for transmission. `None` selects the modem's default
    /// service centre.
    pub fn new(sca: Option<&AddressInfo>, tpdu: impl Into<Bytes>) -> Result<Self, CodecError> {
        let tpdu = tpdu.into();
        validate_tpdu_len(tpdu.len())?;
        Ok(Self {
            sca: encode_sca(sca)?,
            tpdu,
        })
    }

    /// Builds a PDU from an already encoded service centre prefix.
    pub fn from_parts(sca: impl Into<Bytes>, tpdu: impl Into<Bytes>) -> Result<Self, CodecError> {
        let sca = sca.into();
        let tpdu = tpdu.into();
        validate_tpdu_len(tpdu.len())?;

        let declared = sca.first().copied().ok_or(CodecError::FieldValidation {
            field: "sca",
            reason: "missing length octet".to_string(),
        })? as usize;
        if declared + 1 != sca.len() || sca.len() > MAX_SCA_SIZE {
            return Err(CodecError::FieldValidation {
                field: "sca",
                reason: format!("prefix of {} octets declares {declared}", sca.len()),
            });
        }

        Ok(Self { sca, tpdu })
    }

    /// Decodes a PDU whose total length was declared separately, as in the
    /// header of a `+CMGR` reply. The TPDU length is `declared - (L + 1)`.
    pub fn decode_with_length(data: &[u8], declared: usize) -> Result<Self, CodecError> {
        let mut buf = Cursor::new(data);
        let sca_len = decode_u8(&mut buf)? as usize;
        let declared = i32::try_from(declared).map_err(|_| CodecError::InvalidPduLength {
            length: i32::MAX,
            max: MAX_TPDU_SIZE,
        })?;
        let tpdu_len = declared - (sca_len as i32 + 1);
        if tpdu_len <= 0 || tpdu_len as usize > MAX_TPDU_SIZE {
            return Err(CodecError::InvalidPduLength {
                length: tpdu_len,
                max: MAX_TPDU_SIZE,
            });
        }

        buf.set_position(0);
        let sca = decode_bytes(&mut buf, sca_len + 1)?;
        let tpdu = decode_bytes(&mut buf, tpdu_len as usize).map_err(|_| {
            CodecError::InvalidPduLength {
                length: tpdu_len,
                max: data.len().saturating_sub(sca_len + 1),
            }
        })?;
        Ok(Self { sca, tpdu })
    }

    /// Raw service centre prefix, length octet included
    pub fn sca(&self) -> &Bytes {
        &self.sca
    }

    pub fn tpdu(&self) -> &Bytes {
        &self.tpdu
    }

    /// Number of TPDU octets; never counts the service centre prefix
    pub fn msg_length(&self) -> usize {
        self.tpdu.len()
    }

    /// Decodes the service centre prefix, `None` when the modem default is used
    pub fn service_center(&self) -> Option<AddressInfo> {
        let (ton, npi) = AddressInfo::split_type_of_address(*self.sca.get(1)?);
        AddressInfo::from_semi_octets(&self.sca[2..], ton, npi).ok()
    }
}

impl Decodable for SmsPdu {
    /// The first octet is the service centre length `L`; the TPDU is
    /// whatever follows the `L + 1` prefix octets.
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let total = buf.remaining();
        let sca_len = decode_u8(buf)? as usize;
        let tpdu_len = total as i32 - (sca_len as i32 + 1);
        if tpdu_len <= 0 || tpdu_len as usize > MAX_TPDU_SIZE {
            return Err(CodecError::InvalidPduLength {
                length: tpdu_len,
                max: MAX_TPDU_SIZE,
            });
        }

        let mut sca = BytesMut::with_capacity(sca_len + 1);
        sca.put_u8(sca_len as u8);
        sca.put(decode_bytes(buf, sca_len)?);
        let tpdu = decode_bytes(buf, tpdu_len as usize)?;

        Ok(Self {
            sca: sca.freeze(),
            tpdu,
        })
    }
}

impl Encodable for SmsPdu {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_slice(&self.sca);
        buf.put_slice(&self.tpdu);
        Ok(())
    }
}

/// Encodes a service centre prefix: `[ceil(digits / 2) + 1, TOA, BCD...]`,
/// or the single octet `00` when no address is given.
pub fn encode_sca(sca: Option<&AddressInfo>) -> Result<Bytes, CodecError> {
    let Some(addr) = sca.filter(|a| !a.is_empty()) else {
        return Ok(Bytes::from_static(&[0x00]));
    };

    let octets = addr.semi_octet_len() + 1;
    if octets + 1 > MAX_SCA_SIZE {
        return Err(CodecError::FieldValidation {
            field: "sca",
            reason: format!("{} octets exceeds {MAX_SCA_SIZE}", octets + 1),
        });
    }

    let mut buf = BytesMut::with_capacity(octets + 1);
    buf.put_u8(octets as u8);
    buf.put_u8(addr.type_of_address());
    buf.put_slice(&addr.to_semi_octets());
    Ok(buf.freeze())
}

fn validate_tpdu_len(len: usize) -> Result<(), CodecError> {
    if len == 0 || len > MAX_TPDU_SIZE {
        return Err(CodecError::InvalidPduLength {
            length: len as i32,
            max: MAX_TPDU_SIZE,
        });
    }
    Ok(())
}
