// SMS codec - hexadecimal transport encoding and bounded binary decoding
//
// Modems exchange SMS PDUs and SIM records as hexadecimal text inside AT
// lines. This module converts between that text and bytes, and provides the
// cursor helpers and traits every binary structure in the crate decodes with.
// No helper ever advances past the end of the supplied buffer.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use thiserror::Error;

/// Largest TPDU a single GSM SMS can carry
pub const MAX_TPDU_SIZE: usize = 255;

/// Largest service centre prefix: length octet, type-of-address and ten
/// octets of packed digits
pub const MAX_SCA_SIZE: usize = 12;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Trait for binary structures that can be decoded from modem data
pub trait Decodable: Sized {
    /// Decode from the cursor, failing with `Incomplete` rather than reading
    /// past the end
    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError>;

    /// Decode from a hex string as carried on an AT line
    fn from_hex(hex: &str) -> Result<Self, CodecError> {
        let bytes = hex_to_bytes(hex)?;
        let mut cursor = Cursor::new(&bytes[..]);
        Self::decode(&mut cursor)
    }
}

/// Trait for binary structures that are sent to the modem
pub trait Encodable {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Encode and render as uppercase hex
    fn to_hex(&self) -> Result<String, CodecError> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(bytes_to_hex(&buf))
    }
}

/// Codec errors with enough context to log
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Incomplete data: need more bytes")]
    Incomplete,

    #[error("Malformed hex at offset {offset}")]
    MalformedHex { offset: usize },

    #[error("Invalid PDU length: {length}, must be 1-{max}")]
    InvalidPduLength { length: i32, max: usize },

    #[error("Invalid FCP structure: {0}")]
    InvalidFcpStructure(&'static str),

    #[error("Field '{field}' validation failed: {reason}")]
    FieldValidation { field: &'static str, reason: String },
}

/// Render bytes as uppercase hex, two characters per byte
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX_DIGITS[(byte >> 4) as usize] as char);
        out.push(HEX_DIGITS[(byte & 0x0F) as usize] as char);
    }
    out
}

/// Parse a hex string, accepting either case
pub fn hex_to_bytes(hex: &str) -> Result<Bytes, CodecError> {
    let raw = hex.as_bytes();
    if raw.len() % 2 != 0 {
        return Err(CodecError::MalformedHex { offset: raw.len() });
    }

    let mut buf = BytesMut::with_capacity(raw.len() / 2);
    for (i, pair) in raw.chunks_exact(2).enumerate() {
        let high = hex_value(pair[0]).ok_or(CodecError::MalformedHex { offset: i * 2 })?;
        let low = hex_value(pair[1]).ok_or(CodecError::MalformedHex { offset: i * 2 + 1 })?;
        buf.put_u8((high << 4) | low);
    }
    Ok(buf.freeze())
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode a single byte
pub fn decode_u8(buf: &mut Cursor<&[u8]>) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u8())
}

/// Decode a 16-bit big-endian integer
pub fn decode_u16(buf: &mut Cursor<&[u8]>) -> Result<u16, CodecError> {
    if buf.remaining() < 2 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u16())
}

/// Copy out exactly `len` bytes
pub fn decode_bytes(buf: &mut Cursor<&[u8]>, len: usize) -> Result<Bytes, CodecError> {
    if buf.remaining() < len {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.copy_to_bytes(len))
}

/// Skip `len` bytes
pub fn skip(buf: &mut Cursor<&[u8]>, len: usize) -> Result<(), CodecError> {
    if buf.remaining() < len {
        return Err(CodecError::Incomplete);
    }
    buf.advance(len);
    Ok(())
}

/// Look at the next byte without consuming it
pub fn peek_u8(buf: &Cursor<&[u8]>) -> Option<u8> {
    buf.chunk().first().copied()
}

pub fn encode_u8(buf: &mut BytesMut, value: u8) {
    buf.put_u8(value);
}

pub fn encode_u16(buf: &mut BytesMut, value: u16) {
    buf.put_u16(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bytes_to_hex_uppercase() {
        assert_eq!(bytes_to_hex(&[0x00, 0xAB, 0x1f]), "00AB1F");
        assert_eq!(bytes_to_hex(&[]), "");
    }

    #[test]
    fn test_hex_to_bytes_mixed_case() {
        let bytes = hex_to_bytes("00aB1F").unwrap();
        assert_eq!(&bytes[..], &[0x00, 0xAB, 0x1F]);
    }

    #[test]
    fn test_hex_to_bytes_odd_length() {
        let result = hex_to_bytes("ABC");
        assert!(matches!(result, Err(CodecError::MalformedHex { offset: 3 })));
    }

    #[test]
    fn test_hex_to_bytes_bad_character() {
        let result = hex_to_bytes("00G1");
        assert!(matches!(result, Err(CodecError::MalformedHex { offset: 2 })));
    }

    #[test]
    fn test_cursor_helpers_fail_closed() {
        let data = [0x01u8, 0x02, 0x03];
        let mut cursor = Cursor::new(&data[..]);

        assert_eq!(decode_u16(&mut cursor).unwrap(), 0x0102);
        assert!(matches!(decode_u16(&mut cursor), Err(CodecError::Incomplete)));
        assert_eq!(peek_u8(&cursor), Some(0x03));
        assert!(matches!(skip(&mut cursor, 2), Err(CodecError::Incomplete)));
        assert_eq!(decode_u8(&mut cursor).unwrap(), 0x03);
        assert!(matches!(decode_bytes(&mut cursor, 1), Err(CodecError::Incomplete)));
        assert_eq!(peek_u8(&cursor), None);
    }

    proptest! {
        #[test]
        fn property_hex_round_trip(data in proptest::collection::vec(any::<u8>(), 1..=255)) {
            let hex = bytes_to_hex(&data);
            prop_assert_eq!(hex.len(), data.len() * 2);
            let back = hex_to_bytes(&hex).unwrap();
            prop_assert_eq!(&back[..], &data[..]);
        }
    }
}
