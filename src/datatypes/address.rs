// ABOUTME: Fixed-capacity dialling number with type-of-number and numbering plan
// ABOUTME: Converts between ASCII digits, type-of-address octets and packed semi-octets

use crate::datatypes::{NumericPlanIndicator, TypeOfNumber};
use std::fmt;
use std::str;

/// Maximum number of dial digits an address can hold.
pub const MAX_DIGITS: usize = 20;

/// A dialling number or service centre address.
///
/// Digits are stored as ASCII from the set `0-9 * # a b c`; a leading `+`
/// is accepted on input and dropped, since the international marker lives
/// in the type of number instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressInfo {
    digits: [u8; MAX_DIGITS],
    length: u8,
    pub ton: TypeOfNumber,
    pub npi: NumericPlanIndicator,
}

impl AddressInfo {
    /// Creates a new address after validating every digit
    pub fn new(
        number: &str,
        ton: TypeOfNumber,
        npi: NumericPlanIndicator,
    ) -> Result<Self, AddressError> {
        let number = number.strip_prefix('+').unwrap_or(number);
        if number.len() > MAX_DIGITS {
            return Err(AddressError::TooLong {
                max_len: MAX_DIGITS,
                actual_len: number.len(),
            });
        }

        let mut digits = [0u8; MAX_DIGITS];
        for (slot, c) in digits.iter_mut().zip(number.chars()) {
            if semi_octet_value(c).is_none() {
                return Err(AddressError::InvalidDigit(c));
            }
            *slot = c as u8;
        }

        Ok(Self {
            digits,
            length: number.len() as u8,
            ton,
            npi,
        })
    }

    /// International ISDN number, the usual shape of a service centre address
    pub fn international(number: &str) -> Result<Self, AddressError> {
        Self::new(number, TypeOfNumber::International, NumericPlanIndicator::Isdn)
    }

    /// National ISDN number
    pub fn national(number: &str) -> Result<Self, AddressError> {
        Self::new(number, TypeOfNumber::National, NumericPlanIndicator::Isdn)
    }

    /// Splits a type-of-address octet into its number type and plan.
    ///
    /// Values outside the known tables fall back to `Unknown`.
    pub fn split_type_of_address(toa: u8) -> (TypeOfNumber, NumericPlanIndicator) {
        let ton = TypeOfNumber::try_from((toa >> 4) & 0x07).unwrap_or_default();
        let npi = NumericPlanIndicator::try_from(toa & 0x0F).unwrap_or_default();
        (ton, npi)
    }

    /// Type-of-address octet: `1 ttt nnnn`
    pub fn type_of_address(&self) -> u8 {
        0x80 | ((self.ton as u8) << 4) | (self.npi as u8)
    }

    pub fn as_str(&self) -> &str {
        str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.digits[..self.length as usize]
    }

    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of octets the digits occupy once packed, `ceil(len / 2)`
    pub fn semi_octet_len(&self) -> usize {
        self.len().div_ceil(2)
    }

    /// Packs the digits two per octet, low nibble first, padding an odd
    /// count with `0xF`.
    pub fn to_semi_octets(&self) -> Vec<u8> {
        self.as_bytes()
            .chunks(2)
            .map(|pair| {
                let low = semi_octet_value(pair[0] as char).unwrap_or(0x0F);
                let high = pair
                    .get(1)
                    .and_then(|c| semi_octet_value(*c as char))
                    .unwrap_or(0x0F);
                (high << 4) | low
            })
            .collect()
    }

    /// Unpacks semi-octets, stopping at the first `0xF` filler nibble.
    pub fn from_semi_octets(
        packed: &[u8],
        ton: TypeOfNumber,
        npi: NumericPlanIndicator,
    ) -> Result<Self, AddressError> {
        let mut number = String::with_capacity(packed.len() * 2);
        'outer: for byte in packed {
            for nibble in [byte & 0x0F, byte >> 4] {
                if nibble == 0x0F {
                    break 'outer;
                }
                number.push(semi_octet_char(nibble));
            }
        }
        Self::new(&number, ton, npi)
    }
}

impl Default for AddressInfo {
    fn default() -> Self {
        Self {
            digits: [0u8; MAX_DIGITS],
            length: 0,
            ton: TypeOfNumber::Unknown,
            npi: NumericPlanIndicator::Unknown,
        }
    }
}

impl fmt::Debug for AddressInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressInfo")
            .field("number", &self.as_str())
            .field("ton", &self.ton)
            .field("npi", &self.npi)
            .finish()
    }
}

impl fmt::Display for AddressInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ton == TypeOfNumber::International {
            write!(f, "+")?;
        }
        write!(f, "{}", self.as_str())
    }
}

fn semi_octet_value(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        '*' => Some(0x0A),
        '#' => Some(0x0B),
        'a' | 'A' => Some(0x0C),
        'b' | 'B' => Some(0x0D),
        'c' | 'C' => Some(0x0E),
        _ => None,
    }
}

fn semi_octet_char(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        0x0A => '*',
        0x0B => '#',
        0x0C => 'a',
        0x0D => 'b',
        _ => 'c',
    }
}

/// Errors that can occur when building an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// More digits than the fixed buffer holds
    TooLong { max_len: usize, actual_len: usize },
    /// A character outside the dialling digit set
    InvalidDigit(char),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::TooLong {
                max_len,
                actual_len,
            } => {
                write!(f, "Address too long: {actual_len} digits (max {max_len})")
            }
            AddressError::InvalidDigit(c) => {
                write!(f, "Invalid dialling digit {c:?}")
            }
        }
    }
}

impl std::error::Error for AddressError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_international_strips_plus() {
        let addr = AddressInfo::international("+447700900123").unwrap();
        assert_eq!(addr.as_str(), "447700900123");
        assert_eq!(addr.len(), 12);
        assert_eq!(addr.to_string(), "+447700900123");
    }

    #[test]
    fn test_invalid_digit() {
        let result = AddressInfo::national("123-456");
        assert!(matches!(result, Err(AddressError::InvalidDigit('-'))));
    }

    #[test]
    fn test_too_long() {
        let result = AddressInfo::national("123456789012345678901");
        assert!(matches!(
            result,
            Err(AddressError::TooLong {
                max_len: 20,
                actual_len: 21
            })
        ));
    }

    #[test]
    fn test_type_of_address_octet() {
        let addr = AddressInfo::international("123").unwrap();
        assert_eq!(addr.type_of_address(), 0x91);

        let (ton, npi) = AddressInfo::split_type_of_address(0xA1);
        assert_eq!(ton, TypeOfNumber::National);
        assert_eq!(npi, NumericPlanIndicator::Isdn);
    }

    #[test]
    fn test_split_unknown_plan_falls_back() {
        let (_, npi) = AddressInfo::split_type_of_address(0x87);
        assert_eq!(npi, NumericPlanIndicator::Unknown);
    }

    #[test]
    fn test_semi_octets_odd_length() {
        let addr = AddressInfo::international("12345").unwrap();
        assert_eq!(addr.semi_octet_len(), 3);
        assert_eq!(addr.to_semi_octets(), vec![0x21, 0x43, 0xF5]);

        let back = AddressInfo::from_semi_octets(
            &[0x21, 0x43, 0xF5],
            TypeOfNumber::International,
            NumericPlanIndicator::Isdn,
        )
        .unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_semi_octets_special_digits() {
        let addr = AddressInfo::national("*#").unwrap();
        assert_eq!(addr.to_semi_octets(), vec![0xBA]);
    }
}
