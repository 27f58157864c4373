use num_enum::TryFromPrimitive;

/// Type of number, carried in bits 6..4 of a type-of-address octet
/// (3GPP TS 24.008 10.5.4.7).
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum TypeOfNumber {
    #[default]
    Unknown = 0b000,
    International = 0b001,
    National = 0b010,
    NetworkSpecific = 0b011,
    SubscriberNumber = 0b100,
    Alphanumeric = 0b101,
    Abbreviated = 0b110,
    Reserved = 0b111,
}
