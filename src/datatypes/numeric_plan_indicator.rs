use num_enum::TryFromPrimitive;

/// Numbering plan identification, the low nibble of a type-of-address octet.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum NumericPlanIndicator {
    #[default]
    Unknown = 0b0000,
    Isdn = 0b0001,
    Data = 0b0011,
    Telex = 0b0100,
    ServiceCenterSpecific = 0b0101,
    ServiceCenterSpecific2 = 0b0110,
    National = 0b1000,
    Private = 0b1001,
    Ermes = 0b1010,
    Reserved = 0b1111,
}
