use num_enum::TryFromPrimitive;

/// Whether the host still has room to store incoming messages, as reported
/// to the modem with `+XTESM`.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemoryStatus {
    Available = 0,
    Full = 1,
}
