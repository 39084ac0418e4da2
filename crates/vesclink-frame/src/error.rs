/// Reasons a candidate frame is discarded.
///
/// These are never fatal: a stream scanner drops one byte and resynchronizes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidFrame {
    /// The first byte is not a start-of-frame marker.
    #[error("invalid start byte 0x{0:02x}")]
    InvalidStart(u8),

    /// The declared payload length is zero or above the protocol maximum.
    #[error("invalid payload length {0} (must be 1..=1024)")]
    PayloadLength(usize),

    /// The byte where the end-of-frame marker belongs holds something else.
    #[error("invalid end byte 0x{0:02x} (expected 0x03)")]
    InvalidEnd(u8),

    /// The stored checksum does not match the payload.
    #[error("crc mismatch (frame 0x{expected:04x}, computed 0x{computed:04x})")]
    CrcMismatch { expected: u16, computed: u16 },
}

impl InvalidFrame {
    /// Whether the frame was complete and only its integrity check failed.
    pub fn is_checksum(&self) -> bool {
        matches!(self, Self::CrcMismatch { .. })
    }
}
