use bytes::Bytes;
use vesclink_frame::{extract_frame, locate_frame, Locate};

use crate::error::Rejection;
use crate::packet::Packet;
use crate::registry::PacketRegistry;

/// Result of attempting to decode a packet at the start of a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A packet was decoded from the first `packet.frame().wire_size()` bytes.
    Packet(Packet),
    /// The window holds the start of a frame; at least `needed` more bytes are
    /// required. Nothing should be discarded.
    Incomplete { needed: usize },
    /// The window does not start with an acceptable frame. The caller should
    /// skip one byte and try again.
    Rejected(Rejection),
}

/// Decode a packet from the start of `window`.
///
/// Checks run in order: header (start byte and declared length), completeness,
/// end byte and checksum, then type lookup and the type's own decoder. The
/// frame bytes are copied out of `window`, so the caller may reuse its buffer.
pub fn create_packet(window: &[u8], registry: &PacketRegistry) -> Decoded {
    let (frame_len, payload) = match locate_frame(window) {
        Locate::Complete { frame_len, payload } => (frame_len, payload),
        Locate::Incomplete { needed } => return Decoded::Incomplete { needed },
        Locate::Invalid(err) => return Decoded::Rejected(Rejection::Frame(err)),
    };

    // locate_frame never returns an empty payload.
    let type_id = window[payload.start];
    let Some(entry) = registry.lookup(type_id) else {
        return Decoded::Rejected(Rejection::UnknownType(type_id));
    };

    let frame = extract_frame(Bytes::copy_from_slice(&window[..frame_len]), payload);
    match (entry.decode)(frame) {
        Ok(packet) => Decoded::Packet(packet),
        Err(source) => Decoded::Rejected(Rejection::Malformed { type_id, source }),
    }
}
