//! Frame codec for the VESC serial protocol.
//!
//! Every message on the wire is wrapped as:
//! - a start byte (`2` for payloads up to 255 bytes, `3` for larger ones)
//! - a 1-byte or 2-byte big-endian payload length
//! - the payload, whose first byte is the packet type id
//! - a CRC-16/XMODEM of the payload, big-endian
//! - an end byte (`3`)
//!
//! This crate only knows about that envelope. Interpreting payloads is the
//! job of `vesclink-packet`.

pub mod codec;
pub mod crc;
pub mod error;

pub use codec::{
    build_frame, extract_frame, is_start_byte, locate_frame, Frame, FrameBuilder, Locate, EOF,
    MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE, MAX_SMALL_PAYLOAD, MIN_FRAME_SIZE, SOF_LARGE, SOF_SMALL,
};
pub use crc::crc16;
pub use error::InvalidFrame;
