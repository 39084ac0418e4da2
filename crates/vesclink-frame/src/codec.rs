use std::ops::Range;

use bytes::{Bytes, BytesMut};

use crate::crc::crc16;
use crate::error::InvalidFrame;

/// Start byte for frames with a 1-byte length field.
pub const SOF_SMALL: u8 = 2;

/// Start byte for frames with a 2-byte length field.
pub const SOF_LARGE: u8 = 3;

/// End-of-frame marker.
pub const EOF: u8 = 3;

/// Largest payload that fits the small header form.
pub const MAX_SMALL_PAYLOAD: usize = 255;

/// Largest payload the firmware accepts.
pub const MAX_PAYLOAD_SIZE: usize = 1024;

/// Small header (2) + CRC (2) + EOF (1), with an empty payload.
pub const MIN_FRAME_SIZE: usize = 5;

/// Large header (3) + CRC (2) + EOF (1) + maximum payload.
pub const MAX_FRAME_SIZE: usize = 6 + MAX_PAYLOAD_SIZE;

/// CRC (2) + EOF (1).
const TRAILER_SIZE: usize = 3;

/// Whether `byte` can open a frame.
pub fn is_start_byte(byte: u8) -> bool {
    byte == SOF_SMALL || byte == SOF_LARGE
}

fn header_size(payload_len: usize) -> usize {
    if payload_len <= MAX_SMALL_PAYLOAD {
        2
    } else {
        3
    }
}

/// A complete frame on the wire.
///
/// The frame owns its backing buffer; the payload is a range into it.
/// Cloning is cheap, the buffer is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    buf: Bytes,
    payload: Range<usize>,
}

impl Frame {
    /// The whole frame, start byte through end byte.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// The payload (type id followed by the packet body).
    pub fn payload(&self) -> &[u8] {
        &self.buf[self.payload.clone()]
    }

    /// Where the payload sits inside [`Frame::as_bytes`].
    pub fn payload_range(&self) -> Range<usize> {
        self.payload.clone()
    }

    /// Payload length in bytes.
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Total number of bytes this frame occupies on the wire.
    pub fn wire_size(&self) -> usize {
        self.buf.len()
    }

    /// First payload byte, if the payload is not empty.
    pub fn type_id(&self) -> Option<u8> {
        self.payload().first().copied()
    }

    /// Checksum stored in the frame trailer.
    pub fn crc(&self) -> u16 {
        let at = self.payload.end;
        u16::from_be_bytes([self.buf[at], self.buf[at + 1]])
    }

    /// Give up the frame and keep its wire bytes.
    pub fn into_bytes(self) -> Bytes {
        self.buf
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// A frame whose envelope is written but whose payload is still being filled.
///
/// Obtained from [`build_frame`]; [`FrameBuilder::finish`] seals it.
#[derive(Debug)]
pub struct FrameBuilder {
    buf: BytesMut,
    payload: Range<usize>,
}

impl FrameBuilder {
    /// Mutable access to the zero-initialized payload region.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.payload.clone()]
    }

    /// Compute the checksum, write it before the end byte, and freeze.
    pub fn finish(mut self) -> Frame {
        let crc = crc16(&self.buf[self.payload.clone()]);
        let at = self.payload.end;
        self.buf[at..at + 2].copy_from_slice(&crc.to_be_bytes());
        Frame {
            buf: self.buf.freeze(),
            payload: self.payload,
        }
    }
}

/// Allocate a frame for a payload of `payload_size` bytes.
///
/// The start byte, length field and end byte are written immediately; the
/// header form is chosen from the size.
///
/// # Panics
///
/// Panics if `payload_size` exceeds [`MAX_PAYLOAD_SIZE`].
pub fn build_frame(payload_size: usize) -> FrameBuilder {
    assert!(
        payload_size <= MAX_PAYLOAD_SIZE,
        "payload of {payload_size} bytes exceeds maximum of {MAX_PAYLOAD_SIZE}"
    );

    let header = header_size(payload_size);
    let mut buf = BytesMut::zeroed(header + payload_size + TRAILER_SIZE);
    if header == 2 {
        buf[0] = SOF_SMALL;
        buf[1] = payload_size as u8;
    } else {
        buf[0] = SOF_LARGE;
        buf[1..3].copy_from_slice(&(payload_size as u16).to_be_bytes());
    }
    let last = buf.len() - 1;
    buf[last] = EOF;

    FrameBuilder {
        buf,
        payload: header..header + payload_size,
    }
}

/// Wrap bytes that are already known to hold a valid frame.
///
/// No checksum or marker is re-checked here; callers obtain `payload` from
/// [`locate_frame`].
///
/// # Panics
///
/// Panics if `raw` is shorter than [`MIN_FRAME_SIZE`] or longer than
/// [`MAX_FRAME_SIZE`], or if `payload` does not leave at least one byte
/// before it and one byte after it.
pub fn extract_frame(raw: Bytes, payload: Range<usize>) -> Frame {
    assert!(
        (MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&raw.len()),
        "frame of {} bytes is outside {MIN_FRAME_SIZE}..={MAX_FRAME_SIZE}",
        raw.len()
    );
    assert!(
        payload.start >= 1 && payload.start <= payload.end && payload.end < raw.len(),
        "payload range {payload:?} is not inside a {}-byte frame",
        raw.len()
    );
    Frame { buf: raw, payload }
}

/// Outcome of looking for a frame at the start of a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locate {
    /// A structurally valid frame with a matching checksum.
    Complete {
        /// Bytes the frame occupies, from the start byte.
        frame_len: usize,
        /// Payload position relative to the window start.
        payload: Range<usize>,
    },
    /// The window is a prefix of a frame; `needed` more bytes are required
    /// before the next decision is possible.
    Incomplete { needed: usize },
    /// The window does not start with a valid frame.
    Invalid(InvalidFrame),
}

/// Check whether `window` begins with a complete, valid frame.
///
/// Decisions are made as early as the bytes allow: a bad start byte or
/// length is reported from the header alone, before the rest has arrived.
pub fn locate_frame(window: &[u8]) -> Locate {
    let header = match window.first() {
        None => return Locate::Incomplete { needed: 2 },
        Some(&SOF_SMALL) => 2,
        Some(&SOF_LARGE) => 3,
        Some(&other) => return Locate::Invalid(InvalidFrame::InvalidStart(other)),
    };
    if window.len() < header {
        return Locate::Incomplete {
            needed: header - window.len(),
        };
    }

    // A large header may declare a small length; accepted as-is.
    let len = if header == 2 {
        window[1] as usize
    } else {
        u16::from_be_bytes([window[1], window[2]]) as usize
    };
    if len == 0 || len > MAX_PAYLOAD_SIZE {
        return Locate::Invalid(InvalidFrame::PayloadLength(len));
    }

    let frame_len = header + len + TRAILER_SIZE;
    if window.len() < frame_len {
        return Locate::Incomplete {
            needed: frame_len - window.len(),
        };
    }

    let end = window[frame_len - 1];
    if end != EOF {
        return Locate::Invalid(InvalidFrame::InvalidEnd(end));
    }

    let payload = header..header + len;
    let expected = u16::from_be_bytes([window[payload.end], window[payload.end + 1]]);
    let computed = crc16(&window[payload.clone()]);
    if expected != computed {
        return Locate::Invalid(InvalidFrame::CrcMismatch { expected, computed });
    }

    Locate::Complete { frame_len, payload }
}
