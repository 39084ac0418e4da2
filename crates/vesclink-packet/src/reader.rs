use std::io::{ErrorKind, Read};
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tracing::trace;
use vesclink_frame::MAX_FRAME_SIZE;

use crate::error::{Result, StreamError};
use crate::packet::Packet;
use crate::registry::PacketRegistry;
use crate::scan::scan_next;

const INITIAL_BUFFER_CAPACITY: usize = 2 * MAX_FRAME_SIZE;
const READ_CHUNK_SIZE: usize = 1024;

/// Reads complete packets from any `Read` stream.
///
/// Uses the same resynchronizing scan as the stream reassembler: garbage and
/// rejected frames are skipped, callers only ever see decoded packets.
pub struct PacketReader<T> {
    inner: T,
    buf: BytesMut,
    registry: Arc<PacketRegistry>,
    rejected: u64,
}

impl<T: Read> PacketReader<T> {
    /// Create a reader that decodes the built-in packet types.
    pub fn new(inner: T) -> Self {
        Self::with_registry(inner, PacketRegistry::standard())
    }

    /// Create a reader with an explicit registry.
    pub fn with_registry(inner: T, registry: Arc<PacketRegistry>) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            registry,
            rejected: 0,
        }
    }

    /// Read the next packet (blocking).
    ///
    /// EOF yields `Err(StreamError::ConnectionClosed)`; a trailing partial
    /// frame stays buffered.
    pub fn read_packet(&mut self) -> Result<Packet> {
        loop {
            if let Some(packet) = self.next_buffered() {
                return Ok(packet);
            }
            if self.fill()? == 0 {
                return Err(StreamError::ConnectionClosed);
            }
        }
    }

    fn next_buffered(&mut self) -> Option<Packet> {
        let rejected = &mut self.rejected;
        let (consumed, packet) = scan_next(&self.buf, &self.registry, &mut |offset, rejection| {
            *rejected += 1;
            trace!(offset, %rejection, "skipping rejected frame");
        });
        self.buf.advance(consumed);
        packet
    }

    /// Append one read's worth of bytes; `Ok(0)` at EOF.
    fn fill(&mut self) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(StreamError::Io(err)),
            }
        }
    }

    /// Number of candidate frames rejected so far.
    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    /// Bytes buffered but not yet decoded.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Iterator for PacketReader<T> {
    type Item = Result<Packet>;

    /// Yields packets until the stream ends; EOF ends iteration.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_packet() {
            Ok(packet) => Some(Ok(packet)),
            Err(StreamError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
