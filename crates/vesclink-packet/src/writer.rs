use std::io::{self, ErrorKind, Write};

use vesclink_frame::Frame;

use crate::error::{Result, StreamError};
use crate::packet::VescPacket;

/// Writes complete packets to any `Write` stream.
///
/// Every frame is written whole and flushed before the call returns; there is
/// no acknowledgement to wait for.
pub struct PacketWriter<T> {
    inner: T,
}

impl<T: Write> PacketWriter<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Write a packet's frame and flush (blocking).
    pub fn write_packet<P: VescPacket + ?Sized>(&mut self, packet: &P) -> Result<()> {
        self.write_frame(packet.frame())
    }

    /// Write several packets back to back, flushing once at the end.
    pub fn write_batch<'a, P, I>(&mut self, packets: I) -> Result<usize>
    where
        P: VescPacket + ?Sized + 'a,
        I: IntoIterator<Item = &'a P>,
    {
        let mut written = 0usize;
        for packet in packets {
            self.put(packet.frame().as_bytes())?;
            written += 1;
        }
        self.flush()?;
        Ok(written)
    }

    /// Write an already-built frame and flush (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.put(frame.as_bytes())?;
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        let inner = &mut self.inner;
        retrying(|| inner.flush())
    }

    fn put(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            let inner = &mut self.inner;
            match retrying(|| inner.write(bytes))? {
                0 => return Err(StreamError::ConnectionClosed),
                n => bytes = &bytes[n..],
            }
        }
        Ok(())
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

// Serial drivers in non-blocking mode report WouldBlock while the output
// queue drains.
fn retrying<R>(mut op: impl FnMut() -> io::Result<R>) -> Result<R> {
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {}
            Err(err) => return Err(StreamError::Io(err)),
        }
    }
}
