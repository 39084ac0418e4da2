use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;
use vesclink_frame::Frame;

use crate::error::StreamError;
use crate::packet::{Packet, VescPacket};
use crate::registry::PacketRegistry;
use crate::scan::scan_next;

/// `tokio_util` codec over the VESC framing.
///
/// Decoding uses the same resynchronizing scan as [`crate::PacketReader`].
#[derive(Debug, Clone)]
pub struct VescCodec {
    registry: Arc<PacketRegistry>,
}

impl VescCodec {
    pub fn new() -> Self {
        Self::with_registry(PacketRegistry::standard())
    }

    pub fn with_registry(registry: Arc<PacketRegistry>) -> Self {
        Self { registry }
    }
}

impl Default for VescCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for VescCodec {
    type Item = Packet;
    type Error = StreamError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, StreamError> {
        let (consumed, packet) = scan_next(src, &self.registry, &mut |offset, rejection| {
            trace!(offset, %rejection, "skipping rejected frame");
        });
        src.advance(consumed);
        Ok(packet)
    }

    /// At end of stream a pending candidate can never complete, so its start
    /// byte is dropped and scanning resumes behind it.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, StreamError> {
        loop {
            if let Some(packet) = self.decode(src)? {
                return Ok(Some(packet));
            }
            if src.is_empty() {
                return Ok(None);
            }
            trace!(len = src.len(), "dropping truncated frame candidate at end of stream");
            src.advance(1);
        }
    }
}

impl Encoder<Frame> for VescCodec {
    type Error = StreamError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), StreamError> {
        dst.extend_from_slice(frame.as_bytes());
        Ok(())
    }
}

impl Encoder<Packet> for VescCodec {
    type Error = StreamError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<(), StreamError> {
        dst.extend_from_slice(packet.frame().as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::commands::{SetCurrentBrake, SetDutyCycle};
    use crate::telemetry::RequestTelemetry;

    #[tokio::test]
    async fn decodes_stream_with_garbage() {
        let mut wire = vec![0x11, 0x22];
        wire.extend_from_slice(SetDutyCycle::new(0.5).frame().as_bytes());
        wire.extend_from_slice(RequestTelemetry::new().frame().as_bytes());

        let mut framed = FramedRead::new(wire.as_slice(), VescCodec::new());
        let first = framed.next().await.unwrap().unwrap();
        let second = framed.next().await.unwrap().unwrap();
        assert_eq!(first.name(), "SetDuty");
        assert_eq!(second.name(), "RequestValues");
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn partial_frame_at_eof_ends_stream() {
        let frame = SetCurrentBrake::new(4.0).into_frame();
        let wire = frame.as_bytes()[..5].to_vec();

        let mut framed = FramedRead::new(wire.as_slice(), VescCodec::new());
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn frame_after_corrupt_frame_is_recovered_at_eof() {
        let mut wire = SetDutyCycle::new(0.5).frame().as_bytes().to_vec();
        wire[4] ^= 0x10;
        wire.extend_from_slice(RequestTelemetry::new().frame().as_bytes());

        let mut framed = FramedRead::new(wire.as_slice(), VescCodec::new());
        let packet = framed.next().await.unwrap().unwrap();
        assert!(matches!(packet, Packet::RequestTelemetry(_)));
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn encodes_packets_and_frames() {
        let mut framed = FramedWrite::new(Vec::new(), VescCodec::new());
        framed
            .send(Packet::RequestTelemetry(RequestTelemetry::new()))
            .await
            .unwrap();
        framed
            .send(SetDutyCycle::new(0.5).into_frame())
            .await
            .unwrap();

        let wire = framed.into_inner();
        assert_eq!(hex::encode(wire), "0201044084030205050000c3503aa503");
    }
}
