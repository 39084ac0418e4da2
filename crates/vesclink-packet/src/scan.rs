//! Resynchronizing scan over an accumulated byte stream.
//!
//! The scan never blocks and never discards bytes that may still belong to a
//! frame: non-start bytes are skipped, a rejected candidate costs exactly one
//! byte, and a partial frame stops the scan with everything from its start
//! byte onward left in place.
//!
//! The end byte of a rejected frame equals the large-frame start byte, so the
//! scan may then wait on a bogus large header until up to
//! `MAX_FRAME_SIZE` further bytes have arrived.

use vesclink_frame::is_start_byte;

use crate::error::Rejection;
use crate::factory::{create_packet, Decoded};
use crate::packet::{Packet, VescPacket};
use crate::registry::PacketRegistry;

/// Summary of one pass over a buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Leading bytes that can be dropped from the buffer.
    pub consumed: usize,
    /// Packets delivered.
    pub packets: usize,
    /// Candidate frames rejected.
    pub rejected: usize,
    /// Whether the pass stopped at a partial frame.
    pub incomplete: bool,
}

/// Scan forward to the next packet.
///
/// Returns how many leading bytes were used up and the packet, if one was
/// found. `None` means the window is exhausted or ends in a partial frame.
/// `on_reject` sees each rejection with its offset in `window`.
pub fn scan_next<R>(window: &[u8], registry: &PacketRegistry, on_reject: &mut R) -> (usize, Option<Packet>)
where
    R: FnMut(usize, &Rejection),
{
    let mut pos = 0usize;
    while pos < window.len() {
        if !is_start_byte(window[pos]) {
            pos += 1;
            continue;
        }
        match create_packet(&window[pos..], registry) {
            Decoded::Packet(packet) => {
                pos += packet.frame().wire_size();
                return (pos, Some(packet));
            }
            Decoded::Incomplete { .. } => break,
            Decoded::Rejected(rejection) => {
                on_reject(pos, &rejection);
                pos += 1;
            }
        }
    }
    (pos, None)
}

/// Decode every complete packet in `buf`, in stream order.
///
/// The caller drops `report.consumed` leading bytes afterwards.
pub fn scan_buffer<P, R>(
    buf: &[u8],
    registry: &PacketRegistry,
    mut on_packet: P,
    mut on_reject: R,
) -> ScanReport
where
    P: FnMut(Packet),
    R: FnMut(usize, &Rejection),
{
    let mut report = ScanReport::default();
    loop {
        let base = report.consumed;
        let mut rejected = 0usize;
        let (used, packet) = scan_next(&buf[base..], registry, &mut |offset, rejection| {
            rejected += 1;
            on_reject(base + offset, rejection);
        });
        report.consumed += used;
        report.rejected += rejected;

        match packet {
            Some(packet) => {
                report.packets += 1;
                on_packet(packet);
            }
            None => {
                report.incomplete = report.consumed < buf.len();
                return report;
            }
        }
    }
}
