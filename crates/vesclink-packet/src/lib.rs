//! Typed packets for the VESC serial protocol.
//!
//! A packet is a validated [`Frame`] whose first payload byte names its
//! type. This crate provides:
//! - the built-in packet types (firmware version, telemetry, setpoint commands)
//! - a [`PacketRegistry`] mapping type ids to decoders
//! - [`create_packet`], which turns the start of a byte window into a packet
//! - [`scan_buffer`], the resynchronizing scan over an accumulated stream
//! - blocking [`PacketReader`]/[`PacketWriter`] adapters over `Read`/`Write`
//!
//! With the `async` feature, [`VescCodec`] plugs the same scan into
//! `tokio_util::codec`.

#[cfg(feature = "async")]
pub mod codec;
pub mod commands;
pub mod error;
pub mod factory;
pub mod firmware;
pub mod ids;
pub mod packet;
pub mod reader;
pub mod registry;
pub mod scan;
pub mod telemetry;
pub mod writer;

#[cfg(feature = "async")]
pub use codec::VescCodec;
pub use commands::{
    SetCurrent, SetCurrentBrake, SetDutyCycle, SetPosition, SetRpm, SetServoPosition,
};
pub use error::{DecodeError, Rejection, RegistryError, StreamError};
pub use factory::{create_packet, Decoded};
pub use firmware::{FirmwareVersion, RequestFirmwareVersion};
pub use packet::{Packet, RawPacket, VescPacket};
pub use reader::PacketReader;
pub use registry::{DecodeFn, Decoder, PacketRegistry, PacketType};
pub use scan::{scan_buffer, scan_next, ScanReport};
pub use telemetry::{FaultCode, RequestTelemetry, Telemetry};
pub use vesclink_frame::Frame;
pub use writer::PacketWriter;
