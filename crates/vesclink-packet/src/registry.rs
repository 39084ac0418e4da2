use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use vesclink_frame::Frame;

use crate::commands::{
    SetCurrent, SetCurrentBrake, SetDutyCycle, SetPosition, SetRpm, SetServoPosition,
};
use crate::error::{DecodeError, RegistryError};
use crate::firmware::{FirmwareVersion, RequestFirmwareVersion};
use crate::ids;
use crate::packet::{Packet, RawPacket};
use crate::telemetry::{RequestTelemetry, Telemetry};

/// Turns a validated frame into a packet.
pub type Decoder = Box<dyn Fn(Frame) -> Result<Packet, DecodeError> + Send + Sync>;

/// One registered packet type.
pub struct PacketType {
    pub id: u8,
    pub name: &'static str,
    pub decode: Decoder,
}

impl std::fmt::Debug for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketType")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Plain function decoder, as used in static type tables.
pub type DecodeFn = fn(Frame) -> Result<Packet, DecodeError>;

// The firmware reuses the same id for a request and its response; a bare
// type byte is the request.
const STANDARD_TYPES: &[(u8, &str, DecodeFn)] = &[
    (ids::FW_VERSION, "FWVersion", decode_firmware_version),
    (ids::GET_VALUES, "Values", decode_values),
    (ids::SET_DUTY, "SetDuty", decode_set_duty),
    (ids::SET_CURRENT, "SetCurrent", decode_set_current),
    (ids::SET_CURRENT_BRAKE, "SetCurrentBrake", decode_set_current_brake),
    (ids::SET_RPM, "SetRPM", decode_set_rpm),
    (ids::SET_POS, "SetPos", decode_set_pos),
    (ids::SET_SERVO_POS, "SetServoPos", decode_set_servo_pos),
];

fn decode_firmware_version(frame: Frame) -> Result<Packet, DecodeError> {
    if frame.payload_len() == 1 {
        return RequestFirmwareVersion::from_frame(frame).map(Packet::RequestFirmwareVersion);
    }
    FirmwareVersion::from_frame(frame).map(Packet::FirmwareVersion)
}

fn decode_values(frame: Frame) -> Result<Packet, DecodeError> {
    if frame.payload_len() == 1 {
        return RequestTelemetry::from_frame(frame).map(Packet::RequestTelemetry);
    }
    Telemetry::from_frame(frame).map(Packet::Telemetry)
}

fn decode_set_duty(frame: Frame) -> Result<Packet, DecodeError> {
    SetDutyCycle::from_frame(frame).map(Packet::SetDutyCycle)
}

fn decode_set_current(frame: Frame) -> Result<Packet, DecodeError> {
    SetCurrent::from_frame(frame).map(Packet::SetCurrent)
}

fn decode_set_current_brake(frame: Frame) -> Result<Packet, DecodeError> {
    SetCurrentBrake::from_frame(frame).map(Packet::SetCurrentBrake)
}

fn decode_set_rpm(frame: Frame) -> Result<Packet, DecodeError> {
    SetRpm::from_frame(frame).map(Packet::SetRpm)
}

fn decode_set_pos(frame: Frame) -> Result<Packet, DecodeError> {
    SetPosition::from_frame(frame).map(Packet::SetPosition)
}

fn decode_set_servo_pos(frame: Frame) -> Result<Packet, DecodeError> {
    SetServoPosition::from_frame(frame).map(Packet::SetServoPosition)
}

/// Type-id keyed table of packet decoders.
///
/// Populate it before decoding starts; lookups take `&self` so a finished
/// registry can be shared across threads behind an `Arc`.
#[derive(Debug, Default)]
pub struct PacketRegistry {
    types: HashMap<u8, PacketType>,
}

impl PacketRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an ordered `(id, name, decoder)` table.
    ///
    /// Stops at the first duplicate id.
    pub fn from_table(table: &[(u8, &'static str, DecodeFn)]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for &(id, name, decode) in table {
            registry.register(id, name, decode)?;
        }
        Ok(registry)
    }

    /// The built-in packet types, built once per process.
    pub fn standard() -> Arc<PacketRegistry> {
        static STANDARD: OnceLock<Arc<PacketRegistry>> = OnceLock::new();
        let registry = STANDARD.get_or_init(|| match Self::from_table(STANDARD_TYPES) {
            Ok(registry) => Arc::new(registry),
            Err(err) => panic!("built-in packet table is inconsistent: {err}"),
        });
        Arc::clone(registry)
    }

    /// The built-in types, as a registry the caller can extend.
    pub fn with_standard_types() -> Self {
        match Self::from_table(STANDARD_TYPES) {
            Ok(registry) => registry,
            Err(err) => panic!("built-in packet table is inconsistent: {err}"),
        }
    }

    /// Register a decoder for `id`.
    pub fn register<F>(&mut self, id: u8, name: &'static str, decode: F) -> Result<(), RegistryError>
    where
        F: Fn(Frame) -> Result<Packet, DecodeError> + Send + Sync + 'static,
    {
        if let Some(existing) = self.types.get(&id) {
            return Err(RegistryError::DuplicateType {
                id,
                existing: existing.name,
            });
        }
        self.types.insert(
            id,
            PacketType {
                id,
                name,
                decode: Box::new(decode),
            },
        );
        Ok(())
    }

    /// Register `id` as an opaque type decoded into [`Packet::Raw`].
    pub fn register_raw(&mut self, id: u8, name: &'static str) -> Result<(), RegistryError> {
        self.register(id, name, move |frame| {
            RawPacket::new(name, frame).map(Packet::Raw)
        })
    }

    /// Look up the entry for a type id.
    pub fn lookup(&self, id: u8) -> Option<&PacketType> {
        self.types.get(&id)
    }

    /// Check if a type id has a registered decoder.
    pub fn contains(&self, id: u8) -> bool {
        self.types.contains_key(&id)
    }

    /// Registered type ids, ascending.
    pub fn ids(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = self.types.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
