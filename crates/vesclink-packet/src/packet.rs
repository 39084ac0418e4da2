use vesclink_frame::Frame;

use crate::commands::{
    SetCurrent, SetCurrentBrake, SetDutyCycle, SetPosition, SetRpm, SetServoPosition,
};
use crate::error::DecodeError;
use crate::firmware::{FirmwareVersion, RequestFirmwareVersion};
use crate::telemetry::{RequestTelemetry, Telemetry};

/// Capability shared by every packet: a name and the frame it travels in.
pub trait VescPacket {
    /// Human-readable type name.
    fn name(&self) -> &'static str;

    /// The validated frame backing this packet.
    fn frame(&self) -> &Frame;

    /// The first payload byte.
    fn type_id(&self) -> u8 {
        // Every packet is built from, or validated as, a non-empty payload.
        self.frame().payload()[0]
    }
}

/// Any packet the registry can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    RequestFirmwareVersion(RequestFirmwareVersion),
    FirmwareVersion(FirmwareVersion),
    RequestTelemetry(RequestTelemetry),
    Telemetry(Telemetry),
    SetDutyCycle(SetDutyCycle),
    SetCurrent(SetCurrent),
    SetCurrentBrake(SetCurrentBrake),
    SetRpm(SetRpm),
    SetPosition(SetPosition),
    SetServoPosition(SetServoPosition),
    /// A type registered at runtime without a typed decoder.
    Raw(RawPacket),
}

impl Packet {
    fn inner(&self) -> &dyn VescPacket {
        match self {
            Self::RequestFirmwareVersion(p) => p,
            Self::FirmwareVersion(p) => p,
            Self::RequestTelemetry(p) => p,
            Self::Telemetry(p) => p,
            Self::SetDutyCycle(p) => p,
            Self::SetCurrent(p) => p,
            Self::SetCurrentBrake(p) => p,
            Self::SetRpm(p) => p,
            Self::SetPosition(p) => p,
            Self::SetServoPosition(p) => p,
            Self::Raw(p) => p,
        }
    }

    /// Consume the packet and keep its frame.
    pub fn into_frame(self) -> Frame {
        match self {
            Self::RequestFirmwareVersion(p) => p.into_frame(),
            Self::FirmwareVersion(p) => p.into_frame(),
            Self::RequestTelemetry(p) => p.into_frame(),
            Self::Telemetry(p) => p.into_frame(),
            Self::SetDutyCycle(p) => p.into_frame(),
            Self::SetCurrent(p) => p.into_frame(),
            Self::SetCurrentBrake(p) => p.into_frame(),
            Self::SetRpm(p) => p.into_frame(),
            Self::SetPosition(p) => p.into_frame(),
            Self::SetServoPosition(p) => p.into_frame(),
            Self::Raw(p) => p.into_frame(),
        }
    }
}

impl VescPacket for Packet {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn frame(&self) -> &Frame {
        self.inner().frame()
    }
}

/// A validated frame of a type that has no typed decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    name: &'static str,
    frame: Frame,
}

impl RawPacket {
    /// Wrap a validated frame under `name`.
    ///
    /// Fails if the payload is empty.
    pub fn new(name: &'static str, frame: Frame) -> Result<Self, DecodeError> {
        require_len(name, &frame, 1)?;
        Ok(Self { name, frame })
    }

    /// Payload bytes after the type id.
    pub fn body(&self) -> &[u8] {
        &self.frame.payload()[1..]
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

impl VescPacket for RawPacket {
    fn name(&self) -> &'static str {
        self.name
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }
}

pub(crate) fn require_len(
    name: &'static str,
    frame: &Frame,
    required: usize,
) -> Result<(), DecodeError> {
    let actual = frame.payload_len();
    if actual < required {
        return Err(DecodeError::TooShort {
            name,
            required,
            actual,
        });
    }
    Ok(())
}

/// Check the type id and minimum payload length of `frame`.
pub(crate) fn expect_payload(
    name: &'static str,
    type_id: u8,
    frame: &Frame,
    required: usize,
) -> Result<(), DecodeError> {
    let actual = frame.type_id();
    if actual != Some(type_id) {
        return Err(DecodeError::WrongType {
            name,
            expected: type_id,
            actual,
        });
    }
    require_len(name, frame, required)
}

pub(crate) fn read_i16(payload: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([payload[offset], payload[offset + 1]])
}

pub(crate) fn read_i32(payload: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes([
        payload[offset],
        payload[offset + 1],
        payload[offset + 2],
        payload[offset + 3],
    ])
}
