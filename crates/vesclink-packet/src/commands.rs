//! Setpoint commands.
//!
//! Each command is the type id followed by one fixed-point field. Values are
//! multiplied by the field's scale, truncated toward zero and narrowed with
//! two's-complement wrap-around, exactly as the firmware reads them back.
//! No range checking is done.

use vesclink_frame::{build_frame, Frame};

use crate::error::DecodeError;
use crate::ids;
use crate::packet::{expect_payload, read_i16, read_i32, VescPacket};

pub const DUTY_SCALE: f64 = 100_000.0;
pub const CURRENT_SCALE: f64 = 1_000.0;
pub const BRAKE_SCALE: f64 = 1_000.0;
pub const RPM_SCALE: f64 = 1.0;
pub const POSITION_SCALE: f64 = 1_000_000.0;
pub const SERVO_SCALE: f64 = 1_000.0;

fn to_fixed_i32(value: f64, scale: f64) -> i32 {
    (value * scale) as i64 as i32
}

fn to_fixed_i16(value: f64, scale: f64) -> i16 {
    (value * scale) as i64 as i16
}

fn i32_command(type_id: u8, raw: i32) -> Frame {
    let mut builder = build_frame(5);
    let payload = builder.payload_mut();
    payload[0] = type_id;
    payload[1..5].copy_from_slice(&raw.to_be_bytes());
    builder.finish()
}

fn i16_command(type_id: u8, raw: i16) -> Frame {
    let mut builder = build_frame(3);
    let payload = builder.payload_mut();
    payload[0] = type_id;
    payload[1..3].copy_from_slice(&raw.to_be_bytes());
    builder.finish()
}

/// Duty cycle setpoint, nominally -1.0..=1.0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDutyCycle {
    frame: Frame,
}

impl SetDutyCycle {
    const NAME: &'static str = "SetDuty";

    pub fn new(duty: f64) -> Self {
        Self {
            frame: i32_command(ids::SET_DUTY, to_fixed_i32(duty, DUTY_SCALE)),
        }
    }

    pub fn from_frame(frame: Frame) -> Result<Self, DecodeError> {
        expect_payload(Self::NAME, ids::SET_DUTY, &frame, 5)?;
        Ok(Self { frame })
    }

    /// Duty cycle as encoded on the wire.
    pub fn duty(&self) -> f64 {
        f64::from(read_i32(self.frame.payload(), 1)) / DUTY_SCALE
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

impl VescPacket for SetDutyCycle {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }
}

/// Motor current setpoint, A.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCurrent {
    frame: Frame,
}

impl SetCurrent {
    const NAME: &'static str = "SetCurrent";

    pub fn new(current: f64) -> Self {
        Self {
            frame: i32_command(ids::SET_CURRENT, to_fixed_i32(current, CURRENT_SCALE)),
        }
    }

    pub fn from_frame(frame: Frame) -> Result<Self, DecodeError> {
        expect_payload(Self::NAME, ids::SET_CURRENT, &frame, 5)?;
        Ok(Self { frame })
    }

    pub fn current(&self) -> f64 {
        f64::from(read_i32(self.frame.payload(), 1)) / CURRENT_SCALE
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

impl VescPacket for SetCurrent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }
}

/// Brake current setpoint, A.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCurrentBrake {
    frame: Frame,
}

impl SetCurrentBrake {
    const NAME: &'static str = "SetCurrentBrake";

    pub fn new(current_brake: f64) -> Self {
        Self {
            frame: i32_command(ids::SET_CURRENT_BRAKE, to_fixed_i32(current_brake, BRAKE_SCALE)),
        }
    }

    pub fn from_frame(frame: Frame) -> Result<Self, DecodeError> {
        expect_payload(Self::NAME, ids::SET_CURRENT_BRAKE, &frame, 5)?;
        Ok(Self { frame })
    }

    pub fn current_brake(&self) -> f64 {
        f64::from(read_i32(self.frame.payload(), 1)) / BRAKE_SCALE
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

impl VescPacket for SetCurrentBrake {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }
}

/// Electrical RPM setpoint. Fractions are truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRpm {
    frame: Frame,
}

impl SetRpm {
    const NAME: &'static str = "SetRPM";

    pub fn new(rpm: f64) -> Self {
        Self {
            frame: i32_command(ids::SET_RPM, to_fixed_i32(rpm, RPM_SCALE)),
        }
    }

    pub fn from_frame(frame: Frame) -> Result<Self, DecodeError> {
        expect_payload(Self::NAME, ids::SET_RPM, &frame, 5)?;
        Ok(Self { frame })
    }

    pub fn rpm(&self) -> f64 {
        f64::from(read_i32(self.frame.payload(), 1)) / RPM_SCALE
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

impl VescPacket for SetRpm {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }
}

/// Motor position setpoint, degrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetPosition {
    frame: Frame,
}

impl SetPosition {
    const NAME: &'static str = "SetPos";

    pub fn new(position: f64) -> Self {
        Self {
            frame: i32_command(ids::SET_POS, to_fixed_i32(position, POSITION_SCALE)),
        }
    }

    pub fn from_frame(frame: Frame) -> Result<Self, DecodeError> {
        expect_payload(Self::NAME, ids::SET_POS, &frame, 5)?;
        Ok(Self { frame })
    }

    pub fn position(&self) -> f64 {
        f64::from(read_i32(self.frame.payload(), 1)) / POSITION_SCALE
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

impl VescPacket for SetPosition {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }
}

/// Servo output position, nominally 0.0..=1.0. Encoded as a 16-bit field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetServoPosition {
    frame: Frame,
}

impl SetServoPosition {
    const NAME: &'static str = "SetServoPos";

    pub fn new(position: f64) -> Self {
        Self {
            frame: i16_command(ids::SET_SERVO_POS, to_fixed_i16(position, SERVO_SCALE)),
        }
    }

    pub fn from_frame(frame: Frame) -> Result<Self, DecodeError> {
        expect_payload(Self::NAME, ids::SET_SERVO_POS, &frame, 3)?;
        Ok(Self { frame })
    }

    pub fn position(&self) -> f64 {
        f64::from(read_i16(self.frame.payload(), 1)) / SERVO_SCALE
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

impl VescPacket for SetServoPosition {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }
}
