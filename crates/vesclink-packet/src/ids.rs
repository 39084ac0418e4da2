//! Packet type identifiers.
//!
//! Values match the firmware's `COMM_PACKET_ID` enumeration. Only the ids
//! this crate has built-in types for are listed; others can still be
//! registered at runtime.

/// Firmware version request / response.
pub const FW_VERSION: u8 = 0;

/// Telemetry request / response.
pub const GET_VALUES: u8 = 4;

/// Duty cycle setpoint.
pub const SET_DUTY: u8 = 5;

/// Motor current setpoint.
pub const SET_CURRENT: u8 = 6;

/// Brake current setpoint.
pub const SET_CURRENT_BRAKE: u8 = 7;

/// Electrical RPM setpoint.
pub const SET_RPM: u8 = 8;

/// Motor position setpoint.
pub const SET_POS: u8 = 9;

/// Servo output position.
pub const SET_SERVO_POS: u8 = 12;

/// Human-readable name for a built-in type id.
pub fn name(id: u8) -> Option<&'static str> {
    match id {
        FW_VERSION => Some("FWVersion"),
        GET_VALUES => Some("Values"),
        SET_DUTY => Some("SetDuty"),
        SET_CURRENT => Some("SetCurrent"),
        SET_CURRENT_BRAKE => Some("SetCurrentBrake"),
        SET_RPM => Some("SetRPM"),
        SET_POS => Some("SetPos"),
        SET_SERVO_POS => Some("SetServoPos"),
        _ => None,
    }
}
