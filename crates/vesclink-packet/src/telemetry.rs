use vesclink_frame::{build_frame, Frame};

use crate::error::DecodeError;
use crate::ids;
use crate::packet::{expect_payload, read_i16, read_i32, VescPacket};

const REQUEST_NAME: &str = "RequestValues";
const RESPONSE_NAME: &str = "Values";

/// Type id plus every fixed telemetry field through `avg_vq`.
pub const TELEMETRY_MIN_PAYLOAD: usize = 73;

/// Ask the controller for a telemetry snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTelemetry {
    frame: Frame,
}

impl RequestTelemetry {
    pub fn new() -> Self {
        let mut builder = build_frame(1);
        builder.payload_mut()[0] = ids::GET_VALUES;
        Self {
            frame: builder.finish(),
        }
    }

    pub fn from_frame(frame: Frame) -> Result<Self, DecodeError> {
        expect_payload(REQUEST_NAME, ids::GET_VALUES, &frame, 1)?;
        Ok(Self { frame })
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

impl Default for RequestTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl VescPacket for RequestTelemetry {
    fn name(&self) -> &'static str {
        REQUEST_NAME
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }
}

/// Controller fault, as reported in telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultCode {
    None,
    OverVoltage,
    UnderVoltage,
    Drv,
    AbsOverCurrent,
    OverTempFet,
    OverTempMotor,
    GateDriverOverVoltage,
    GateDriverUnderVoltage,
    McuUnderVoltage,
    BootingFromWatchdogReset,
    /// A code this crate does not know about (newer firmware).
    Unknown(u8),
}

impl FaultCode {
    /// Firmware-style name, e.g. `FAULT_CODE_OVER_VOLTAGE`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "FAULT_CODE_NONE",
            Self::OverVoltage => "FAULT_CODE_OVER_VOLTAGE",
            Self::UnderVoltage => "FAULT_CODE_UNDER_VOLTAGE",
            Self::Drv => "FAULT_CODE_DRV",
            Self::AbsOverCurrent => "FAULT_CODE_ABS_OVER_CURRENT",
            Self::OverTempFet => "FAULT_CODE_OVER_TEMP_FET",
            Self::OverTempMotor => "FAULT_CODE_OVER_TEMP_MOTOR",
            Self::GateDriverOverVoltage => "FAULT_CODE_GATE_DRIVER_OVER_VOLTAGE",
            Self::GateDriverUnderVoltage => "FAULT_CODE_GATE_DRIVER_UNDER_VOLTAGE",
            Self::McuUnderVoltage => "FAULT_CODE_MCU_UNDER_VOLTAGE",
            Self::BootingFromWatchdogReset => "FAULT_CODE_BOOTING_FROM_WATCHDOG_RESET",
            Self::Unknown(_) => "FAULT_CODE_UNKNOWN",
        }
    }
}

impl From<u8> for FaultCode {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::None,
            1 => Self::OverVoltage,
            2 => Self::UnderVoltage,
            3 => Self::Drv,
            4 => Self::AbsOverCurrent,
            5 => Self::OverTempFet,
            6 => Self::OverTempMotor,
            7 => Self::GateDriverOverVoltage,
            8 => Self::GateDriverUnderVoltage,
            9 => Self::McuUnderVoltage,
            10 => Self::BootingFromWatchdogReset,
            other => Self::Unknown(other),
        }
    }
}

impl std::fmt::Display for FaultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "FAULT_CODE_UNKNOWN({code})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Telemetry snapshot (`COMM_GET_VALUES` response).
///
/// All fields are big-endian two's complement at fixed payload offsets.
/// Accessors read the frame on every call; nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telemetry {
    frame: Frame,
}

impl Telemetry {
    /// Fails if the payload is shorter than [`TELEMETRY_MIN_PAYLOAD`].
    /// Longer payloads (newer firmware appends fields) are accepted.
    pub fn from_frame(frame: Frame) -> Result<Self, DecodeError> {
        expect_payload(RESPONSE_NAME, ids::GET_VALUES, &frame, TELEMETRY_MIN_PAYLOAD)?;
        Ok(Self { frame })
    }

    fn i16_scaled(&self, offset: usize, scale: f64) -> f64 {
        f64::from(read_i16(self.frame.payload(), offset)) / scale
    }

    fn i32_scaled(&self, offset: usize, scale: f64) -> f64 {
        f64::from(read_i32(self.frame.payload(), offset)) / scale
    }

    /// MOSFET temperature, °C (wire ×10).
    pub fn temp_fet(&self) -> f64 {
        self.i16_scaled(1, 10.0)
    }

    /// Motor temperature, °C (wire ×10).
    pub fn temp_motor(&self) -> f64 {
        self.i16_scaled(3, 10.0)
    }

    /// Average motor current, A (wire ×100).
    pub fn avg_motor_current(&self) -> f64 {
        self.i32_scaled(5, 100.0)
    }

    /// Average input current, A (wire ×100).
    pub fn avg_input_current(&self) -> f64 {
        self.i32_scaled(9, 100.0)
    }

    /// Average d-axis current, A (wire ×100).
    pub fn avg_id(&self) -> f64 {
        self.i32_scaled(13, 100.0)
    }

    /// Average q-axis current, A (wire ×100).
    pub fn avg_iq(&self) -> f64 {
        self.i32_scaled(17, 100.0)
    }

    /// Current duty cycle, -1.0..=1.0 (wire ×1000).
    pub fn duty_cycle_now(&self) -> f64 {
        self.i16_scaled(21, 1000.0)
    }

    /// Electrical RPM (wire ×1).
    pub fn rpm(&self) -> f64 {
        self.i32_scaled(23, 1.0)
    }

    /// Input voltage, V (wire ×10).
    pub fn v_in(&self) -> f64 {
        self.i16_scaled(27, 10.0)
    }

    /// Charge drawn, Ah (wire ×10000).
    pub fn amp_hours(&self) -> f64 {
        self.i32_scaled(29, 1e4)
    }

    /// Charge regenerated, Ah (wire ×10000).
    pub fn amp_hours_charged(&self) -> f64 {
        self.i32_scaled(33, 1e4)
    }

    /// Energy drawn, Wh (wire ×10000).
    pub fn watt_hours(&self) -> f64 {
        self.i32_scaled(37, 1e4)
    }

    /// Energy regenerated, Wh (wire ×10000).
    pub fn watt_hours_charged(&self) -> f64 {
        self.i32_scaled(41, 1e4)
    }

    /// Tachometer, signed electrical steps.
    pub fn tachometer(&self) -> i32 {
        read_i32(self.frame.payload(), 45)
    }

    /// Tachometer, absolute electrical steps.
    pub fn tachometer_abs(&self) -> i32 {
        read_i32(self.frame.payload(), 49)
    }

    /// Raw fault code byte.
    pub fn fault_code(&self) -> u8 {
        self.frame.payload()[53]
    }

    /// Fault code decoded into [`FaultCode`].
    pub fn fault(&self) -> FaultCode {
        FaultCode::from(self.fault_code())
    }

    /// PID position, degrees (wire ×1000000).
    pub fn pid_pos_now(&self) -> f64 {
        self.i32_scaled(54, 1e6)
    }

    /// CAN controller id.
    pub fn controller_id(&self) -> u8 {
        self.frame.payload()[58]
    }

    /// MOSFET 1 temperature, °C (wire ×10).
    pub fn temp_mos1(&self) -> f64 {
        self.i16_scaled(59, 10.0)
    }

    /// MOSFET 2 temperature, °C (wire ×10).
    pub fn temp_mos2(&self) -> f64 {
        self.i16_scaled(61, 10.0)
    }

    /// MOSFET 3 temperature, °C (wire ×10).
    pub fn temp_mos3(&self) -> f64 {
        self.i16_scaled(63, 10.0)
    }

    /// Average d-axis voltage, V (wire ×1000).
    pub fn avg_vd(&self) -> f64 {
        self.i32_scaled(65, 1e3)
    }

    /// Average q-axis voltage, V (wire ×1000).
    pub fn avg_vq(&self) -> f64 {
        self.i32_scaled(69, 1e3)
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

impl VescPacket for Telemetry {
    fn name(&self) -> &'static str {
        RESPONSE_NAME
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A telemetry payload with every field set to a recognizable value.
    pub(crate) fn telemetry_payload() -> Vec<u8> {
        let mut p = vec![0u8; TELEMETRY_MIN_PAYLOAD];
        p[0] = ids::GET_VALUES;
        p[1..3].copy_from_slice(&150i16.to_be_bytes());
        p[3..5].copy_from_slice(&(-52i16).to_be_bytes());
        p[5..9].copy_from_slice(&1234i32.to_be_bytes());
        p[9..13].copy_from_slice(&(-250i32).to_be_bytes());
        p[13..17].copy_from_slice(&10i32.to_be_bytes());
        p[17..21].copy_from_slice(&(-20i32).to_be_bytes());
        p[21..23].copy_from_slice(&500i16.to_be_bytes());
        p[23..27].copy_from_slice(&(-12_000i32).to_be_bytes());
        p[27..29].copy_from_slice(&482i16.to_be_bytes());
        p[29..33].copy_from_slice(&15_000i32.to_be_bytes());
        p[33..37].copy_from_slice(&2_500i32.to_be_bytes());
        p[37..41].copy_from_slice(&700_000i32.to_be_bytes());
        p[41..45].copy_from_slice(&1i32.to_be_bytes());
        p[45..49].copy_from_slice(&(-42i32).to_be_bytes());
        p[49..53].copy_from_slice(&42i32.to_be_bytes());
        p[53] = 5;
        p[54..58].copy_from_slice(&90_500_000i32.to_be_bytes());
        p[58] = 17;
        p[59..61].copy_from_slice(&301i16.to_be_bytes());
        p[61..63].copy_from_slice(&302i16.to_be_bytes());
        p[63..65].copy_from_slice(&(-303i16).to_be_bytes());
        p[65..69].copy_from_slice(&1_500i32.to_be_bytes());
        p[69..73].copy_from_slice(&(-2_250i32).to_be_bytes());
        p
    }

    fn frame_with(payload: &[u8]) -> Frame {
        let mut builder = build_frame(payload.len());
        builder.payload_mut().copy_from_slice(payload);
        builder.finish()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_request_wire_bytes() {
        let request = RequestTelemetry::new();
        assert_eq!(
            request.frame().as_bytes(),
            hex::decode("020104408403").unwrap()
        );
    }

    #[test]
    fn test_temp_fet_from_raw_0x0096() {
        let mut payload = vec![0u8; TELEMETRY_MIN_PAYLOAD];
        payload[0] = ids::GET_VALUES;
        payload[1] = 0x00;
        payload[2] = 0x96;
        let t = Telemetry::from_frame(frame_with(&payload)).unwrap();
        assert!(approx(t.temp_fet(), 15.0));
    }

    #[test]
    fn test_every_field() {
        let t = Telemetry::from_frame(frame_with(&telemetry_payload())).unwrap();
        assert!(approx(t.temp_fet(), 15.0));
        assert!(approx(t.temp_motor(), -5.2));
        assert!(approx(t.avg_motor_current(), 12.34));
        assert!(approx(t.avg_input_current(), -2.5));
        assert!(approx(t.avg_id(), 0.1));
        assert!(approx(t.avg_iq(), -0.2));
        assert!(approx(t.duty_cycle_now(), 0.5));
        assert!(approx(t.rpm(), -12_000.0));
        assert!(approx(t.v_in(), 48.2));
        assert!(approx(t.amp_hours(), 1.5));
        assert!(approx(t.amp_hours_charged(), 0.25));
        assert!(approx(t.watt_hours(), 70.0));
        assert!(approx(t.watt_hours_charged(), 0.0001));
        assert_eq!(t.tachometer(), -42);
        assert_eq!(t.tachometer_abs(), 42);
        assert_eq!(t.fault_code(), 5);
        assert_eq!(t.fault(), FaultCode::OverTempFet);
        assert!(approx(t.pid_pos_now(), 90.5));
        assert_eq!(t.controller_id(), 17);
        assert!(approx(t.temp_mos1(), 30.1));
        assert!(approx(t.temp_mos2(), 30.2));
        assert!(approx(t.temp_mos3(), -30.3));
        assert!(approx(t.avg_vd(), 1.5));
        assert!(approx(t.avg_vq(), -2.25));
    }

    #[test]
    fn test_accessors_are_idempotent() {
        let t = Telemetry::from_frame(frame_with(&telemetry_payload())).unwrap();
        let first = (t.rpm(), t.v_in(), t.tachometer(), t.fault());
        let second = (t.rpm(), t.v_in(), t.tachometer(), t.fault());
        assert_eq!(first, second);
    }

    #[test]
    fn test_short_payload_is_rejected() {
        let payload = &telemetry_payload()[..TELEMETRY_MIN_PAYLOAD - 1];
        let err = Telemetry::from_frame(frame_with(payload)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TooShort {
                required: TELEMETRY_MIN_PAYLOAD,
                actual: 72,
                ..
            }
        ));
    }

    #[test]
    fn test_longer_payload_is_accepted() {
        let mut payload = telemetry_payload();
        payload.extend_from_slice(&[0xAA; 8]);
        let t = Telemetry::from_frame(frame_with(&payload)).unwrap();
        assert!(approx(t.avg_vq(), -2.25));
    }

    #[test]
    fn test_fault_code_mapping() {
        assert_eq!(FaultCode::from(0), FaultCode::None);
        assert_eq!(FaultCode::from(10), FaultCode::BootingFromWatchdogReset);
        assert_eq!(FaultCode::from(200), FaultCode::Unknown(200));
        assert_eq!(FaultCode::Drv.to_string(), "FAULT_CODE_DRV");
        assert_eq!(FaultCode::Unknown(200).to_string(), "FAULT_CODE_UNKNOWN(200)");
    }
}
