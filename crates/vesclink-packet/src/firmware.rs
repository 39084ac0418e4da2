use vesclink_frame::{build_frame, Frame};

use crate::error::DecodeError;
use crate::ids;
use crate::packet::{expect_payload, VescPacket};

const REQUEST_NAME: &str = "RequestFWVersion";
const RESPONSE_NAME: &str = "FWVersion";

/// Bytes after the hardware name terminator: uuid, paired, test version,
/// hardware type.
const TRAILING_FIELDS: usize = 12 + 1 + 1 + 1;

/// Ask the controller for its firmware version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFirmwareVersion {
    frame: Frame,
}

impl RequestFirmwareVersion {
    pub fn new() -> Self {
        let mut builder = build_frame(1);
        builder.payload_mut()[0] = ids::FW_VERSION;
        Self {
            frame: builder.finish(),
        }
    }

    pub fn from_frame(frame: Frame) -> Result<Self, DecodeError> {
        expect_payload(REQUEST_NAME, ids::FW_VERSION, &frame, 1)?;
        Ok(Self { frame })
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

impl Default for RequestFirmwareVersion {
    fn default() -> Self {
        Self::new()
    }
}

impl VescPacket for RequestFirmwareVersion {
    fn name(&self) -> &'static str {
        REQUEST_NAME
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }
}

/// Firmware version report.
///
/// Payload layout after the type id: major, minor, NUL-terminated hardware
/// name, 12-byte UUID, paired flag, test version, hardware type.
/// Fields are parsed once, when the packet is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareVersion {
    frame: Frame,
    major: u8,
    minor: u8,
    hardware_name: String,
    uuid: [u8; 12],
    paired: bool,
    test_version: u8,
    hardware_type: u8,
}

impl FirmwareVersion {
    pub fn from_frame(frame: Frame) -> Result<Self, DecodeError> {
        expect_payload(RESPONSE_NAME, ids::FW_VERSION, &frame, 4)?;
        let payload = frame.payload();

        let name_len = payload[3..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::Unterminated {
                name: RESPONSE_NAME,
                field: "hardware name",
            })?;
        let nul = 3 + name_len;

        let required = nul + 1 + TRAILING_FIELDS;
        if payload.len() < required {
            return Err(DecodeError::TooShort {
                name: RESPONSE_NAME,
                required,
                actual: payload.len(),
            });
        }

        let mut uuid = [0u8; 12];
        uuid.copy_from_slice(&payload[nul + 1..nul + 13]);

        Ok(Self {
            major: payload[1],
            minor: payload[2],
            hardware_name: String::from_utf8_lossy(&payload[3..nul]).into_owned(),
            uuid,
            paired: payload[nul + 13] != 0,
            test_version: payload[nul + 14],
            hardware_type: payload[nul + 15],
            frame,
        })
    }

    /// Firmware major version.
    pub fn major(&self) -> u8 {
        self.major
    }

    /// Firmware minor version, printed zero-padded (`5.02`).
    pub fn minor(&self) -> u8 {
        self.minor
    }

    /// Hardware name reported by the firmware (for example `410`).
    pub fn hardware_name(&self) -> &str {
        &self.hardware_name
    }

    /// MCU unique id.
    pub fn uuid(&self) -> &[u8; 12] {
        &self.uuid
    }

    /// Whether the controller is paired with a remote.
    pub fn paired(&self) -> bool {
        self.paired
    }

    /// Non-zero on pre-release firmware builds.
    pub fn test_version(&self) -> u8 {
        self.test_version
    }

    /// Hardware type / device version byte.
    pub fn hardware_type(&self) -> u8 {
        self.hardware_type
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}

impl VescPacket for FirmwareVersion {
    fn name(&self) -> &'static str {
        RESPONSE_NAME
    }

    fn frame(&self) -> &Frame {
        &self.frame
    }
}
