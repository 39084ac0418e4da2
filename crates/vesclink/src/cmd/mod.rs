use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use vesclink_interface::{InterfaceConfig, VescInterface};
use vesclink_packet::{
    Packet, RequestFirmwareVersion, RequestTelemetry, SetCurrent, SetCurrentBrake, SetDutyCycle,
    SetPosition, SetRpm, SetServoPosition,
};
use vesclink_transport::SerialConfig;

use crate::exit::{interface_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod info;
pub mod monitor;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports.
    Ports(PortsArgs),
    /// Query the firmware version of a controller.
    Info(InfoArgs),
    /// Poll and print telemetry.
    Monitor(MonitorArgs),
    /// Send a single command.
    Send(SendArgs),
    /// Print the encoded frame for a command.
    Encode(EncodeArgs),
    /// Decode a captured byte stream.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Packet kinds that can be built from the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PacketKind {
    /// Firmware version request.
    FwVersion,
    /// Telemetry request.
    Values,
    /// Duty cycle, -1.0..=1.0.
    Duty,
    /// Motor current in amps.
    Current,
    /// Brake current in amps.
    Brake,
    /// Electrical RPM.
    Rpm,
    /// Rotor position in degrees.
    Pos,
    /// Servo output, 0.0..=1.0.
    Servo,
}

impl PacketKind {
    /// Build the packet, requiring a value for setpoints only.
    pub fn build(self, value: Option<f64>) -> CliResult<Packet> {
        let require = |value: Option<f64>| {
            value.ok_or_else(|| CliError::new(USAGE, format!("{self:?} requires a VALUE")))
        };
        let reject = |value: Option<f64>| match value {
            Some(_) => Err(CliError::new(USAGE, format!("{self:?} takes no VALUE"))),
            None => Ok(()),
        };

        let packet = match self {
            Self::FwVersion => {
                reject(value)?;
                Packet::RequestFirmwareVersion(RequestFirmwareVersion::new())
            }
            Self::Values => {
                reject(value)?;
                Packet::RequestTelemetry(RequestTelemetry::new())
            }
            Self::Duty => Packet::SetDutyCycle(SetDutyCycle::new(require(value)?)),
            Self::Current => Packet::SetCurrent(SetCurrent::new(require(value)?)),
            Self::Brake => Packet::SetCurrentBrake(SetCurrentBrake::new(require(value)?)),
            Self::Rpm => Packet::SetRpm(SetRpm::new(require(value)?)),
            Self::Pos => Packet::SetPosition(SetPosition::new(require(value)?)),
            Self::Servo => Packet::SetServoPosition(SetServoPosition::new(require(value)?)),
        };
        Ok(packet)
    }
}

/// Serial connection settings shared by commands that open a port.
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Serial port (e.g. /dev/ttyACM0, COM3).
    pub port: String,
    /// Baud rate.
    #[arg(long, default_value_t = 115_200)]
    pub baud: u32,
    /// Reassembler poll interval (e.g. 10ms).
    #[arg(long, default_value = "10ms")]
    pub poll_interval: String,
}

impl ConnectArgs {
    pub fn config(&self) -> CliResult<InterfaceConfig> {
        Ok(InterfaceConfig {
            poll_interval: parse_duration(&self.poll_interval)?,
            serial: SerialConfig {
                baud_rate: self.baud,
                ..SerialConfig::default()
            },
        })
    }

    /// Open the port with these settings.
    pub fn connect(&self) -> CliResult<VescInterface> {
        let mut iface = VescInterface::with_config(self.config()?);
        iface
            .connect(&self.port)
            .map_err(|err| interface_error("connect failed", err))?;
        Ok(iface)
    }
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// How long to wait for the reply (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Time between telemetry requests (e.g. 500ms, 1s).
    #[arg(long, default_value = "500ms")]
    pub interval: String,
    /// Exit after printing N records.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Command to send.
    #[arg(value_enum)]
    pub kind: PacketKind,
    /// Setpoint value.
    #[arg(allow_negative_numbers = true)]
    pub value: Option<f64>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Command to encode.
    #[arg(value_enum)]
    pub kind: PacketKind,
    /// Setpoint value.
    #[arg(allow_negative_numbers = true)]
    pub value: Option<f64>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex-encoded input (whitespace ignored).
    #[arg(long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read raw bytes from file. Default: stdin.
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `150ms`, `2s` or bare seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use vesclink_packet::VescPacket;

    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn setpoints_require_value() {
        let err = PacketKind::Duty.build(None).unwrap_err();
        assert_eq!(err.code, USAGE);
        let packet = PacketKind::Rpm.build(Some(1000.0)).unwrap();
        assert_eq!(packet.type_id(), 8);
    }

    #[test]
    fn requests_reject_value() {
        assert!(PacketKind::Values.build(Some(1.0)).is_err());
        assert_eq!(PacketKind::FwVersion.build(None).unwrap().type_id(), 0);
    }

    #[test]
    fn connect_args_map_to_config() {
        let args = ConnectArgs {
            port: "/dev/ttyACM0".to_string(),
            baud: 230_400,
            poll_interval: "5ms".to_string(),
        };
        let cfg = args.config().unwrap();
        assert_eq!(cfg.serial.baud_rate, 230_400);
        assert_eq!(cfg.poll_interval, Duration::from_millis(5));
    }
}
