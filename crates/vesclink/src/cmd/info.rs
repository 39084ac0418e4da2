use std::sync::mpsc;

use serde::Serialize;
use tracing::warn;
use vesclink_packet::{FirmwareVersion, Packet};

use crate::cmd::{parse_duration, InfoArgs};
use crate::exit::{interface_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct InfoOutput {
    port: String,
    firmware: String,
    hardware_name: String,
    hardware_type: u8,
    uuid: String,
    paired: bool,
    test_version: u8,
}

impl InfoOutput {
    fn new(port: &str, fw: &FirmwareVersion) -> Self {
        Self {
            port: port.to_string(),
            firmware: format!("{}.{:02}", fw.major(), fw.minor()),
            hardware_name: fw.hardware_name().to_string(),
            hardware_type: fw.hardware_type(),
            uuid: hex::encode(fw.uuid()),
            paired: fw.paired(),
            test_version: fw.test_version(),
        }
    }
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let mut iface = args.connect.connect()?;

    let (tx, rx) = mpsc::channel();
    iface.set_packet_handler(move |packet| {
        if let Packet::FirmwareVersion(fw) = packet {
            let _ = tx.send(fw);
        }
    });
    iface.set_error_handler(|message| warn!(%message, "receive error"));

    iface
        .request_firmware_version()
        .map_err(|err| interface_error("request failed", err))?;

    let fw = rx.recv_timeout(timeout).map_err(|_| {
        CliError::new(
            TIMEOUT,
            format!("no firmware version reply within {timeout:?}"),
        )
    })?;
    iface
        .disconnect()
        .map_err(|err| interface_error("disconnect failed", err))?;

    print_info(&InfoOutput::new(&args.connect.port, &fw), format);
    Ok(SUCCESS)
}

fn print_info(out: &InfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Controller Info:");
            println!("  Port:          {}", out.port);
            println!("  Firmware:      {}", out.firmware);
            println!("  Hardware:      {}", out.hardware_name);
            println!("  Hardware type: {}", out.hardware_type);
            println!("  UUID:          {}", out.uuid);
            println!("  Paired:        {}", out.paired);
            if out.test_version != 0 {
                println!("  Test build:    {}", out.test_version);
            }
        }
        OutputFormat::Raw => {
            println!("{}", out.firmware);
        }
    }
}
