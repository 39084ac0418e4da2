use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use vesclink_transport::{available_ports, PortInfo};

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    vid: Option<String>,
    pid: Option<String>,
    serial_number: Option<&'a str>,
    manufacturer: Option<&'a str>,
    product: Option<&'a str>,
}

impl<'a> From<&'a PortInfo> for PortOutput<'a> {
    fn from(port: &'a PortInfo) -> Self {
        Self {
            name: &port.name,
            kind: port.kind,
            vid: port.vid.map(|v| format!("{v:04x}")),
            pid: port.pid.map(|p| format!("{p:04x}")),
            serial_number: port.serial_number.as_deref(),
            manufacturer: port.manufacturer.as_deref(),
            product: port.product.as_deref(),
        }
    }
}

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = available_ports().map_err(|err| transport_error("port scan failed", err))?;
    let rows: Vec<PortOutput<'_>> = ports.iter().map(PortOutput::from).collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE", "VID:PID", "SERIAL", "PRODUCT"]);
            for row in &rows {
                table.add_row(vec![
                    row.name.to_string(),
                    row.kind.to_string(),
                    usb_id(row),
                    row.serial_number.unwrap_or("-").to_string(),
                    row.product.or(row.manufacturer).unwrap_or("-").to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in &rows {
                println!("{} ({}) {}", row.name, row.kind, usb_id(row));
            }
        }
        OutputFormat::Raw => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
    }

    Ok(SUCCESS)
}

fn usb_id(row: &PortOutput<'_>) -> String {
    match (&row.vid, &row.pid) {
        (Some(vid), Some(pid)) => format!("{vid}:{pid}"),
        _ => "-".to_string(),
    }
}
