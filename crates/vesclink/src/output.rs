use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::{json, Map, Value};
use vesclink_packet::{Packet, VescPacket};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    name: &'a str,
    type_id: u8,
    payload_size: usize,
    frame: String,
    fields: Value,
    timestamp: String,
}

impl<'a> PacketOutput<'a> {
    fn new(packet: &'a Packet) -> Self {
        let frame = packet.frame();
        Self {
            name: packet.name(),
            type_id: packet.type_id(),
            payload_size: frame.payload_len(),
            frame: hex::encode(frame.as_bytes()),
            fields: packet_fields(packet),
            timestamp: now_unix_seconds(),
        }
    }
}

/// Print one packet as it arrives.
pub fn print_packet(packet: &Packet, format: OutputFormat) {
    print_packets(std::slice::from_ref(packet), format);
}

/// Print a batch of packets; table output shares one table.
pub fn print_packets(packets: &[Packet], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for packet in packets {
                println!(
                    "{}",
                    serde_json::to_string(&PacketOutput::new(packet))
                        .unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "ID", "SIZE", "FIELDS"]);
            for packet in packets {
                table.add_row(vec![
                    packet.name().to_string(),
                    packet.type_id().to_string(),
                    packet.frame().payload_len().to_string(),
                    render_fields(&packet_fields(packet), "\n"),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for packet in packets {
                let fields = render_fields(&packet_fields(packet), " ");
                if fields.is_empty() {
                    println!(
                        "{} (type {}) size={}",
                        packet.name(),
                        packet.type_id(),
                        packet.frame().payload_len()
                    );
                } else {
                    println!(
                        "{} (type {}) size={} {}",
                        packet.name(),
                        packet.type_id(),
                        packet.frame().payload_len(),
                        fields
                    );
                }
            }
        }
        OutputFormat::Raw => {
            for packet in packets {
                print_raw(packet.frame().as_bytes());
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Decoded field values, keyed by field name.
pub fn packet_fields(packet: &Packet) -> Value {
    match packet {
        Packet::RequestFirmwareVersion(_) | Packet::RequestTelemetry(_) => {
            Value::Object(Map::new())
        }
        Packet::FirmwareVersion(fw) => json!({
            "major": fw.major(),
            "minor": fw.minor(),
            "hardware_name": fw.hardware_name(),
            "uuid": hex::encode(fw.uuid()),
            "paired": fw.paired(),
            "test_version": fw.test_version(),
            "hardware_type": fw.hardware_type(),
        }),
        Packet::Telemetry(t) => json!({
            "temp_fet": t.temp_fet(),
            "temp_motor": t.temp_motor(),
            "avg_motor_current": t.avg_motor_current(),
            "avg_input_current": t.avg_input_current(),
            "avg_id": t.avg_id(),
            "avg_iq": t.avg_iq(),
            "duty_cycle_now": t.duty_cycle_now(),
            "rpm": t.rpm(),
            "v_in": t.v_in(),
            "amp_hours": t.amp_hours(),
            "amp_hours_charged": t.amp_hours_charged(),
            "watt_hours": t.watt_hours(),
            "watt_hours_charged": t.watt_hours_charged(),
            "tachometer": t.tachometer(),
            "tachometer_abs": t.tachometer_abs(),
            "fault": t.fault().to_string(),
            "pid_pos_now": t.pid_pos_now(),
            "controller_id": t.controller_id(),
            "temp_mos1": t.temp_mos1(),
            "temp_mos2": t.temp_mos2(),
            "temp_mos3": t.temp_mos3(),
            "avg_vd": t.avg_vd(),
            "avg_vq": t.avg_vq(),
        }),
        Packet::SetDutyCycle(p) => json!({ "duty": p.duty() }),
        Packet::SetCurrent(p) => json!({ "current": p.current() }),
        Packet::SetCurrentBrake(p) => json!({ "current_brake": p.current_brake() }),
        Packet::SetRpm(p) => json!({ "rpm": p.rpm() }),
        Packet::SetPosition(p) => json!({ "position": p.position() }),
        Packet::SetServoPosition(p) => json!({ "position": p.position() }),
        Packet::Raw(p) => json!({ "body": hex::encode(p.body()) }),
    }
}

fn render_fields(fields: &Value, separator: &str) -> String {
    let Value::Object(map) = fields else {
        return String::new();
    };
    map.iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{key}={s}"),
            other => format!("{key}={other}"),
        })
        .collect::<Vec<_>>()
        .join(separator)
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use vesclink_packet::{RequestTelemetry, SetDutyCycle};

    use super::*;

    #[test]
    fn command_fields() {
        let fields = packet_fields(&Packet::SetDutyCycle(SetDutyCycle::new(0.5)));
        assert_eq!(fields, json!({ "duty": 0.5 }));
        assert_eq!(render_fields(&fields, " "), "duty=0.5");
    }

    #[test]
    fn request_has_no_fields() {
        let fields = packet_fields(&Packet::RequestTelemetry(RequestTelemetry::new()));
        assert_eq!(render_fields(&fields, " "), "");
    }

    #[test]
    fn json_output_carries_frame_hex() {
        let packet = Packet::SetDutyCycle(SetDutyCycle::new(0.5));
        let out = serde_json::to_value(PacketOutput::new(&packet)).unwrap();
        assert_eq!(out["name"], "SetDuty");
        assert_eq!(out["type_id"], 5);
        assert_eq!(out["frame"], "0205050000c3503aa503");
    }
}
