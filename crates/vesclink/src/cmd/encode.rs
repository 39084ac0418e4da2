use serde::Serialize;
use vesclink_packet::VescPacket;

use crate::cmd::EncodeArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_raw, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput<'a> {
    name: &'a str,
    type_id: u8,
    frame: String,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let packet = args.kind.build(args.value)?;
    let bytes = packet.frame().as_bytes();

    match format {
        OutputFormat::Json => {
            let out = EncodeOutput {
                name: packet.name(),
                type_id: packet.type_id(),
                frame: hex::encode(bytes),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", hex::encode(bytes)),
        OutputFormat::Raw => print_raw(bytes),
    }

    Ok(SUCCESS)
}
