use std::io::Read;

use tracing::{debug, trace, warn};
use vesclink_packet::{scan_buffer, PacketRegistry};

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_packets, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = read_input(&args)?;
    let registry = PacketRegistry::standard();

    let mut packets = Vec::new();
    let mut discarded = 0usize;
    let mut offset = 0usize;
    while offset < bytes.len() {
        let report = scan_buffer(
            &bytes[offset..],
            &registry,
            |packet| packets.push(packet),
            |at, rejection| {
                if rejection.is_discarded_frame() {
                    discarded += 1;
                    debug!(offset = offset + at, %rejection, "discarding frame");
                } else {
                    trace!(offset = offset + at, %rejection, "skipping candidate frame");
                }
            },
        );
        offset += report.consumed;
        if !report.incomplete {
            break;
        }
        // No more bytes will arrive, so the pending start byte is noise.
        trace!(offset, "dropping truncated frame candidate");
        offset += 1;
    }

    if discarded > 0 {
        warn!(discarded, "frames failed validation");
    }
    if packets.is_empty() {
        return Err(CliError::new(
            DATA_INVALID,
            format!("no packets found in {} bytes", bytes.len()),
        ));
    }

    print_packets(&packets, format);
    Ok(SUCCESS)
}

fn read_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(text) = &args.hex {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        return hex::decode(&compact)
            .map_err(|err| CliError::new(USAGE, format!("--hex is not valid hex: {err}")));
    }
    if let Some(path) = &args.file {
        return std::fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }

    let mut buf = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buf)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_input_ignores_whitespace() {
        let args = DecodeArgs {
            hex: Some("02 01 04\n40 84 03".to_string()),
            file: None,
        };
        assert_eq!(read_input(&args).unwrap(), vec![2, 1, 4, 0x40, 0x84, 3]);
    }

    #[test]
    fn bad_hex_is_usage_error() {
        let args = DecodeArgs {
            hex: Some("zz".to_string()),
            file: None,
        };
        assert_eq!(read_input(&args).unwrap_err().code, USAGE);
    }
}
