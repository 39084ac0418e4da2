use tracing::info;
use vesclink_packet::VescPacket;

use crate::cmd::SendArgs;
use crate::exit::{interface_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: SendArgs, _format: OutputFormat) -> CliResult<i32> {
    // Validate before touching the port.
    let packet = args.kind.build(args.value)?;
    let mut iface = args.connect.connect()?;

    iface
        .send(&packet)
        .map_err(|err| interface_error("send failed", err))?;
    info!(
        port = %args.connect.port,
        packet = packet.name(),
        frame = %hex::encode(packet.frame().as_bytes()),
        "sent"
    );

    iface
        .disconnect()
        .map_err(|err| interface_error("disconnect failed", err))?;
    Ok(SUCCESS)
}
