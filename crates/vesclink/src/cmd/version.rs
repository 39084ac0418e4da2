use vesclink_frame::MAX_PAYLOAD_SIZE;
use vesclink_packet::PacketRegistry;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    let version = env!("CARGO_PKG_VERSION");
    if !args.extended {
        println!("vesclink {version}");
        return Ok(SUCCESS);
    }

    let registry = PacketRegistry::standard();
    let mut names: Vec<&str> = (0..=u8::MAX)
        .filter_map(|id| registry.lookup(id).map(|ty| ty.name))
        .collect();
    names.dedup();

    println!("vesclink {version}");
    println!("  target:         {}", env!("VESCLINK_BUILD_TARGET"));
    println!("  async codec:    {}", cfg!(feature = "async"));
    println!("  max payload:    {MAX_PAYLOAD_SIZE} bytes");
    println!("  packet types:   {}", names.join(", "));

    Ok(SUCCESS)
}
