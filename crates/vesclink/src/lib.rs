//! Serial link to VESC motor controllers.
//!
//! vesclink speaks the VESC UART protocol: checksummed framing, typed
//! packets for the common commands and replies, and a device interface that
//! reassembles inbound packets from an unsegmented byte stream.
//!
//! # Crate Structure
//!
//! - [`transport`] - Byte transports (serial port, in-memory)
//! - [`frame`] - Frame layout, CRC-16 and frame location
//! - [`packet`] - Typed packets, the packet registry and stream scanning
//! - [`interface`] - Stream reassembler and device interface

/// Re-export transport types.
pub mod transport {
    pub use vesclink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use vesclink_frame::*;
}

/// Re-export packet types.
pub mod packet {
    pub use vesclink_packet::*;
}

/// Re-export interface types.
pub mod interface {
    pub use vesclink_interface::*;
}

pub use vesclink_interface::VescInterface;
pub use vesclink_packet::{Packet, VescPacket};
