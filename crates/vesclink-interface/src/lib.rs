//! Talk to a VESC motor controller.
//!
//! [`VescInterface`] owns a transport and a [`StreamReassembler`]. Inbound
//! bytes are appended to a shared buffer by the transport; a polling thread
//! scans that buffer, decodes packets and hands them to the application's
//! packet handler. Outbound commands are written straight to the transport.

pub mod config;
pub mod error;
pub mod interface;
pub mod reassembler;

pub use config::{InterfaceConfig, DEFAULT_POLL_INTERVAL};
pub use error::{InterfaceError, Result};
pub use interface::VescInterface;
pub use reassembler::{ErrorHandler, PacketHandler, StreamReassembler};
