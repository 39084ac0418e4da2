//! Byte transports for the VESC serial protocol.
//!
//! The protocol core never touches a device directly. It needs two things from
//! a transport:
//! - a sink for encoded frames ([`ByteSink`])
//! - a callback invoked with every inbound chunk ([`OnBytes`])
//!
//! [`SerialTransport`] talks to a real controller over a serial port.
//! [`MemoryTransport`] is an in-process stand-in for tests and simulators.

pub mod error;
pub mod memory;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::{MemoryHandle, MemoryTransport};
pub use serial::{available_ports, PortInfo, SerialConfig, SerialTransport};
pub use traits::{ByteSink, OnBytes, OnError, Transport};
