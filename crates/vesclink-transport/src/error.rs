/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport is already open.
    #[error("transport already open: {port}")]
    AlreadyOpen { port: String },

    /// The serial port could not be opened.
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// The port opened but a line option could not be applied.
    #[error("failed to set {option} on {port}: {source}")]
    Configure {
        port: String,
        option: &'static str,
        source: serialport::Error,
    },

    /// Serial port enumeration failed.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(serialport::Error),

    /// The transport is not open.
    #[error("transport not open")]
    NotOpen,

    /// An I/O error occurred on the open port.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device closed the link or stopped accepting bytes.
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
