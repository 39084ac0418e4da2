use std::fmt;
use std::io;

use vesclink_interface::InterfaceError;
use vesclink_transport::TransportError;

// Process exit codes. 3 covers serial/transport failures, 50 an access-denied
// port, 60 input that held no packets, 64 bad arguments, 124 a reply timeout.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::Open { ref source, .. } | TransportError::Configure { ref source, .. }
            if source.kind() == serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn interface_error(context: &str, err: InterfaceError) -> CliError {
    match err {
        InterfaceError::Transport(err) => transport_error(context, err),
        InterfaceError::NotConnected => CliError::new(FAILURE, format!("{context}: {err}")),
        InterfaceError::AlreadyConnected { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_io_maps_through_io_kind() {
        let err = transport_error(
            "send failed",
            TransportError::Io(io::Error::from(io::ErrorKind::TimedOut)),
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("send failed: "));
    }

    #[test]
    fn open_failure_is_transport_error() {
        let err = transport_error(
            "connect failed",
            TransportError::Open {
                port: "/dev/ttyACM9".to_string(),
                source: serialport::Error::new(serialport::ErrorKind::NoDevice, "no such device"),
            },
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn open_permission_denied() {
        let err = transport_error(
            "connect failed",
            TransportError::Open {
                port: "/dev/ttyACM0".to_string(),
                source: serialport::Error::new(
                    serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied),
                    "permission denied",
                ),
            },
        );
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn interface_errors() {
        assert_eq!(
            interface_error("send failed", InterfaceError::NotConnected).code,
            FAILURE
        );
        assert_eq!(
            interface_error(
                "connect failed",
                InterfaceError::Spawn(io::Error::other("no threads"))
            )
            .code,
            INTERNAL
        );
    }
}
