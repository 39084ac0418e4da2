/// Errors that can occur in interface operations.
#[derive(Debug, thiserror::Error)]
pub enum InterfaceError {
    /// `connect` was called while a transport is open.
    #[error("already connected to {endpoint}")]
    AlreadyConnected { endpoint: String },

    /// A command was sent with no open transport.
    #[error("not connected")]
    NotConnected,

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] vesclink_transport::TransportError),

    /// The reassembler thread could not be started.
    #[error("failed to start reassembler thread: {0}")]
    Spawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, InterfaceError>;
