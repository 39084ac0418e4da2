use crate::error::{Result, TransportError};

/// Callback invoked with every chunk of inbound bytes.
///
/// Transports call it from their own receive context, usually a reader thread,
/// so it must be `Send`.
pub type OnBytes = Box<dyn FnMut(&[u8]) + Send>;

/// Callback invoked when the receive side fails and stops delivering bytes.
pub type OnError = Box<dyn FnMut(TransportError) + Send>;

/// Fire-and-forget sink for encoded frames.
///
/// Nothing is read back; the protocol has no acknowledgements.
pub trait ByteSink {
    /// Write the whole buffer to the device.
    fn send_bytes(&mut self, bytes: &[u8]) -> Result<()>;
}

/// A connection-oriented byte transport.
pub trait Transport: ByteSink + Send {
    /// Open the transport and start delivering inbound bytes to `on_bytes`.
    ///
    /// Opening an already-open transport is an error; nothing is retried.
    fn open(&mut self, on_bytes: OnBytes, on_error: OnError) -> Result<()>;

    /// Whether the transport is currently open.
    fn is_open(&self) -> bool;

    /// Stop receiving and release the underlying resource.
    ///
    /// Closing a transport that is not open is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Human-readable endpoint description for diagnostics.
    fn describe(&self) -> String;
}

impl<T: ByteSink + ?Sized> ByteSink for Box<T> {
    fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send_bytes(bytes)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self, on_bytes: OnBytes, on_error: OnError) -> Result<()> {
        (**self).open(on_bytes, on_error)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
