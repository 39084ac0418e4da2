use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, OnBytes, OnError, Transport};

#[derive(Default)]
struct State {
    open: bool,
    sent: Vec<Vec<u8>>,
}

#[derive(Default)]
struct Callbacks {
    on_bytes: Option<OnBytes>,
    on_error: Option<OnError>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    // Separate from `state` so a callback that ends up calling `send_bytes`
    // cannot deadlock against an in-flight `inject`.
    callbacks: Mutex<Callbacks>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process transport.
///
/// Outbound writes are recorded; inbound bytes are injected through the
/// paired [`MemoryHandle`].
pub struct MemoryTransport {
    shared: Arc<Shared>,
}

/// Test-side end of a [`MemoryTransport`].
#[derive(Clone)]
pub struct MemoryHandle {
    shared: Arc<Shared>,
}

impl MemoryTransport {
    /// Create a closed transport and its handle.
    pub fn new() -> (Self, MemoryHandle) {
        let shared = Arc::new(Shared::default());
        (
            Self {
                shared: Arc::clone(&shared),
            },
            MemoryHandle { shared },
        )
    }
}

impl ByteSink for MemoryTransport {
    fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = lock(&self.shared.state);
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        trace!(len = bytes.len(), "memory transport send");
        state.sent.push(bytes.to_vec());
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn open(&mut self, on_bytes: OnBytes, on_error: OnError) -> Result<()> {
        let mut state = lock(&self.shared.state);
        if state.open {
            return Err(TransportError::AlreadyOpen {
                port: "memory".to_string(),
            });
        }
        let mut callbacks = lock(&self.shared.callbacks);
        callbacks.on_bytes = Some(on_bytes);
        callbacks.on_error = Some(on_error);
        state.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        lock(&self.shared.state).open
    }

    fn close(&mut self) -> Result<()> {
        lock(&self.shared.state).open = false;
        let mut callbacks = lock(&self.shared.callbacks);
        callbacks.on_bytes = None;
        callbacks.on_error = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

impl MemoryHandle {
    /// Deliver `bytes` as if they had arrived from the device.
    ///
    /// Returns `false` when the transport is closed and nothing was delivered.
    pub fn inject(&self, bytes: &[u8]) -> bool {
        let mut callbacks = lock(&self.shared.callbacks);
        match callbacks.on_bytes.as_mut() {
            Some(on_bytes) => {
                on_bytes(bytes);
                true
            }
            None => false,
        }
    }

    /// Simulate a receive-side failure.
    ///
    /// The transport reports `err` to its error callback and stops delivering
    /// bytes. Returns `false` when the transport was not open.
    pub fn fail(&self, err: TransportError) -> bool {
        let on_error = {
            let mut callbacks = lock(&self.shared.callbacks);
            callbacks.on_bytes = None;
            callbacks.on_error.take()
        };
        match on_error {
            Some(mut on_error) => {
                on_error(err);
                true
            }
            None => false,
        }
    }

    /// Everything written through the transport, one entry per write.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        lock(&self.shared.state).sent.clone()
    }

    /// Drain and return the recorded writes.
    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut lock(&self.shared.state).sent)
    }

    /// Whether the paired transport is open.
    pub fn is_open(&self) -> bool {
        lock(&self.shared.state).open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn send_records_writes_in_order() {
        let (mut transport, handle) = MemoryTransport::new();
        transport
            .open(Box::new(|_bytes: &[u8]| {}), Box::new(|_err| {}))
            .unwrap();

        transport.send_bytes(&[1, 2, 3]).unwrap();
        transport.send_bytes(&[4]).unwrap();

        assert_eq!(handle.sent(), vec![vec![1, 2, 3], vec![4]]);
        assert_eq!(handle.take_sent().len(), 2);
        assert!(handle.sent().is_empty());
    }

    #[test]
    fn send_while_closed_is_not_open() {
        let (mut transport, handle) = MemoryTransport::new();
        let err = transport.send_bytes(&[1]).unwrap_err();
        assert!(matches!(err, TransportError::NotOpen));
        assert!(handle.sent().is_empty());
    }

    #[test]
    fn inject_reaches_on_bytes_until_closed() {
        let (mut transport, handle) = MemoryTransport::new();
        let (tx, rx) = mpsc::channel();
        transport
            .open(
                Box::new(move |bytes: &[u8]| {
                    let _ = tx.send(bytes.to_vec());
                }),
                Box::new(|_err| {}),
            )
            .unwrap();

        assert!(handle.inject(&[0x02, 0x01]));
        assert_eq!(rx.try_recv().unwrap(), vec![0x02, 0x01]);

        transport.close().unwrap();
        assert!(!handle.inject(&[0x03]));
        assert!(!handle.is_open());
    }

    #[test]
    fn open_twice_is_rejected() {
        let (mut transport, _handle) = MemoryTransport::new();
        transport
            .open(Box::new(|_bytes: &[u8]| {}), Box::new(|_err| {}))
            .unwrap();
        let err = transport
            .open(Box::new(|_bytes: &[u8]| {}), Box::new(|_err| {}))
            .unwrap_err();
        assert!(matches!(err, TransportError::AlreadyOpen { .. }));
    }

    #[test]
    fn fail_reports_error_and_stops_delivery() {
        let (mut transport, handle) = MemoryTransport::new();
        let (tx, rx) = mpsc::channel();
        transport
            .open(
                Box::new(|_bytes: &[u8]| {}),
                Box::new(move |err| {
                    let _ = tx.send(err.to_string());
                }),
            )
            .unwrap();

        assert!(handle.fail(TransportError::Closed));
        assert_eq!(rx.try_recv().unwrap(), "transport closed");
        assert!(!handle.inject(&[1]));
        assert!(!handle.fail(TransportError::Closed));
    }
}
