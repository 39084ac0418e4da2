use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tracing::{debug, trace, warn};
use vesclink_packet::{scan_buffer, Packet, PacketRegistry, ScanReport};
use vesclink_transport::{OnBytes, OnError};

use crate::config::DEFAULT_POLL_INTERVAL;

/// Receives every decoded packet, on the reassembler thread.
pub type PacketHandler = Box<dyn FnMut(Packet) + Send>;

/// Receives a message for every discarded frame and transport failure.
pub type ErrorHandler = Box<dyn FnMut(String) + Send>;

#[derive(Default)]
struct State {
    buf: BytesMut,
    on_packet: Option<PacketHandler>,
    on_error: Option<ErrorHandler>,
}

struct Shared {
    state: Mutex<State>,
    registry: Arc<PacketRegistry>,
    running: AtomicBool,
}

// The buffer is only ever appended to or advanced by whole scan results, so
// it stays consistent even if a handler panicked while holding the lock.
fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Turns an unsegmented byte stream into packets.
///
/// Bytes are appended with [`push`](Self::push) (or the closure from
/// [`receiver`](Self::receiver)). A polling thread started with
/// [`start`](Self::start) scans the buffer every `poll_interval`, dispatches
/// each decoded packet to the packet handler in stream order, and drops the
/// bytes it has used up. Handlers run on that thread while the buffer lock is
/// held, so they must not call back into the reassembler.
pub struct StreamReassembler {
    shared: Arc<Shared>,
    poll_interval: Duration,
    thread: Option<JoinHandle<()>>,
}

impl StreamReassembler {
    /// Reassembler for the built-in packet types, polling every 10 ms.
    pub fn new() -> Self {
        Self::with_registry(PacketRegistry::standard(), DEFAULT_POLL_INTERVAL)
    }

    pub fn with_registry(registry: Arc<PacketRegistry>, poll_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                registry,
                running: AtomicBool::new(false),
            }),
            poll_interval,
            thread: None,
        }
    }

    /// Replace the packet handler.
    pub fn set_packet_handler<F>(&self, handler: F)
    where
        F: FnMut(Packet) + Send + 'static,
    {
        lock(&self.shared.state).on_packet = Some(Box::new(handler));
    }

    /// Replace the error handler.
    pub fn set_error_handler<F>(&self, handler: F)
    where
        F: FnMut(String) + Send + 'static,
    {
        lock(&self.shared.state).on_error = Some(Box::new(handler));
    }

    /// Append received bytes.
    pub fn push(&self, bytes: &[u8]) {
        lock(&self.shared.state).buf.extend_from_slice(bytes);
    }

    /// A transport callback that appends to this reassembler's buffer.
    pub fn receiver(&self) -> OnBytes {
        let shared = Arc::clone(&self.shared);
        Box::new(move |bytes: &[u8]| {
            lock(&shared.state).buf.extend_from_slice(bytes);
        })
    }

    /// A transport callback that forwards receive failures to the error handler.
    pub fn error_sink(&self) -> OnError {
        let shared = Arc::clone(&self.shared);
        Box::new(move |err| {
            warn!(error = %err, "transport receive failed");
            if let Some(on_error) = lock(&shared.state).on_error.as_mut() {
                on_error(err.to_string());
            }
        })
    }

    /// Run one scan pass on the calling thread.
    pub fn run_pass(&self) -> ScanReport {
        scan_pass(&self.shared)
    }

    /// Start the polling thread. Does nothing if it is already running.
    pub fn start(&mut self) -> std::io::Result<()> {
        if self.thread.is_some() {
            return Ok(());
        }

        self.shared.running.store(true, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let poll_interval = self.poll_interval;
        let spawned = std::thread::Builder::new()
            .name("vesclink-reassembler".to_string())
            .spawn(move || {
                while shared.running.load(Ordering::SeqCst) {
                    scan_pass(&shared);
                    std::thread::sleep(poll_interval);
                }
            });

        match spawned {
            Ok(handle) => {
                self.thread = Some(handle);
                debug!(?poll_interval, "reassembler started");
                Ok(())
            }
            Err(err) => {
                self.shared.running.store(false, Ordering::SeqCst);
                Err(err)
            }
        }
    }

    /// Stop the polling thread and discard any buffered bytes.
    ///
    /// A partial frame does not survive a stop; the next start begins with
    /// an empty buffer.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("reassembler thread panicked");
            }
            debug!("reassembler stopped");
        }
        lock(&self.shared.state).buf.clear();
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Bytes waiting to be scanned.
    pub fn buffered_len(&self) -> usize {
        lock(&self.shared.state).buf.len()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Default for StreamReassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StreamReassembler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn scan_pass(shared: &Shared) -> ScanReport {
    let mut guard = lock(&shared.state);
    let State {
        buf,
        on_packet,
        on_error,
    } = &mut *guard;
    if buf.is_empty() {
        return ScanReport::default();
    }

    let report = scan_buffer(
        &buf[..],
        &shared.registry,
        |packet| {
            if let Some(on_packet) = on_packet.as_mut() {
                on_packet(packet);
            }
        },
        |offset, rejection| {
            if rejection.is_discarded_frame() {
                debug!(offset, %rejection, "discarding frame");
                if let Some(on_error) = on_error.as_mut() {
                    on_error(rejection.to_string());
                }
            } else {
                trace!(offset, %rejection, "skipping candidate frame");
            }
        },
    );
    buf.advance(report.consumed);
    report
}
