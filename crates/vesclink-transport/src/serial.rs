use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, OnBytes, OnError, Transport};

const READ_CHUNK_SIZE: usize = 1024;

/// Line settings for a serial connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Baud rate. Default: 115200.
    pub baud_rate: u32,
    /// How long a single blocking read waits before the reader thread
    /// re-checks its run flag. Default: 100 ms.
    pub read_timeout: Duration,
    pub data_bits: DataBits,
    /// Default: none. Hardware flow control is not supported on every host
    /// (macOS rejects it for USB CDC devices).
    pub flow_control: FlowControl,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            read_timeout: Duration::from_millis(100),
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Serial port transport.
///
/// Inbound bytes are read on a dedicated thread and handed to the `on_bytes`
/// callback as they arrive; outbound writes happen on the caller's thread.
pub struct SerialTransport {
    port_name: String,
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
    reader: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl SerialTransport {
    /// Create a transport for `port_name` with default line settings.
    pub fn new(port_name: impl Into<String>) -> Self {
        Self::with_config(port_name, SerialConfig::default())
    }

    /// Create a transport with explicit line settings.
    pub fn with_config(port_name: impl Into<String>, config: SerialConfig) -> Self {
        Self {
            port_name: port_name.into(),
            config,
            port: None,
            reader: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Device path this transport opens.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Current line settings.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn configure(&self, port: &mut dyn SerialPort) -> Result<()> {
        port.set_data_bits(self.config.data_bits)
            .map_err(|source| self.configure_error("data bits", source))?;
        port.set_flow_control(self.config.flow_control)
            .map_err(|source| self.configure_error("flow control", source))?;
        port.set_parity(self.config.parity)
            .map_err(|source| self.configure_error("parity", source))?;
        port.set_stop_bits(self.config.stop_bits)
            .map_err(|source| self.configure_error("stop bits", source))?;
        Ok(())
    }

    fn configure_error(&self, option: &'static str, source: serialport::Error) -> TransportError {
        TransportError::Configure {
            port: self.port_name.clone(),
            option,
            source,
        }
    }
}

impl ByteSink for SerialTransport {
    fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;

        let mut offset = 0usize;
        while offset < bytes.len() {
            match port.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match port.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl Transport for SerialTransport {
    fn open(&mut self, on_bytes: OnBytes, on_error: OnError) -> Result<()> {
        if self.port.is_some() {
            return Err(TransportError::AlreadyOpen {
                port: self.port_name.clone(),
            });
        }

        let mut port = serialport::new(&self.port_name, self.config.baud_rate)
            .timeout(self.config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: self.port_name.clone(),
                source,
            })?;
        self.configure(port.as_mut())?;

        let reader = port.try_clone().map_err(|source| TransportError::Open {
            port: self.port_name.clone(),
            source,
        })?;

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let handle = std::thread::Builder::new()
            .name("vesclink-serial-rx".to_string())
            .spawn(move || receive_loop(reader, running, on_bytes, on_error))
            .map_err(|err| {
                self.running.store(false, Ordering::SeqCst);
                TransportError::Io(err)
            })?;

        self.reader = Some(handle);
        self.port = Some(port);
        info!(port = %self.port_name, baud = self.config.baud_rate, "serial port open");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                warn!(port = %self.port_name, "serial reader thread panicked");
            }
        }
        if self.port.take().is_some() {
            debug!(port = %self.port_name, "serial port closed");
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.port_name, self.config.baud_rate)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn receive_loop<R: Read>(
    mut reader: R,
    running: Arc<AtomicBool>,
    mut on_bytes: OnBytes,
    mut on_error: OnError,
) {
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    while running.load(Ordering::SeqCst) {
        match reader.read(&mut chunk) {
            Ok(0) => {
                warn!("serial port returned end of stream, receive loop stopping");
                running.store(false, Ordering::SeqCst);
                on_error(TransportError::Closed);
                break;
            }
            Ok(n) => on_bytes(&chunk[..n]),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::WouldBlock
                ) =>
            {
                continue
            }
            Err(err) => {
                warn!(error = %err, "serial read failed, receive loop stopping");
                running.store(false, Ordering::SeqCst);
                on_error(TransportError::Io(err));
                break;
            }
        }
    }
}

/// A serial port visible on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    /// `usb`, `pci`, `bluetooth` or `unknown`.
    pub kind: &'static str,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

/// List serial ports on this host.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;

    Ok(ports
        .into_iter()
        .map(|p| match p.port_type {
            SerialPortType::UsbPort(usb) => PortInfo {
                name: p.port_name,
                kind: "usb",
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                serial_number: usb.serial_number,
                manufacturer: usb.manufacturer,
                product: usb.product,
            },
            other => PortInfo {
                name: p.port_name,
                kind: match other {
                    SerialPortType::PciPort => "pci",
                    SerialPortType::BluetoothPort => "bluetooth",
                    _ => "unknown",
                },
                vid: None,
                pid: None,
                serial_number: None,
                manufacturer: None,
                product: None,
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_handlers() -> (OnBytes, OnError) {
        (Box::new(|_bytes: &[u8]| {}), Box::new(|_err| {}))
    }

    /// Yields each scripted read result in turn.
    struct ScriptedPort(Vec<std::io::Result<Vec<u8>>>);

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.0.is_empty() {
                return Ok(0);
            }
            let bytes = self.0.remove(0)?;
            buf[..bytes.len()].copy_from_slice(&bytes);
            Ok(bytes.len())
        }
    }

    fn run_scripted(
        script: Vec<std::io::Result<Vec<u8>>>,
    ) -> (Vec<u8>, Vec<TransportError>, bool) {
        let received = Arc::new(std::sync::Mutex::new(Vec::new()));
        let errors = Arc::new(std::sync::Mutex::new(Vec::new()));
        let running = Arc::new(AtomicBool::new(true));

        let sink = Arc::clone(&received);
        let on_bytes: OnBytes = Box::new(move |bytes: &[u8]| {
            sink.lock().unwrap().extend_from_slice(bytes);
        });
        let errs = Arc::clone(&errors);
        let on_error: OnError = Box::new(move |err| errs.lock().unwrap().push(err));

        receive_loop(ScriptedPort(script), Arc::clone(&running), on_bytes, on_error);

        let received = received.lock().unwrap().clone();
        let errors = std::mem::take(&mut *errors.lock().unwrap());
        (received, errors, running.load(Ordering::SeqCst))
    }

    #[test]
    fn end_of_stream_stops_receive_loop_as_closed() {
        let (received, errors, running) = run_scripted(vec![
            Ok(vec![0x02, 0x01]),
            Err(ErrorKind::TimedOut.into()),
            Ok(vec![0x04]),
            Ok(Vec::new()),
            Ok(vec![0xFF]),
        ]);

        assert_eq!(received, vec![0x02, 0x01, 0x04]);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], TransportError::Closed));
        assert!(!running);
    }

    #[test]
    fn read_failure_stops_receive_loop_as_io() {
        let (received, errors, running) = run_scripted(vec![
            Err(ErrorKind::Interrupted.into()),
            Err(ErrorKind::BrokenPipe.into()),
        ]);

        assert!(received.is_empty());
        assert!(matches!(&errors[..], [TransportError::Io(e)] if e.kind() == ErrorKind::BrokenPipe));
        assert!(!running);
    }

    #[test]
    fn default_config_matches_controller_line_settings() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.data_bits, DataBits::Eight);
        assert_eq!(cfg.flow_control, FlowControl::None);
        assert_eq!(cfg.parity, Parity::None);
        assert_eq!(cfg.stop_bits, StopBits::One);
    }

    #[test]
    fn send_before_open_is_not_open() {
        let mut transport = SerialTransport::new("/dev/null-vesc");
        let err = transport.send_bytes(&[0x02, 0x01]).unwrap_err();
        assert!(matches!(err, TransportError::NotOpen));
    }

    #[test]
    fn close_without_open_is_noop() {
        let mut transport = SerialTransport::new("/dev/null-vesc");
        transport.close().unwrap();
        assert!(!transport.is_open());
    }

    #[test]
    #[cfg(unix)]
    fn open_missing_device_reports_open_error() {
        let path = format!("/tmp/vesclink-missing-{}", std::process::id());
        let mut transport = SerialTransport::new(path.clone());
        let (on_bytes, on_error) = noop_handlers();

        let err = transport.open(on_bytes, on_error).unwrap_err();
        match err {
            TransportError::Open { port, .. } => assert_eq!(port, path),
            other => panic!("expected open error, got {other:?}"),
        }
        assert!(!transport.is_open());
    }

    #[test]
    fn describe_includes_port_and_baud() {
        let transport = SerialTransport::with_config(
            "/dev/ttyACM0",
            SerialConfig {
                baud_rate: 921_600,
                ..SerialConfig::default()
            },
        );
        assert_eq!(transport.describe(), "/dev/ttyACM0 @ 921600 baud");
        assert_eq!(transport.port_name(), "/dev/ttyACM0");
    }
}
