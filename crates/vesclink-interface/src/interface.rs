use std::sync::Arc;

use tracing::debug;
use vesclink_packet::{
    Packet, PacketRegistry, RequestFirmwareVersion, RequestTelemetry, SetCurrent,
    SetCurrentBrake, SetDutyCycle, SetPosition, SetRpm, SetServoPosition, VescPacket,
};
use vesclink_transport::{SerialTransport, Transport};

use crate::config::InterfaceConfig;
use crate::error::{InterfaceError, Result};
use crate::reassembler::StreamReassembler;

/// Connection to one VESC.
///
/// Commands are fire-and-forget. Responses arrive asynchronously through the
/// packet handler, called from the reassembler thread.
pub struct VescInterface {
    config: InterfaceConfig,
    reassembler: StreamReassembler,
    transport: Option<Box<dyn Transport>>,
}

impl VescInterface {
    /// Interface with default configuration and the built-in packet types.
    pub fn new() -> Self {
        Self::with_config(InterfaceConfig::default())
    }

    pub fn with_config(config: InterfaceConfig) -> Self {
        Self::with_registry(config, PacketRegistry::standard())
    }

    /// Interface that decodes with a caller-supplied registry.
    pub fn with_registry(config: InterfaceConfig, registry: Arc<PacketRegistry>) -> Self {
        let reassembler = StreamReassembler::with_registry(registry, config.poll_interval);
        Self {
            config,
            reassembler,
            transport: None,
        }
    }

    pub fn config(&self) -> &InterfaceConfig {
        &self.config
    }

    /// Set the callback for decoded inbound packets.
    pub fn set_packet_handler<F>(&self, handler: F)
    where
        F: FnMut(Packet) + Send + 'static,
    {
        self.reassembler.set_packet_handler(handler);
    }

    /// Set the callback for discarded frames and transport failures.
    pub fn set_error_handler<F>(&self, handler: F)
    where
        F: FnMut(String) + Send + 'static,
    {
        self.reassembler.set_error_handler(handler);
    }

    /// Open `port` as a serial device with the configured line settings.
    pub fn connect(&mut self, port: &str) -> Result<()> {
        let transport = SerialTransport::with_config(port, self.config.serial.clone());
        self.connect_with(transport)
    }

    /// Start receiving through an arbitrary transport.
    pub fn connect_with<T>(&mut self, transport: T) -> Result<()>
    where
        T: Transport + 'static,
    {
        if let Some(current) = &self.transport {
            return Err(InterfaceError::AlreadyConnected {
                endpoint: current.describe(),
            });
        }

        let mut transport: Box<dyn Transport> = Box::new(transport);
        self.reassembler.start().map_err(InterfaceError::Spawn)?;
        if let Err(err) =
            transport.open(self.reassembler.receiver(), self.reassembler.error_sink())
        {
            self.reassembler.stop();
            return Err(err.into());
        }

        debug!(endpoint = %transport.describe(), "connected");
        self.transport = Some(transport);
        Ok(())
    }

    /// Close the transport and stop the reassembler.
    ///
    /// Not being connected is not an error.
    pub fn disconnect(&mut self) -> Result<()> {
        let Some(mut transport) = self.transport.take() else {
            return Ok(());
        };

        let closed = transport.close();
        self.reassembler.stop();
        debug!(endpoint = %transport.describe(), "disconnected");
        closed.map_err(InterfaceError::from)
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Endpoint of the open transport.
    pub fn endpoint(&self) -> Option<String> {
        self.transport.as_ref().map(|t| t.describe())
    }

    /// Write a packet's frame to the device.
    pub fn send<P: VescPacket + ?Sized>(&mut self, packet: &P) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(InterfaceError::NotConnected)?;
        transport.send_bytes(packet.frame().as_bytes())?;
        Ok(())
    }

    /// Ask for the firmware version; the reply arrives as
    /// [`Packet::FirmwareVersion`].
    pub fn request_firmware_version(&mut self) -> Result<()> {
        self.send(&RequestFirmwareVersion::new())
    }

    /// Ask for a telemetry snapshot; the reply arrives as
    /// [`Packet::Telemetry`].
    pub fn request_state(&mut self) -> Result<()> {
        self.send(&RequestTelemetry::new())
    }

    /// Duty cycle in -1.0..=1.0.
    pub fn set_duty_cycle(&mut self, duty: f64) -> Result<()> {
        self.send(&SetDutyCycle::new(duty))
    }

    /// Motor current in amps.
    pub fn set_current(&mut self, current: f64) -> Result<()> {
        self.send(&SetCurrent::new(current))
    }

    /// Brake current in amps.
    pub fn set_brake(&mut self, current_brake: f64) -> Result<()> {
        self.send(&SetCurrentBrake::new(current_brake))
    }

    /// Electrical RPM.
    pub fn set_speed(&mut self, rpm: f64) -> Result<()> {
        self.send(&SetRpm::new(rpm))
    }

    /// Rotor position in degrees.
    pub fn set_position(&mut self, position: f64) -> Result<()> {
        self.send(&SetPosition::new(position))
    }

    /// Servo output in 0.0..=1.0.
    pub fn set_servo(&mut self, position: f64) -> Result<()> {
        self.send(&SetServoPosition::new(position))
    }
}

impl Default for VescInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for VescInterface {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use vesclink_transport::{MemoryHandle, MemoryTransport, TransportError};

    use super::*;

    const WAIT: Duration = Duration::from_secs(2);

    fn connected() -> (VescInterface, MemoryHandle, mpsc::Receiver<Packet>) {
        let mut iface = VescInterface::new();
        let (tx, rx) = mpsc::channel();
        iface.set_packet_handler(move |packet| {
            let _ = tx.send(packet);
        });
        let (transport, handle) = MemoryTransport::new();
        iface.connect_with(transport).unwrap();
        (iface, handle, rx)
    }

    #[test]
    fn test_helpers_write_expected_frames() {
        let (mut iface, handle, _) = connected();
        iface.request_firmware_version().unwrap();
        iface.request_state().unwrap();
        iface.set_duty_cycle(0.5).unwrap();
        iface.set_speed(1000.0).unwrap();

        let sent: Vec<String> = handle.take_sent().into_iter().map(hex::encode).collect();
        assert_eq!(
            sent,
            vec![
                "020100000003",
                "020104408403",
                "0205050000c3503aa503",
                "020508000003e82b5803",
            ]
        );
    }

    #[test]
    fn test_every_setpoint_helper_sends_its_type() {
        let (mut iface, handle, _) = connected();
        iface.set_current(1.0).unwrap();
        iface.set_brake(2.0).unwrap();
        iface.set_position(3.0).unwrap();
        iface.set_servo(0.5).unwrap();

        let types: Vec<u8> = handle.take_sent().iter().map(|f| f[2]).collect();
        assert_eq!(types, vec![6, 7, 9, 12]);
    }

    #[test]
    fn test_inbound_bytes_reach_packet_handler() {
        let (iface, handle, rx) = connected();
        let mut wire = vec![0x55, 0xAA];
        wire.extend_from_slice(SetDutyCycle::new(0.25).frame().as_bytes());
        let (first, second) = wire.split_at(5);
        assert!(handle.inject(first));
        assert!(handle.inject(second));

        let packet = rx.recv_timeout(WAIT).unwrap();
        assert!(matches!(packet, Packet::SetDutyCycle(ref d) if d.duty() == 0.25));
        drop(iface);
    }

    #[test]
    fn test_send_without_connection() {
        let mut iface = VescInterface::new();
        let err = iface.set_current(1.0).unwrap_err();
        assert!(matches!(err, InterfaceError::NotConnected));
    }

    #[test]
    fn test_connect_twice_is_rejected() {
        let (mut iface, _handle, _) = connected();
        let (second, _) = MemoryTransport::new();
        let err = iface.connect_with(second).unwrap_err();
        assert!(matches!(err, InterfaceError::AlreadyConnected { .. }));
        assert!(iface.is_connected());
    }

    #[test]
    fn test_disconnect_closes_transport() {
        let (mut iface, handle, _) = connected();
        assert!(handle.is_open());
        iface.disconnect().unwrap();
        assert!(!iface.is_connected());
        assert!(!handle.is_open());
        assert!(matches!(
            iface.request_state().unwrap_err(),
            InterfaceError::NotConnected
        ));
    }

    #[test]
    fn test_disconnect_when_not_connected_is_noop() {
        let mut iface = VescInterface::new();
        iface.disconnect().unwrap();
        iface.disconnect().unwrap();
    }

    #[test]
    fn test_reconnect_after_disconnect() {
        let (mut iface, _, rx) = connected();
        iface.disconnect().unwrap();

        let (transport, handle) = MemoryTransport::new();
        iface.connect_with(transport).unwrap();
        handle.inject(RequestTelemetry::new().frame().as_bytes());
        assert!(matches!(
            rx.recv_timeout(WAIT).unwrap(),
            Packet::RequestTelemetry(_)
        ));
    }

    #[test]
    fn test_transport_failure_reaches_error_handler() {
        let (iface, handle, _) = connected();
        let (tx, rx) = mpsc::channel();
        iface.set_error_handler(move |message| {
            let _ = tx.send(message);
        });

        assert!(handle.fail(TransportError::Closed));
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), "transport closed");
    }

    #[test]
    fn test_open_failure_leaves_interface_disconnected() {
        let mut iface = VescInterface::new();
        let err = iface.connect_with(Unopenable).unwrap_err();
        assert!(matches!(
            err,
            InterfaceError::Transport(TransportError::AlreadyOpen { .. })
        ));
        assert!(!iface.is_connected());

        // The reassembler was stopped again, so a later connect succeeds.
        let (transport, _handle) = MemoryTransport::new();
        iface.connect_with(transport).unwrap();
    }

    struct Unopenable;

    impl vesclink_transport::ByteSink for Unopenable {
        fn send_bytes(&mut self, _bytes: &[u8]) -> vesclink_transport::Result<()> {
            Err(TransportError::NotOpen)
        }
    }

    impl Transport for Unopenable {
        fn open(
            &mut self,
            _on_bytes: vesclink_transport::OnBytes,
            _on_error: vesclink_transport::OnError,
        ) -> vesclink_transport::Result<()> {
            Err(TransportError::AlreadyOpen {
                port: "busy".to_string(),
            })
        }

        fn is_open(&self) -> bool {
            false
        }

        fn close(&mut self) -> vesclink_transport::Result<()> {
            Ok(())
        }

        fn describe(&self) -> String {
            "busy".to_string()
        }
    }

    #[test]
    fn test_endpoint_reports_transport() {
        let (iface, _handle, _) = connected();
        assert_eq!(iface.endpoint().as_deref(), Some("memory"));
    }
}
