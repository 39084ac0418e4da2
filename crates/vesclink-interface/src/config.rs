use std::time::Duration;

use vesclink_transport::SerialConfig;

/// How often the reassembler scans its buffer.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Interface configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceConfig {
    /// Sleep between reassembler passes. Default: 10 ms.
    pub poll_interval: Duration,
    /// Line settings used by [`crate::VescInterface::connect`].
    pub serial: SerialConfig,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            serial: SerialConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = InterfaceConfig::default();
        assert_eq!(cfg.poll_interval, Duration::from_millis(10));
        assert_eq!(cfg.serial.baud_rate, 115_200);
    }
}
