//! Client configuration

use std::time::Duration;

use thiserror::Error;
use vision_shared::defaults;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Command port {command_port} leaves no room for the port at offset {offset}")]
    PortOutOfRange { command_port: u16, offset: u16 },
}

/// Configuration for a vision controller client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Hostname of the vision manager
    pub hostname: String,
    /// Command port; configuration and status ports are derived from it
    pub command_port: u16,
    /// Caller identifier attached to every command and configuration request
    pub caller_id: Option<String>,
    /// Idle connections older than this are reopened before reuse
    pub reconnection_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".into(),
            command_port: defaults::COMMAND_PORT,
            caller_id: None,
            reconnection_timeout: defaults::RECONNECTION_TIMEOUT,
            connect_timeout: defaults::CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(hostname: impl Into<String>, command_port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            command_port,
            ..Default::default()
        }
    }

    /// Check that every derived port fits in the port range
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.configuration_port()?;
        self.status_port()?;
        Ok(())
    }

    /// Port of the administrative configuration channel
    pub fn configuration_port(&self) -> Result<u16, ConfigError> {
        self.derived_port(defaults::CONFIGURATION_PORT_OFFSET)
    }

    /// Port the vision manager publishes its state on
    pub fn status_port(&self) -> Result<u16, ConfigError> {
        self.derived_port(defaults::STATUS_PORT_OFFSET)
    }

    fn derived_port(&self, offset: u16) -> Result<u16, ConfigError> {
        self.command_port
            .checked_add(offset)
            .ok_or(ConfigError::PortOutOfRange {
                command_port: self.command_port,
                offset,
            })
    }

    pub fn command_address(&self) -> String {
        format!("{}:{}", self.hostname, self.command_port)
    }

    pub fn configuration_address(&self) -> Result<String, ConfigError> {
        Ok(format!("{}:{}", self.hostname, self.configuration_port()?))
    }

    pub fn status_address(&self) -> Result<String, ConfigError> {
        Ok(format!("{}:{}", self.hostname, self.status_port()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.command_address(), "127.0.0.1:7004");
        assert_eq!(config.configuration_address().unwrap(), "127.0.0.1:7006");
        assert_eq!(config.status_address().unwrap(), "127.0.0.1:7007");
        assert!(config.caller_id.is_none());
    }

    #[test]
    fn test_derived_ports() {
        let config = ClientConfig::new("visioncontroller1", 9000);
        assert_eq!(config.configuration_port(), Ok(9002));
        assert_eq!(config.status_port(), Ok(9003));
        assert_eq!(config.status_address().unwrap(), "visioncontroller1:9003");
    }

    #[test]
    fn test_derived_ports_must_fit() {
        assert!(ClientConfig::new("vm", 65532).validate().is_ok());

        let config = ClientConfig::new("vm", 65533);
        assert_eq!(config.configuration_port(), Ok(65535));
        assert_eq!(
            config.status_port(),
            Err(ConfigError::PortOutOfRange {
                command_port: 65533,
                offset: 3,
            })
        );
        assert!(config.validate().is_err());
        assert!(ClientConfig::new("vm", u16::MAX).configuration_address().is_err());
    }
}
