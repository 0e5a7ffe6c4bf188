use std::io::{Read, Write};
use std::time::Duration;

use crate::control::domain::command_transport::{
    decode_response, prepare_command, CommandTransport, TransportError, TransportResponse,
};
use crate::shared::constants::{DEFAULT_UART_BAUD, DEFAULT_UART_PORT, DEFAULT_UART_TIMEOUT_SECS};

/// Time the controller gets to answer before the reply is read.
const REPLY_SETTLE: Duration = Duration::from_millis(150);

#[derive(Clone, Debug, PartialEq)]
pub struct SerialConfig {
    pub port: String,
    pub baud: u32,
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_UART_PORT.to_string(),
            baud: DEFAULT_UART_BAUD,
            timeout: Duration::from_secs_f64(DEFAULT_UART_TIMEOUT_SECS),
        }
    }
}

impl SerialConfig {
    pub fn from_process_env() -> Result<Self, TransportError> {
        Self::from_env(|key| std::env::var(key).ok())
    }

    /// Reads `UART_PORT`, `UART_BAUD` and `UART_TIMEOUT` (seconds).
    pub fn from_env<F>(lookup: F) -> Result<Self, TransportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(port) = get("UART_PORT") {
            config.port = port.trim().to_string();
        }
        if let Some(baud) = get("UART_BAUD") {
            config.baud = baud
                .trim()
                .parse()
                .map_err(|_| invalid("UART_BAUD", &baud))?;
        }
        if let Some(timeout) = get("UART_TIMEOUT") {
            let secs: f64 = timeout
                .trim()
                .parse()
                .map_err(|_| invalid("UART_TIMEOUT", &timeout))?;
            config.timeout =
                Duration::try_from_secs_f64(secs).map_err(|_| invalid("UART_TIMEOUT", &timeout))?;
        }
        Ok(config)
    }
}

fn invalid(key: &str, value: &str) -> TransportError {
    TransportError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Opens the serial port for each command and closes it afterwards.
pub struct SerialTransport {
    config: SerialConfig,
}

impl SerialTransport {
    pub fn new(config: SerialConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn io_error(&self, source: std::io::Error) -> TransportError {
        TransportError::Io {
            port: self.config.port.clone(),
            source,
        }
    }
}

impl CommandTransport for SerialTransport {
    fn send(&self, command: &str) -> Result<TransportResponse, TransportError> {
        let (sent, payload) = prepare_command(command)?;

        let mut port = serialport::new(&self.config.port, self.config.baud)
            .timeout(self.config.timeout)
            .open()
            .map_err(|e| TransportError::Open {
                port: self.config.port.clone(),
                reason: e.to_string(),
            })?;

        port.write_all(&payload).map_err(|e| self.io_error(e))?;
        port.flush().map_err(|e| self.io_error(e))?;
        std::thread::sleep(REPLY_SETTLE);

        let pending = port
            .bytes_to_read()
            .map_err(|e| self.io_error(e.into()))?;
        let mut reply = vec![0u8; pending as usize];
        if !reply.is_empty() {
            let read = port.read(&mut reply).map_err(|e| self.io_error(e))?;
            reply.truncate(read);
        }
        log::info!("Sent {:?} to {} ({} reply bytes)", sent, self.config.port, reply.len());

        Ok(TransportResponse {
            port: self.config.port.clone(),
            baud: self.config.baud,
            sent,
            response: decode_response(&reply),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let owned: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| owned.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_defaults_match_the_controller_wiring() {
        let config = SerialConfig::from_env(lookup(&[])).unwrap();
        assert_eq!(config.port, "/dev/ttyAMA0");
        assert_eq!(config.baud, 115_200);
        assert_eq!(config.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_env_overrides() {
        let config = SerialConfig::from_env(lookup(&[
            ("UART_PORT", "/dev/ttyUSB0"),
            ("UART_BAUD", "9600"),
            ("UART_TIMEOUT", "0.25"),
        ]))
        .unwrap();
        assert_eq!(config.port, "/dev/ttyUSB0");
        assert_eq!(config.baud, 9600);
        assert_eq!(config.timeout, Duration::from_millis(250));
    }

    #[rstest]
    #[case("UART_BAUD", "fast")]
    #[case("UART_TIMEOUT", "-1")]
    #[case("UART_TIMEOUT", "soon")]
    fn test_bad_values_are_rejected(#[case] key: &str, #[case] value: &str) {
        let err = SerialConfig::from_env(lookup(&[(key, value)])).unwrap_err();
        assert!(matches!(err, TransportError::InvalidSetting { key: k, .. } if k == key));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = SerialConfig::from_env(lookup(&[("UART_PORT", "  "), ("UART_BAUD", "")])).unwrap();
        assert_eq!(config, SerialConfig::default());
    }

    #[test]
    fn test_empty_command_fails_before_opening_port() {
        let transport = SerialTransport::new(SerialConfig {
            port: "/nonexistent/tty".into(),
            ..SerialConfig::default()
        });
        assert!(matches!(transport.send("   "), Err(TransportError::EmptyCommand)));
    }

    #[test]
    fn test_missing_port_reports_open_error() {
        let transport = SerialTransport::new(SerialConfig {
            port: "/nonexistent/tty".into(),
            ..SerialConfig::default()
        });
        let err = transport.send("U").unwrap_err();
        assert!(matches!(err, TransportError::Open { ref port, .. } if port == "/nonexistent/tty"));
    }
}
