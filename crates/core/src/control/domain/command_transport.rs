use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Command is empty")]
    EmptyCommand,
    #[error("invalid value for {key}: {value:?}")]
    InvalidSetting { key: String, value: String },
    #[error("could not open {port}: {reason}")]
    Open { port: String, reason: String },
    #[error("I/O on {port} failed: {source}")]
    Io {
        port: String,
        #[source]
        source: std::io::Error,
    },
}

/// What was sent over the link and what came back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransportResponse {
    pub port: String,
    pub baud: u32,
    pub sent: String,
    pub response: String,
}

/// Line-oriented command link to the solving robot.
pub trait CommandTransport: Send {
    fn send(&self, command: &str) -> Result<TransportResponse, TransportError>;
}

/// Trims `command` and terminates it with a newline, dropping non-ASCII
/// characters.
pub fn prepare_command(command: &str) -> Result<(String, Vec<u8>), TransportError> {
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return Err(TransportError::EmptyCommand);
    }
    let mut payload: Vec<u8> = trimmed.chars().filter(char::is_ascii).map(|c| c as u8).collect();
    payload.push(b'\n');
    Ok((trimmed.to_string(), payload))
}

/// Decodes a reply, keeping only ASCII and trimming surrounding whitespace.
pub fn decode_response(bytes: &[u8]) -> String {
    let text: String = bytes.iter().filter(|b| b.is_ascii()).map(|&b| b as char).collect();
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("R U R' U'", "R U R' U'\n")]
    #[case("  F2 B2 \r\n", "F2 B2\n")]
    #[case("D\u{00e9}", "D\n")]
    fn test_prepare_command_trims_and_terminates(#[case] input: &str, #[case] payload: &str) {
        let (_, bytes) = prepare_command(input).unwrap();
        assert_eq!(bytes, payload.as_bytes());
    }

    #[test]
    fn test_prepare_command_reports_trimmed_text() {
        let (sent, _) = prepare_command("  L2 ").unwrap();
        assert_eq!(sent, "L2");
    }

    #[rstest]
    #[case("")]
    #[case("   \n\t")]
    fn test_blank_command_is_rejected(#[case] input: &str) {
        assert!(matches!(prepare_command(input), Err(TransportError::EmptyCommand)));
    }

    #[test]
    fn test_decode_response_strips_noise() {
        assert_eq!(decode_response(b"  OK\r\n"), "OK");
        assert_eq!(decode_response(&[0xff, b'A', b'C', b'K']), "ACK");
        assert_eq!(decode_response(b""), "");
    }
}
