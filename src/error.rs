// MIT License - Copyright (c) 2026 Peter Wright
// Gateway error types

/// Reasons a decoder rejects the frame it was accumulating.
///
/// Every rejection is recovered locally by resetting the decoder; none of
/// them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Unexpected clash code 0x{0:02x} inside packet body")]
    UnexpectedClashCode(u8),

    #[error("Invalid clash code offset 0x{0:02x}")]
    InvalidClashCode(u8),

    #[error("Packet too long (limit {limit} bytes)")]
    TooLong { limit: usize },

    #[error("Packet too short ({len} bytes, minimum {min})")]
    TooShort { len: usize, min: usize },

    #[error("Invalid CRC: expected {expected:04x}, found {found:04x}")]
    CrcMismatch { expected: u16, found: u16 },

    #[error("Invalid packet id: expected 0x80, found 0x{0:02x}")]
    BadPacketIdentity(u8),

    #[error("Invalid packet format")]
    InvalidFormat,

    #[error("Invalid Gent event code pair {msb}/{lsb}")]
    InvalidEventPair { msb: u8, lsb: u8 },

    #[error("Checksum mismatch: expected {expected:04x}")]
    ChecksumMismatch { expected: u16 },

    #[error("Line too long (limit {limit} characters)")]
    LineTooLong { limit: usize },

    #[error("Too many lines (limit {limit})")]
    TooManyLines { limit: usize },

    #[error("Message too long (limit {limit} bytes)")]
    MessageTooLong { limit: usize },

    #[error("Malformed line terminator")]
    MalformedLine,

    #[error("Stalled frame abandoned after {idle_ms}ms without data")]
    Stalled { idle_ms: u64 },
}

impl FrameError {
    /// Whether this is a validation failure on a fully delimited frame, as
    /// opposed to a framing violation.
    ///
    /// Validation failures may be forwarded anyway in verbose mode; framing
    /// violations never are. Only the Advanced BMS checks qualify: a Gent
    /// checksum mismatch is never forwarded.
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            FrameError::TooShort { .. }
                | FrameError::CrcMismatch { .. }
                | FrameError::BadPacketIdentity(_)
                | FrameError::InvalidFormat
        )
    }
}

/// All errors that can occur in the gateway library.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Serial port error: {0}")]
    Serial(String),

    #[error("Publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("Event payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Unknown protocol id: {0}")]
    UnknownProtocol(u8),

    #[error("Invalid configuration: {details}")]
    InvalidConfig { details: String },
}

impl GatewayError {
    /// Whether the failure came from the outbound transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Publish { .. })
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failures() {
        assert!(FrameError::CrcMismatch { expected: 1, found: 2 }.is_validation_failure());
        assert!(FrameError::BadPacketIdentity(0x81).is_validation_failure());
        assert!(FrameError::InvalidFormat.is_validation_failure());
        assert!(FrameError::TooShort { len: 4, min: 12 }.is_validation_failure());
    }

    #[test]
    fn test_framing_violations() {
        assert!(!FrameError::UnexpectedClashCode(0xfb).is_validation_failure());
        assert!(!FrameError::InvalidClashCode(0x06).is_validation_failure());
        assert!(!FrameError::TooLong { limit: 108 }.is_validation_failure());
        assert!(!FrameError::TooManyLines { limit: 8 }.is_validation_failure());
        assert!(!FrameError::Stalled { idle_ms: 500 }.is_validation_failure());
        assert!(!FrameError::ChecksumMismatch { expected: 6 }.is_validation_failure());
    }

    #[test]
    fn test_error_display() {
        let err = FrameError::CrcMismatch {
            expected: 0x8c67,
            found: 0x8c66,
        };
        assert_eq!(err.to_string(), "Invalid CRC: expected 8c67, found 8c66");
        let err = GatewayError::Publish {
            topic: "nimbus/dev/event".to_string(),
            reason: "queue full".to_string(),
        };
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "Publish to nimbus/dev/event failed: queue full");
    }
}
