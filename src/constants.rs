// MIT License - Copyright (c) 2026 Peter Wright
// Panel protocol constants

/// Advanced BMS framing bytes.
pub const ADV_SOM: u8 = 0xFE; // Start of message
pub const ADV_EOM: u8 = 0xFF; // End of message
pub const ADV_CLASH: u8 = 0xFA; // Clash code (byte stuffing prefix)
pub const ADV_PACKET_ID: u8 = 0x80; // Packet identity, always 0x80
pub const ADV_NO_MORE_MESSAGES: u8 = 0xF0; // Message list terminator

/// Highest offset that may follow a clash code (0xFA + 5 = 0xFF).
pub const ADV_CLASH_MAX_OFFSET: u8 = 0x05;

/// Shortest valid Advanced BMS packet ('Network Configuration Change').
pub const ADV_MIN_LENGTH: usize = 12;

/// Longest valid Advanced BMS packet: 5 header bytes, up to 100 payload
/// bytes, CRC high, CRC low and end of message.
pub const ADV_MAX_LENGTH: usize = 108;

/// Offset of the first message identifier code in an Advanced BMS packet.
pub const ADV_FIRST_MESSAGE_OFFSET: usize = 5;

/// Advanced MXPro ASCII printer-port limits.
///
/// First line is 16 characters, the next three 42, up to two optional lines
/// and two more lines of contingency, all terminated by `<cr><lf>`. A blank
/// line ends the message.
pub const ASCII_MAX_LINES: usize = 8;
pub const ASCII_LINE_LENGTH: usize = 42;
pub const ASCII_MAX_LENGTH: usize = 312;
pub const CR: u8 = 0x0D;
pub const LF: u8 = 0x0A;

/// Gent Vigilon framing.
pub const GENT_MAX_EVENT_MSB: u8 = 0x12;
pub const GENT_ACK: u8 = 0x06;
pub const GENT_NAK: u8 = 0x15;
/// Gent event packets are always 59 bytes: 57 body bytes and a 16-bit sum.
pub const GENT_EVENT_LENGTH: usize = 59;
pub const GENT_EVENT_BODY_LENGTH: usize = GENT_EVENT_LENGTH - 2;
/// ACK/NAK packets: two event bytes and a 16-bit sum.
pub const GENT_ACK_NAK_LENGTH: usize = 4;

/// Largest payload accepted into a transfer envelope.
pub const MAX_EVENT_PAYLOAD: usize = 512;

/// Command type of the outer transfer envelope (event transfer).
pub const TRANSFER_COMMAND_EVENT: u8 = 0x83;

/// Bytes following the outer length field, excluding the inner envelope:
/// transfer id, timestamp and fractional seconds.
pub const TRANSFER_HEADER_TAIL: usize = 12;
/// Bytes following the inner length field, excluding the payload:
/// timestamp and fractional seconds.
pub const EVENT_HEADER_TAIL: usize = 8;
/// Type byte plus 3-byte length field.
pub const TYPE_AND_LENGTH: usize = 4;

/// Default MQTT topic for encoded event envelopes.
pub const DEFAULT_EVENT_TOPIC: &str = "nimbus/dev/event";

/// Advanced BMS CRC lookup table, low byte.
pub const ADV_CRC_TABLE_LOW: [u8; 256] = [
    0x00, 0xc0, 0xc1, 0x01, 0xc3, 0x03, 0x02, 0xc2, 0xc6, 0x06, 0x07, 0xc7, 0x05, 0xc5, 0xc4, 0x04,
    0xcc, 0x0c, 0x0d, 0xcd, 0x0f, 0xcf, 0xce, 0x0e, 0x0a, 0xca, 0xcb, 0x0b, 0xc9, 0x09, 0x08, 0xc8,
    0xd8, 0x18, 0x19, 0xd9, 0x1b, 0xdb, 0xda, 0x1a, 0x1e, 0xde, 0xdf, 0x1f, 0xdd, 0x1d, 0x1c, 0xdc,
    0x14, 0xd4, 0xd5, 0x15, 0xd7, 0x17, 0x16, 0xd6, 0xd2, 0x12, 0x13, 0xd3, 0x11, 0xd1, 0xd0, 0x10,
    0xf0, 0x30, 0x31, 0xf1, 0x33, 0xf3, 0xf2, 0x32, 0x36, 0xf6, 0xf7, 0x37, 0xf5, 0x35, 0x34, 0xf4,
    0x3c, 0xfc, 0xfd, 0x3d, 0xff, 0x3f, 0x3e, 0xfe, 0xfa, 0x3a, 0x3b, 0xfb, 0x39, 0xf9, 0xf8, 0x38,
    0x28, 0xe8, 0xe9, 0x29, 0xeb, 0x2b, 0x2a, 0xea, 0xee, 0x2e, 0x2f, 0xef, 0x2d, 0xed, 0xec, 0x2c,
    0xe4, 0x24, 0x25, 0xe5, 0x27, 0xe7, 0xe6, 0x26, 0x22, 0xe2, 0xe3, 0x23, 0xe1, 0x21, 0x20, 0xe0,
    0xa0, 0x60, 0x61, 0xa1, 0x63, 0xa3, 0xa2, 0x62, 0x66, 0xa6, 0xa7, 0x67, 0xa5, 0x65, 0x64, 0xa4,
    0x6c, 0xac, 0xad, 0x6d, 0xaf, 0x6f, 0x6e, 0xae, 0xaa, 0x6a, 0x6b, 0xab, 0x69, 0xa9, 0xa8, 0x68,
    0x78, 0xb8, 0xb9, 0x79, 0xbb, 0x7b, 0x7a, 0xba, 0xbe, 0x7e, 0x7f, 0xbf, 0x7d, 0xbd, 0xbc, 0x7c,
    0xb4, 0x74, 0x75, 0xb5, 0x77, 0xb7, 0xb6, 0x76, 0x72, 0xb2, 0xb3, 0x73, 0xb1, 0x71, 0x70, 0xb0,
    0x50, 0x90, 0x91, 0x51, 0x93, 0x53, 0x52, 0x92, 0x96, 0x56, 0x57, 0x97, 0x55, 0x95, 0x94, 0x54,
    0x9c, 0x5c, 0x5d, 0x9d, 0x5f, 0x9f, 0x9e, 0x5e, 0x5a, 0x9a, 0x9b, 0x5b, 0x99, 0x59, 0x58, 0x98,
    0x88, 0x48, 0x49, 0x89, 0x4b, 0x8b, 0x8a, 0x4a, 0x4e, 0x8e, 0x8f, 0x4f, 0x8d, 0x4d, 0x4c, 0x8c,
    0x44, 0x84, 0x85, 0x45, 0x87, 0x47, 0x46, 0x86, 0x82, 0x42, 0x43, 0x83, 0x41, 0x81, 0x80, 0x40,
];

/// Advanced BMS CRC lookup table, high byte.
pub const ADV_CRC_TABLE_HIGH: [u8; 256] = [
    0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41, 0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40,
    0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40, 0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41,
    0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40, 0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41,
    0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41, 0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40,
    0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40, 0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41,
    0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41, 0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40,
    0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41, 0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40,
    0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40, 0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41,
    0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40, 0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41,
    0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41, 0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40,
    0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41, 0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40,
    0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40, 0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41,
    0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41, 0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40,
    0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40, 0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41,
    0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40, 0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41,
    0x00, 0xc1, 0x81, 0x40, 0x01, 0xc0, 0x80, 0x41, 0x01, 0xc0, 0x80, 0x41, 0x00, 0xc1, 0x81, 0x40,
];

/// Advanced BMS message identifier codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageId {
    Acknowledgement = 0x01,
    DeviceStatus = 0x0A,
    NodeStatus = 0x0B,
    NetworkConfigChange = 0x0C,
    ZoneText = 0x0D,
    AnalogueValue = 0x0E,
    OutputActivated = 0x0F,
    RequestNodeStatus = 0x2A,
}

impl MessageId {
    /// All known identifier codes, in census order.
    pub const ALL: [MessageId; 8] = [
        MessageId::Acknowledgement,
        MessageId::DeviceStatus,
        MessageId::NodeStatus,
        MessageId::NetworkConfigChange,
        MessageId::ZoneText,
        MessageId::AnalogueValue,
        MessageId::OutputActivated,
        MessageId::RequestNodeStatus,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|id| *id as u8 == code)
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Position of this id in [`MessageId::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::Acknowledgement => 0,
            Self::DeviceStatus => 1,
            Self::NodeStatus => 2,
            Self::NetworkConfigChange => 3,
            Self::ZoneText => 4,
            Self::AnalogueValue => 5,
            Self::OutputActivated => 6,
            Self::RequestNodeStatus => 7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Acknowledgement => "Acknowledgement",
            Self::DeviceStatus => "Device Status",
            Self::NodeStatus => "Node Status",
            Self::NetworkConfigChange => "Network Configuration Change",
            Self::ZoneText => "Zone Text",
            Self::AnalogueValue => "Analogue Value",
            Self::OutputActivated => "Output Activated / Deactivated by BMS",
            Self::RequestNodeStatus => "Request Node Status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_lookup() {
        assert_eq!(MessageId::from_code(0x0A), Some(MessageId::DeviceStatus));
        assert_eq!(MessageId::from_code(0x2A), Some(MessageId::RequestNodeStatus));
        assert_eq!(MessageId::from_code(0xF0), None);
        assert_eq!(MessageId::from_code(0x02), None);
    }

    #[test]
    fn test_message_id_index_matches_census_order() {
        for (position, id) in MessageId::ALL.iter().enumerate() {
            assert_eq!(id.index(), position);
        }
    }

    #[test]
    fn test_gent_lengths() {
        assert_eq!(GENT_EVENT_BODY_LENGTH, 57);
        assert_eq!(GENT_ACK_NAK_LENGTH, 4);
    }
}
