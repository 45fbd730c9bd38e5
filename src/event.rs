// MIT License - Copyright (c) 2026 Peter Wright
// Validated frames and gateway counters

use chrono::Utc;
use serde::Serialize;

/// A frame that passed its decoder, ready for packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFrame {
    pub protocol_id: u8,
    pub payload: Vec<u8>,
    /// Seconds since the Unix epoch at the moment the frame completed
    pub captured_at: u32,
}

impl ValidatedFrame {
    /// Stamp a frame with the current time.
    pub fn new(protocol_id: u8, payload: Vec<u8>) -> Self {
        Self::at(protocol_id, payload, Utc::now().timestamp() as u32)
    }

    pub fn at(protocol_id: u8, payload: Vec<u8>, captured_at: u32) -> Self {
        Self {
            protocol_id,
            payload,
            captured_at,
        }
    }
}

/// Running counters for the engine, published in the status heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStats {
    /// Frames handed to the packager, whether or not the publish succeeded
    pub total_events: u64,
    /// Envelopes accepted by the transport
    pub events_published: u64,
    /// Frames dropped by a decoder
    pub frames_rejected: u64,
    /// Bytes thrown away with rejected frames
    pub discarded_bytes: u64,
    pub transport_failures: u64,
    /// Transfer id of the most recent envelope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transfer_id: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timestamp_is_current() {
        let before = Utc::now().timestamp() as u32;
        let frame = ValidatedFrame::new(5, vec![0xFE, 0xFF]);
        let after = Utc::now().timestamp() as u32;
        assert!(frame.captured_at >= before && frame.captured_at <= after);
        assert_eq!(frame.protocol_id, 5);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = GatewayStats {
            total_events: 3,
            events_published: 2,
            frames_rejected: 1,
            discarded_bytes: 13,
            transport_failures: 1,
            last_transfer_id: Some(3),
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalEvents"], 3);
        assert_eq!(json["discardedBytes"], 13);
        assert_eq!(json["lastTransferId"], 3);

        let empty = serde_json::to_value(GatewayStats::default()).unwrap();
        assert!(empty.get("lastTransferId").is_none());
    }
}
