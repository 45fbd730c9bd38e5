// MIT License - Copyright (c) 2026 Peter Wright
// Transfer envelope encoding
//
// Wire layout, all multi-byte fields little endian:
//
//   0x83, length(3), transfer id(4), timestamp(4), fraction(4),
//     event type, length(3), timestamp(4), fraction(4), payload
//
// Each length counts the bytes that follow it, so the outer length is
// payload + 24 and the whole envelope is payload + 28 bytes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info};

use crate::constants::{
    EVENT_HEADER_TAIL, MAX_EVENT_PAYLOAD, TRANSFER_COMMAND_EVENT, TRANSFER_HEADER_TAIL,
    TYPE_AND_LENGTH,
};
use crate::error::{GatewayError, Result};
use crate::event::ValidatedFrame;
use crate::transport::Publisher;

/// Total envelope size for a payload of `payload_len` bytes.
pub const fn envelope_len(payload_len: usize) -> usize {
    payload_len + EVENT_HEADER_TAIL + TRANSFER_HEADER_TAIL + 2 * TYPE_AND_LENGTH
}

/// One event wrapped for transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEnvelope {
    pub transfer_id: u8,
    /// Protocol id the payload was decoded with
    pub event_type: u8,
    pub timestamp: u32,
    pub payload: Vec<u8>,
}

fn put_length(out: &mut Vec<u8>, len: usize) {
    let bytes = (len as u32).to_le_bytes();
    out.extend_from_slice(&bytes[..3]);
}

fn read_length(bytes: &[u8]) -> usize {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]) as usize
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

impl TransferEnvelope {
    pub fn new(transfer_id: u8, frame: &ValidatedFrame) -> Result<Self> {
        if frame.payload.len() > MAX_EVENT_PAYLOAD {
            return Err(GatewayError::PayloadTooLarge {
                len: frame.payload.len(),
                max: MAX_EVENT_PAYLOAD,
            });
        }
        Ok(Self {
            transfer_id,
            event_type: frame.protocol_id,
            timestamp: frame.captured_at,
            payload: frame.payload.clone(),
        })
    }

    /// Length of the inner event record after its length field.
    pub fn event_length(&self) -> usize {
        self.payload.len() + EVENT_HEADER_TAIL
    }

    /// Length of the outer record after its length field.
    pub fn transfer_length(&self) -> usize {
        self.event_length() + TYPE_AND_LENGTH + TRANSFER_HEADER_TAIL
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(envelope_len(self.payload.len()));
        out.push(TRANSFER_COMMAND_EVENT);
        put_length(&mut out, self.transfer_length());
        out.extend_from_slice(&(self.transfer_id as u32).to_le_bytes());
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());

        out.push(self.event_type);
        put_length(&mut out, self.event_length());
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Base64 text form, as published.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Parse the binary form, checking both length fields.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = TYPE_AND_LENGTH + TRANSFER_HEADER_TAIL + TYPE_AND_LENGTH + EVENT_HEADER_TAIL;
        if bytes.len() < header {
            return Err(GatewayError::MalformedEnvelope(format!(
                "{} bytes is shorter than the {} byte header",
                bytes.len(),
                header
            )));
        }
        if bytes[0] != TRANSFER_COMMAND_EVENT {
            return Err(GatewayError::MalformedEnvelope(format!(
                "unexpected command type 0x{:02x}",
                bytes[0]
            )));
        }
        let transfer_length = read_length(&bytes[1..4]);
        if transfer_length + TYPE_AND_LENGTH != bytes.len() {
            return Err(GatewayError::MalformedEnvelope(format!(
                "transfer length {} does not match {} bytes",
                transfer_length,
                bytes.len()
            )));
        }
        let transfer_id = read_u32(&bytes[4..8]);

        let inner = &bytes[TYPE_AND_LENGTH + TRANSFER_HEADER_TAIL..];
        let event_length = read_length(&inner[1..4]);
        if event_length + TYPE_AND_LENGTH != inner.len() {
            return Err(GatewayError::MalformedEnvelope(format!(
                "event length {} does not match {} bytes",
                event_length,
                inner.len()
            )));
        }
        Ok(Self {
            transfer_id: transfer_id as u8,
            event_type: inner[0],
            timestamp: read_u32(&inner[4..8]),
            payload: inner[TYPE_AND_LENGTH + EVENT_HEADER_TAIL..].to_vec(),
        })
    }

    /// Parse the Base64 text form.
    pub fn decode(text: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| GatewayError::MalformedEnvelope(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

/// Wraps validated frames and hands them to the transport.
#[derive(Debug)]
pub struct EventPackager {
    topic: String,
    next_transfer_id: u8,
    total_events: u64,
}

impl EventPackager {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            next_transfer_id: 1,
            total_events: 0,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }

    /// Id the next envelope will carry.
    pub fn next_transfer_id(&self) -> u8 {
        self.next_transfer_id
    }

    pub fn total_events(&self) -> u64 {
        self.total_events
    }

    /// Build the envelope for `frame`, consuming a transfer id.
    pub fn package(&mut self, frame: &ValidatedFrame) -> Result<TransferEnvelope> {
        let envelope = TransferEnvelope::new(self.next_transfer_id, frame)?;
        self.next_transfer_id = self.next_transfer_id.wrapping_add(1);
        Ok(envelope)
    }

    /// Package `frame` and publish it. Returns the envelope that was sent.
    ///
    /// The transfer id is consumed even if the publish fails; the event is
    /// not retried.
    pub fn forward(
        &mut self,
        frame: &ValidatedFrame,
        publisher: &mut dyn Publisher,
    ) -> Result<TransferEnvelope> {
        self.total_events += 1;
        info!(
            "Forwarding {} bytes (Event {})",
            frame.payload.len(),
            self.total_events
        );
        let envelope = self.package(frame)?;
        let text = envelope.encode();
        debug!(
            "Transfer {}: {} envelope bytes, {} encoded",
            envelope.transfer_id,
            envelope_len(envelope.payload.len()),
            text.len()
        );
        publisher.publish(&self.topic, &text)?;
        Ok(envelope)
    }
}
