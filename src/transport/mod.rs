// MIT License - Copyright (c) 2026 Peter Wright
// Engine input and output seams

pub mod mqtt;
pub mod serial;

use std::collections::VecDeque;

use crate::error::Result;

pub use mqtt::MqttPublisher;
pub use serial::{SerialSettings, SerialSource};

/// Source of panel bytes.
///
/// Must never block: `None` means nothing is pending right now.
pub trait ByteSource {
    fn next_byte(&mut self) -> Option<u8>;
}

/// In-memory source, used for captures and tests.
impl ByteSource for VecDeque<u8> {
    fn next_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

/// Outbound transport for encoded envelopes.
pub trait Publisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<()>;
}
