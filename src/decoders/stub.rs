// MIT License - Copyright (c) 2026 Peter Wright
// Placeholder decoder for panels without a framing implementation

use super::{DecodeOutcome, FrameDecoder};

/// Accepts and drops every byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubDecoder;

impl FrameDecoder for StubDecoder {
    fn on_byte(&mut self, _byte: u8) -> DecodeOutcome {
        DecodeOutcome::Pending
    }

    fn reset(&mut self) {}

    fn is_idle(&self) -> bool {
        true
    }

    fn buffered(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_never_completes() {
        let mut decoder = StubDecoder;
        for byte in 0u8..=255 {
            assert_eq!(decoder.on_byte(byte), DecodeOutcome::Pending);
        }
        assert!(decoder.is_idle());
        assert_eq!(decoder.buffered(), 0);
    }
}
