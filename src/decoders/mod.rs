// MIT License - Copyright (c) 2026 Peter Wright
// Byte-at-a-time panel frame decoders

pub mod advanced;
pub mod advanced_ascii;
pub mod gent;
pub mod stub;

use crate::config::GatewayConfig;
use crate::error::FrameError;

pub use advanced::{AdvancedDecoder, MessageCensus};
pub use advanced_ascii::AdvancedAsciiDecoder;
pub use gent::GentDecoder;
pub use stub::StubDecoder;

/// Result of feeding one byte to a decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Still accumulating, or the byte was ignored between frames
    Pending,
    /// A validated frame ready for packaging
    Complete(Vec<u8>),
    /// A valid frame that is handled locally and not forwarded
    Consumed,
    /// The frame being accumulated was dropped. `discarded` holds the bytes
    /// thrown away, including the byte that triggered the rejection.
    Rejected {
        reason: FrameError,
        discarded: Vec<u8>,
    },
}

/// Common decoder contract.
///
/// A decoder sees each input byte exactly once, with no lookahead, and must
/// return immediately.
pub trait FrameDecoder {
    fn on_byte(&mut self, byte: u8) -> DecodeOutcome;

    /// Drop any partial frame and return to the initial state.
    fn reset(&mut self);

    /// Whether the decoder is between frames.
    fn is_idle(&self) -> bool;

    /// Bytes held for the frame in progress.
    fn buffered(&self) -> usize;
}

/// Which decoder a protocol uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderKind {
    AdvancedBms,
    AdvancedAscii,
    Gent,
    Stub,
}

impl DecoderKind {
    /// Construct a fresh decoder in its initial state.
    pub fn start(self, config: &GatewayConfig) -> Decoder {
        match self {
            Self::AdvancedBms => {
                Decoder::AdvancedBms(AdvancedDecoder::new(config.advanced_filter, config.verbose))
            }
            Self::AdvancedAscii => Decoder::AdvancedAscii(AdvancedAsciiDecoder::new()),
            Self::Gent => Decoder::Gent(GentDecoder::new()),
            Self::Stub => Decoder::Stub(StubDecoder),
        }
    }
}

/// The live decoder for the active protocol.
#[derive(Debug)]
pub enum Decoder {
    AdvancedBms(AdvancedDecoder),
    AdvancedAscii(AdvancedAsciiDecoder),
    Gent(GentDecoder),
    Stub(StubDecoder),
}

impl Decoder {
    pub fn kind(&self) -> DecoderKind {
        match self {
            Self::AdvancedBms(_) => DecoderKind::AdvancedBms,
            Self::AdvancedAscii(_) => DecoderKind::AdvancedAscii,
            Self::Gent(_) => DecoderKind::Gent,
            Self::Stub(_) => DecoderKind::Stub,
        }
    }
}

impl FrameDecoder for Decoder {
    fn on_byte(&mut self, byte: u8) -> DecodeOutcome {
        match self {
            Self::AdvancedBms(d) => d.on_byte(byte),
            Self::AdvancedAscii(d) => d.on_byte(byte),
            Self::Gent(d) => d.on_byte(byte),
            Self::Stub(d) => d.on_byte(byte),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::AdvancedBms(d) => d.reset(),
            Self::AdvancedAscii(d) => d.reset(),
            Self::Gent(d) => d.reset(),
            Self::Stub(d) => d.reset(),
        }
    }

    fn is_idle(&self) -> bool {
        match self {
            Self::AdvancedBms(d) => d.is_idle(),
            Self::AdvancedAscii(d) => d.is_idle(),
            Self::Gent(d) => d.is_idle(),
            Self::Stub(d) => d.is_idle(),
        }
    }

    fn buffered(&self) -> usize {
        match self {
            Self::AdvancedBms(d) => d.buffered(),
            Self::AdvancedAscii(d) => d.buffered(),
            Self::Gent(d) => d.buffered(),
            Self::Stub(d) => d.buffered(),
        }
    }
}
