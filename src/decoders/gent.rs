// MIT License - Copyright (c) 2026 Peter Wright
// Gent Vigilon Universal decoder

use tracing::debug;

use super::{DecodeOutcome, FrameDecoder};
use crate::constants::{
    GENT_ACK, GENT_ACK_NAK_LENGTH, GENT_EVENT_BODY_LENGTH, GENT_EVENT_LENGTH, GENT_MAX_EVENT_MSB,
    GENT_NAK,
};
use crate::error::FrameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    EventLsb,
    Collecting,
    ChecksumHi,
    ChecksumLo,
}

/// Whether `(msb, lsb)` is a known Gent event code pair.
pub fn is_valid_event_pair(msb: u8, lsb: u8) -> bool {
    match msb {
        0 => matches!(lsb, 1..=6 | GENT_NAK),
        2 => matches!(lsb, 1 | 2),
        4 | 5 | 7 | 9 | 10 | 18 => true,
        _ => false,
    }
}

/// ACK and NAK are the only four byte packets.
pub fn is_ack_or_nak(msb: u8, lsb: u8) -> bool {
    msb == 0 && (lsb == GENT_ACK || lsb == GENT_NAK)
}

/// Gent frame decoder.
///
/// Every packet opens with a two byte event code and closes with the 16-bit
/// sum of all preceding bytes, high byte first. ACK/NAK packets are four
/// bytes, everything else is 59.
#[derive(Debug)]
pub struct GentDecoder {
    state: State,
    buffer: Vec<u8>,
    sum: u16,
    expected_len: usize,
}

impl Default for GentDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl GentDecoder {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            buffer: Vec::with_capacity(GENT_EVENT_LENGTH),
            sum: 0,
            expected_len: GENT_EVENT_LENGTH,
        }
    }

    fn accumulate(&mut self, byte: u8) {
        self.buffer.push(byte);
        self.sum = self.sum.wrapping_add(byte as u16);
    }

    fn reject(&mut self, reason: FrameError) -> DecodeOutcome {
        let discarded = std::mem::take(&mut self.buffer);
        debug!("Gent: {}, discarding {} bytes", reason, discarded.len());
        self.state = State::Idle;
        self.sum = 0;
        DecodeOutcome::Rejected { reason, discarded }
    }

    fn finish(&mut self) -> DecodeOutcome {
        let frame = std::mem::take(&mut self.buffer);
        self.state = State::Idle;
        self.sum = 0;
        if frame.len() == GENT_EVENT_LENGTH {
            DecodeOutcome::Complete(frame)
        } else {
            debug!("Gent: {} received", if frame[1] == GENT_ACK { "ACK" } else { "NAK" });
            DecodeOutcome::Consumed
        }
    }
}

impl FrameDecoder for GentDecoder {
    fn on_byte(&mut self, byte: u8) -> DecodeOutcome {
        match self.state {
            State::Idle => {
                if byte <= GENT_MAX_EVENT_MSB {
                    self.buffer.clear();
                    self.sum = 0;
                    self.accumulate(byte);
                    self.state = State::EventLsb;
                }
                DecodeOutcome::Pending
            }
            State::EventLsb => {
                let msb = self.buffer[0];
                self.accumulate(byte);
                if !is_valid_event_pair(msb, byte) {
                    return self.reject(FrameError::InvalidEventPair { msb, lsb: byte });
                }
                if is_ack_or_nak(msb, byte) {
                    self.expected_len = GENT_ACK_NAK_LENGTH;
                    self.state = State::ChecksumHi;
                } else {
                    self.expected_len = GENT_EVENT_LENGTH;
                    self.state = State::Collecting;
                }
                DecodeOutcome::Pending
            }
            State::Collecting => {
                self.accumulate(byte);
                if self.buffer.len() >= GENT_EVENT_BODY_LENGTH {
                    self.state = State::ChecksumHi;
                }
                DecodeOutcome::Pending
            }
            State::ChecksumHi => {
                self.buffer.push(byte);
                if byte != (self.sum >> 8) as u8 {
                    let expected = self.sum;
                    return self.reject(FrameError::ChecksumMismatch { expected });
                }
                self.state = State::ChecksumLo;
                DecodeOutcome::Pending
            }
            State::ChecksumLo => {
                self.buffer.push(byte);
                if byte != (self.sum & 0xFF) as u8 {
                    let expected = self.sum;
                    return self.reject(FrameError::ChecksumMismatch { expected });
                }
                debug_assert_eq!(self.buffer.len(), self.expected_len);
                self.finish()
            }
        }
    }

    fn reset(&mut self) {
        self.state = State::Idle;
        self.buffer.clear();
        self.sum = 0;
        self.expected_len = GENT_EVENT_LENGTH;
    }

    fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
