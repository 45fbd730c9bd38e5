// MIT License - Copyright (c) 2026 Peter Wright
// Advanced MXPro ASCII printer-port decoder

use tracing::debug;

use super::{DecodeOutcome, FrameDecoder};
use crate::constants::{ASCII_LINE_LENGTH, ASCII_MAX_LENGTH, ASCII_MAX_LINES, CR, LF};
use crate::error::FrameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingFirstLine,
    Collecting,
    Resynchronizing,
}

/// Line-oriented decoder for the Advanced ASCII event output.
///
/// An event is a run of non-blank lines followed by a blank line. The
/// forwarded payload is the raw text, including the terminating blank line.
/// After any violation the decoder drops input until the next blank line.
#[derive(Debug)]
pub struct AdvancedAsciiDecoder {
    state: State,
    buffer: Vec<u8>,
    /// Characters in the current line, including its terminator
    line_chars: usize,
    line_count: usize,
    previous: u8,
}

impl Default for AdvancedAsciiDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvancedAsciiDecoder {
    pub fn new() -> Self {
        Self {
            state: State::AwaitingFirstLine,
            buffer: Vec::with_capacity(ASCII_MAX_LENGTH),
            line_chars: 0,
            line_count: 0,
            previous: 0,
        }
    }

    /// True when the line just ended by `LF` is exactly `CR LF`.
    fn is_blank_line(&self) -> bool {
        self.line_chars == 2 && self.previous == CR
    }

    fn resynchronize(&mut self, reason: FrameError) -> DecodeOutcome {
        let discarded = std::mem::take(&mut self.buffer);
        debug!("ASCII: {}, discarding {} bytes", reason, discarded.len());
        self.line_chars = 0;
        self.line_count = 0;
        self.state = State::Resynchronizing;
        DecodeOutcome::Rejected { reason, discarded }
    }

    fn awaiting_first_line(&mut self, byte: u8) -> DecodeOutcome {
        self.line_chars += 1;
        self.buffer.push(byte);

        if byte == LF {
            if self.line_chars > 2 {
                self.line_count = 1;
                self.line_chars = 0;
                self.state = State::Collecting;
            } else {
                // Blank line between messages
                self.buffer.clear();
                self.line_chars = 0;
            }
            DecodeOutcome::Pending
        } else if self.line_chars > ASCII_LINE_LENGTH {
            let discarded = std::mem::take(&mut self.buffer);
            self.line_chars = 0;
            debug!("ASCII: line too long, discarding {} bytes", discarded.len());
            DecodeOutcome::Rejected {
                reason: FrameError::LineTooLong {
                    limit: ASCII_LINE_LENGTH,
                },
                discarded,
            }
        } else {
            DecodeOutcome::Pending
        }
    }

    fn collecting(&mut self, byte: u8) -> DecodeOutcome {
        self.line_chars += 1;
        self.buffer.push(byte);

        if byte == LF {
            if self.line_chars > 2 {
                self.line_count += 1;
                self.line_chars = 0;
                if self.line_count > ASCII_MAX_LINES {
                    return self.resynchronize(FrameError::TooManyLines {
                        limit: ASCII_MAX_LINES,
                    });
                }
                DecodeOutcome::Pending
            } else if self.is_blank_line() {
                let message = std::mem::take(&mut self.buffer);
                debug!("ASCII: message of {} lines", self.line_count);
                self.line_chars = 0;
                self.line_count = 0;
                self.state = State::AwaitingFirstLine;
                DecodeOutcome::Complete(message)
            } else {
                self.resynchronize(FrameError::MalformedLine)
            }
        } else if self.line_chars > ASCII_LINE_LENGTH {
            self.resynchronize(FrameError::LineTooLong {
                limit: ASCII_LINE_LENGTH,
            })
        } else if self.buffer.len() >= ASCII_MAX_LENGTH {
            self.resynchronize(FrameError::MessageTooLong {
                limit: ASCII_MAX_LENGTH,
            })
        } else {
            DecodeOutcome::Pending
        }
    }

    fn resynchronizing(&mut self, byte: u8) -> DecodeOutcome {
        self.line_chars += 1;
        if byte == LF {
            if self.is_blank_line() {
                debug!("ASCII: resynchronized");
                self.buffer.clear();
                self.state = State::AwaitingFirstLine;
            }
            self.line_chars = 0;
        }
        DecodeOutcome::Pending
    }
}

impl FrameDecoder for AdvancedAsciiDecoder {
    fn on_byte(&mut self, byte: u8) -> DecodeOutcome {
        let outcome = match self.state {
            State::AwaitingFirstLine => self.awaiting_first_line(byte),
            State::Collecting => self.collecting(byte),
            State::Resynchronizing => self.resynchronizing(byte),
        };
        self.previous = byte;
        outcome
    }

    fn reset(&mut self) {
        self.state = State::AwaitingFirstLine;
        self.buffer.clear();
        self.line_chars = 0;
        self.line_count = 0;
        self.previous = 0;
    }

    fn is_idle(&self) -> bool {
        self.state == State::AwaitingFirstLine && self.buffer.is_empty()
    }

    fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &[u8] = b"FIRE ALARM\r\nZone 12 Loop 1\r\nGround Floor Kitchen\r\n\r\n";

    fn feed(decoder: &mut AdvancedAsciiDecoder, bytes: &[u8]) -> Vec<DecodeOutcome> {
        bytes
            .iter()
            .map(|&b| decoder.on_byte(b))
            .filter(|o| *o != DecodeOutcome::Pending)
            .collect()
    }

    #[test]
    fn test_three_lines_and_blank_forwarded() {
        let mut d = AdvancedAsciiDecoder::new();
        let outcomes = feed(&mut d, MESSAGE);
        assert_eq!(outcomes, vec![DecodeOutcome::Complete(MESSAGE.to_vec())]);
        assert!(d.is_idle());
    }

    #[test]
    fn test_leading_blank_lines_skipped() {
        let mut d = AdvancedAsciiDecoder::new();
        let mut stream = b"\r\n\r\n\n".to_vec();
        stream.extend_from_slice(MESSAGE);
        let outcomes = feed(&mut d, &stream);
        assert_eq!(outcomes, vec![DecodeOutcome::Complete(MESSAGE.to_vec())]);
    }

    #[test]
    fn test_ninth_line_forces_resync() {
        let mut d = AdvancedAsciiDecoder::new();
        let mut stream = Vec::new();
        for line in 1..=9 {
            stream.extend_from_slice(format!("Line {}\r\n", line).as_bytes());
        }
        let outcomes = feed(&mut d, &stream);
        assert!(matches!(
            outcomes.as_slice(),
            [DecodeOutcome::Rejected {
                reason: FrameError::TooManyLines { limit: 8 },
                ..
            }]
        ));

        // Rest of the bad message is dropped up to its blank line
        let outcomes = feed(&mut d, b"Line 10\r\n\r\n");
        assert!(outcomes.is_empty());

        // Next message decodes normally
        let outcomes = feed(&mut d, MESSAGE);
        assert_eq!(outcomes, vec![DecodeOutcome::Complete(MESSAGE.to_vec())]);
    }

    #[test]
    fn test_eight_lines_accepted() {
        let mut d = AdvancedAsciiDecoder::new();
        let mut stream = Vec::new();
        for line in 1..=8 {
            stream.extend_from_slice(format!("Line {}\r\n", line).as_bytes());
        }
        stream.extend_from_slice(b"\r\n");
        let outcomes = feed(&mut d, &stream);
        assert_eq!(outcomes, vec![DecodeOutcome::Complete(stream)]);
    }

    #[test]
    fn test_long_line_in_message_resyncs() {
        let mut d = AdvancedAsciiDecoder::new();
        let mut stream = b"HEADER\r\n".to_vec();
        stream.extend(std::iter::repeat_n(b'X', ASCII_LINE_LENGTH + 1));
        let outcomes = feed(&mut d, &stream);
        assert!(matches!(
            outcomes.as_slice(),
            [DecodeOutcome::Rejected {
                reason: FrameError::LineTooLong { .. },
                ..
            }]
        ));
        let outcomes = feed(&mut d, b"XX\r\nmore\r\n\r\n");
        assert!(outcomes.is_empty());
        assert_eq!(feed(&mut d, MESSAGE), vec![DecodeOutcome::Complete(MESSAGE.to_vec())]);
    }

    #[test]
    fn test_long_first_line_discarded() {
        let mut d = AdvancedAsciiDecoder::new();
        let stream: Vec<u8> = std::iter::repeat_n(b'Y', ASCII_LINE_LENGTH + 1).collect();
        let outcomes = feed(&mut d, &stream);
        match outcomes.as_slice() {
            [DecodeOutcome::Rejected { reason, discarded }] => {
                assert_eq!(*reason, FrameError::LineTooLong { limit: ASCII_LINE_LENGTH });
                assert_eq!(discarded.len(), ASCII_LINE_LENGTH + 1);
            }
            other => panic!("unexpected outcomes {:?}", other),
        }
        assert!(d.is_idle());
    }

    #[test]
    fn test_bare_lf_is_malformed() {
        let mut d = AdvancedAsciiDecoder::new();
        let outcomes = feed(&mut d, b"ALARM\r\n\n");
        assert!(matches!(
            outcomes.as_slice(),
            [DecodeOutcome::Rejected {
                reason: FrameError::MalformedLine,
                ..
            }]
        ));
    }

    #[test]
    fn test_message_too_long() {
        let mut d = AdvancedAsciiDecoder::new();
        let mut stream = Vec::new();
        // 8 lines of 40 characters plus CR LF would reach 336 bytes
        for _ in 0..8 {
            stream.extend(std::iter::repeat_n(b'Z', 40));
            stream.extend_from_slice(b"\r\n");
        }
        let outcomes = feed(&mut d, &stream);
        match outcomes.as_slice() {
            [DecodeOutcome::Rejected { reason, discarded }] => {
                assert_eq!(*reason, FrameError::MessageTooLong { limit: ASCII_MAX_LENGTH });
                assert_eq!(discarded.len(), ASCII_MAX_LENGTH);
            }
            other => panic!("unexpected outcomes {:?}", other),
        }
    }

    #[test]
    fn test_reset_clears_partial_message() {
        let mut d = AdvancedAsciiDecoder::new();
        feed(&mut d, b"PARTIAL\r\nHALF");
        assert!(!d.is_idle());
        d.reset();
        assert!(d.is_idle());
        assert_eq!(feed(&mut d, MESSAGE), vec![DecodeOutcome::Complete(MESSAGE.to_vec())]);
    }
}
