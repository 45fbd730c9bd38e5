// MIT License - Copyright (c) 2026 Peter Wright
// Advanced MXPro BMS interface decoder
//
// Frames are `SOM, 0x80, dest, source, sequence, messages..., 0xF0,
// CRC hi, CRC lo, EOM`. Any byte of 0xFA or above inside the frame is sent
// as a clash code pair and restored here before validation.

use tracing::debug;

use super::{DecodeOutcome, FrameDecoder};
use crate::config::AdvancedFilter;
use crate::constants::{
    ADV_CLASH, ADV_EOM, ADV_FIRST_MESSAGE_OFFSET, ADV_MAX_LENGTH, ADV_MIN_LENGTH,
    ADV_NO_MORE_MESSAGES, ADV_PACKET_ID, ADV_SOM, MessageId,
};
use crate::crc::{check_crc, restore_clash_code};
use crate::error::FrameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Collecting,
    EscapePending,
}

/// Occurrence counts of each known message id in one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageCensus {
    counts: [u16; MessageId::ALL.len()],
}

impl MessageCensus {
    pub fn record(&mut self, id: MessageId) {
        let slot = id.index();
        self.counts[slot] = self.counts[slot].saturating_add(1);
    }

    pub fn count(&self, id: MessageId) -> u16 {
        self.counts[id.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&c| c as u32).sum()
    }

    pub fn clear(&mut self) {
        self.counts = Default::default();
    }

    /// Non-zero entries, in census order.
    pub fn present(&self) -> impl Iterator<Item = (MessageId, u16)> + '_ {
        MessageId::ALL
            .iter()
            .zip(self.counts.iter())
            .filter(|(_, count)| **count > 0)
            .map(|(id, count)| (*id, *count))
    }

    /// Whether a frame with this census passes the forwarding filter.
    pub fn is_of_interest(&self, filter: AdvancedFilter) -> bool {
        match filter {
            AdvancedFilter::AnyMessage => {
                self.total() > self.count(MessageId::Acknowledgement) as u32
            }
            AdvancedFilter::DeviceStatusOnly => self.count(MessageId::DeviceStatus) > 0,
        }
    }
}

/// Validate a complete, unescaped frame and fill in its message census.
///
/// Checks run in order and stop at the first failure: length, CRC, packet
/// identity, then the message list format.
pub fn validate_frame(frame: &[u8], census: &mut MessageCensus) -> Result<(), FrameError> {
    if frame.len() < ADV_MIN_LENGTH {
        return Err(FrameError::TooShort {
            len: frame.len(),
            min: ADV_MIN_LENGTH,
        });
    }
    check_crc(frame).map_err(|(expected, found)| FrameError::CrcMismatch { expected, found })?;
    if frame[1] != ADV_PACKET_ID {
        return Err(FrameError::BadPacketIdentity(frame[1]));
    }
    check_format(frame, census)
}

/// Walk the message list from the first message id to the terminator.
///
/// Each message is `id, length, ...` where the length counts itself and the
/// data that follows it.
fn check_format(frame: &[u8], census: &mut MessageCensus) -> Result<(), FrameError> {
    census.clear();
    let max_offset = frame.len() - 4;
    let mut offset = ADV_FIRST_MESSAGE_OFFSET;
    let mut code = frame[offset];
    offset += 1;

    while code != ADV_NO_MORE_MESSAGES {
        let Some(id) = MessageId::from_code(code) else {
            debug!("Unknown message id 0x{:02x} at offset {}", code, offset - 1);
            return Err(FrameError::InvalidFormat);
        };
        census.record(id);

        let sub_length = frame[offset] as usize;
        if sub_length == 0 {
            return Err(FrameError::InvalidFormat);
        }
        offset += sub_length - 1;
        if offset > max_offset {
            return Err(FrameError::InvalidFormat);
        }
        code = frame[offset];
        offset += 1;
    }
    Ok(())
}

/// Advanced BMS frame decoder.
#[derive(Debug)]
pub struct AdvancedDecoder {
    state: State,
    buffer: Vec<u8>,
    census: MessageCensus,
    filter: AdvancedFilter,
    verbose: bool,
}

impl AdvancedDecoder {
    pub fn new(filter: AdvancedFilter, verbose: bool) -> Self {
        Self {
            state: State::Idle,
            buffer: Vec::with_capacity(ADV_MAX_LENGTH),
            census: MessageCensus::default(),
            filter,
            verbose,
        }
    }

    /// Census of the last validated frame.
    pub fn census(&self) -> &MessageCensus {
        &self.census
    }

    fn reject(&mut self, reason: FrameError, byte: u8) -> DecodeOutcome {
        let mut discarded = std::mem::take(&mut self.buffer);
        discarded.push(byte);
        debug!("Advanced: {}, discarding {} bytes", reason, discarded.len());
        self.state = State::Idle;
        DecodeOutcome::Rejected { reason, discarded }
    }

    fn finish(&mut self) -> DecodeOutcome {
        let frame = std::mem::take(&mut self.buffer);
        self.state = State::Idle;

        match validate_frame(&frame, &mut self.census) {
            Ok(()) => {
                for (id, count) in self.census.present() {
                    debug!("Advanced: {} x{}", id.label(), count);
                }
                if self.verbose || self.census.is_of_interest(self.filter) {
                    DecodeOutcome::Complete(frame)
                } else {
                    debug!("Advanced: frame of {} bytes not of interest", frame.len());
                    DecodeOutcome::Consumed
                }
            }
            Err(reason) => {
                debug!("Advanced: {}, discarding {} bytes", reason, frame.len());
                DecodeOutcome::Rejected {
                    reason,
                    discarded: frame,
                }
            }
        }
    }
}

impl FrameDecoder for AdvancedDecoder {
    fn on_byte(&mut self, byte: u8) -> DecodeOutcome {
        if self.state == State::Idle {
            if byte == ADV_SOM {
                self.buffer.clear();
                self.buffer.push(byte);
                self.state = State::Collecting;
            }
            return DecodeOutcome::Pending;
        }

        if self.buffer.len() >= ADV_MAX_LENGTH {
            return self.reject(FrameError::TooLong { limit: ADV_MAX_LENGTH }, byte);
        }

        match self.state {
            State::EscapePending => match restore_clash_code(byte) {
                Some(restored) => {
                    self.buffer.push(restored);
                    self.state = State::Collecting;
                    DecodeOutcome::Pending
                }
                None => self.reject(FrameError::InvalidClashCode(byte), byte),
            },
            _ => match byte {
                ADV_EOM => {
                    self.buffer.push(byte);
                    self.finish()
                }
                ADV_CLASH => {
                    self.state = State::EscapePending;
                    DecodeOutcome::Pending
                }
                0xFB..=0xFE => self.reject(FrameError::UnexpectedClashCode(byte), byte),
                _ => {
                    self.buffer.push(byte);
                    DecodeOutcome::Pending
                }
            },
        }
    }

    fn reset(&mut self) {
        self.state = State::Idle;
        self.buffer.clear();
        self.census.clear();
    }

    fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::{add_clash_codes, build_packet, compute_crc, request_node_status};

    const NODE_STATUS: [u8; 13] = [
        0xFE, 0x80, 0x00, 0x00, 0x02, 0x0B, 0x04, 0x01, 0x02, 0xF0, 0x9E, 0xC1, 0xFF,
    ];
    const DEVICE_STATUS: [u8; 13] = [
        0xFE, 0x80, 0x00, 0x00, 0x04, 0x0A, 0x04, 0x01, 0x02, 0xF0, 0xA3, 0x67, 0xFF,
    ];
    // CRC high byte 0xFE goes out as a clash code pair
    const ACK_ON_WIRE: [u8; 13] = [
        0xFE, 0x80, 0x00, 0x00, 0x03, 0x01, 0x03, 0x05, 0xF0, 0xFA, 0x04, 0x83, 0xFF,
    ];

    fn feed(decoder: &mut AdvancedDecoder, bytes: &[u8]) -> Vec<DecodeOutcome> {
        bytes
            .iter()
            .map(|&b| decoder.on_byte(b))
            .filter(|o| *o != DecodeOutcome::Pending)
            .collect()
    }

    fn decoder() -> AdvancedDecoder {
        AdvancedDecoder::new(AdvancedFilter::AnyMessage, false)
    }

    #[test]
    fn test_request_node_status_completes() {
        let mut d = decoder();
        let frame = request_node_status();
        let outcomes = feed(&mut d, &frame);
        assert_eq!(outcomes, vec![DecodeOutcome::Complete(frame.to_vec())]);
        assert_eq!(d.census().count(MessageId::RequestNodeStatus), 1);
        assert!(d.is_idle());
    }

    #[test]
    fn test_noise_before_som_ignored() {
        let mut d = decoder();
        let mut stream = vec![0x00, 0x41, 0xFF, 0xF0, 0x80];
        stream.extend_from_slice(&NODE_STATUS);
        let outcomes = feed(&mut d, &stream);
        assert_eq!(outcomes, vec![DecodeOutcome::Complete(NODE_STATUS.to_vec())]);
    }

    #[test]
    fn test_clash_code_restored() {
        let mut d = AdvancedDecoder::new(AdvancedFilter::AnyMessage, true);
        let outcomes = feed(&mut d, &ACK_ON_WIRE);
        let expected = vec![
            0xFE, 0x80, 0x00, 0x00, 0x03, 0x01, 0x03, 0x05, 0xF0, 0xFE, 0x83, 0xFF,
        ];
        assert_eq!(outcomes, vec![DecodeOutcome::Complete(expected)]);
    }

    #[test]
    fn test_bare_ack_not_of_interest() {
        let mut d = decoder();
        assert_eq!(feed(&mut d, &ACK_ON_WIRE), vec![DecodeOutcome::Consumed]);
        assert_eq!(d.census().count(MessageId::Acknowledgement), 1);
    }

    #[test]
    fn test_device_status_filter() {
        let mut d = AdvancedDecoder::new(AdvancedFilter::DeviceStatusOnly, false);
        assert_eq!(feed(&mut d, &NODE_STATUS), vec![DecodeOutcome::Consumed]);
        assert_eq!(
            feed(&mut d, &DEVICE_STATUS),
            vec![DecodeOutcome::Complete(DEVICE_STATUS.to_vec())]
        );
    }

    #[test]
    fn test_built_packet_with_clash_bytes() {
        // Message data containing every reserved value
        let packet = build_packet(0x01, 0x02, 0xFB, &[0x0D, 0x07, 0xFA, 0xFB, 0xFC, 0xFD, 0xFF]);
        let mut d = decoder();
        let outcomes = feed(&mut d, &add_clash_codes(&packet));
        assert_eq!(outcomes, vec![DecodeOutcome::Complete(packet)]);
        assert_eq!(d.census().count(MessageId::ZoneText), 1);
    }

    #[test]
    fn test_unexpected_clash_code_rejected() {
        let mut d = decoder();
        let outcomes = feed(&mut d, &[0xFE, 0x80, 0x00, 0xFB]);
        assert_eq!(
            outcomes,
            vec![DecodeOutcome::Rejected {
                reason: FrameError::UnexpectedClashCode(0xFB),
                discarded: vec![0xFE, 0x80, 0x00, 0xFB],
            }]
        );
        assert!(d.is_idle());
        // Next frame decodes normally
        assert_eq!(
            feed(&mut d, &NODE_STATUS),
            vec![DecodeOutcome::Complete(NODE_STATUS.to_vec())]
        );
    }

    #[test]
    fn test_som_inside_frame_is_violation() {
        let mut d = decoder();
        let outcomes = feed(&mut d, &[0xFE, 0x80, 0xFE]);
        assert!(matches!(
            outcomes.as_slice(),
            [DecodeOutcome::Rejected {
                reason: FrameError::UnexpectedClashCode(0xFE),
                ..
            }]
        ));
    }

    #[test]
    fn test_invalid_clash_offset_rejected() {
        let mut d = decoder();
        let outcomes = feed(&mut d, &[0xFE, 0x80, 0xFA, 0x06]);
        assert!(matches!(
            outcomes.as_slice(),
            [DecodeOutcome::Rejected {
                reason: FrameError::InvalidClashCode(0x06),
                ..
            }]
        ));
        assert!(d.is_idle());
    }

    #[test]
    fn test_too_long_rejected() {
        let mut d = decoder();
        let mut stream = vec![0xFE];
        stream.extend(std::iter::repeat_n(0x11, ADV_MAX_LENGTH));
        let outcomes = feed(&mut d, &stream);
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            DecodeOutcome::Rejected { reason, discarded } => {
                assert_eq!(*reason, FrameError::TooLong { limit: ADV_MAX_LENGTH });
                assert_eq!(discarded.len(), ADV_MAX_LENGTH + 1);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(d.is_idle());
    }

    #[test]
    fn test_maximum_length_frame_accepted() {
        // 5 header bytes, 99 message bytes, terminator, CRC and EOM
        let mut messages = vec![0x0D, 99];
        messages.extend(std::iter::repeat_n(0x20, 97));
        let packet = build_packet(0, 0, 1, &messages);
        assert_eq!(packet.len(), ADV_MAX_LENGTH);
        let mut d = decoder();
        assert_eq!(
            feed(&mut d, &add_clash_codes(&packet)),
            vec![DecodeOutcome::Complete(packet)]
        );
    }

    #[test]
    fn test_too_short_rejected() {
        let mut d = decoder();
        let outcomes = feed(&mut d, &[0xFE, 0x80, 0xF0, 0x12, 0x34, 0xFF]);
        assert!(matches!(
            outcomes.as_slice(),
            [DecodeOutcome::Rejected {
                reason: FrameError::TooShort { len: 6, min: 12 },
                ..
            }]
        ));
    }

    #[test]
    fn test_crc_mismatch_rejected() {
        let mut frame = request_node_status();
        frame[7] = 0x02;
        let mut d = decoder();
        let outcomes = feed(&mut d, &frame);
        match outcomes.as_slice() {
            [DecodeOutcome::Rejected { reason, discarded }] => {
                assert!(matches!(reason, FrameError::CrcMismatch { found: 0x8C67, .. }));
                assert_eq!(discarded, &frame.to_vec());
            }
            other => panic!("unexpected outcomes {:?}", other),
        }
    }

    #[test]
    fn test_bad_packet_identity_rejected() {
        let mut frame = request_node_status().to_vec();
        frame[1] = 0x81;
        let len = frame.len();
        let (hi, lo) = compute_crc(&frame[1..len - 3]);
        frame[len - 3] = hi;
        frame[len - 2] = lo;
        let mut d = decoder();
        let outcomes = feed(&mut d, &add_clash_codes(&frame));
        assert!(matches!(
            outcomes.as_slice(),
            [DecodeOutcome::Rejected {
                reason: FrameError::BadPacketIdentity(0x81),
                ..
            }]
        ));
    }

    #[test]
    fn test_unknown_message_id_rejected() {
        let packet = build_packet(0, 0, 1, &[0x55, 0x03, 0x01]);
        let mut d = decoder();
        let outcomes = feed(&mut d, &add_clash_codes(&packet));
        assert!(matches!(
            outcomes.as_slice(),
            [DecodeOutcome::Rejected {
                reason: FrameError::InvalidFormat,
                ..
            }]
        ));
    }

    #[test]
    fn test_sub_length_overrun_rejected() {
        let packet = build_packet(0, 0, 1, &[0x0B, 0x09, 0x01]);
        let mut census = MessageCensus::default();
        assert_eq!(
            validate_frame(&packet, &mut census),
            Err(FrameError::InvalidFormat)
        );
    }

    #[test]
    fn test_multiple_messages_counted() {
        let packet = build_packet(0, 0, 1, &[0x01, 0x03, 0x05, 0x0A, 0x04, 0x01, 0x02, 0x0A, 0x02]);
        let mut census = MessageCensus::default();
        assert_eq!(validate_frame(&packet, &mut census), Ok(()));
        assert_eq!(census.count(MessageId::Acknowledgement), 1);
        assert_eq!(census.count(MessageId::DeviceStatus), 2);
        assert_eq!(census.total(), 3);
        assert!(census.is_of_interest(AdvancedFilter::DeviceStatusOnly));
    }

    #[test]
    fn test_census_slots_are_distinct() {
        for id in MessageId::ALL {
            let mut census = MessageCensus::default();
            census.record(id);
            assert_eq!(census.count(id), 1);
            assert_eq!(census.total(), 1);
            assert_eq!(census.present().collect::<Vec<_>>(), vec![(id, 1)]);
        }
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut d = decoder();
        feed(&mut d, &NODE_STATUS[..6]);
        assert!(!d.is_idle());
        d.reset();
        assert!(d.is_idle());
        assert_eq!(
            feed(&mut d, &NODE_STATUS[6..]),
            Vec::<DecodeOutcome>::new()
        );
    }
}
