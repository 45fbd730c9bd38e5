// MIT License - Copyright (c) 2026 Peter Wright
// Advanced BMS CRC and clash code handling

use crate::constants::{
    ADV_CLASH, ADV_CLASH_MAX_OFFSET, ADV_CRC_TABLE_HIGH, ADV_CRC_TABLE_LOW, ADV_EOM,
    ADV_NO_MORE_MESSAGES, ADV_PACKET_ID, ADV_SOM,
};
use tracing::debug;

/// Advanced BMS CRC-16.
///
/// Table driven, running high and low bytes separately, both seeded with
/// 0xFF. Returns `(crc_hi, crc_lo)`.
pub fn compute_crc(data: &[u8]) -> (u8, u8) {
    let mut crc_hi: u8 = 0xFF;
    let mut crc_lo: u8 = 0xFF;
    for &byte in data {
        let index = (crc_hi ^ byte) as usize;
        crc_hi = crc_lo ^ ADV_CRC_TABLE_HIGH[index];
        crc_lo = ADV_CRC_TABLE_LOW[index];
    }
    (crc_hi, crc_lo)
}

/// Compute the CRC as a single big-endian `u16`.
pub fn compute_crc_raw(data: &[u8]) -> u16 {
    let (hi, lo) = compute_crc(data);
    u16::from_be_bytes([hi, lo])
}

/// Check the CRC of an unescaped packet.
///
/// The CRC covers everything between the start-of-message byte and the two
/// CRC bytes that precede the end-of-message byte. Returns the computed and
/// received values on mismatch.
pub fn check_crc(packet: &[u8]) -> Result<(), (u16, u16)> {
    if packet.len() < 4 {
        return Err((0, 0));
    }
    let len = packet.len();
    let computed = compute_crc_raw(&packet[1..len - 3]);
    let received = u16::from_be_bytes([packet[len - 3], packet[len - 2]]);
    if computed == received {
        debug!("CRC Ok");
        Ok(())
    } else {
        debug!("CRC Not Ok (expected {:04x}, got {:04x})", computed, received);
        Err((computed, received))
    }
}

/// Convenience wrapper over [`check_crc`].
pub fn is_valid_crc(packet: &[u8]) -> bool {
    check_crc(packet).is_ok()
}

/// Apply clash code substitution to an outbound packet.
///
/// Any body byte of 0xFA or above is sent as `0xFA, byte - 0xFA`. The first
/// and last bytes (start and end of message) are copied unchanged.
pub fn add_clash_codes(packet: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(packet.len() + 8);
    let Some((&first, rest)) = packet.split_first() else {
        return out;
    };
    out.push(first);
    let Some((&last, body)) = rest.split_last() else {
        return out;
    };
    for &byte in body {
        if byte >= ADV_CLASH {
            out.push(ADV_CLASH);
            out.push(byte - ADV_CLASH);
        } else {
            out.push(byte);
        }
    }
    out.push(last);
    out
}

/// Restore the byte that followed a clash code, if the offset is legal.
pub fn restore_clash_code(offset: u8) -> Option<u8> {
    if offset <= ADV_CLASH_MAX_OFFSET {
        Some(ADV_CLASH + offset)
    } else {
        None
    }
}

/// Build a complete, unescaped Advanced BMS packet around a message list.
///
/// The message list must not include the 'no more messages' terminator; it
/// is appended here along with the CRC and end of message.
pub fn build_packet(destination: u8, source: u8, sequence: u8, messages: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(messages.len() + 9);
    packet.push(ADV_SOM);
    packet.push(ADV_PACKET_ID);
    packet.push(destination);
    packet.push(source);
    packet.push(sequence);
    packet.extend_from_slice(messages);
    packet.push(ADV_NO_MORE_MESSAGES);
    let (hi, lo) = compute_crc(&packet[1..]);
    packet.push(hi);
    packet.push(lo);
    packet.push(ADV_EOM);
    packet
}

/// The 'Request Node Status' poll, used to check the comms path to an
/// Advanced panel.
pub fn request_node_status() -> [u8; 12] {
    [
        0xFE, // Start of message
        0x80, // Packet identity
        0x00, // Destination address
        0x00, // Source address
        0x01, // Packet sequence number
        0x2A, // Request Node Status
        0x03, // Length
        0x01, // Network node
        0xF0, // No more messages
        0x8C, // CRC high
        0x67, // CRC low
        0xFF, // End of message
    ]
}
