//! Example: Replay a hex capture of a panel serial line through a decoder.
//!
//! ```text
//! cargo run --example decode_capture -- 5 capture.hex
//! ```
//!
//! The capture is whitespace separated hex bytes; `#` starts a comment.

use std::collections::VecDeque;

use anyhow::{Context, bail};
use fire_panel_bridge::{GatewayConfig, ProtocolManager, Publisher, Result, TransferEnvelope};

struct PrintPublisher;

impl Publisher for PrintPublisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<()> {
        let envelope = TransferEnvelope::decode(payload)?;
        println!(
            "{} transfer {} type {} at {}: {:02x?}",
            topic, envelope.transfer_id, envelope.event_type, envelope.timestamp, envelope.payload
        );
        Ok(())
    }
}

fn parse_capture(text: &str) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for line in text.lines() {
        let data = line.split('#').next().unwrap_or_default();
        for token in data.split_whitespace() {
            let byte = u8::from_str_radix(token.trim_start_matches("0x"), 16)
                .with_context(|| format!("bad hex byte '{}'", token))?;
            bytes.push(byte);
        }
    }
    Ok(bytes)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        bail!("usage: {} <protocol id> <capture file>", args[0]);
    }
    let protocol_id: u8 = args[1].parse().context("protocol id must be 0-255")?;
    let text = std::fs::read_to_string(&args[2])
        .with_context(|| format!("Failed to read capture {}", args[2]))?;
    let mut input: VecDeque<u8> = parse_capture(&text)?.into();

    let config = GatewayConfig::builder()
        .protocol_id(protocol_id)
        .verbose(true)
        .build();
    let mut manager = ProtocolManager::new(config);

    let read = manager.scan(&mut input, &mut PrintPublisher);
    println!("\n{} bytes read", read);
    println!("{:#?}", manager.stats());
    Ok(())
}
