//! Example: Pretty-print Base64 transfer envelopes, one per line on stdin.
//!
//! ```text
//! mosquitto_sub -t nimbus/dev/event | cargo run --example envelope_dump
//! ```

use std::io::BufRead;

use chrono::DateTime;
use fire_panel_bridge::{ProtocolId, TransferEnvelope};

fn main() -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        match TransferEnvelope::decode(text) {
            Ok(envelope) => {
                let protocol = ProtocolId::from_u8(envelope.event_type)
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let when = DateTime::from_timestamp(envelope.timestamp as i64, 0)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default();
                println!(
                    "#{:<3} {} [{}] {} bytes",
                    envelope.transfer_id,
                    when,
                    protocol,
                    envelope.payload.len()
                );
                for chunk in envelope.payload.chunks(16) {
                    let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
                    let ascii: String = chunk
                        .iter()
                        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                        .collect();
                    println!("    {:<47}  {}", hex.join(" "), ascii);
                }
            }
            Err(e) => eprintln!("Skipping line: {}", e),
        }
    }
    Ok(())
}
