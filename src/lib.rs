// MIT License - Copyright (c) 2026 Peter Wright
// Fire panel protocol engine
//
//! # fire-panel-bridge
//!
//! Protocol engine for legacy fire alarm panels connected over a serial
//! line (Advanced MXPro BMS and ASCII, Gent Vigilon and others).
//!
//! Bytes from the panel are fed one at a time into the decoder for the
//! configured protocol. Each validated frame is wrapped in a timestamped,
//! length-prefixed transfer envelope, Base64 encoded and handed to a
//! [`Publisher`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::collections::VecDeque;
//! use fire_panel_bridge::{GatewayConfig, ProtocolManager, Publisher, Result};
//!
//! struct Print;
//!
//! impl Publisher for Print {
//!     fn publish(&mut self, topic: &str, payload: &str) -> Result<()> {
//!         println!("{topic}: {payload}");
//!         Ok(())
//!     }
//! }
//!
//! let config = GatewayConfig::builder().protocol_id(5).build();
//! let mut manager = ProtocolManager::new(config);
//!
//! let mut input: VecDeque<u8> = fire_panel_bridge::crc::request_node_status().into_iter().collect();
//! manager.scan(&mut input, &mut Print);
//! ```

pub mod config;
pub mod constants;
pub mod crc;
pub mod decoders;
pub mod envelope;
pub mod error;
pub mod event;
pub mod manager;
pub mod protocol;
pub mod transport;

// Re-exports for convenience
pub use config::{AdvancedFilter, GatewayConfig, GatewayConfigBuilder};
pub use decoders::{DecodeOutcome, Decoder, DecoderKind, FrameDecoder};
pub use envelope::{EventPackager, TransferEnvelope};
pub use error::{FrameError, GatewayError, Result};
pub use event::{GatewayStats, ValidatedFrame};
pub use manager::ProtocolManager;
pub use protocol::{Framing, InterfaceKind, ProtocolDescriptor, ProtocolId};
pub use transport::{ByteSource, MqttPublisher, Publisher, SerialSettings, SerialSource};
