// MIT License - Copyright (c) 2026 Peter Wright
// Protocol lifecycle and serial scan loop

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::config::GatewayConfig;
use crate::decoders::{DecodeOutcome, Decoder, FrameDecoder};
use crate::envelope::EventPackager;
use crate::error::{FrameError, GatewayError, Result};
use crate::event::{GatewayStats, ValidatedFrame};
use crate::protocol::{self, ProtocolDescriptor, ProtocolId};
use crate::transport::{ByteSource, Publisher};

/// The selected protocol and its live decoder.
#[derive(Debug)]
struct ActiveProtocol {
    descriptor: &'static ProtocolDescriptor,
    decoder: Decoder,
}

fn log_protocol(action: &str, descriptor: &ProtocolDescriptor) {
    info!(
        "{} protocol Id: {}, \"{}\" on {} interface",
        action,
        descriptor.id.as_u8(),
        descriptor.label,
        descriptor.interface.label()
    );
}

/// Owns the single active decoder and routes its frames to the packager.
///
/// At most one decoder exists at a time. Selecting a protocol always drops
/// the running decoder before the new one is built, even when the id does
/// not change.
#[derive(Debug)]
pub struct ProtocolManager {
    config: GatewayConfig,
    current_id: u8,
    active: Option<ActiveProtocol>,
    packager: EventPackager,
    stats: GatewayStats,
    last_byte_at: Option<Instant>,
}

impl ProtocolManager {
    /// Create a manager and start the configured protocol.
    ///
    /// An unknown protocol id is logged and leaves the manager with no
    /// active protocol.
    pub fn new(config: GatewayConfig) -> Self {
        let mut manager = Self {
            packager: EventPackager::new(config.event_topic.clone()),
            current_id: config.protocol_id,
            config,
            active: None,
            stats: GatewayStats::default(),
            last_byte_at: None,
        };
        if let Err(e) = manager.select_protocol(manager.config.protocol_id) {
            error!("{}", e);
        }
        manager
    }

    /// Stop the active protocol, if any, then start `id`.
    ///
    /// The current id is updated even when `id` has no handler or is not a
    /// known protocol. Unknown ids return an error after degrading to no
    /// protocol.
    pub fn select_protocol(&mut self, id: u8) -> Result<()> {
        if let Some(previous) = self.active.take() {
            log_protocol("Stopping", previous.descriptor);
        }
        self.current_id = id;
        self.last_byte_at = None;

        let Some(descriptor) = protocol::descriptor(id) else {
            info!("No protocol configured");
            return Err(GatewayError::UnknownProtocol(id));
        };
        if descriptor.id == ProtocolId::None {
            info!("No protocol configured");
            return Ok(());
        }

        match descriptor.decoder {
            Some(kind) => {
                log_protocol("Starting", descriptor);
                self.active = Some(ActiveProtocol {
                    descriptor,
                    decoder: kind.start(&self.config),
                });
            }
            None => {
                warn!(
                    "Protocol Id: {}, \"{}\" has no handler",
                    id, descriptor.label
                );
                info!("No protocol configured");
            }
        }
        Ok(())
    }

    /// Replace the engine configuration and restart the configured protocol.
    ///
    /// Transfer ids and statistics carry over.
    pub fn reconfigure(&mut self, config: GatewayConfig) -> Result<()> {
        self.packager.set_topic(config.event_topic.clone());
        self.config = config;
        self.select_protocol(self.config.protocol_id)
    }

    /// Id most recently requested, whether or not it started a decoder.
    pub fn current_id(&self) -> u8 {
        self.current_id
    }

    /// Registry entry of the running protocol, if one is active.
    pub fn active_descriptor(&self) -> Option<&'static ProtocolDescriptor> {
        self.active.as_ref().map(|a| a.descriptor)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn stats(&self) -> &GatewayStats {
        &self.stats
    }

    /// Drain every byte the source has ready right now.
    ///
    /// Bytes read while no protocol is active are dropped. Returns the
    /// number of bytes read.
    pub fn scan(&mut self, source: &mut dyn ByteSource, publisher: &mut dyn Publisher) -> usize {
        let mut count = 0;
        while let Some(byte) = source.next_byte() {
            count += 1;
            self.feed_byte(byte, publisher);
        }
        count
    }

    pub fn feed_byte(&mut self, byte: u8, publisher: &mut dyn Publisher) {
        self.feed_byte_at(byte, Instant::now(), publisher);
    }

    /// Feed one byte that arrived at `now`.
    pub fn feed_byte_at(&mut self, byte: u8, now: Instant, publisher: &mut dyn Publisher) {
        let timeout = self.config.frame_timeout_ms;
        let last = self.last_byte_at.replace(now);
        let Some(active) = self.active.as_mut() else {
            return;
        };

        if let (Some(timeout_ms), Some(last)) = (timeout, last) {
            let idle = now.saturating_duration_since(last);
            if idle > Duration::from_millis(timeout_ms) && !active.decoder.is_idle() {
                let reason = FrameError::Stalled {
                    idle_ms: idle.as_millis() as u64,
                };
                let abandoned = active.decoder.buffered();
                warn!(
                    "{}: {}, discarding {} bytes",
                    active.descriptor.label, reason, abandoned
                );
                active.decoder.reset();
                self.stats.frames_rejected += 1;
                self.stats.discarded_bytes += abandoned as u64;
            }
        }

        let outcome = active.decoder.on_byte(byte);
        let protocol_id = active.descriptor.id.as_u8();
        let label = active.descriptor.label;

        match outcome {
            DecodeOutcome::Pending => {}
            DecodeOutcome::Consumed => debug!("{}: frame consumed", label),
            DecodeOutcome::Complete(payload) => {
                self.forward(ValidatedFrame::new(protocol_id, payload), publisher);
            }
            DecodeOutcome::Rejected { reason, discarded } => {
                self.stats.frames_rejected += 1;
                if self.config.verbose && reason.is_validation_failure() {
                    warn!("{}: {}, forwarding anyway", label, reason);
                    self.forward(ValidatedFrame::new(protocol_id, discarded), publisher);
                } else {
                    warn!("{}: {}, discarding {} bytes", label, reason, discarded.len());
                    self.stats.discarded_bytes += discarded.len() as u64;
                }
            }
        }
    }

    fn forward(&mut self, frame: ValidatedFrame, publisher: &mut dyn Publisher) {
        match self.packager.forward(&frame, publisher) {
            Ok(envelope) => {
                self.stats.events_published += 1;
                self.stats.last_transfer_id = Some(envelope.transfer_id);
            }
            Err(e) => {
                if e.is_transport() {
                    self.stats.transport_failures += 1;
                }
                error!("Event dropped: {}", e);
            }
        }
        self.stats.total_events = self.packager.total_events();
    }
}
