// MIT License - Copyright (c) 2026 Peter Wright
// Gateway configuration

use crate::constants::DEFAULT_EVENT_TOPIC;
use crate::error::{GatewayError, Result};

/// Which valid Advanced BMS frames are forwarded when not in verbose mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvancedFilter {
    /// Any frame carrying a message other than a bare acknowledgement
    #[default]
    AnyMessage,
    /// Only frames carrying a Device Status message
    DeviceStatusOnly,
}

impl AdvancedFilter {
    /// Parse a config value ("any" or "device_status").
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "any" | "any_message" => Some(Self::AnyMessage),
            "device_status" | "device_status_only" => Some(Self::DeviceStatusOnly),
            _ => None,
        }
    }
}

/// Configuration for the protocol engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Active protocol id (0 = none configured)
    pub protocol_id: u8,
    /// Forward every delimited frame, including those failing validation
    pub verbose: bool,
    /// Advanced BMS forwarding filter
    pub advanced_filter: AdvancedFilter,
    /// Reset a part-received frame after this long without a byte.
    /// Disabled when `None`.
    pub frame_timeout_ms: Option<u64>,
    /// Topic for encoded event envelopes
    pub event_topic: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            protocol_id: 0,
            verbose: false,
            advanced_filter: AdvancedFilter::AnyMessage,
            frame_timeout_ms: None,
            event_topic: DEFAULT_EVENT_TOPIC.to_string(),
        }
    }
}

impl GatewayConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.event_topic.is_empty() {
            return Err(GatewayError::InvalidConfig {
                details: "event topic is empty".to_string(),
            });
        }
        if self.event_topic.contains(['+', '#']) {
            return Err(GatewayError::InvalidConfig {
                details: format!("event topic {} contains a wildcard", self.event_topic),
            });
        }
        if self.frame_timeout_ms == Some(0) {
            return Err(GatewayError::InvalidConfig {
                details: "frame timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for GatewayConfig.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    pub fn protocol_id(mut self, id: u8) -> Self {
        self.config.protocol_id = id;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn advanced_filter(mut self, filter: AdvancedFilter) -> Self {
        self.config.advanced_filter = filter;
        self
    }

    pub fn frame_timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.config.frame_timeout_ms = ms;
        self
    }

    pub fn event_topic(mut self, topic: impl Into<String>) -> Self {
        self.config.event_topic = topic.into();
        self
    }

    pub fn build(self) -> GatewayConfig {
        self.config
    }
}
