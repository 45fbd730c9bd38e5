// MIT License - Copyright (c) 2026 Peter Wright
// Panel serial line

use std::io::Read;
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, error, info};

use super::ByteSource;
use crate::error::{GatewayError, Result};
use crate::protocol::{Framing, ProtocolDescriptor};

/// Serial line parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud: u32,
    pub framing: Framing,
}

impl SerialSettings {
    /// Settings for a protocol, using the panel defaults unless overridden.
    pub fn for_protocol(
        port: impl Into<String>,
        descriptor: &ProtocolDescriptor,
        baud: Option<u32>,
        framing: Option<Framing>,
    ) -> Self {
        Self {
            port: port.into(),
            baud: baud.unwrap_or(descriptor.default_baud),
            framing: framing.unwrap_or(descriptor.default_framing),
        }
    }

    fn parity(&self) -> serialport::Parity {
        match self.framing {
            Framing::EightNoneOne => serialport::Parity::None,
            Framing::EightEvenOne => serialport::Parity::Even,
        }
    }
}

/// Non-blocking byte source over a serial port.
///
/// Only reads when the driver reports data waiting, and then a single byte
/// at a time. A read error marks the source failed; the owner re-opens it.
pub struct SerialSource {
    settings: SerialSettings,
    port: Box<dyn SerialPort>,
    failed: bool,
}

impl std::fmt::Debug for SerialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSource")
            .field("settings", &self.settings)
            .field("failed", &self.failed)
            .finish()
    }
}

impl SerialSource {
    pub fn open(settings: SerialSettings) -> Result<Self> {
        info!(
            "Opening {} at {} baud, framing {}",
            settings.port,
            settings.baud,
            settings.framing.label()
        );
        let port = serialport::new(&settings.port, settings.baud)
            .timeout(Duration::from_millis(10))
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(settings.parity())
            .open()
            .map_err(|e| {
                GatewayError::Serial(format!("Failed to open serial port {}: {}", settings.port, e))
            })?;

        // Drop anything buffered before we started listening
        if let Err(e) = port.clear(serialport::ClearBuffer::Input) {
            debug!("Could not clear serial input buffer: {}", e);
        }

        Ok(Self {
            settings,
            port,
            failed: false,
        })
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    /// Whether a read error has occurred since the port was opened.
    pub fn is_failed(&self) -> bool {
        self.failed
    }
}

impl ByteSource for SerialSource {
    fn next_byte(&mut self) -> Option<u8> {
        if self.failed {
            return None;
        }
        match self.port.bytes_to_read() {
            Ok(0) => None,
            Ok(_) => {
                let mut byte = [0u8; 1];
                match self.port.read(&mut byte) {
                    Ok(1) => Some(byte[0]),
                    Ok(_) => None,
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => None,
                    Err(e) => {
                        error!("Serial read error on {}: {}", self.settings.port, e);
                        self.failed = true;
                        None
                    }
                }
            }
            Err(e) => {
                error!("Serial status error on {}: {}", self.settings.port, e);
                self.failed = true;
                None
            }
        }
    }
}
