// MIT License - Copyright (c) 2026 Peter Wright
// Panel protocol registry

use std::fmt;

use crate::decoders::DecoderKind;

/// Supported panel protocols.
///
/// The numeric value is the configuration id and is also the event type tag
/// carried in every transfer envelope, so it must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProtocolId {
    None = 0,
    Gent = 1,
    Kentec = 2,
    SiemensAscii = 3,
    MinervaAscii = 4,
    Advanced = 5,
    Notifier = 6,
    GentAscii = 7,
    Ziton = 8,
    Reserved = 9,
    AdvancedAscii = 10,
}

/// Number of entries in the registry.
pub const PROTOCOL_COUNT: usize = 11;

impl ProtocolId {
    /// Look up a configuration id. Returns `None` for ids outside the
    /// enumeration.
    pub fn from_u8(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::None),
            1 => Some(Self::Gent),
            2 => Some(Self::Kentec),
            3 => Some(Self::SiemensAscii),
            4 => Some(Self::MinervaAscii),
            5 => Some(Self::Advanced),
            6 => Some(Self::Notifier),
            7 => Some(Self::GentAscii),
            8 => Some(Self::Ziton),
            9 => Some(Self::Reserved),
            10 => Some(Self::AdvancedAscii),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Registry entry for this protocol.
    pub fn descriptor(self) -> &'static ProtocolDescriptor {
        &REGISTRY[self as usize]
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor().label)
    }
}

/// Physical interface a protocol runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    None,
    Serial,
    Usb,
    Ethernet,
}

impl InterfaceKind {
    /// Label used in log and status messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Serial => "serial",
            Self::Usb => "USB",
            Self::Ethernet => "Ethernet",
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Character framing on the serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// 8 data bits, no parity, 1 stop bit
    EightNoneOne,
    /// 8 data bits, even parity, 1 stop bit
    EightEvenOne,
}

impl Framing {
    /// Parse the usual short form ("8N1", "8E1"), case insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "8N1" => Some(Self::EightNoneOne),
            "8E1" => Some(Self::EightEvenOne),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::EightNoneOne => "8N1",
            Self::EightEvenOne => "8E1",
        }
    }
}

/// Immutable description of one panel protocol.
#[derive(Debug)]
pub struct ProtocolDescriptor {
    pub id: ProtocolId,
    pub label: &'static str,
    pub interface: InterfaceKind,
    /// Decoder started for this protocol. `None` means bytes are discarded.
    pub decoder: Option<DecoderKind>,
    /// Panel default serial settings
    pub default_baud: u32,
    pub default_framing: Framing,
}

impl ProtocolDescriptor {
    /// Whether selecting this protocol starts a decoder.
    pub fn has_handler(&self) -> bool {
        self.decoder.is_some()
    }
}

/// The protocol registry, indexed by protocol id.
pub static REGISTRY: [ProtocolDescriptor; PROTOCOL_COUNT] = [
    ProtocolDescriptor {
        id: ProtocolId::None,
        label: "None configured",
        interface: InterfaceKind::None,
        decoder: None,
        default_baud: 19200,
        default_framing: Framing::EightNoneOne,
    },
    ProtocolDescriptor {
        id: ProtocolId::Gent,
        label: "Gent Vigilon Universal",
        interface: InterfaceKind::Serial,
        decoder: Some(DecoderKind::Gent),
        default_baud: 9600,
        default_framing: Framing::EightEvenOne,
    },
    ProtocolDescriptor {
        id: ProtocolId::Kentec,
        label: "Kentec Syncro AS",
        interface: InterfaceKind::Serial,
        decoder: Some(DecoderKind::Stub),
        default_baud: 19200,
        default_framing: Framing::EightNoneOne,
    },
    ProtocolDescriptor {
        id: ProtocolId::SiemensAscii,
        label: "Siemens Cerberus CS1140 ASCII",
        interface: InterfaceKind::Serial,
        decoder: Some(DecoderKind::Stub),
        default_baud: 9600,
        default_framing: Framing::EightNoneOne,
    },
    ProtocolDescriptor {
        id: ProtocolId::MinervaAscii,
        label: "Tyco Minerva ASCII",
        interface: InterfaceKind::Serial,
        decoder: Some(DecoderKind::Stub),
        default_baud: 4800,
        default_framing: Framing::EightNoneOne,
    },
    ProtocolDescriptor {
        id: ProtocolId::Advanced,
        label: "Advanced MXPro BMS I/F",
        interface: InterfaceKind::Serial,
        decoder: Some(DecoderKind::AdvancedBms),
        default_baud: 38400,
        default_framing: Framing::EightNoneOne,
    },
    ProtocolDescriptor {
        id: ProtocolId::Notifier,
        label: "Notifier ID3000",
        interface: InterfaceKind::Serial,
        decoder: Some(DecoderKind::Stub),
        default_baud: 9600,
        default_framing: Framing::EightNoneOne,
    },
    ProtocolDescriptor {
        id: ProtocolId::GentAscii,
        label: "Gent Vigilon ASCII",
        interface: InterfaceKind::Serial,
        decoder: Some(DecoderKind::Stub),
        default_baud: 9600,
        default_framing: Framing::EightEvenOne,
    },
    ProtocolDescriptor {
        id: ProtocolId::Ziton,
        label: "Ziton ZP3",
        interface: InterfaceKind::Serial,
        decoder: Some(DecoderKind::Stub),
        default_baud: 19200,
        default_framing: Framing::EightNoneOne,
    },
    ProtocolDescriptor {
        id: ProtocolId::Reserved,
        label: "Reserved",
        interface: InterfaceKind::None,
        decoder: None,
        default_baud: 19200,
        default_framing: Framing::EightNoneOne,
    },
    ProtocolDescriptor {
        id: ProtocolId::AdvancedAscii,
        label: "Advanced MXPro ASCII",
        interface: InterfaceKind::Serial,
        decoder: Some(DecoderKind::AdvancedAscii),
        default_baud: 9600,
        default_framing: Framing::EightNoneOne,
    },
];

/// Look up a registry entry by raw configuration id.
pub fn descriptor(id: u8) -> Option<&'static ProtocolDescriptor> {
    ProtocolId::from_u8(id).map(ProtocolId::descriptor)
}
