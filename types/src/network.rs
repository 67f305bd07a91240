//! Network identifier and the constant set each network fixes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// Magic byte that opens every message header.
pub const MAGIC: u8 = b'R';

/// Identifies which network a node is connected to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production network.
    Live,
    /// The public beta network.
    #[default]
    Beta,
    /// The test network.
    Test,
}

impl NetworkId {
    /// Header byte identifying this network.
    pub fn id_byte(&self) -> u8 {
        match self {
            Self::Live => b'C',
            Self::Beta => b'B',
            Self::Test => b'X',
        }
    }

    pub fn from_id_byte(byte: u8) -> Option<Self> {
        match byte {
            b'C' => Some(Self::Live),
            b'B' => Some(Self::Beta),
            b'X' => Some(Self::Test),
            _ => None,
        }
    }

    /// Default port for this network.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Live => 7075,
            Self::Beta => 54000,
            Self::Test => 17075,
        }
    }

    /// DNS name resolving to well-known peers.
    pub fn peering_host(&self) -> &'static str {
        match self {
            Self::Live => "peering.nano.org",
            Self::Beta => "peering-beta.nano.org",
            Self::Test => "peering-test.nano.org",
        }
    }

    /// How long telemetry stays fresh, in milliseconds. Also the interval
    /// between telemetry requests.
    pub fn telemetry_cache_cutoff_ms(&self) -> u64 {
        match self {
            Self::Live => 60_000,
            Self::Beta => 15_000,
            Self::Test => 60_000,
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Beta => "beta",
            Self::Test => "test",
        }
    }

    pub fn constants(&self) -> NetworkConstants {
        NetworkConstants::for_network(*self)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "beta" => Ok(Self::Beta),
            "test" => Ok(Self::Test),
            other => Err(TypesError::UnknownNetwork(other.to_string())),
        }
    }
}

/// The version triple carried in every header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub max: u8,
    pub using: u8,
    pub min: u8,
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self {
            max: 0x13,
            using: 0x12,
            min: 0x12,
        }
    }
}

/// Everything fixed by the choice of network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkConstants {
    pub network: NetworkId,
    pub magic: u8,
    pub id_byte: u8,
    pub version: ProtocolVersion,
    pub default_port: u16,
    pub peering_host: &'static str,
    pub telemetry_cache_cutoff_ms: u64,
}

impl NetworkConstants {
    pub fn for_network(network: NetworkId) -> Self {
        Self {
            network,
            magic: MAGIC,
            id_byte: network.id_byte(),
            version: ProtocolVersion::default(),
            default_port: network.default_port(),
            peering_host: network.peering_host(),
            telemetry_cache_cutoff_ms: network.telemetry_cache_cutoff_ms(),
        }
    }
}
