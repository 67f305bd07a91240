//! Node configuration with TOML file support.

use std::path::PathBuf;
use std::str::FromStr;

use lattice_consensus::{ActiveVotePolicy, ElectionConfig, WeightTable, DEFAULT_MIN_PROMOTION_VOTERS};
use lattice_crypto::{decode_account, generate_keypair, keypair_from_private};
use lattice_types::{Account, Amount, KeyPair, NetworkId, PrivateKey, PublicKey};
use serde::{Deserialize, Serialize};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a lattice node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Which network to join. Fixes magic, id byte, port and peering host.
    #[serde(default)]
    pub network: NetworkId,

    /// Accept inbound connections.
    #[serde(default = "default_true")]
    pub listen: bool,

    /// Listen port; the network's default port when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Explicit `ip:port` peers dialed at startup.
    #[serde(default)]
    pub peers: Vec<String>,

    /// Resolve the network's peering host and dial every address it returns.
    #[serde(default = "default_true")]
    pub discover: bool,

    #[serde(default = "default_max_peers")]
    pub max_peers: usize,

    /// Periodically send telemetry_req to every peer.
    #[serde(default)]
    pub request_telemetry: bool,

    /// Serve the HTTP status endpoint on this port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_port: Option<u16>,

    /// LMDB directory. Blocks are kept in memory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_path: Option<PathBuf>,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log filter, e.g. `"info"` or `"debug,lattice_consensus=trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Hex private key for a stable node id. A fresh key is generated per run when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_seed: Option<String>,

    #[serde(default = "default_min_promotion_voters")]
    pub min_promotion_voters: usize,

    #[serde(default)]
    pub active_vote_policy: ActiveVotePolicy,

    /// Voting weights. The built-in reference table is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<WeightsConfig>,
}

/// Externally supplied weight table. Amounts are written as decimal strings
/// of raw units; TOML integers cannot hold them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightsConfig {
    pub trended: Amount,
    #[serde(default)]
    pub representatives: Vec<RepresentativeWeight>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentativeWeight {
    /// `nano_` address or 64 hex characters.
    pub account: String,
    pub weight: Amount,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_max_peers() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_min_promotion_voters() -> usize {
    DEFAULT_MIN_PROMOTION_VOTERS
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn listen_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.network.default_port())
    }

    pub fn election_config(&self) -> ElectionConfig {
        ElectionConfig {
            min_promotion_voters: self.min_promotion_voters,
            active_vote_policy: self.active_vote_policy,
        }
    }

    /// The configured weight table, or the reference table.
    pub fn weight_table(&self) -> Result<WeightTable, NodeError> {
        let Some(weights) = &self.weights else {
            return Ok(WeightTable::reference());
        };
        let reps = weights
            .representatives
            .iter()
            .map(|rep| Ok((parse_account(&rep.account)?, rep.weight)))
            .collect::<Result<Vec<_>, NodeError>>()?;
        Ok(WeightTable::new(weights.trended, reps)?)
    }

    /// The node identity key: from `node_seed`, or freshly generated.
    pub fn node_key(&self) -> Result<KeyPair, NodeError> {
        match &self.node_seed {
            Some(seed) => {
                let private = PrivateKey::from_str(seed)
                    .map_err(|e| NodeError::Config(format!("node_seed: {e}")))?;
                Ok(keypair_from_private(private))
            }
            None => Ok(generate_keypair()?),
        }
    }
}

fn parse_account(s: &str) -> Result<Account, NodeError> {
    if let Some(account) = decode_account(s) {
        return Ok(account);
    }
    s.parse::<PublicKey>()
        .map_err(|e| NodeError::Config(format!("account {s:?}: {e}")))
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: NetworkId::default(),
            listen: default_true(),
            port: None,
            peers: Vec::new(),
            discover: default_true(),
            max_peers: default_max_peers(),
            request_telemetry: false,
            status_port: None,
            ledger_path: None,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            node_seed: None,
            min_promotion_voters: default_min_promotion_voters(),
            active_vote_policy: ActiveVotePolicy::default(),
            weights: None,
        }
    }
}
