//! Lattice daemon: entry point for running a peer node.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lattice_node::{init_logging, LatticeNode, LogFormat, NodeConfig};
use lattice_types::NetworkId;

#[derive(Parser)]
#[command(name = "lattice-daemon", about = "Block-lattice peer node daemon")]
struct Cli {
    /// Network to join: "live", "beta" or "test".
    /// When a config file is provided, defaults to the file's network value.
    #[arg(long, env = "LATTICE_NETWORK")]
    network: Option<NetworkId>,

    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "LATTICE_CONFIG")]
    config: Option<PathBuf>,

    /// Port for peer connections (defaults to the network's port).
    #[arg(long, env = "LATTICE_PORT")]
    port: Option<u16>,

    /// Accept inbound peer connections.
    #[arg(long, env = "LATTICE_LISTEN")]
    listen: Option<bool>,

    /// Peer to dial at startup, as ip:port. Repeatable.
    #[arg(long = "peer", env = "LATTICE_PEERS", value_delimiter = ',')]
    peers: Vec<String>,

    /// Skip resolving the network's peering host.
    #[arg(long, env = "LATTICE_NO_DISCOVER")]
    no_discover: bool,

    /// Periodically request telemetry from every peer.
    #[arg(long, env = "LATTICE_TELEMETRY")]
    telemetry: bool,

    /// Serve the HTTP status endpoint on this port.
    #[arg(long, env = "LATTICE_STATUS_PORT")]
    status_port: Option<u16>,

    /// LMDB directory for the ledger. Blocks stay in memory when unset.
    #[arg(long, env = "LATTICE_LEDGER_PATH")]
    ledger_path: Option<PathBuf>,

    /// Log level or filter, e.g. "info" or "debug,lattice_consensus=trace".
    #[arg(long, env = "LATTICE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format: "human" or "json".
    #[arg(long, env = "LATTICE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Node operations.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node until SIGINT/SIGTERM.
    Run,
    /// Print the effective configuration as TOML and exit.
    Config,
}

impl Cli {
    /// Overlay the command-line flags on `base`.
    fn apply(&self, mut config: NodeConfig) -> NodeConfig {
        if let Some(network) = self.network {
            config.network = network;
        }
        if self.port.is_some() {
            config.port = self.port;
        }
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if !self.peers.is_empty() {
            config.peers = self.peers.clone();
        }
        if self.no_discover {
            config.discover = false;
        }
        if self.telemetry {
            config.request_telemetry = true;
        }
        if self.status_port.is_some() {
            config.status_port = self.status_port;
        }
        if self.ledger_path.is_some() {
            config.ledger_path = self.ledger_path.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(&path.to_string_lossy())
            .with_context(|| format!("loading {}", path.display()))?,
        None => NodeConfig::default(),
    };
    let config = cli.apply(base);

    match cli.command {
        Command::Node { action } => match action {
            NodeAction::Config => {
                print!("{}", config.to_toml_string()?);
            }
            NodeAction::Run => {
                init_logging(config.log_format, &config.log_level);
                tracing::info!(
                    network = config.network.as_str(),
                    port = config.listen_port(),
                    status = ?config.status_port,
                    "starting lattice node"
                );

                let mut node = LatticeNode::new(config).context("building node")?;
                node.start().await.context("starting node")?;
                node.run_until_signal().await?;
                tracing::info!("lattice daemon exited cleanly");
            }
        },
    }

    Ok(())
}
