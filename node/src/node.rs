//! The lattice node: wires the listener, dialers, telemetry loop and status
//! endpoint around one shared [`NodeContext`].

use std::net::{Ipv6Addr, SocketAddr};
use std::sync::Arc;

use lattice_crypto::{Ed25519Verifier, SignatureVerifier};
use lattice_ledger::Block;
use lattice_messages::{BulkPull, FrontierReq};
use lattice_rpc::{PeerCountSource, StatusServer, StatusServerHandle};
use lattice_store::{LedgerStore, MemoryStore};
use lattice_store_lmdb::LmdbStore;
use lattice_types::{Account, BlockHash, Clock, SystemClock};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bootstrap;
use crate::config::NodeConfig;
use crate::connection::{connect_address, connect_domain, spawn_listener};
use crate::context::NodeContext;
use crate::event::NodeEvent;
use crate::telemetry::spawn_telemetry_loop;
use crate::NodeError;

pub struct LatticeNode {
    ctx: Arc<NodeContext>,
    task_handles: Vec<JoinHandle<()>>,
    status: Option<StatusServerHandle>,
    local_addr: Option<SocketAddr>,
}

impl LatticeNode {
    /// Build a node from configuration: LMDB when `ledger_path` is set,
    /// an in-memory store otherwise.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let store: Arc<dyn LedgerStore> = match &config.ledger_path {
            Some(path) => {
                std::fs::create_dir_all(path)?;
                Arc::new(LmdbStore::open(path)?)
            }
            None => Arc::new(MemoryStore::new()),
        };
        Self::with_parts(config, store, Arc::new(Ed25519Verifier), Arc::new(SystemClock))
    }

    /// Build a node around caller-supplied collaborators.
    pub fn with_parts(
        config: NodeConfig,
        store: Arc<dyn LedgerStore>,
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NodeError> {
        let ctx = NodeContext::new(config, store, verifier, clock)?;
        Ok(Self {
            ctx: Arc::new(ctx),
            task_handles: Vec::new(),
            status: None,
            local_addr: None,
        })
    }

    pub fn context(&self) -> &Arc<NodeContext> {
        &self.ctx
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.ctx.subscribe()
    }

    /// Address of the peer listener, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Address of the status endpoint, once serving.
    pub fn status_addr(&self) -> Option<SocketAddr> {
        self.status.as_ref().map(StatusServerHandle::local_addr)
    }

    /// Start everything the configuration enables.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        let config = self.ctx.config().clone();
        info!(
            network = config.network.as_str(),
            port = config.listen_port(),
            peers = config.peers.len(),
            discover = config.discover,
            "lattice node starting"
        );

        if config.listen {
            self.listen_on(SocketAddr::from((Ipv6Addr::UNSPECIFIED, config.listen_port())))
                .await?;
        }

        if let Some(port) = config.status_port {
            self.serve_status(SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)))
                .await?;
        }

        if config.request_telemetry {
            self.task_handles.push(spawn_telemetry_loop(Arc::clone(&self.ctx)));
        }

        for peer in &config.peers {
            match peer.parse::<SocketAddr>() {
                Ok(addr) => {
                    self.connect(addr);
                }
                Err(e) => warn!(peer = %peer, error = %e, "ignoring unparseable peer address"),
            }
        }

        if config.discover {
            let ctx = Arc::clone(&self.ctx);
            self.task_handles.push(tokio::spawn(async move {
                let host = ctx.constants().peering_host;
                let port = ctx.constants().default_port;
                if let Err(e) = connect_domain(&ctx, host, port).await {
                    warn!(host, error = %e, "peer discovery failed");
                }
            }));
        }

        Ok(())
    }

    /// Accept peer connections on `addr`. Returns the bound address.
    pub async fn listen_on(&mut self, addr: SocketAddr) -> Result<SocketAddr, NodeError> {
        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        info!(addr = %local, "listening for peers");
        self.task_handles
            .push(spawn_listener(Arc::clone(&self.ctx), listener));
        self.local_addr = Some(local);
        Ok(local)
    }

    /// Serve the status endpoint (and `/metrics`) on `addr`.
    pub async fn serve_status(&mut self, addr: SocketAddr) -> Result<SocketAddr, NodeError> {
        let peers: Arc<dyn PeerCountSource> = self.ctx.registry().clone();
        let handle = StatusServer::new(addr, peers)
            .with_metrics(self.ctx.metrics().registry.clone())
            .start(self.ctx.shutdown().subscribe())
            .await?;
        let local = handle.local_addr();
        self.status = Some(handle);
        Ok(local)
    }

    /// Dial a peer. Returns `false` if it is already known or the registry is full.
    pub fn connect(&self, addr: SocketAddr) -> bool {
        connect_address(&self.ctx, addr)
    }

    pub fn publish(&self, block: &Block, peer_count: usize) -> usize {
        self.ctx.publish(block, peer_count)
    }

    pub fn request_telemetry(&self) -> usize {
        self.ctx.request_telemetry()
    }

    pub async fn bulk_pull(&self, addr: SocketAddr, request: &BulkPull) -> Result<Vec<BlockHash>, NodeError> {
        bootstrap::bulk_pull_from(&self.ctx, addr, request).await
    }

    pub async fn frontier_req(
        &self,
        addr: SocketAddr,
        request: &FrontierReq,
    ) -> Result<Vec<(Account, BlockHash)>, NodeError> {
        bootstrap::frontier_req_from(&self.ctx, addr, request).await
    }

    /// Signal every task to stop and wait for them.
    pub async fn stop(&mut self) {
        info!("lattice node stopping");
        self.ctx.shutdown().shutdown();

        for handle in self.task_handles.drain(..) {
            let _ = handle.await;
        }
        if let Some(status) = self.status.take() {
            let _ = status.join().await;
        }
        info!("lattice node stopped");
    }

    /// Run until SIGINT/SIGTERM, then stop.
    pub async fn run_until_signal(&mut self) -> Result<(), NodeError> {
        self.ctx.shutdown().wait_for_signal().await?;
        self.stop().await;
        Ok(())
    }
}
