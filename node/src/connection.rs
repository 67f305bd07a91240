//! Per-connection tasks, dialing and the accept loop.
//!
//! Each connection runs two tasks: a read loop that feeds its own
//! [`MessageDecoder`] and dispatches through [`NodeContext::handle_message`],
//! and a writer that drains the connection's outbound queue. The queue's
//! sender is registered with the peer registry so publish, broadcast and
//! telemetry requests reach the socket without touching it directly.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lattice_messages::{Message, PeerEndpoint};
use lattice_protocol::MessageDecoder;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::context::{NodeContext, Session};
use crate::event::NodeEvent;
use crate::NodeError;

/// Timeout for an outbound TCP connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a closing connection waits for its queued frames to flush.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

const OUTBOUND_QUEUE_CAPACITY: usize = 1024;
const READ_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Accepted by our listener; stays silent until the peer speaks.
    Inbound,
    /// Dialed by us; opens with a handshake query.
    Outbound,
}

/// Drive one connection until it closes.
///
/// The peer is attached to the registry for the connection's lifetime and
/// removed afterwards. A peer-limit refusal returns before any event is
/// emitted; every other error is emitted as [`NodeEvent::Error`] before
/// [`NodeEvent::PeerClosed`].
pub async fn run_connection(
    ctx: Arc<NodeContext>,
    stream: TcpStream,
    endpoint: PeerEndpoint,
    direction: Direction,
) -> Result<(), NodeError> {
    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    if !ctx.lock_registry().attach(endpoint, tx.clone()) {
        return Err(NodeError::PeerLimit(endpoint.to_string()));
    }
    debug!(peer = %endpoint, ?direction, "connection open");

    let (reader, writer) = stream.into_split();
    let writer_task = tokio::spawn(write_loop(endpoint, writer, rx));

    let mut session = Session::new(endpoint, tx);
    let result = read_loop(&ctx, &mut session, reader, direction).await;

    if let Err(e) = &result {
        ctx.emit(NodeEvent::Error {
            peer: endpoint,
            error: e.to_string(),
        });
    }

    ctx.lock_registry().remove(&endpoint);
    ctx.update_peer_gauge();
    // Dropping the last senders lets the writer flush what is queued and exit.
    drop(session);
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer_task).await.is_err() {
        debug!(peer = %endpoint, "writer did not drain in time");
    }

    ctx.emit(NodeEvent::PeerClosed(endpoint));
    result
}

async fn read_loop(
    ctx: &Arc<NodeContext>,
    session: &mut Session,
    mut reader: OwnedReadHalf,
    direction: Direction,
) -> Result<(), NodeError> {
    let mut shutdown = ctx.shutdown().subscribe();
    let mut decoder = MessageDecoder::for_network(ctx.constants().clone(), ctx.verifier());

    if direction == Direction::Outbound {
        let query = session.handshake.query()?;
        session
            .outbound
            .send(ctx.encoder().encode(&Message::NodeIdHandshake(query)))
            .await
            .map_err(|_| NodeError::StreamClosed)?;
    }

    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = tokio::select! {
            read = reader.read(&mut buf) => read?,
            _ = shutdown.recv() => return Ok(()),
        };
        if n == 0 {
            return Ok(());
        }

        let mut messages = Vec::new();
        let fed = decoder.feed_with(&buf[..n], |decoded| messages.push(decoded));
        for decoded in messages {
            ctx.handle_message(session, decoded).await?;
        }
        if let Err(e) = fed {
            ctx.metrics().framing_errors.inc();
            warn!(peer = %session.endpoint, error = %e, "unframeable stream, closing");
            return Err(e.into());
        }
    }
}

async fn write_loop(endpoint: PeerEndpoint, mut writer: OwnedWriteHalf, mut rx: mpsc::Receiver<Vec<u8>>) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = writer.write_all(&frame).await {
            debug!(peer = %endpoint, error = %e, "write failed");
            return;
        }
    }
    let _ = writer.shutdown().await;
}

/// Run a connection on its own task, logging how it ended.
pub fn spawn_connection(
    ctx: Arc<NodeContext>,
    stream: TcpStream,
    endpoint: PeerEndpoint,
    direction: Direction,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match run_connection(ctx, stream, endpoint, direction).await {
            Ok(()) => debug!(peer = %endpoint, "connection closed"),
            Err(NodeError::PeerLimit(_)) => debug!(peer = %endpoint, "peer limit reached, connection refused"),
            Err(e) => warn!(peer = %endpoint, error = %e, "connection closed with error"),
        }
    })
}

/// Dial an endpoint that was already reserved in the registry.
///
/// The reservation is released if the dial fails.
pub fn spawn_dial(ctx: Arc<NodeContext>, endpoint: PeerEndpoint) -> JoinHandle<()> {
    tokio::spawn(async move {
        let addr = endpoint.socket_addr();
        let failure = match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                debug!(peer = %endpoint, "dialed");
                if let Err(e) = run_connection(Arc::clone(&ctx), stream, endpoint, Direction::Outbound).await {
                    debug!(peer = %endpoint, error = %e, "outbound connection ended");
                }
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => "timed out".to_string(),
        };
        debug!(peer = %endpoint, error = %failure, "dial failed");
        ctx.lock_registry().remove(&endpoint);
    })
}

/// Reserve and dial `addr`. Returns `false` if it is already a peer or the
/// registry is full.
pub fn connect_address(ctx: &Arc<NodeContext>, addr: SocketAddr) -> bool {
    let endpoint = PeerEndpoint::from(addr);
    if !ctx.lock_registry().reserve(endpoint) {
        return false;
    }
    spawn_dial(Arc::clone(ctx), endpoint);
    true
}

/// Resolve `host` and dial every IPv4 address it returns.
pub async fn connect_domain(ctx: &Arc<NodeContext>, host: &str, port: u16) -> Result<usize, NodeError> {
    let addrs = tokio::net::lookup_host((host, port)).await?;
    let dialed = addrs
        .filter(SocketAddr::is_ipv4)
        .filter(|addr| connect_address(ctx, *addr))
        .count();
    info!(host, port, dialed, "peering host resolved");
    Ok(dialed)
}

/// Accept inbound connections until shutdown.
pub fn spawn_listener(ctx: Arc<NodeContext>, listener: TcpListener) -> JoinHandle<()> {
    let mut shutdown = ctx.shutdown().subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        spawn_connection(Arc::clone(&ctx), stream, PeerEndpoint::from(addr), Direction::Inbound);
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
                _ = shutdown.recv() => break,
            }
        }
        debug!("listener stopped");
    })
}
