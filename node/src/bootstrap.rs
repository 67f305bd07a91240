//! Bootstrap sessions: serving and pulling ledger data.
//!
//! Serving side:
//! - bulk_pull walks `previous` links from the start block and streams
//!   `tag ‖ body` records closed by a lone not_a_block tag.
//! - frontier_req streams 64-byte `account ‖ frontier` records closed by
//!   64 zero bytes.
//!
//! Client side, over any byte stream:
//! - [`bulk_pull`] sends the request, feeds the reply through a
//!   [`BlockStreamDecoder`] and stores each block as it completes.
//! - [`frontier_req`] collects the `(account, frontier)` pairs.
//!
//! Bytes after a sentinel are ignored.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use lattice_ledger::{BlockType, StoredBlock};
use lattice_messages::{BulkPull, FrontierReq, Message};
use lattice_protocol::{
    BlockStreamDecoder, BlockStreamEvent, FrontierStreamDecoder, FrontierStreamEvent,
    MessageEncoder, FRONTIER_RECORD_SIZE,
};
use lattice_store::LedgerStore;
use lattice_types::{Account, BlockHash, PublicKey, Timestamp};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::context::NodeContext;
use crate::NodeError;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// How long a bootstrap client waits for the TCP connection to open.
pub const BOOTSTRAP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ── Server ──────────────────────────────────────────────────────────────

/// Build the full bulk_pull response for `request`.
///
/// `start` is looked up as a block hash first, then as an account whose
/// frontier to start from. The walk stops before `end`, at an open block,
/// at a block missing from the store, or after `count` blocks (zero or
/// absent means no limit). A `previous` link back to a block already sent
/// also ends the walk.
pub fn serve_bulk_pull(store: &dyn LedgerStore, request: &BulkPull) -> Result<Vec<u8>, NodeError> {
    let mut out = Vec::new();
    let limit = request.count.filter(|&c| c > 0);

    let mut current = if store.exists(&request.start)? {
        Some(request.start)
    } else {
        store.frontier(&PublicKey(*request.start.as_bytes()))?
    };

    let mut sent = 0u64;
    let mut visited = HashSet::new();
    while let Some(hash) = current {
        if hash.is_zero() || hash == request.end || limit.is_some_and(|l| sent >= l) {
            break;
        }
        if !visited.insert(hash) {
            warn!(start = %request.start, at = %hash, "previous links form a cycle, ending bulk_pull");
            break;
        }
        let Some(stored) = store.get(&hash)? else {
            break;
        };
        out.extend_from_slice(&stored.block.to_tagged_bytes());
        sent += 1;
        current = Some(stored.block.previous());
    }

    debug!(start = %request.start, blocks = sent, "serving bulk_pull");
    out.push(BlockType::NotABlock.as_u8());
    Ok(out)
}

/// Build the full frontier_req response for `request`.
///
/// A count of zero means every frontier from `start` on. Age and
/// confirmed-only filters are not applied.
pub fn serve_frontier_req(store: &dyn LedgerStore, request: &FrontierReq) -> Result<Vec<u8>, NodeError> {
    let count = match request.count {
        0 => usize::MAX,
        n => n as usize,
    };
    let frontiers = store.frontiers(&request.start, count)?;

    let mut out = Vec::with_capacity((frontiers.len() + 1) * FRONTIER_RECORD_SIZE);
    for (account, frontier) in &frontiers {
        out.extend_from_slice(account.as_bytes());
        out.extend_from_slice(frontier.as_bytes());
    }
    out.extend_from_slice(&[0u8; FRONTIER_RECORD_SIZE]);

    debug!(start = %request.start, frontiers = frontiers.len(), "serving frontier_req");
    Ok(out)
}

// ── Client ──────────────────────────────────────────────────────────────

/// Send a bulk_pull and store every block of the reply.
///
/// Returns the hashes stored, in stream order. The connection closing before
/// the sentinel is [`NodeError::StreamClosed`]; blocks stored until then stay.
pub async fn bulk_pull<S>(
    stream: &mut S,
    encoder: &MessageEncoder,
    request: &BulkPull,
    store: &dyn LedgerStore,
    now: Timestamp,
) -> Result<Vec<BlockHash>, NodeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(&encoder.encode(&Message::BulkPull(request.clone())))
        .await?;
    stream.flush().await?;

    let mut decoder = BlockStreamDecoder::new_block_stream();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut stored = Vec::new();

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Err(NodeError::StreamClosed);
        }
        let mut events = Vec::new();
        let fed = decoder.feed_with(&buf[..n], |event| events.push(event));
        for event in events {
            match event {
                BlockStreamEvent::Block(block) => {
                    let hash = block.hash();
                    store.put(&hash, &StoredBlock::unlinked(block, now.as_secs()))?;
                    stored.push(hash);
                }
                BlockStreamEvent::End => return Ok(stored),
            }
        }
        fed?;
    }
}

/// Send a frontier_req and collect the reply.
pub async fn frontier_req<S>(
    stream: &mut S,
    encoder: &MessageEncoder,
    request: &FrontierReq,
) -> Result<Vec<(Account, BlockHash)>, NodeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(&encoder.encode(&Message::FrontierReq(request.clone())))
        .await?;
    stream.flush().await?;

    let mut decoder = FrontierStreamDecoder::new_frontier_stream();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut frontiers = Vec::new();

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Err(NodeError::StreamClosed);
        }
        let mut events = Vec::new();
        let fed = decoder.feed_with(&buf[..n], |event| events.push(event));
        for event in events {
            match event {
                FrontierStreamEvent::Frontier { account, frontier } => {
                    frontiers.push((account, frontier))
                }
                FrontierStreamEvent::End => return Ok(frontiers),
            }
        }
        fed?;
    }
}

async fn open(addr: SocketAddr) -> Result<TcpStream, NodeError> {
    match tokio::time::timeout(BOOTSTRAP_CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
        Ok(stream) => Ok(stream?),
        Err(_) => Err(NodeError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("connect to {addr} timed out"),
        ))),
    }
}

/// Pull a chain from `addr` over a fresh connection into the node's store.
pub async fn bulk_pull_from(
    ctx: &NodeContext,
    addr: SocketAddr,
    request: &BulkPull,
) -> Result<Vec<BlockHash>, NodeError> {
    let mut stream = open(addr).await?;
    let hashes = bulk_pull(&mut stream, ctx.encoder(), request, ctx.store(), ctx.now()).await?;
    ctx.metrics().blocks_bootstrapped.inc_by(hashes.len() as u64);
    info!(peer = %addr, start = %request.start, blocks = hashes.len(), "bulk_pull complete");
    Ok(hashes)
}

/// Fetch frontiers from `addr` over a fresh connection.
pub async fn frontier_req_from(
    ctx: &NodeContext,
    addr: SocketAddr,
    request: &FrontierReq,
) -> Result<Vec<(Account, BlockHash)>, NodeError> {
    let mut stream = open(addr).await?;
    let frontiers = frontier_req(&mut stream, ctx.encoder(), request).await?;
    info!(peer = %addr, frontiers = frontiers.len(), "frontier_req complete");
    Ok(frontiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_ledger::{Block, OpenBlock, StateBlock};
    use lattice_store::MemoryStore;
    use lattice_types::{Amount, NetworkId, Signature};
    use tokio::io::duplex;

    fn make_hash(byte: u8) -> BlockHash {
        BlockHash::new([byte; 32])
    }

    fn encoder() -> MessageEncoder {
        MessageEncoder::new(NetworkId::Test.constants())
    }

    fn open_block(account: u8) -> Block {
        Block::Open(OpenBlock {
            source: make_hash(90),
            representative: PublicKey([2; 32]),
            account: PublicKey([account; 32]),
            signature: Signature([3; 64]),
            work: 7,
        })
    }

    fn state_block(account: u8, previous: BlockHash, balance: u128) -> Block {
        Block::State(StateBlock {
            account: PublicKey([account; 32]),
            previous,
            representative: PublicKey([2; 32]),
            balance: Amount::new(balance),
            link: [0; 32],
            signature: Signature([4; 64]),
            work: 9,
        })
    }

    /// Store a chain of `len` blocks for `account`; returns hashes oldest first.
    fn store_chain(store: &MemoryStore, account: u8, len: usize) -> Vec<BlockHash> {
        let mut hashes = Vec::new();
        let first = open_block(account);
        let mut previous = first.hash();
        let mut stored = StoredBlock::unlinked(first, 0);
        store.put(&previous, &stored).unwrap();
        hashes.push(previous);
        for i in 1..len {
            let block = state_block(account, previous, 1_000 - i as u128);
            let hash = block.hash();
            stored = StoredBlock::unlinked(block, 0);
            stored.sideband.height = i as u64 + 1;
            store.put(&hash, &stored).unwrap();
            hashes.push(hash);
            previous = hash;
        }
        hashes
    }

    fn decode_stream(bytes: &[u8]) -> Vec<BlockStreamEvent> {
        BlockStreamDecoder::new_block_stream().feed(bytes).unwrap()
    }

    #[test]
    fn bulk_pull_walks_back_to_open_block() {
        let store = MemoryStore::new();
        let chain = store_chain(&store, 1, 3);
        let request = BulkPull {
            start: chain[2],
            end: BlockHash::ZERO,
            count: None,
        };
        let events = decode_stream(&serve_bulk_pull(&store, &request).unwrap());
        let hashes: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                BlockStreamEvent::Block(b) => Some(b.hash()),
                BlockStreamEvent::End => None,
            })
            .collect();
        assert_eq!(hashes, vec![chain[2], chain[1], chain[0]]);
        assert_eq!(events.last(), Some(&BlockStreamEvent::End));
    }

    #[test]
    fn bulk_pull_stops_on_a_previous_cycle() {
        let store = MemoryStore::new();
        let (a, b) = (make_hash(41), make_hash(42));
        store.put(&a, &StoredBlock::unlinked(state_block(1, b, 10), 0)).unwrap();
        store.put(&b, &StoredBlock::unlinked(state_block(1, a, 20), 0)).unwrap();

        for count in [None, Some(0)] {
            let request = BulkPull { start: a, end: BlockHash::ZERO, count };
            let events = decode_stream(&serve_bulk_pull(&store, &request).unwrap());
            assert_eq!(events.len(), 3);
            assert_eq!(events[0], BlockStreamEvent::Block(state_block(1, b, 10)));
            assert_eq!(events[1], BlockStreamEvent::Block(state_block(1, a, 20)));
            assert_eq!(events[2], BlockStreamEvent::End);
        }
    }

    #[test]
    fn bulk_pull_stops_before_end_hash() {
        let store = MemoryStore::new();
        let chain = store_chain(&store, 1, 4);
        let request = BulkPull {
            start: chain[3],
            end: chain[1],
            count: None,
        };
        let events = decode_stream(&serve_bulk_pull(&store, &request).unwrap());
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn bulk_pull_honours_count() {
        let store = MemoryStore::new();
        let chain = store_chain(&store, 1, 4);
        let request = BulkPull {
            start: chain[3],
            end: BlockHash::ZERO,
            count: Some(1),
        };
        let events = decode_stream(&serve_bulk_pull(&store, &request).unwrap());
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn bulk_pull_by_account_starts_at_frontier() {
        let store = MemoryStore::new();
        let chain = store_chain(&store, 5, 2);
        let request = BulkPull {
            start: BlockHash::new([5; 32]),
            end: BlockHash::ZERO,
            count: None,
        };
        let events = decode_stream(&serve_bulk_pull(&store, &request).unwrap());
        assert!(matches!(&events[0], BlockStreamEvent::Block(b) if b.hash() == chain[1]));
    }

    #[test]
    fn bulk_pull_of_unknown_start_is_just_the_sentinel() {
        let store = MemoryStore::new();
        let request = BulkPull {
            start: make_hash(44),
            end: BlockHash::ZERO,
            count: None,
        };
        assert_eq!(serve_bulk_pull(&store, &request).unwrap(), vec![1]);
    }

    #[test]
    fn frontier_req_ends_with_zero_record() {
        let store = MemoryStore::new();
        store_chain(&store, 1, 1);
        store_chain(&store, 2, 2);
        let request = FrontierReq {
            start: PublicKey::ZERO,
            age: u32::MAX,
            count: 0,
            confirmed_only: false,
        };
        let bytes = serve_frontier_req(&store, &request).unwrap();
        assert_eq!(bytes.len(), 3 * FRONTIER_RECORD_SIZE);
        assert!(bytes[2 * FRONTIER_RECORD_SIZE..].iter().all(|&b| b == 0));
    }

    /// Read one request frame off the server half, then write `reply` and
    /// anything in `trailer`.
    async fn serve_once<S>(mut server: S, request_len: usize, reply: Vec<u8>)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut request = vec![0u8; request_len];
        server.read_exact(&mut request).await.unwrap();
        for chunk in reply.chunks(7) {
            server.write_all(chunk).await.unwrap();
        }
        server.flush().await.unwrap();
    }

    #[tokio::test]
    async fn client_stores_pulled_blocks() {
        let remote = MemoryStore::new();
        let chain = store_chain(&remote, 1, 3);
        let request = BulkPull {
            start: chain[2],
            end: BlockHash::ZERO,
            count: None,
        };
        let mut reply = serve_bulk_pull(&remote, &request).unwrap();
        // Trailing garbage after the sentinel is never read as a block.
        reply.extend_from_slice(&[0xff; 10]);

        let request_len = encoder().encode(&Message::BulkPull(request.clone())).len();
        let (mut client, server) = duplex(256);
        let server_task = tokio::spawn(serve_once(server, request_len, reply));

        let local = MemoryStore::new();
        let stored = bulk_pull(&mut client, &encoder(), &request, &local, Timestamp::from_secs(10))
            .await
            .unwrap();
        server_task.await.unwrap();

        assert_eq!(stored, vec![chain[2], chain[1], chain[0]]);
        assert_eq!(local.block_count().unwrap(), 3);
        let record = local.get(&chain[0]).unwrap().unwrap();
        assert_eq!(record.sideband.timestamp, 10);
    }

    #[tokio::test]
    async fn client_reports_stream_closed_before_sentinel() {
        let remote = MemoryStore::new();
        let chain = store_chain(&remote, 1, 2);
        let request = BulkPull {
            start: chain[1],
            end: BlockHash::ZERO,
            count: None,
        };
        let mut reply = serve_bulk_pull(&remote, &request).unwrap();
        reply.pop();

        let request_len = encoder().encode(&Message::BulkPull(request.clone())).len();
        let (mut client, server) = duplex(256);
        let server_task = tokio::spawn(serve_once(server, request_len, reply));

        let local = MemoryStore::new();
        let err = bulk_pull(&mut client, &encoder(), &request, &local, Timestamp::EPOCH)
            .await
            .unwrap_err();
        server_task.await.unwrap();
        assert!(matches!(err, NodeError::StreamClosed));
        assert_eq!(local.block_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn client_collects_frontiers() {
        let remote = MemoryStore::new();
        let a = store_chain(&remote, 1, 2);
        let b = store_chain(&remote, 2, 1);
        let request = FrontierReq {
            start: PublicKey::ZERO,
            age: u32::MAX,
            count: 10,
            confirmed_only: false,
        };
        let reply = serve_frontier_req(&remote, &request).unwrap();

        let request_len = encoder().encode(&Message::FrontierReq(request.clone())).len();
        let (mut client, server) = duplex(128);
        let server_task = tokio::spawn(serve_once(server, request_len, reply));

        let frontiers = frontier_req(&mut client, &encoder(), &request).await.unwrap();
        server_task.await.unwrap();
        assert_eq!(
            frontiers,
            vec![(PublicKey([1; 32]), a[1]), (PublicKey([2; 32]), b[0])]
        );
    }
}
