//! Shared node state and per-message dispatch.
//!
//! One [`NodeContext`] is shared by every connection task. It owns the peer
//! registry and the election engine behind `std::sync::Mutex`es; locks are
//! always taken registry first, then engine, and never held across an
//! `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lattice_consensus::{ElectionEngine, VoteOutcome};
use lattice_crypto::{encode_node_id, SignatureVerifier};
use lattice_ledger::Block;
use lattice_messages::{
    Message, NodeIdHandshake, PeerEndpoint, Publish, TelemetryData, Vote,
};
use lattice_network::{FrameSender, PeerRegistry, VoteDispatch};
use lattice_protocol::{DecodedMessage, MessageEncoder};
use lattice_store::LedgerStore;
use lattice_types::{Clock, KeyPair, NetworkConstants, PublicKey, Timestamp};
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

use crate::bootstrap::{serve_bulk_pull, serve_frontier_req};
use crate::config::NodeConfig;
use crate::connection;
use crate::event::NodeEvent;
use crate::handshake::{HandshakeOutcome, HandshakeSession};
use crate::metrics::NodeMetrics;
use crate::shutdown::ShutdownController;
use crate::telemetry;
use crate::NodeError;

/// Peers a publish goes to when the caller does not say.
pub const DEFAULT_PUBLISH_PEERS: usize = 8;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

pub struct NodeContext {
    config: NodeConfig,
    constants: NetworkConstants,
    encoder: MessageEncoder,
    node_key: KeyPair,
    verifier: Arc<dyn SignatureVerifier>,
    registry: Arc<Mutex<PeerRegistry>>,
    engine: Mutex<ElectionEngine>,
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<NodeEvent>,
    metrics: NodeMetrics,
    shutdown: ShutdownController,
    started_at: Timestamp,
}

/// State owned by one connection's read loop.
pub struct Session {
    pub endpoint: PeerEndpoint,
    pub handshake: HandshakeSession,
    /// The connection's own outbound queue, shared with the registry.
    pub outbound: FrameSender,
}

impl Session {
    pub fn new(endpoint: PeerEndpoint, outbound: FrameSender) -> Self {
        Self {
            endpoint,
            handshake: HandshakeSession::new(),
            outbound,
        }
    }
}

impl NodeContext {
    pub fn new(
        config: NodeConfig,
        store: Arc<dyn LedgerStore>,
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NodeError> {
        let constants = config.network.constants();
        let node_key = config.node_key()?;
        let engine = ElectionEngine::new(config.weight_table()?, config.election_config());
        let registry = PeerRegistry::new(config.max_peers);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let started_at = clock.now();

        info!(
            network = constants.network.as_str(),
            node_id = %encode_node_id(&node_key.public),
            "node identity ready"
        );

        Ok(Self {
            encoder: MessageEncoder::new(constants.clone()),
            constants,
            config,
            node_key,
            verifier,
            registry: Arc::new(Mutex::new(registry)),
            engine: Mutex::new(engine),
            store,
            clock,
            events,
            metrics: NodeMetrics::new(),
            shutdown: ShutdownController::new(),
            started_at,
        })
    }

    // -- Accessors ---------------------------------------------------------------

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn constants(&self) -> &NetworkConstants {
        &self.constants
    }

    pub fn encoder(&self) -> &MessageEncoder {
        &self.encoder
    }

    pub fn node_id(&self) -> PublicKey {
        self.node_key.public
    }

    pub(crate) fn node_key(&self) -> &KeyPair {
        &self.node_key
    }

    pub fn verifier(&self) -> Arc<dyn SignatureVerifier> {
        Arc::clone(&self.verifier)
    }

    /// The registry handle, e.g. for the status endpoint's peer count.
    pub fn registry(&self) -> &Arc<Mutex<PeerRegistry>> {
        &self.registry
    }

    pub fn lock_registry(&self) -> MutexGuard<'_, PeerRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lock_engine(&self) -> MutexGuard<'_, ElectionEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    pub fn shutdown(&self) -> &ShutdownController {
        &self.shutdown
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: NodeEvent) {
        if self.events.receiver_count() > 0 {
            trace!(event = event.name(), "node event");
            let _ = self.events.send(event);
        }
    }

    pub(crate) fn update_peer_gauge(&self) {
        let handshaken = self.lock_registry().handshaken_count();
        self.metrics.peer_count.set(handshaken as i64);
    }

    // -- Outbound ----------------------------------------------------------------

    /// Send `block` to `max(peer_count, connected)` peers in random order.
    pub fn publish(&self, block: &Block, peer_count: usize) -> usize {
        let frame = self.encoder.encode(&Message::Publish(Publish { block: block.clone() }));
        let registry = self.lock_registry();
        let sent = registry
            .publish_targets(peer_count)
            .iter()
            .filter(|endpoint| registry.send(endpoint, frame.clone()))
            .count();
        debug!(hash = %block.hash(), peers = sent, "block published");
        sent
    }

    /// Stamp every connected peer and send each a telemetry_req.
    pub fn request_telemetry(&self) -> usize {
        let frame = telemetry::request_frame(self);
        let now = self.now();
        self.lock_registry().request_telemetry(&frame, now)
    }

    async fn reply(&self, session: &Session, message: &Message) -> Result<(), NodeError> {
        self.reply_raw(session, self.encoder.encode(message)).await
    }

    async fn reply_raw(&self, session: &Session, bytes: Vec<u8>) -> Result<(), NodeError> {
        session
            .outbound
            .send(bytes)
            .await
            .map_err(|_| NodeError::StreamClosed)
    }

    // -- Inbound dispatch ----------------------------------------------------------

    /// Apply one decoded message from `session`'s peer.
    ///
    /// An `Err` means the connection must be closed.
    pub async fn handle_message(
        self: &Arc<Self>,
        session: &mut Session,
        decoded: DecodedMessage,
    ) -> Result<(), NodeError> {
        let peer = session.endpoint;
        let now = self.now();
        self.metrics.messages_received.inc();
        self.lock_registry().record_message(&peer, now);
        trace!(peer = %peer, kind = decoded.message.message_type().as_str(), "message received");
        self.emit(NodeEvent::Message {
            peer,
            message: decoded.message.clone(),
        });

        match decoded.message {
            Message::Keepalive(keepalive) => {
                let dial = self.lock_registry().on_keepalive(&keepalive);
                for endpoint in dial {
                    connection::spawn_dial(Arc::clone(self), endpoint);
                }
            }
            Message::ConfirmAck(vote) => {
                self.on_vote(peer, vote, decoded.vote_valid.unwrap_or(false))?;
            }
            Message::NodeIdHandshake(handshake) => {
                self.on_handshake(session, handshake).await?;
            }
            Message::TelemetryReq => {
                let data = telemetry::local_telemetry(self)?;
                self.reply(session, &Message::TelemetryAck(data)).await?;
            }
            Message::TelemetryAck(data) => self.on_telemetry(peer, data)?,
            Message::BulkPull(request) => {
                let stream = serve_bulk_pull(self.store(), &request)?;
                self.reply_raw(session, stream).await?;
            }
            Message::FrontierReq(request) => {
                let stream = serve_frontier_req(self.store(), &request)?;
                self.reply_raw(session, stream).await?;
            }
            Message::Publish(_)
            | Message::ConfirmReq(_)
            | Message::BulkPush
            | Message::BulkPullAccount(_)
            | Message::AscPullReq(_)
            | Message::AscPullAck(_) => {}
        }
        Ok(())
    }

    async fn on_handshake(&self, session: &mut Session, handshake: NodeIdHandshake) -> Result<(), NodeError> {
        let peer = session.endpoint;

        if let Some(response) = &handshake.response {
            match session.handshake.verify(response, self.verifier.as_ref())? {
                HandshakeOutcome::Verified(node_id) => {
                    self.lock_registry().set_node_id(&peer, node_id)?;
                    self.update_peer_gauge();
                    info!(peer = %peer, node_id = %encode_node_id(&node_id), "handshake complete");
                    self.emit(NodeEvent::Handshake { peer, node_id });
                }
                HandshakeOutcome::Unsolicited => {
                    debug!(peer = %peer, "unsolicited handshake response ignored");
                }
            }
        }

        if let Some(cookie) = handshake.query {
            let mut reply = if !session.handshake.has_queried() && !session.handshake.is_complete() {
                session.handshake.query()?
            } else {
                NodeIdHandshake::default()
            };
            reply.response = Some(HandshakeSession::respond(&cookie, &self.node_key));
            self.reply(session, &Message::NodeIdHandshake(reply)).await?;
        }
        Ok(())
    }

    fn on_vote(&self, peer: PeerEndpoint, vote: Vote, valid: bool) -> Result<(), NodeError> {
        self.metrics.votes_received.inc();
        if !valid {
            self.metrics.votes_invalid.inc();
        }

        let now = self.now();
        let (dispatch, active, inactive) = {
            let mut registry = self.lock_registry();
            let mut engine = self.lock_engine();
            let dispatch = registry.on_vote(&vote, valid, peer, &mut engine, now)?;
            (dispatch, engine.active_count(), engine.inactive_count())
        };
        self.metrics.active_elections.set(active as i64);
        self.metrics.inactive_elections.set(inactive as i64);
        self.emit(NodeEvent::Vote { peer, vote, valid });

        let VoteDispatch::Applied(outcomes) = dispatch else {
            return Ok(());
        };
        for (_, outcome) in outcomes {
            match outcome {
                VoteOutcome::Started(summary) => {
                    self.metrics.elections_started.inc();
                    self.emit(NodeEvent::ElectionStarted(summary.clone()));
                    if summary.confirmed_at.is_some() {
                        self.metrics.elections_confirmed.inc();
                        self.emit(NodeEvent::ElectionConfirmed(summary));
                    }
                }
                VoteOutcome::Confirmed(summary) => {
                    self.metrics.elections_confirmed.inc();
                    self.emit(NodeEvent::ElectionConfirmed(summary));
                }
                VoteOutcome::Ignored(_) | VoteOutcome::Tallied(_) => {}
            }
        }
        Ok(())
    }

    fn on_telemetry(&self, peer: PeerEndpoint, telemetry: TelemetryData) -> Result<(), NodeError> {
        let now = self.now();
        let verdict = self.lock_registry().on_telemetry(&peer, telemetry.clone(), now)?;
        if verdict.is_rejected() {
            self.metrics.telemetry_rejected.inc();
        }
        self.emit(NodeEvent::Telemetry {
            peer,
            telemetry,
            verdict,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RepresentativeWeight, WeightsConfig};
    use lattice_crypto::{generate_keypair, keypair_from_private, sign_message, Ed25519Verifier};
    use lattice_ledger::{BlockType, ChangeBlock};
    use lattice_messages::HEADER_SIZE;
    use lattice_nullables::NullClock;
    use lattice_protocol::{BlockStreamDecoder, BlockStreamEvent, MessageDecoder};
    use lattice_store::MemoryStore;
    use lattice_types::{Amount, BlockHash, PrivateKey, Signature};
    use std::net::Ipv4Addr;
    use tokio::sync::mpsc;

    fn make_hash(byte: u8) -> BlockHash {
        BlockHash::new([byte; 32])
    }

    fn ep(last: u8) -> PeerEndpoint {
        PeerEndpoint::new(Ipv4Addr::new(10, 0, 0, last).to_ipv6_mapped(), 54000)
    }

    fn rep_key(seed: u8) -> KeyPair {
        keypair_from_private(PrivateKey([seed; 32]))
    }

    /// Reps 1, 2, 3 hold 70%, 20% and 10% of a trended weight of 100.
    fn context(clock: Arc<NullClock>) -> Arc<NodeContext> {
        let representatives = [(1u8, 70u128), (2, 20), (3, 10)]
            .into_iter()
            .map(|(seed, weight)| RepresentativeWeight {
                account: rep_key(seed).public.to_string(),
                weight: Amount::new(weight),
            })
            .collect();
        let config = NodeConfig {
            min_promotion_voters: 1,
            weights: Some(WeightsConfig {
                trended: Amount::new(100),
                representatives,
            }),
            ..Default::default()
        };
        Arc::new(
            NodeContext::new(
                config,
                Arc::new(MemoryStore::new()),
                Arc::new(Ed25519Verifier),
                clock,
            )
            .unwrap(),
        )
    }

    /// Attach a peer and return its session plus the receiving end of its queue.
    fn attach(ctx: &NodeContext, endpoint: PeerEndpoint) -> (Session, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(16);
        assert!(ctx.lock_registry().attach(endpoint, tx.clone()));
        (Session::new(endpoint, tx), rx)
    }

    fn decode(ctx: &NodeContext, bytes: &[u8]) -> Vec<DecodedMessage> {
        MessageDecoder::for_network(ctx.constants().clone(), ctx.verifier())
            .feed(bytes)
            .unwrap()
    }

    fn wire(ctx: &NodeContext, message: Message) -> DecodedMessage {
        decode(ctx, &ctx.encoder().encode(&message)).remove(0)
    }

    fn signed_vote(key: &KeyPair, hashes: Vec<BlockHash>) -> Vote {
        let mut vote = Vote {
            account: key.public,
            signature: Signature([0; 64]),
            timestamp: 1,
            hashes,
        };
        vote.signature = sign_message(&vote.signed_payload(), &key.private);
        vote
    }

    #[tokio::test]
    async fn query_gets_query_and_response() {
        let ctx = context(Arc::new(NullClock::new(0)));
        let (mut session, mut rx) = attach(&ctx, ep(1));
        let cookie = [9u8; 32];
        let query = NodeIdHandshake {
            query: Some(cookie),
            response: None,
        };
        ctx.handle_message(&mut session, wire(&ctx, Message::NodeIdHandshake(query)))
            .await
            .unwrap();

        let reply = decode(&ctx, &rx.recv().await.unwrap()).remove(0);
        let Message::NodeIdHandshake(reply) = reply.message else {
            panic!("expected a handshake reply");
        };
        assert!(reply.query.is_some());
        let response = reply.response.unwrap();
        assert_eq!(response.node_id, ctx.node_id());
        assert!(Ed25519Verifier.verify(
            &response.node_id,
            &response.signed_payload(&cookie),
            &response.signature
        ));
        assert!(session.handshake.has_queried());
    }

    #[tokio::test]
    async fn valid_response_records_node_id() {
        let ctx = context(Arc::new(NullClock::new(0)));
        let mut events = ctx.subscribe();
        let (mut session, _rx) = attach(&ctx, ep(1));
        let cookie = session.handshake.query().unwrap().query.unwrap();

        let peer_key = generate_keypair().unwrap();
        let answer = NodeIdHandshake {
            query: None,
            response: Some(HandshakeSession::respond(&cookie, &peer_key)),
        };
        ctx.handle_message(&mut session, wire(&ctx, Message::NodeIdHandshake(answer)))
            .await
            .unwrap();

        assert_eq!(ctx.lock_registry().get(&ep(1)).unwrap().node_id, Some(peer_key.public));
        assert_eq!(ctx.metrics().peer_count.get(), 1);
        assert!(matches!(events.recv().await.unwrap(), NodeEvent::Message { .. }));
        assert!(matches!(
            events.recv().await.unwrap(),
            NodeEvent::Handshake { node_id, .. } if node_id == peer_key.public
        ));
    }

    #[tokio::test]
    async fn forged_response_closes_connection() {
        let ctx = context(Arc::new(NullClock::new(0)));
        let (mut session, _rx) = attach(&ctx, ep(1));
        session.handshake.query().unwrap();

        let peer_key = generate_keypair().unwrap();
        let answer = NodeIdHandshake {
            query: None,
            response: Some(HandshakeSession::respond(&[0u8; 32], &peer_key)),
        };
        let err = ctx
            .handle_message(&mut session, wire(&ctx, Message::NodeIdHandshake(answer)))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::InvalidHandshake(_)));
        assert_eq!(ctx.lock_registry().handshaken_count(), 0);
    }

    #[tokio::test]
    async fn principal_vote_starts_and_confirms_election() {
        let ctx = context(Arc::new(NullClock::new(1_000)));
        let mut events = ctx.subscribe();
        let (mut session, _rx) = attach(&ctx, ep(1));
        let vote = signed_vote(&rep_key(1), vec![make_hash(7)]);

        ctx.handle_message(&mut session, wire(&ctx, Message::ConfirmAck(vote)))
            .await
            .unwrap();

        assert_eq!(ctx.metrics().votes_received.get(), 1);
        assert_eq!(ctx.metrics().elections_started.get(), 1);
        assert_eq!(ctx.metrics().elections_confirmed.get(), 1);
        assert_eq!(ctx.metrics().active_elections.get(), 1);

        let names: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.name())
            .collect();
        assert_eq!(names, vec!["message", "vote", "election_started", "election_confirmed"]);
    }

    #[tokio::test]
    async fn forged_vote_is_counted_and_ignored() {
        let ctx = context(Arc::new(NullClock::new(0)));
        let (mut session, _rx) = attach(&ctx, ep(1));
        let mut vote = signed_vote(&rep_key(1), vec![make_hash(7)]);
        vote.timestamp += 1;

        ctx.handle_message(&mut session, wire(&ctx, Message::ConfirmAck(vote)))
            .await
            .unwrap();

        assert_eq!(ctx.metrics().votes_invalid.get(), 1);
        assert_eq!(ctx.metrics().elections_started.get(), 0);
        assert!(ctx.lock_engine().get(&make_hash(7)).is_none());
    }

    #[tokio::test]
    async fn unsolicited_telemetry_is_rejected() {
        let ctx = context(Arc::new(NullClock::new(0)));
        let mut events = ctx.subscribe();
        let (mut session, _rx) = attach(&ctx, ep(1));
        let data = TelemetryData::default();

        ctx.handle_message(&mut session, wire(&ctx, Message::TelemetryAck(data)))
            .await
            .unwrap();

        assert_eq!(ctx.metrics().telemetry_rejected.get(), 1);
        let _message = events.recv().await.unwrap();
        let NodeEvent::Telemetry { verdict, .. } = events.recv().await.unwrap() else {
            panic!("expected a telemetry event");
        };
        assert!(verdict.unsolicited);
        assert!(verdict.mismatched);
    }

    #[tokio::test]
    async fn late_telemetry_is_rejected() {
        let clock = Arc::new(NullClock::new(0));
        let ctx = context(Arc::clone(&clock));
        let mut events = ctx.subscribe();
        let (mut session, mut rx) = attach(&ctx, ep(1));
        let node = generate_keypair().unwrap();
        ctx.lock_registry().set_node_id(&ep(1), node.public).unwrap();

        assert_eq!(ctx.request_telemetry(), 1);
        assert_eq!(rx.recv().await.unwrap().len(), HEADER_SIZE);
        clock.advance(10_001);

        let data = TelemetryData {
            node_id: node.public,
            ..Default::default()
        };
        ctx.handle_message(&mut session, wire(&ctx, Message::TelemetryAck(data)))
            .await
            .unwrap();

        let _message = events.recv().await.unwrap();
        let NodeEvent::Telemetry { verdict, .. } = events.recv().await.unwrap() else {
            panic!("expected a telemetry event");
        };
        assert!(verdict.late);
        assert!(verdict.is_peer());
        assert!(ctx.lock_registry().get(&ep(1)).unwrap().telemetry.is_none());
    }

    #[tokio::test]
    async fn telemetry_req_is_answered() {
        let ctx = context(Arc::new(NullClock::new(0)));
        let (mut session, mut rx) = attach(&ctx, ep(1));
        ctx.handle_message(&mut session, wire(&ctx, Message::TelemetryReq))
            .await
            .unwrap();
        let reply = decode(&ctx, &rx.recv().await.unwrap()).remove(0);
        assert!(matches!(reply.message, Message::TelemetryAck(t) if t.node_id == ctx.node_id()));
    }

    #[tokio::test]
    async fn bulk_pull_is_served_on_the_connection() {
        let ctx = context(Arc::new(NullClock::new(0)));
        let (mut session, mut rx) = attach(&ctx, ep(1));
        let request = lattice_messages::BulkPull {
            start: make_hash(3),
            end: BlockHash::ZERO,
            count: None,
        };
        ctx.handle_message(&mut session, wire(&ctx, Message::BulkPull(request)))
            .await
            .unwrap();
        let stream = rx.recv().await.unwrap();
        assert_eq!(
            BlockStreamDecoder::new_block_stream().feed(&stream).unwrap(),
            vec![BlockStreamEvent::End]
        );
        assert_eq!(stream, vec![BlockType::NotABlock.as_u8()]);
    }

    #[tokio::test]
    async fn publish_reaches_every_connected_peer() {
        let ctx = context(Arc::new(NullClock::new(0)));
        let mut queues: Vec<_> = (1..=3).map(|i| attach(&ctx, ep(i)).1).collect();
        let block = Block::Change(ChangeBlock {
            previous: make_hash(1),
            representative: PublicKey([2; 32]),
            signature: Signature([3; 64]),
            work: 4,
        });
        assert_eq!(ctx.publish(&block, 1), 3);
        for rx in &mut queues {
            let frame = rx.recv().await.unwrap();
            let decoded = decode(&ctx, &frame).remove(0);
            assert!(matches!(decoded.message, Message::Publish(p) if p.block == block));
        }
    }
}
