//! The live peer set and the dispatch of decoded peer traffic.
//!
//! Peers are keyed by their 18-byte endpoint. An outbound connection is
//! registered as a placeholder before the socket opens, so gossip that names
//! the same endpoint again while it is connecting does not dial it twice.

use std::collections::HashMap;

use lattice_consensus::{ElectionEngine, VoteOutcome};
use lattice_crypto::encode_account;
use lattice_messages::{Keepalive, PeerEndpoint, TelemetryData, Vote};
use lattice_types::{Account, BlockHash, PublicKey, Timestamp};
use rand::seq::SliceRandom;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::error::NetworkError;
use crate::peer::{FrameSender, Peer, Representative};
use crate::telemetry::TelemetryVerdict;

/// What became of an inbound confirm_ack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteDispatch {
    /// Signature check failed; nothing was recorded.
    Invalid,
    /// Valid, but the representative has no weight. Only the vote count moved.
    Unweighted,
    /// One outcome per hash, in vote order.
    Applied(Vec<(BlockHash, VoteOutcome)>),
}

pub struct PeerRegistry {
    peers: HashMap<PeerEndpoint, Peer>,
    representatives: HashMap<Account, Representative>,
    max_peers: usize,
}

impl PeerRegistry {
    pub fn new(max_peers: usize) -> Self {
        Self {
            peers: HashMap::new(),
            representatives: HashMap::new(),
            max_peers,
        }
    }

    // -- Peer lifecycle --------------------------------------------------------

    /// Claim a slot for an outbound connection that is about to be opened.
    ///
    /// Returns `false` if the endpoint is already known or the registry is full.
    pub fn reserve(&mut self, endpoint: PeerEndpoint) -> bool {
        if self.peers.contains_key(&endpoint) || self.peers.len() >= self.max_peers {
            return false;
        }
        self.peers.insert(endpoint, Peer::placeholder(endpoint));
        true
    }

    /// Register an open connection and its outbound frame queue.
    ///
    /// Inbound connections are admitted here without a reservation; they are
    /// refused only when the registry is full.
    pub fn attach(&mut self, endpoint: PeerEndpoint, sender: FrameSender) -> bool {
        if !self.peers.contains_key(&endpoint) && self.peers.len() >= self.max_peers {
            return false;
        }
        let peer = self
            .peers
            .entry(endpoint)
            .or_insert_with(|| Peer::placeholder(endpoint));
        peer.sender = Some(sender);
        debug!(peer = %endpoint, current = self.peers.len(), "peer attached");
        true
    }

    pub fn set_node_id(&mut self, endpoint: &PeerEndpoint, node_id: PublicKey) -> Result<(), NetworkError> {
        let peer = self
            .peers
            .get_mut(endpoint)
            .ok_or(NetworkError::PeerNotFound(*endpoint))?;
        peer.node_id = Some(node_id);
        Ok(())
    }

    /// Drop a peer, on disconnect or failed dial.
    pub fn remove(&mut self, endpoint: &PeerEndpoint) -> Option<Peer> {
        let removed = self.peers.remove(endpoint);
        if removed.is_some() {
            debug!(peer = %endpoint, current = self.peers.len(), "peer removed");
        }
        removed
    }

    pub fn contains(&self, endpoint: &PeerEndpoint) -> bool {
        self.peers.contains_key(endpoint)
    }

    pub fn get(&self, endpoint: &PeerEndpoint) -> Option<&Peer> {
        self.peers.get(endpoint)
    }

    /// Every registered endpoint, placeholders included.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Peers that completed the node-id handshake.
    pub fn handshaken_count(&self) -> usize {
        self.peers.values().filter(|p| p.is_handshaken()).count()
    }

    pub fn connected(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values().filter(|p| p.is_connected())
    }

    pub fn max_peers(&self) -> usize {
        self.max_peers
    }

    // -- Inbound dispatch ------------------------------------------------------

    pub fn record_message(&mut self, endpoint: &PeerEndpoint, now: Timestamp) {
        if let Some(peer) = self.peers.get_mut(endpoint) {
            peer.messages += 1;
            peer.last_message = Some(now);
        }
    }

    /// Gossip-driven fan-out: reserve every advertised endpoint that is not
    /// already a peer and not the wildcard, and return them for dialing.
    pub fn on_keepalive(&mut self, keepalive: &Keepalive) -> Vec<PeerEndpoint> {
        let mut dial = Vec::new();
        for endpoint in &keepalive.peers {
            if endpoint.is_wildcard() || self.peers.contains_key(endpoint) {
                continue;
            }
            if self.reserve(*endpoint) {
                dial.push(*endpoint);
            }
        }
        dial
    }

    /// Apply the telemetry acceptance rules for an ack from `endpoint`.
    ///
    /// Accepted data is stored and the request stamp cleared; a rejected ack
    /// changes nothing. The verdict is returned either way.
    pub fn on_telemetry(
        &mut self,
        endpoint: &PeerEndpoint,
        telemetry: TelemetryData,
        now: Timestamp,
    ) -> Result<TelemetryVerdict, NetworkError> {
        let peer = self
            .peers
            .get_mut(endpoint)
            .ok_or(NetworkError::PeerNotFound(*endpoint))?;
        let verdict = TelemetryVerdict::evaluate(&telemetry, peer.node_id, peer.last_telemetry_req, now);

        for rejection in verdict.rejections() {
            debug!(peer = %endpoint, reason = rejection.as_str(), "telemetry_ack rejected");
        }
        if !verdict.is_rejected() {
            peer.telemetry = Some(telemetry);
            peer.last_telemetry_req = None;
        }
        Ok(verdict)
    }

    /// Record a confirm_ack and, if the representative carries weight, feed
    /// each hash to the election engine.
    pub fn on_vote(
        &mut self,
        vote: &Vote,
        valid: bool,
        from: PeerEndpoint,
        engine: &mut ElectionEngine,
        now: Timestamp,
    ) -> Result<VoteDispatch, NetworkError> {
        if !valid {
            debug!(peer = %from, rep = %vote.account, "invalid vote received");
            return Ok(VoteDispatch::Invalid);
        }

        let rep = self.representatives.entry(vote.account).or_insert_with(|| {
            debug!(rep = %encode_account(&vote.account), peer = %from, "found new representative");
            Representative::new(vote.account, from)
        });
        rep.votes += 1;
        rep.last_vote = Some(now);

        if !engine.weights().contains(&vote.account) {
            return Ok(VoteDispatch::Unweighted);
        }

        let mut outcomes = Vec::with_capacity(vote.hashes.len());
        for hash in &vote.hashes {
            let outcome = engine.process_vote(*hash, &vote.account, now)?;
            outcomes.push((*hash, outcome));
        }
        Ok(VoteDispatch::Applied(outcomes))
    }

    pub fn representative(&self, account: &Account) -> Option<&Representative> {
        self.representatives.get(account)
    }

    pub fn representatives(&self) -> impl Iterator<Item = &Representative> {
        self.representatives.values()
    }

    // -- Outbound ---------------------------------------------------------------

    /// Queue a frame for one peer. Returns `false` if it is not connected or
    /// its queue is full or closed.
    pub fn send(&self, endpoint: &PeerEndpoint, frame: Vec<u8>) -> bool {
        let Some(sender) = self.peers.get(endpoint).and_then(|p| p.sender.as_ref()) else {
            return false;
        };
        match sender.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(peer = %endpoint, "outbound queue full, frame dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Queue a frame for every connected peer. Returns how many accepted it.
    pub fn broadcast(&self, frame: &[u8]) -> usize {
        let targets: Vec<PeerEndpoint> = self.connected().map(|p| p.endpoint).collect();
        targets
            .iter()
            .filter(|ep| self.send(ep, frame.to_vec()))
            .count()
    }

    /// Connected peers in random order, `max(peer_count, connected)` of them.
    ///
    /// The upper bound means every connected peer is chosen.
    pub fn publish_targets(&self, peer_count: usize) -> Vec<PeerEndpoint> {
        let mut targets: Vec<PeerEndpoint> = self.connected().map(|p| p.endpoint).collect();
        targets.shuffle(&mut rand::thread_rng());
        let size = peer_count.max(targets.len());
        targets.truncate(size);
        targets
    }

    /// Stamp every connected peer with a telemetry request time and queue the
    /// request frame.
    pub fn request_telemetry(&mut self, frame: &[u8], now: Timestamp) -> usize {
        let mut sent = 0;
        for peer in self.peers.values_mut().filter(|p| p.is_connected()) {
            peer.last_telemetry_req = Some(now);
            if let Some(sender) = &peer.sender {
                if sender.try_send(frame.to_vec()).is_ok() {
                    sent += 1;
                }
            }
        }
        sent
    }
}
