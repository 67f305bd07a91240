//! Node-id handshake: prove control of the node key by signing the peer's cookie.
//!
//! The dialing side sends a query as soon as the socket opens. The accepting
//! side stays silent until the first message, so a bootstrap client that
//! opens a connection only to send bulk_pull or frontier_req receives nothing
//! but the stream it asked for. When that first message carries a query, the
//! acceptor answers with its own query and its response in one message.

use lattice_crypto::{random_bytes, sign_message, SignatureVerifier};
use lattice_messages::handshake::COOKIE_SIZE;
use lattice_messages::{HandshakeResponse, NodeIdHandshake};
use lattice_types::{KeyPair, PublicKey, Signature};

use crate::NodeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Verified(PublicKey),
    /// A response arrived but no query of ours is outstanding.
    Unsolicited,
}

/// Per-connection handshake state.
#[derive(Debug, Default)]
pub struct HandshakeSession {
    cookie: Option<[u8; COOKIE_SIZE]>,
    node_id: Option<PublicKey>,
}

impl HandshakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_id(&self) -> Option<PublicKey> {
        self.node_id
    }

    pub fn is_complete(&self) -> bool {
        self.node_id.is_some()
    }

    /// Whether a query of ours has gone out on this connection.
    pub fn has_queried(&self) -> bool {
        self.cookie.is_some()
    }

    /// A fresh query. The cookie is kept to check the peer's response.
    pub fn query(&mut self) -> Result<NodeIdHandshake, NodeError> {
        let cookie = random_bytes::<COOKIE_SIZE>()?;
        self.cookie = Some(cookie);
        Ok(NodeIdHandshake {
            query: Some(cookie),
            response: None,
        })
    }

    /// Sign a peer's cookie with the node key.
    pub fn respond(cookie: &[u8; COOKIE_SIZE], node_key: &KeyPair) -> HandshakeResponse {
        let mut response = HandshakeResponse {
            node_id: node_key.public,
            signature: Signature([0; 64]),
            v2: None,
        };
        response.signature = sign_message(&response.signed_payload(cookie), &node_key.private);
        response
    }

    /// Check a response against our outstanding cookie.
    ///
    /// A bad signature is an error and the connection must be closed.
    pub fn verify(
        &mut self,
        response: &HandshakeResponse,
        verifier: &dyn SignatureVerifier,
    ) -> Result<HandshakeOutcome, NodeError> {
        let Some(cookie) = self.cookie.take() else {
            return Ok(HandshakeOutcome::Unsolicited);
        };
        let payload = response.signed_payload(&cookie);
        if !verifier.verify(&response.node_id, &payload, &response.signature) {
            return Err(NodeError::InvalidHandshake(format!(
                "bad cookie signature from {}",
                response.node_id
            )));
        }
        self.node_id = Some(response.node_id);
        Ok(HandshakeOutcome::Verified(response.node_id))
    }
}
