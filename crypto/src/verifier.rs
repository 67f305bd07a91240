//! The signature-verification capability consumed by the node.
//!
//! Decoders and the peer registry never call the Ed25519 code directly; they
//! go through [`SignatureVerifier`] so tests can swap in a deterministic double.

use lattice_types::{PrivateKey, PublicKey, Signature};

pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool;

    fn public_key(&self, private_key: &PrivateKey) -> PublicKey;
}

/// Production verifier backed by [`crate::verify_signature`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        crate::verify_signature(message, signature, public_key)
    }

    fn public_key(&self, private_key: &PrivateKey) -> PublicKey {
        crate::public_from_private(private_key)
    }
}
