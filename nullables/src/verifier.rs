//! Nullable signature verifier with a fixed verdict.

use lattice_crypto::SignatureVerifier;
use lattice_types::{PrivateKey, PublicKey, Signature};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A verifier that answers every check the same way and counts the calls.
///
/// `public_key` returns the private key bytes unchanged, so tests can pick
/// node ids directly.
#[derive(Debug)]
pub struct NullVerifier {
    accept: bool,
    calls: AtomicUsize,
}

impl NullVerifier {
    pub fn accept_all() -> Self {
        Self {
            accept: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn reject_all() -> Self {
        Self {
            accept: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `verify` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SignatureVerifier for NullVerifier {
    fn verify(&self, _public_key: &PublicKey, _message: &[u8], _signature: &Signature) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.accept
    }

    fn public_key(&self, private_key: &PrivateKey) -> PublicKey {
        PublicKey(private_key.0)
    }
}
