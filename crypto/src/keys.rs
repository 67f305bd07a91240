//! Ed25519 key generation with Blake2b-512 key expansion.

use ed25519_dalek::hazmat::ExpandedSecretKey;
use ed25519_dalek::VerifyingKey;
use lattice_types::{KeyPair, PrivateKey, PublicKey};

use crate::error::CryptoError;
use crate::hash::blake2b_512;

/// Fill an array from the operating system's random source.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut bytes = [0u8; N];
    getrandom::getrandom(&mut bytes).map_err(|e| CryptoError::Random(e.to_string()))?;
    Ok(bytes)
}

/// Generate a new key pair from a secure random source.
pub fn generate_keypair() -> Result<KeyPair, CryptoError> {
    let private = PrivateKey(random_bytes::<32>()?);
    Ok(keypair_from_private(private))
}

pub(crate) fn expand(private: &PrivateKey) -> ExpandedSecretKey {
    ExpandedSecretKey::from_bytes(&blake2b_512(&private.0))
}

/// Derive the public key from a private key.
pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    let verifying_key = VerifyingKey::from(&expand(private));
    PublicKey(verifying_key.to_bytes())
}

/// Reconstruct a full key pair from a private key.
pub fn keypair_from_private(private: PrivateKey) -> KeyPair {
    let public = public_from_private(&private);
    KeyPair { public, private }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_valid_keypair() {
        let kp = generate_keypair().unwrap();
        assert_ne!(kp.public.0, [0u8; 32]);
        assert_eq!(public_from_private(&kp.private), kp.public);
    }

    #[test]
    fn zero_key_matches_known_public_key() {
        // Well-known Blake2b-flavoured Ed25519 vector for the all-zero private key.
        let public = public_from_private(&PrivateKey([0u8; 32]));
        assert_eq!(
            hex::encode_upper(public.0),
            "19D3D919475DEED4696B5D13018151D1AF88B2BD3BCFF048B45031C1F36D1858"
        );
    }

    #[test]
    fn random_bytes_differ() {
        let a = random_bytes::<32>().unwrap();
        let b = random_bytes::<32>().unwrap();
        assert_ne!(a, b);
    }
}
