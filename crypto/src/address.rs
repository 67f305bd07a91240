//! Text encoding of account and node-id public keys.
//!
//! Format: prefix + base32(4 zero bits ‖ public_key, 52 chars) + base32(checksum, 8 chars)
//!
//! Checksum: Blake2b-40(public_key), byte-reversed.
//! Base32 alphabet: `13456789abcdefghijkmnopqrstuwxyz` (avoids ambiguous chars).

use blake2::digest::consts::U5;
use blake2::{Blake2b, Digest};
use lattice_types::PublicKey;

/// Base32 alphabet (32 chars, avoids visually ambiguous 0/O, 2/Z, l/I, v).
const BASE32_ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

/// Reverse lookup table: ASCII byte → 5-bit value (0xFF = invalid).
const BASE32_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let alpha = BASE32_ALPHABET;
    let mut i = 0;
    while i < 32 {
        table[alpha[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Number of base32 characters for the public key (4 + 256 bits = 52 × 5).
const PUBKEY_CHARS: usize = 52;
/// Number of base32 characters for the checksum (40 bits = 8 × 5).
const CHECKSUM_CHARS: usize = 8;
/// Zero bits prepended to the key so it splits evenly into 5-bit groups.
const PUBKEY_PAD_BITS: u32 = 4;

const ACCOUNT_PREFIXES: [&str; 2] = ["nano_", "xrb_"];
const NODE_ID_PREFIX: &str = "node_";

/// Encode `bytes` preceded by `pad_bits` zero bits.
fn encode_base32(bytes: &[u8], pad_bits: u32) -> String {
    let total_bits = bytes.len() * 8 + pad_bits as usize;
    let mut result = String::with_capacity(total_bits.div_ceil(5));

    let mut buffer: u64 = 0;
    let mut bits_in_buffer = pad_bits;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u64;
        bits_in_buffer += 8;
        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let idx = ((buffer >> bits_in_buffer) & 0x1F) as usize;
            result.push(BASE32_ALPHABET[idx] as char);
        }
        buffer &= (1u64 << bits_in_buffer) - 1;
    }
    if bits_in_buffer > 0 {
        let idx = ((buffer << (5 - bits_in_buffer)) & 0x1F) as usize;
        result.push(BASE32_ALPHABET[idx] as char);
    }

    result
}

/// Decode a base32 string whose first `pad_bits` bits must be zero.
/// Returns `None` on invalid characters, wrong length or non-zero padding.
fn decode_base32_fixed<const N: usize>(s: &str, pad_bits: u32) -> Option<[u8; N]> {
    if s.len() * 5 != N * 8 + pad_bits as usize {
        return None;
    }

    let mut buffer: u64 = 0;
    let mut bits_in_buffer: u32 = 0;
    let mut skip = pad_bits;
    let mut result = [0u8; N];
    let mut pos = 0;

    for c in s.bytes() {
        let val = *BASE32_DECODE.get(c as usize)?;
        if val == 0xFF {
            return None;
        }
        buffer = (buffer << 5) | val as u64;
        bits_in_buffer += 5;
        if skip > 0 && bits_in_buffer >= skip {
            bits_in_buffer -= skip;
            if buffer >> bits_in_buffer != 0 {
                return None;
            }
            skip = 0;
        }
        while skip == 0 && bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            result[pos] = (buffer >> bits_in_buffer) as u8;
            pos += 1;
        }
        buffer &= (1u64 << bits_in_buffer) - 1;
    }

    Some(result)
}

fn checksum(public_key: &[u8; 32]) -> [u8; 5] {
    let digest = Blake2b::<U5>::digest(public_key);
    let mut out = [0u8; 5];
    out.copy_from_slice(&digest);
    out.reverse();
    out
}

fn encode_with_prefix(prefix: &str, public_key: &PublicKey) -> String {
    format!(
        "{}{}{}",
        prefix,
        encode_base32(public_key.as_bytes(), PUBKEY_PAD_BITS),
        encode_base32(&checksum(public_key.as_bytes()), 0)
    )
}

/// Encode an account public key as `nano_…`.
pub fn encode_account(public_key: &PublicKey) -> String {
    encode_with_prefix(ACCOUNT_PREFIXES[0], public_key)
}

/// Encode a node identity public key as `node_…`.
pub fn encode_node_id(public_key: &PublicKey) -> String {
    encode_with_prefix(NODE_ID_PREFIX, public_key)
}

/// Extract the public key from an encoded account or node id.
///
/// Returns `None` if the text is malformed or has an invalid checksum.
pub fn decode_account(address: &str) -> Option<PublicKey> {
    let encoded = ACCOUNT_PREFIXES
        .iter()
        .chain(std::iter::once(&NODE_ID_PREFIX))
        .find_map(|p| address.strip_prefix(p))?;
    if encoded.len() != PUBKEY_CHARS + CHECKSUM_CHARS {
        return None;
    }

    let key: [u8; 32] = decode_base32_fixed(&encoded[..PUBKEY_CHARS], PUBKEY_PAD_BITS)?;
    let sum: [u8; 5] = decode_base32_fixed(&encoded[PUBKEY_CHARS..], 0)?;
    if sum != checksum(&key) {
        return None;
    }

    Some(PublicKey(key))
}
