//! # Hashing Utilities
//!
//! The three digests the admission pipeline touches:
//!
//! - **SHA-256** — transaction hashes (what operators grep for in logs) and
//!   the message digest behind native secp256k1 signatures.
//! - **BLAKE3** — address derivation for Ed25519 keys and module accounts.
//!   NOVA-native structures always prefer BLAKE3.
//! - **Keccak-256** — everything Ethereum-shaped: EVM sighashes, EIP-712
//!   typed-data digests, and secp256k1 address derivation. Ethereum picked
//!   pre-standard Keccak, so this is *not* SHA3-256.

use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// Compute the SHA-256 hash and return a fixed-size array.
///
/// # Example
///
/// ```
/// use nova_admission::crypto::sha256;
///
/// let hash = sha256(b"NOVA protocol");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the BLAKE3 hash of the input data.
///
/// ```
/// use nova_admission::crypto::blake3_hash;
///
/// assert_eq!(blake3_hash(b"NOVA protocol").len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute the Keccak-256 hash of the input data.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-256 over the concatenation of several slices, without building the
/// concatenated buffer first. EIP-712 struct hashing is mostly this.
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
