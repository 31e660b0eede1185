//! # Cryptographic Primitives
//!
//! Everything the admission pipeline needs to check who signed what:
//!
//! - **hash** — SHA-256, BLAKE3, Keccak-256.
//! - **keys** — [`PublicKey`] / [`Keypair`] for Ed25519 and secp256k1.
//! - **ecdsa** — recoverable secp256k1 signatures, Ethereum style.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper around audited
//! implementations (`ed25519-dalek`, `k256`, `sha2`, `sha3`, `blake3`).

pub mod ecdsa;
pub mod hash;
pub mod keys;

pub use ecdsa::{recover_address, RECOVERABLE_SIGNATURE_LENGTH};
pub use hash::{blake3_hash, keccak256, keccak256_concat, sha256};
pub use keys::{CryptoError, Keypair, PublicKey};
