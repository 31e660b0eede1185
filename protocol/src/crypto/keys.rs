//! # Key Management
//!
//! The admission pipeline accepts two signature schemes:
//!
//! - **Ed25519** — the native NOVA scheme. Deterministic, fast, no nonce
//!   footguns.
//! - **secp256k1** — what every Ethereum wallet speaks. Native transactions
//!   may be signed with it (ECDSA over SHA-256), and it is the only scheme
//!   for EVM and EIP-712 transactions (recoverable ECDSA over Keccak-256,
//!   see [`super::ecdsa`]).
//!
//! [`PublicKey`] is what travels inside a transaction and sits in an account.
//! [`Keypair`] is the signing side; the pipeline itself never holds one, but
//! wallets, tests and benches do.
//!
//! Key bytes are never logged.

use ed25519_dalek::{Signer as _, Verifier as _};
use k256::ecdsa::signature::{Signer as _, Verifier as _};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::ecdsa;
use super::hash::blake3_hash;
use crate::identity::{Address, ADDRESS_LENGTH};

/// Errors that can occur during key operations.
///
/// Messages never include key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("invalid public key bytes")]
    InvalidPublicKey,

    #[error("invalid signature encoding")]
    InvalidSignature,

    #[error("signature is malleable (high-s)")]
    MalleableSignature,

    #[error("public key recovery failed")]
    RecoveryFailed,

    #[error("operation requires a secp256k1 key")]
    UnsupportedKeyType,

    #[error("signing failed")]
    SigningFailed,
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// A signer's public key as carried in signer infos and accounts.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicKey {
    /// 32-byte Ed25519 verifying key.
    Ed25519([u8; 32]),
    /// 33-byte SEC1-compressed secp256k1 point.
    Secp256k1(Vec<u8>),
}

impl PublicKey {
    /// Short scheme name, for logs and gas descriptors.
    pub fn scheme(&self) -> &'static str {
        match self {
            PublicKey::Ed25519(_) => "ed25519",
            PublicKey::Secp256k1(_) => "secp256k1",
        }
    }

    /// Derive the account address controlled by this key.
    ///
    /// Ed25519 keys hash with BLAKE3 (NOVA-native), secp256k1 keys hash the
    /// uncompressed point with Keccak-256 so the address matches what an
    /// Ethereum wallet shows for the same key.
    pub fn address(&self) -> Result<Address, CryptoError> {
        match self {
            PublicKey::Ed25519(bytes) => Ok(ed25519_address(bytes)),
            PublicKey::Secp256k1(bytes) => {
                let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
                    .map_err(|_| CryptoError::InvalidPublicKey)?;
                Ok(ecdsa::address_from_verifying_key(&key))
            }
        }
    }

    /// Verify a native-mode signature over `message`.
    ///
    /// Returns `false` for any malformed input. No panics, no partial
    /// decoding tricks.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match self {
            PublicKey::Ed25519(bytes) => {
                let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(bytes) else {
                    return false;
                };
                let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
                    return false;
                };
                key.verify(message, &sig).is_ok()
            }
            PublicKey::Secp256k1(bytes) => {
                let Ok(key) = k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes) else {
                    return false;
                };
                let Ok(sig) = k256::ecdsa::Signature::from_slice(signature) else {
                    return false;
                };
                // Reject high-s encodings so a signature has exactly one valid form.
                if sig.normalize_s().is_some() {
                    return false;
                }
                key.verify(message, &sig).is_ok()
            }
        }
    }
}

fn ed25519_address(key: &[u8; 32]) -> Address {
    let digest = blake3_hash(key);
    let mut out = [0u8; ADDRESS_LENGTH];
    out.copy_from_slice(&digest[..ADDRESS_LENGTH]);
    Address::from_bytes(out)
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicKey::Ed25519(bytes) => write!(f, "PublicKey::Ed25519({})", hex::encode(bytes)),
            PublicKey::Secp256k1(bytes) => {
                write!(f, "PublicKey::Secp256k1({})", hex::encode(bytes))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// Signing key for either supported scheme.
///
/// Deliberately not `Serialize`. Exporting secret material should be a
/// conscious act, not a side effect of shoving a struct into JSON.
pub enum Keypair {
    Ed25519(ed25519_dalek::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

impl Keypair {
    /// Fresh Ed25519 keypair from the OS RNG.
    pub fn generate_ed25519() -> Self {
        Keypair::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng))
    }

    /// Fresh secp256k1 keypair from the OS RNG.
    pub fn generate_secp256k1() -> Self {
        Keypair::Secp256k1(k256::ecdsa::SigningKey::random(&mut OsRng))
    }

    /// Deterministic Ed25519 keypair. Only as strong as the seed.
    pub fn ed25519_from_seed(seed: &[u8; 32]) -> Self {
        Keypair::Ed25519(ed25519_dalek::SigningKey::from_bytes(seed))
    }

    /// Deterministic secp256k1 keypair. Fails if the seed is not a valid
    /// scalar (zero or above the curve order).
    pub fn secp256k1_from_seed(seed: &[u8; 32]) -> Result<Self, CryptoError> {
        k256::ecdsa::SigningKey::from_slice(seed)
            .map(Keypair::Secp256k1)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// The public half.
    pub fn public_key(&self) -> PublicKey {
        match self {
            Keypair::Ed25519(key) => PublicKey::Ed25519(key.verifying_key().to_bytes()),
            Keypair::Secp256k1(key) => PublicKey::Secp256k1(
                key.verifying_key().to_encoded_point(true).as_bytes().to_vec(),
            ),
        }
    }

    /// Address controlled by this keypair.
    pub fn address(&self) -> Address {
        match self {
            Keypair::Ed25519(key) => ed25519_address(&key.verifying_key().to_bytes()),
            Keypair::Secp256k1(key) => ecdsa::address_from_verifying_key(key.verifying_key()),
        }
    }

    /// Native-mode signature over `message`.
    ///
    /// Ed25519 signs the message directly; secp256k1 produces a 64-byte
    /// low-s ECDSA signature over SHA-256(message).
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            Keypair::Ed25519(key) => key.sign(message).to_bytes().to_vec(),
            Keypair::Secp256k1(key) => {
                let sig: k256::ecdsa::Signature = key.sign(message);
                sig.to_bytes().to_vec()
            }
        }
    }

    /// 65-byte recoverable signature over a 32-byte digest (EVM and EIP-712).
    pub fn sign_digest_recoverable(&self, digest: &[u8; 32]) -> Result<[u8; 65], CryptoError> {
        match self {
            Keypair::Secp256k1(key) => ecdsa::sign_recoverable(key, digest),
            Keypair::Ed25519(_) => Err(CryptoError::UnsupportedKeyType),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret material, not even in debug builds.
        write!(f, "Keypair({:?})", self.public_key())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
