//! # Recoverable ECDSA (secp256k1)
//!
//! Ethereum-style signatures are 65 bytes, `r || s || v`, over a 32-byte
//! Keccak digest. The verifier never needs the public key up front: it
//! recovers the key from the signature and compares the derived address with
//! the one the transaction claims.
//!
//! - `v` may be `0/1` or the legacy `27/28`.
//! - High-s signatures are rejected (EIP-2); every signature has exactly one
//!   valid encoding.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

use super::hash::keccak256;
use super::keys::CryptoError;
use crate::identity::{Address, ADDRESS_LENGTH};

/// Length of a recoverable signature.
pub const RECOVERABLE_SIGNATURE_LENGTH: usize = 65;

/// Derive the Ethereum address of a secp256k1 key:
/// `Keccak256(uncompressed_point[1..])[12..]`.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; ADDRESS_LENGTH];
    out.copy_from_slice(&hash[12..]);
    Address::from_bytes(out)
}

/// Sign a 32-byte digest and return `r || s || v` with `v` in `{27, 28}`.
pub fn sign_recoverable(key: &SigningKey, digest: &[u8; 32]) -> Result<[u8; 65], CryptoError> {
    let (sig, recid) = key
        .sign_prehash_recoverable(digest)
        .map_err(|_| CryptoError::SigningFailed)?;

    // k256 already emits low-s, but normalize anyway and flip the parity bit
    // if we had to, so the output is always verifiable by `recover_address`.
    let (sig, recid) = match sig.normalize_s() {
        Some(normalized) => (
            normalized,
            RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced()),
        ),
        None => (sig, recid),
    };

    let mut out = [0u8; RECOVERABLE_SIGNATURE_LENGTH];
    out[..64].copy_from_slice(&sig.to_bytes());
    out[64] = recid.to_byte() + 27;
    Ok(out)
}

/// Recover the signer address from a 65-byte signature over `digest`.
pub fn recover_address(digest: &[u8; 32], signature: &[u8]) -> Result<Address, CryptoError> {
    if signature.len() != RECOVERABLE_SIGNATURE_LENGTH {
        return Err(CryptoError::InvalidSignature);
    }

    let sig = Signature::from_slice(&signature[..64]).map_err(|_| CryptoError::InvalidSignature)?;
    if sig.normalize_s().is_some() {
        return Err(CryptoError::MalleableSignature);
    }

    let v = match signature[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - 27,
        _ => return Err(CryptoError::InvalidSignature),
    };
    let recid = RecoveryId::from_byte(v).ok_or(CryptoError::InvalidSignature)?;

    let key = VerifyingKey::recover_from_prehash(digest, &sig, recid)
        .map_err(|_| CryptoError::RecoveryFailed)?;
    Ok(address_from_verifying_key(&key))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
