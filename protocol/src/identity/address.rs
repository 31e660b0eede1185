//! # Account Addresses
//!
//! Every account on the ledger is keyed by a 20-byte address. The width is
//! shared with Ethereum on purpose: an EVM sender, an EIP-712 signer and a
//! native Ed25519 signer all live in the same account space, so a balance
//! funded through one protocol can pay fees through another.
//!
//! The human-facing form is Bech32 with the `nova` prefix:
//!
//! ```text
//! key material
//!     Ed25519   -> BLAKE3(pubkey)[..20]
//!     secp256k1 -> Keccak256(uncompressed pubkey)[12..]
//!     module    -> BLAKE3("module:" || name)[..20]
//!         -> Bech32("nova", 20 bytes) -> nova1...
//! ```

use std::fmt;
use std::str::FromStr;

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ADDRESS_HRP;
use crate::crypto::hash::blake3_hash;

/// Address length in bytes.
pub const ADDRESS_LENGTH: usize = 20;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while parsing an address string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The string is empty.
    #[error("empty address string")]
    Empty,

    /// The Bech32 string could not be decoded (bad charset or checksum).
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The decoded address has an unexpected human-readable prefix.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp {
        /// The expected HRP.
        expected: String,
        /// The HRP that was actually found.
        got: String,
    },

    /// The decoded payload has the wrong length.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A ledger account address.
///
/// # Examples
///
/// ```
/// use nova_admission::identity::Address;
///
/// let addr = Address::from_bytes([7u8; 20]);
/// let encoded = addr.to_bech32();
/// assert!(encoded.starts_with("nova1"));
/// assert_eq!(Address::from_bech32(&encoded).unwrap(), addr);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Wrap raw address bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Build an address from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        let arr: [u8; ADDRESS_LENGTH] =
            bytes.try_into().map_err(|_| AddressError::InvalidLength {
                expected: ADDRESS_LENGTH,
                got: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Deterministic address of a named module account (fee collector,
    /// distribution, ...). Nobody holds a key for these.
    pub fn for_module(name: &str) -> Self {
        let digest = blake3_hash(format!("module:{}", name).as_bytes());
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&digest[..ADDRESS_LENGTH]);
        Self(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Parse a Bech32 `nova1...` address.
    ///
    /// Validates the checksum, the HRP and the payload length.
    pub fn from_bech32(s: &str) -> Result<Self, AddressError> {
        if s.trim().is_empty() {
            return Err(AddressError::Empty);
        }

        let (hrp, data) =
            bech32::decode(s).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;

        if hrp != nova_hrp() {
            return Err(AddressError::InvalidHrp {
                expected: ADDRESS_HRP.to_string(),
                got: hrp.to_string(),
            });
        }

        Self::from_slice(&data)
    }

    /// Encode as a Bech32 `nova1...` string.
    pub fn to_bech32(&self) -> String {
        self.to_string()
    }

    /// Ethereum-style `0x`-prefixed hex rendering.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

fn nova_hrp() -> Hrp {
    Hrp::parse_unchecked(ADDRESS_HRP)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        bech32::encode_to_fmt::<Bech32, _>(f, nova_hrp(), &self.0).map_err(|_| fmt::Error)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
