//! # Identity Module
//!
//! Account identifiers. Every participant on the ledger, human or module, is
//! a 20-byte [`Address`] rendered as Bech32 with the `nova` HRP
//! (human-readable, checksummed, hard to fat-finger).
//!
//! ## Design Decisions
//!
//! - Bech32 (not Bech32m) for addresses. We encode raw key hashes, not
//!   witness programs, and Bech32's error detection is enough for that.
//! - The same address space serves native Ed25519 signers and Ethereum
//!   keys, so a delegated fee payer can be either.

pub mod address;

pub use address::{Address, AddressError, ADDRESS_LENGTH};
