//! # Ledger Collaborators
//!
//! The admission pipeline never owns ledger state. It reads accounts and
//! requests mutations through the traits in this module, which the node
//! implements on top of its real store:
//!
//! - [`AccountKeeper`] — accounts (number, sequence, public key) and module
//!   account addresses. Sequence bumps are compare-and-increment: a bump
//!   only lands if the account is still at the sequence its signature was
//!   checked against.
//! - [`BankKeeper`] — balances and transfers. Transfers must be atomic per
//!   call: two concurrent debits of the same account must never both
//!   succeed against a stale balance.
//! - [`PacketVerifier`] — inter-chain packet receipts.
//!
//! [`MemoryLedger`] implements all three in memory. Tests and benches use
//! it; so can a light node that does not persist state.
//!
//! All methods take `&self`: implementations are shared across threads and
//! handle their own locking.

pub mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::keys::PublicKey;
use crate::identity::Address;
use crate::transaction::types::Coins;

pub use memory::{MemoryLedger, TransferRecord};

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A ledger account as the pipeline sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    /// Assigned at creation, never reused. Bound into sign bytes so a
    /// signature cannot be replayed against a re-created account.
    pub account_number: u64,
    /// Replay protection counter, incremented once per admitted transaction.
    pub sequence: u64,
    /// Set the first time the account signs.
    pub pub_key: Option<PublicKey>,
    /// Keccak hash of EVM bytecode for contract accounts.
    pub code_hash: Option<[u8; 32]>,
}

impl Account {
    /// Fresh account with no key and sequence zero.
    pub fn new(address: Address, account_number: u64) -> Self {
        Self {
            address,
            account_number,
            sequence: 0,
            pub_key: None,
            code_hash: None,
        }
    }

    /// Contract accounts cannot sign.
    pub fn is_contract(&self) -> bool {
        self.code_hash.is_some()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Balance transfer failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    /// The sender holds less than requested in some denom.
    #[error("insufficient funds: {address} has {available}{denom}, needs {needed}{denom}")]
    InsufficientFunds {
        address: Address,
        denom: String,
        needed: u128,
        available: u128,
    },

    /// Anything else the store reports.
    #[error("store error: {0}")]
    Store(String),
}

/// Sequence bump failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("account {0} does not exist")]
    UnknownAccount(Address),

    /// The account moved on since the caller read it.
    #[error("account {address} is at sequence {actual}, expected {expected}")]
    Mismatch {
        address: Address,
        expected: u64,
        actual: u64,
    },

    #[error("sequence of account {0} is exhausted")]
    Overflow(Address),
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Account storage.
pub trait AccountKeeper: Send + Sync {
    /// Look up an account.
    fn get_account(&self, address: &Address) -> Option<Account>;

    /// Insert or overwrite an account.
    fn set_account(&self, account: Account);

    /// Create, store and return a new account with the next account number.
    fn new_account(&self, address: &Address) -> Account;

    /// Address of a named module account, if registered.
    fn get_module_address(&self, name: &str) -> Option<Address>;

    /// Atomically move `address` from sequence `expected` to `expected + 1`
    /// and return the new sequence. Fails without writing if the account is
    /// missing, no longer at `expected`, or at `u64::MAX`.
    fn increment_sequence(&self, address: &Address, expected: u64) -> Result<u64, SequenceError>;
}

/// Balances and transfers.
pub trait BankKeeper: Send + Sync {
    /// Balance of `address` in `denom`.
    fn balance(&self, address: &Address, denom: &str) -> u128;

    /// Move `amount` from `from` to `to`, all denoms or nothing.
    fn send_coins(&self, from: &Address, to: &Address, amount: &Coins) -> Result<(), BankError>;
}

/// Inter-chain packet receipts.
pub trait PacketVerifier: Send + Sync {
    /// `true` if the packet `(destination_channel, sequence)` was already
    /// received, which makes relaying it again redundant.
    fn has_packet_receipt(&self, channel: &str, sequence: u64) -> bool;
}
