//! # In-Memory Ledger
//!
//! A flat `HashMap` ledger behind one `parking_lot::RwLock`. Every mutation
//! takes the write lock for its whole check-then-apply, so concurrent
//! transfers from the same account serialize and a stale balance can never
//! be spent twice.
//!
//! Every successful transfer is also appended to a journal. Tests use it
//! to prove that the pipeline moved exactly what it should have, and
//! nothing else.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::{Account, AccountKeeper, BankError, BankKeeper, PacketVerifier, SequenceError};
use crate::identity::Address;
use crate::transaction::types::Coins;

/// One entry in the transfer journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub from: Address,
    pub to: Address,
    pub amount: Coins,
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<Address, Account>,
    balances: HashMap<Address, BTreeMap<String, u128>>,
    modules: HashMap<String, Address>,
    packet_receipts: HashSet<(String, u64)>,
    journal: Vec<TransferRecord>,
    next_account_number: u64,
}

impl LedgerState {
    fn create_account(&mut self, address: Address) -> Account {
        let account = Account::new(address, self.next_account_number);
        self.next_account_number += 1;
        self.accounts.insert(address, account.clone());
        account
    }
}

/// Thread-safe in-memory implementation of every ledger collaborator.
#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    /// Empty ledger. No modules registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module account (fee collector and friends) and return its
    /// address. Idempotent.
    pub fn register_module(&self, name: &str) -> Address {
        let mut state = self.state.write();
        if let Some(addr) = state.modules.get(name) {
            return *addr;
        }
        let addr = Address::for_module(name);
        state.modules.insert(name.to_string(), addr);
        if !state.accounts.contains_key(&addr) {
            state.create_account(addr);
        }
        addr
    }

    /// Create an account if it does not exist yet and return it.
    pub fn ensure_account(&self, address: &Address) -> Account {
        let mut state = self.state.write();
        match state.accounts.get(address) {
            Some(existing) => existing.clone(),
            None => state.create_account(*address),
        }
    }

    /// Mint `amount` into `address` out of thin air. Genesis and tests only.
    pub fn fund(&self, address: &Address, amount: &Coins) {
        let mut state = self.state.write();
        if !state.accounts.contains_key(address) {
            state.create_account(*address);
        }
        let balances = state.balances.entry(*address).or_default();
        for coin in amount.iter() {
            let entry = balances.entry(coin.denom.clone()).or_insert(0);
            *entry = entry.saturating_add(coin.amount);
        }
    }

    /// Record that a packet arrived on `channel` with `sequence`.
    pub fn record_packet_receipt(&self, channel: &str, sequence: u64) {
        self.state
            .write()
            .packet_receipts
            .insert((channel.to_string(), sequence));
    }

    /// Every successful transfer so far, oldest first.
    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.state.read().journal.clone()
    }

    /// Number of accounts, module accounts included.
    pub fn account_count(&self) -> usize {
        self.state.read().accounts.len()
    }
}

impl AccountKeeper for MemoryLedger {
    fn get_account(&self, address: &Address) -> Option<Account> {
        self.state.read().accounts.get(address).cloned()
    }

    fn set_account(&self, account: Account) {
        self.state.write().accounts.insert(account.address, account);
    }

    fn new_account(&self, address: &Address) -> Account {
        self.state.write().create_account(*address)
    }

    fn get_module_address(&self, name: &str) -> Option<Address> {
        self.state.read().modules.get(name).copied()
    }

    fn increment_sequence(&self, address: &Address, expected: u64) -> Result<u64, SequenceError> {
        let mut state = self.state.write();
        let account = state
            .accounts
            .get_mut(address)
            .ok_or(SequenceError::UnknownAccount(*address))?;
        if account.sequence != expected {
            return Err(SequenceError::Mismatch {
                address: *address,
                expected,
                actual: account.sequence,
            });
        }
        account.sequence = expected
            .checked_add(1)
            .ok_or(SequenceError::Overflow(*address))?;
        Ok(account.sequence)
    }
}

impl BankKeeper for MemoryLedger {
    fn balance(&self, address: &Address, denom: &str) -> u128 {
        self.state
            .read()
            .balances
            .get(address)
            .and_then(|b| b.get(denom))
            .copied()
            .unwrap_or(0)
    }

    fn send_coins(&self, from: &Address, to: &Address, amount: &Coins) -> Result<(), BankError> {
        let mut state = self.state.write();

        // Check every denom before touching anything.
        for coin in amount.iter() {
            let available = state
                .balances
                .get(from)
                .and_then(|b| b.get(&coin.denom))
                .copied()
                .unwrap_or(0);
            if available < coin.amount {
                return Err(BankError::InsufficientFunds {
                    address: *from,
                    denom: coin.denom.clone(),
                    needed: coin.amount,
                    available,
                });
            }
            if from != to {
                let held = state
                    .balances
                    .get(to)
                    .and_then(|b| b.get(&coin.denom))
                    .copied()
                    .unwrap_or(0);
                if held.checked_add(coin.amount).is_none() {
                    return Err(BankError::Store(format!(
                        "balance overflow for {} in {}",
                        to, coin.denom
                    )));
                }
            }
        }

        if from != to {
            for coin in amount.iter() {
                let sender = state.balances.entry(*from).or_default();
                let entry = sender.entry(coin.denom.clone()).or_insert(0);
                *entry -= coin.amount;

                let recipient = state.balances.entry(*to).or_default();
                let entry = recipient.entry(coin.denom.clone()).or_insert(0);
                *entry += coin.amount;
            }
            if !state.accounts.contains_key(to) {
                state.create_account(*to);
            }
        }

        state.journal.push(TransferRecord {
            from: *from,
            to: *to,
            amount: amount.clone(),
        });
        Ok(())
    }
}

impl PacketVerifier for MemoryLedger {
    fn has_packet_receipt(&self, channel: &str, sequence: u64) -> bool {
        self.state
            .read()
            .packet_receipts
            .contains(&(channel.to_string(), sequence))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
