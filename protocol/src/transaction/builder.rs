//! Transaction structure and construction via the builder pattern.
//!
//! A [`Transaction`] has three parts, the same split every account-based
//! chain converged on:
//!
//! ```text
//! Transaction
//! ├── body        what to do: messages, memo, timeout, extension options
//! ├── auth_info   who pays and how: signer infos (key + sequence), fee
//! └── signatures  one per signer, in signer order
//! ```
//!
//! The builder does not sign. That happens in [`super::signing`], which
//! keeps construction testable without key material.

use serde::{Deserialize, Serialize};

use super::extension::{ExtensionOption, TypedExtension};
use super::msgs::Message;
use super::types::{Coins, Fee};
use super::verification::TxError;
use crate::crypto::hash::sha256;
use crate::crypto::keys::PublicKey;
use crate::identity::Address;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// The part of a transaction that says what should happen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBody {
    pub messages: Vec<Message>,
    pub memo: String,
    /// Block height after which the transaction is no longer valid.
    /// Zero disables the check.
    pub timeout_height: u64,
    /// Only the first option is ever inspected.
    pub extension_options: Vec<ExtensionOption>,
}

/// Per-signer metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    /// May be omitted once the account has a key on chain.
    pub public_key: Option<PublicKey>,
    /// The sequence the signer believes its account is at.
    pub sequence: u64,
}

/// Signer metadata plus the fee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub signer_infos: Vec<SignerInfo>,
    pub fee: Option<Fee>,
}

/// A NOVA ledger transaction as it enters the admission pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub body: TxBody,
    pub auth_info: AuthInfo,
    pub signatures: Vec<Vec<u8>>,
}

impl Transaction {
    /// Required signers, deduplicated, in the order their messages appear.
    pub fn signers(&self) -> Vec<Address> {
        let mut out: Vec<Address> = Vec::new();
        for signer in self.body.messages.iter().flat_map(Message::signers) {
            if !out.contains(&signer) {
                out.push(signer);
            }
        }
        out
    }

    /// The declared fee, if any.
    pub fn fee(&self) -> Option<&Fee> {
        self.auth_info.fee.as_ref()
    }

    /// Declared gas limit, zero when no fee is present.
    pub fn gas_limit(&self) -> u64 {
        self.fee().map(|f| f.gas_limit).unwrap_or(0)
    }

    /// Default fee payer: the first signer.
    pub fn fee_payer(&self) -> Option<Address> {
        self.signers().into_iter().next()
    }

    /// Canonical binary encoding (bincode). Size gas is charged on this.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TxError> {
        bincode::serialize(self).map_err(|e| TxError::Encoding(e.to_string()))
    }

    /// SHA-256 of the canonical encoding. What operators grep for in logs.
    pub fn hash(&self) -> Result<[u8; 32], TxError> {
        self.to_bytes().map(|bytes| sha256(&bytes))
    }

    /// Hex rendering of [`Transaction::hash`]; empty if encoding fails.
    pub fn hash_hex(&self) -> String {
        self.hash().map(hex::encode).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`Transaction`]s.
///
/// # Usage
///
/// ```rust
/// use nova_admission::identity::Address;
/// use nova_admission::transaction::types::Coins;
/// use nova_admission::transaction::{Message, MsgSend, TransactionBuilder};
///
/// let from = Address::from_bytes([1; 20]);
/// let to = Address::from_bytes([2; 20]);
/// let tx = TransactionBuilder::new()
///     .message(Message::Send(MsgSend { from, to, amount: Coins::single("photon", 5) }))
///     .fee(Coins::single("photon", 10), 200_000)
///     .memo("rent")
///     .build();
///
/// assert_eq!(tx.signers(), vec![from]);
/// assert!(tx.signatures.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    body: TxBody,
    signer_infos: Vec<SignerInfo>,
    fee: Option<Fee>,
}

impl TransactionBuilder {
    /// Empty builder. No fee, no messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub fn message(mut self, msg: Message) -> Self {
        self.body.messages.push(msg);
        self
    }

    /// Sets the memo.
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.body.memo = memo.into();
        self
    }

    /// Sets the timeout height (0 disables).
    pub fn timeout_height(mut self, height: u64) -> Self {
        self.body.timeout_height = height;
        self
    }

    /// Sets the fee and gas limit.
    pub fn fee(mut self, amount: Coins, gas_limit: u64) -> Self {
        self.fee = Some(Fee::new(amount, gas_limit));
        self
    }

    /// Declares a signer. Call once per signer, in [`Transaction::signers`]
    /// order.
    pub fn signer(mut self, public_key: Option<PublicKey>, sequence: u64) -> Self {
        self.signer_infos.push(SignerInfo {
            public_key,
            sequence,
        });
        self
    }

    /// Appends an already packed extension option.
    pub fn extension_option(mut self, option: ExtensionOption) -> Self {
        self.body.extension_options.push(option);
        self
    }

    /// Packs and appends a typed extension option.
    pub fn extension<T: TypedExtension>(self, value: &T) -> Result<Self, TxError> {
        let option = ExtensionOption::pack(value).map_err(|e| TxError::Encoding(e.to_string()))?;
        Ok(self.extension_option(option))
    }

    /// Consumes the builder and produces an unsigned [`Transaction`].
    pub fn build(self) -> Transaction {
        Transaction {
            body: self.body,
            auth_info: AuthInfo {
                signer_infos: self.signer_infos,
                fee: self.fee,
            },
            signatures: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
