//! Rejection reasons.
//!
//! Every variant is a per-transaction rejection: the transaction is not
//! admitted and the caller discards the context. Node misconfiguration is a
//! separate type, [`ConfigError`](crate::config::ConfigError), and is never
//! produced while handling a transaction.

use thiserror::Error;

use crate::identity::Address;
use crate::ledger::{BankError, SequenceError};
use crate::transaction::{CodecError, TxError};

/// Why a transaction was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnteError {
    // -- Dispatch ----------------------------------------------------------
    /// The transaction lacks the minimal shape (fee, signers).
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    /// The first extension option carries a tag no chain handles.
    #[error("rejecting tx with unsupported extension option: {0}")]
    UnsupportedExtension(String),

    /// An extension option could not be decoded.
    #[error("failed to unpack extension option: {0}")]
    ExtensionDecode(#[from] CodecError),

    // -- Fees --------------------------------------------------------------
    /// The transaction does not expose a fee.
    #[error("transaction is not fee bearing")]
    NotFeeBearing,

    /// The delegated fee payer address does not parse.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The effective fee payer has no account.
    #[error("fee payer address: {0} does not exist")]
    UnknownPayerAccount(Address),

    /// Balance too low for a fee, a gas cost or a transfer.
    #[error("{0}")]
    InsufficientFunds(String),

    /// The ledger store failed.
    #[error("{0}")]
    Store(String),

    /// Offered fee is below the local mempool floor.
    #[error("insufficient fee; got: {offered} required: {required}")]
    InsufficientFee { offered: String, required: String },

    // -- Structure ---------------------------------------------------------
    /// Stateless validation failed.
    #[error(transparent)]
    InvalidTx(#[from] TxError),

    /// Block height is past the transaction's timeout height.
    #[error("block height {height} is greater than timeout height {timeout}")]
    TimeoutHeight { timeout: u64, height: u64 },

    /// Memo longer than allowed.
    #[error("maximum number of characters is {max} but received {got} characters")]
    MemoTooLarge { max: u64, got: u64 },

    /// Too many signer public keys.
    #[error("signatures: {got}, limit: {limit}")]
    TooManySignatures { limit: u64, got: u64 },

    /// A relayed packet was already received.
    #[error("packet rejected: {0}")]
    PacketRejected(String),

    /// A wrapped Ethereum transaction is not acceptable.
    #[error("invalid ethereum tx: {0}")]
    InvalidEthereumTx(String),

    // -- Authentication ----------------------------------------------------
    /// A signer has no account.
    #[error("account {0} does not exist")]
    UnknownAccount(Address),

    /// A public key is missing or does not belong to its signer.
    #[error("invalid public key: {0}")]
    InvalidPubKey(String),

    /// Signer info sequence does not match the account.
    #[error("account sequence mismatch, expected {expected}, got {got}")]
    WrongSequence { expected: u64, got: u64 },

    /// The sequence cannot be incremented any further.
    #[error("sequence of account {0} is exhausted")]
    SequenceOverflow(Address),

    /// Ethereum nonce does not match the account sequence.
    #[error("invalid nonce; got {got}, expected {expected}")]
    InvalidNonce { expected: u64, got: u64 },

    /// A signature or typed-data check failed.
    #[error("signature verification failed: {0}")]
    Verification(String),

    /// Signed for a different chain.
    #[error("invalid chain id; expected {expected}, got {got}")]
    InvalidChainId { expected: u64, got: u64 },

    // -- Containment -------------------------------------------------------
    /// The gas meter ran dry.
    #[error("out of gas in location: {descriptor}; gasWanted: {limit}, gasUsed: {consumed}")]
    OutOfGas {
        descriptor: String,
        limit: u64,
        consumed: u64,
    },

    /// An uncontrolled fault inside a decorator, caught at the boundary.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnteError {
    /// Stable snake_case label for metrics and logs.
    pub fn code(&self) -> &'static str {
        match self {
            AnteError::MalformedTransaction(_) => "malformed_transaction",
            AnteError::UnsupportedExtension(_) => "unsupported_extension",
            AnteError::ExtensionDecode(_) => "extension_decode",
            AnteError::NotFeeBearing => "not_fee_bearing",
            AnteError::InvalidAddress(_) => "invalid_address",
            AnteError::UnknownPayerAccount(_) => "unknown_payer_account",
            AnteError::InsufficientFunds(_) => "insufficient_funds",
            AnteError::Store(_) => "store_error",
            AnteError::InsufficientFee { .. } => "insufficient_fee",
            AnteError::InvalidTx(_) => "invalid_tx",
            AnteError::TimeoutHeight { .. } => "timeout_height",
            AnteError::MemoTooLarge { .. } => "memo_too_large",
            AnteError::TooManySignatures { .. } => "too_many_signatures",
            AnteError::PacketRejected(_) => "packet_rejected",
            AnteError::InvalidEthereumTx(_) => "invalid_ethereum_tx",
            AnteError::UnknownAccount(_) => "unknown_account",
            AnteError::InvalidPubKey(_) => "invalid_pub_key",
            AnteError::WrongSequence { .. } => "wrong_sequence",
            AnteError::SequenceOverflow(_) => "sequence_overflow",
            AnteError::InvalidNonce { .. } => "invalid_nonce",
            AnteError::Verification(_) => "verification_failed",
            AnteError::InvalidChainId { .. } => "invalid_chain_id",
            AnteError::OutOfGas { .. } => "out_of_gas",
            AnteError::Internal(_) => "internal",
        }
    }
}

impl From<BankError> for AnteError {
    fn from(err: BankError) -> Self {
        match err {
            BankError::InsufficientFunds { .. } => AnteError::InsufficientFunds(err.to_string()),
            BankError::Store(msg) => AnteError::Store(msg),
        }
    }
}

/// A bump that lost the race reads like a stale signer sequence: the
/// account is at `actual`, the transaction was checked against `expected`.
impl From<SequenceError> for AnteError {
    fn from(err: SequenceError) -> Self {
        match err {
            SequenceError::UnknownAccount(address) => AnteError::UnknownAccount(address),
            SequenceError::Mismatch {
                expected, actual, ..
            } => AnteError::WrongSequence {
                expected: actual,
                got: expected,
            },
            SequenceError::Overflow(address) => AnteError::SequenceOverflow(address),
        }
    }
}
