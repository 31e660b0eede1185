//! Stateless transaction checks.
//!
//! Everything here can be decided from the transaction bytes alone, without
//! touching the ledger. The checks are ordered from cheapest to most
//! expensive to fail fast on clearly invalid transactions. Signature
//! verification is stateful (it needs account numbers and sequences) and
//! lives in the ante decorators instead.

use thiserror::Error;

use super::builder::Transaction;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Structural problems with a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    /// The transaction carries no messages.
    #[error("transaction has no messages")]
    NoMessages,

    /// A message failed its own stateless checks.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// No fee section at all.
    #[error("transaction has no fee")]
    MissingFee,

    /// Gas limit is zero or above the configured maximum.
    #[error("invalid gas limit {gas}: must be in 1..={max}")]
    InvalidGasLimit { gas: u64, max: u64 },

    /// Unsigned transaction.
    #[error("no signatures supplied")]
    NoSignatures,

    /// Signature count does not match the number of required signers.
    #[error("wrong number of signatures; expected {expected}, got {got}")]
    SignatureCountMismatch { expected: usize, got: usize },

    /// Signer info count does not match the number of required signers.
    #[error("wrong number of signer infos; expected {expected}, got {got}")]
    SignerInfoCountMismatch { expected: usize, got: usize },

    /// A coin string could not be parsed.
    #[error("invalid coins: {0}")]
    InvalidCoins(String),

    /// Canonical encoding failed.
    #[error("encoding error: {0}")]
    Encoding(String),
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

impl Transaction {
    /// Stateless validation of a native (non-EVM) transaction.
    ///
    /// The checks, in order:
    ///
    /// 1. **Messages** — at least one, each passing its own checks.
    /// 2. **Fee** — present, with `0 < gas_limit <= max_gas`.
    /// 3. **Signatures** — present, exactly one per required signer.
    /// 4. **Signer infos** — exactly one per required signer.
    pub fn validate_basic(&self, max_gas: u64) -> Result<(), TxError> {
        if self.body.messages.is_empty() {
            return Err(TxError::NoMessages);
        }
        for msg in &self.body.messages {
            msg.validate_basic()?;
        }

        let fee = self.fee().ok_or(TxError::MissingFee)?;
        if fee.gas_limit == 0 || fee.gas_limit > max_gas {
            return Err(TxError::InvalidGasLimit {
                gas: fee.gas_limit,
                max: max_gas,
            });
        }

        if self.signatures.is_empty() {
            return Err(TxError::NoSignatures);
        }

        let expected = self.signers().len();
        if self.signatures.len() != expected {
            return Err(TxError::SignatureCountMismatch {
                expected,
                got: self.signatures.len(),
            });
        }
        if self.auth_info.signer_infos.len() != expected {
            return Err(TxError::SignerInfoCountMismatch {
                expected,
                got: self.auth_info.signer_infos.len(),
            });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
