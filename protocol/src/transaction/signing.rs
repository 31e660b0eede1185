//! Transaction signing.
//!
//! Signing is a separate step from building because the keypair may not
//! be available at construction time (hardware wallet, remote signer,
//! browser extension). Three flavours:
//!
//! - **Direct** ([`sign_transaction`]): the signer signs
//!   [`sign_bytes`], the canonical encoding of body and auth info bound to a
//!   chain id, account number and sequence.
//! - **EIP-712** ([`sign_eip712`], [`sign_fee_payer_eip712`]): a recoverable
//!   secp256k1 signature over the typed-data digest.
//! - **Ethereum** ([`sign_ethereum_msg`]): a recoverable signature over the
//!   message sighash.

use serde::Serialize;

use super::builder::{AuthInfo, Transaction, TxBody};
use super::msgs::MsgEthereumTx;
use super::typed_data::{tx_digest, TypedDataContext};
use super::verification::TxError;
use crate::crypto::keys::{CryptoError, Keypair};

/// Everything a direct-mode signature commits to.
#[derive(Serialize)]
struct SignDoc<'a> {
    chain_id: &'a str,
    account_number: u64,
    sequence: u64,
    body: &'a TxBody,
    auth_info: &'a AuthInfo,
}

/// Canonical bytes a direct-mode signer signs.
///
/// Binding the chain id and account number prevents replay across chains
/// and across re-created accounts; the sequence prevents replay on the same
/// account.
pub fn sign_bytes(
    chain_id: &str,
    account_number: u64,
    sequence: u64,
    body: &TxBody,
    auth_info: &AuthInfo,
) -> Result<Vec<u8>, TxError> {
    let doc = SignDoc {
        chain_id,
        account_number,
        sequence,
        body,
        auth_info,
    };
    bincode::serialize(&doc).map_err(|e| TxError::Encoding(e.to_string()))
}

/// Sign `tx` in direct mode and append the signature.
///
/// Call once per signer, in [`Transaction::signers`] order.
pub fn sign_transaction(
    tx: &mut Transaction,
    keypair: &Keypair,
    chain_id: &str,
    account_number: u64,
    sequence: u64,
) -> Result<(), TxError> {
    let bytes = sign_bytes(chain_id, account_number, sequence, &tx.body, &tx.auth_info)?;
    tx.signatures.push(keypair.sign(&bytes));
    Ok(())
}

/// Sign `tx` as an EIP-712 typed-data transaction and append the signature.
pub fn sign_eip712(
    tx: &mut Transaction,
    keypair: &Keypair,
    ctx: &TypedDataContext<'_>,
) -> Result<(), SigningError> {
    let digest = tx_digest(tx, ctx)?;
    let sig = keypair.sign_digest_recoverable(&digest)?;
    tx.signatures.push(sig.to_vec());
    Ok(())
}

/// Produce the fee payer's authorisation: a recoverable signature over the
/// same typed-data digest the signer signed. Goes into
/// `ExtensionOptionsWeb3Tx::fee_payer_sig`.
pub fn sign_fee_payer_eip712(
    tx: &Transaction,
    fee_payer: &Keypair,
    ctx: &TypedDataContext<'_>,
) -> Result<Vec<u8>, SigningError> {
    let digest = tx_digest(tx, ctx)?;
    Ok(fee_payer.sign_digest_recoverable(&digest)?.to_vec())
}

/// Sign an Ethereum message in place.
pub fn sign_ethereum_msg(msg: &mut MsgEthereumTx, keypair: &Keypair) -> Result<(), CryptoError> {
    let sig = keypair.sign_digest_recoverable(&msg.sighash())?;
    msg.signature = sig.to_vec();
    Ok(())
}

/// Either the transaction could not be encoded, or the key could not sign.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error(transparent)]
    Tx(#[from] TxError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
