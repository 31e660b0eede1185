//! EIP-712 typed-data hashing for web3-signed transactions.
//!
//! A browser wallet cannot sign NOVA's binary sign bytes in a way the user
//! can read, but it can sign EIP-712 typed data. A web3 transaction is a
//! normal native transaction whose signature covers this digest instead:
//!
//! ```text
//! digest = keccak256(0x19 0x01 || domainSeparator || hashStruct(Tx))
//!
//! EIP712Domain(string name,string version,uint256 chainId,string verifyingContract)
//! Tx(uint256 account_number,string chain_id,Fee fee,string memo,string msgs,uint256 sequence,uint256 timeout_height)
//! Fee(address feePayer,string amount,uint256 gas)
//! ```
//!
//! `msgs` is the JSON rendering of the message list, so the wallet shows
//! the user something legible. `feePayer` is always set (the first signer
//! when nobody else pays), so the signer commits to who is charged.

use super::builder::Transaction;
use super::verification::TxError;
use crate::config::{EIP712_DOMAIN_NAME, EIP712_DOMAIN_VERSION, EIP712_VERIFYING_CONTRACT};
use crate::crypto::hash::{keccak256, keccak256_concat};
use crate::identity::Address;

const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,string verifyingContract)";
const FEE_TYPE: &str = "Fee(address feePayer,string amount,uint256 gas)";
const TX_TYPE: &str = "Tx(uint256 account_number,string chain_id,Fee fee,string memo,string msgs,uint256 sequence,uint256 timeout_height)";

/// Everything the typed-data digest commits to besides the transaction
/// itself.
#[derive(Debug, Clone, Copy)]
pub struct TypedDataContext<'a> {
    /// Native chain id string.
    pub chain_id: &'a str,
    /// EVM chain id placed in the domain.
    pub evm_chain_id: u64,
    /// Signer's account number.
    pub account_number: u64,
    /// Signer's sequence.
    pub sequence: u64,
    /// Who pays the fee.
    pub fee_payer: Address,
}

fn uint256(value: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[24..].copy_from_slice(&value.to_be_bytes());
    out
}

fn address_word(addr: &Address) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[12..].copy_from_slice(addr.as_bytes());
    out
}

/// `hashStruct(EIP712Domain)` for the given EVM chain id.
pub fn domain_separator(evm_chain_id: u64) -> [u8; 32] {
    keccak256_concat(&[
        &keccak256(DOMAIN_TYPE.as_bytes()),
        &keccak256(EIP712_DOMAIN_NAME.as_bytes()),
        &keccak256(EIP712_DOMAIN_VERSION.as_bytes()),
        &uint256(evm_chain_id),
        &keccak256(EIP712_VERIFYING_CONTRACT.as_bytes()),
    ])
}

fn hash_fee(tx: &Transaction, fee_payer: &Address) -> Result<[u8; 32], TxError> {
    let fee = tx.fee().ok_or(TxError::MissingFee)?;
    Ok(keccak256_concat(&[
        &keccak256(FEE_TYPE.as_bytes()),
        &address_word(fee_payer),
        &keccak256(fee.amount.to_string().as_bytes()),
        &uint256(fee.gas_limit),
    ]))
}

fn hash_tx(tx: &Transaction, ctx: &TypedDataContext<'_>) -> Result<[u8; 32], TxError> {
    let msgs = serde_json::to_string(&tx.body.messages)
        .map_err(|e| TxError::Encoding(e.to_string()))?;
    let type_hash = keccak256(format!("{}{}", TX_TYPE, FEE_TYPE).as_bytes());

    Ok(keccak256_concat(&[
        &type_hash,
        &uint256(ctx.account_number),
        &keccak256(ctx.chain_id.as_bytes()),
        &hash_fee(tx, &ctx.fee_payer)?,
        &keccak256(tx.body.memo.as_bytes()),
        &keccak256(msgs.as_bytes()),
        &uint256(ctx.sequence),
        &uint256(tx.body.timeout_height),
    ]))
}

/// The 32-byte digest a web3 wallet signs for `tx`.
pub fn tx_digest(tx: &Transaction, ctx: &TypedDataContext<'_>) -> Result<[u8; 32], TxError> {
    let domain = domain_separator(ctx.evm_chain_id);
    let message = hash_tx(tx, ctx)?;
    Ok(keccak256_concat(&[&[0x19, 0x01], &domain, &message]))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::msgs::{Message, MsgSend};
    use crate::transaction::types::Coins;

    fn tx() -> Transaction {
        TransactionBuilder::new()
            .message(Message::Send(MsgSend {
                from: Address::from_bytes([1; 20]),
                to: Address::from_bytes([2; 20]),
                amount: Coins::single("photon", 3),
            }))
            .fee(Coins::single("photon", 10), 150_000)
            .memo("coffee")
            .build()
    }

    fn ctx(fee_payer: u8) -> TypedDataContext<'static> {
        TypedDataContext {
            chain_id: "nova-test-1",
            evm_chain_id: 9_740,
            account_number: 4,
            sequence: 2,
            fee_payer: Address::from_bytes([fee_payer; 20]),
        }
    }

    #[test]
    fn uint256_is_big_endian_left_padded() {
        let word = uint256(0x0102);
        assert_eq!(&word[..30], &[0u8; 30]);
        assert_eq!(&word[30..], &[0x01, 0x02]);
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(tx_digest(&tx(), &ctx(1)).unwrap(), tx_digest(&tx(), &ctx(1)).unwrap());
    }

    #[test]
    fn digest_commits_to_fee_payer_and_domain() {
        let base = tx_digest(&tx(), &ctx(1)).unwrap();
        assert_ne!(base, tx_digest(&tx(), &ctx(7)).unwrap());

        let mut other_chain = ctx(1);
        other_chain.evm_chain_id = 1;
        assert_ne!(base, tx_digest(&tx(), &other_chain).unwrap());

        let mut later = ctx(1);
        later.sequence += 1;
        assert_ne!(base, tx_digest(&tx(), &later).unwrap());
    }

    #[test]
    fn digest_commits_to_memo() {
        let mut changed = tx();
        changed.body.memo = "tea".into();
        assert_ne!(
            tx_digest(&tx(), &ctx(1)).unwrap(),
            tx_digest(&changed, &ctx(1)).unwrap()
        );
    }

    #[test]
    fn missing_fee_is_an_error() {
        let mut no_fee = tx();
        no_fee.auth_info.fee = None;
        assert_eq!(tx_digest(&no_fee, &ctx(1)), Err(TxError::MissingFee));
    }

    #[test]
    fn domain_separator_depends_on_chain_id() {
        assert_ne!(domain_separator(1), domain_separator(9_740));
    }
}
