//! Messages: the state transitions a transaction asks for.
//!
//! The admission pipeline does not execute messages, it only needs to know
//! who must sign them, whether they are well formed, and (for Ethereum
//! messages) what they cost.

use serde::{Deserialize, Serialize};

use super::types::Coins;
use super::verification::TxError;
use crate::crypto::hash::keccak256;
use crate::crypto::ecdsa::RECOVERABLE_SIGNATURE_LENGTH;
use crate::identity::Address;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Every message kind the ledger understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Plain bank transfer.
    Send(MsgSend),
    /// An Ethereum transaction wrapped for the native ledger.
    EthereumTx(MsgEthereumTx),
    /// Inbound inter-chain packet relayed by `signer`.
    RecvPacket(MsgRecvPacket),
}

impl Message {
    /// Stable type name, used in logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Message::Send(_) => "send",
            Message::EthereumTx(_) => "ethereum_tx",
            Message::RecvPacket(_) => "recv_packet",
        }
    }

    /// Addresses that must authorize this message.
    pub fn signers(&self) -> Vec<Address> {
        match self {
            Message::Send(msg) => vec![msg.from],
            Message::EthereumTx(msg) => vec![msg.from],
            Message::RecvPacket(msg) => vec![msg.signer],
        }
    }

    /// Stateless checks.
    pub fn validate_basic(&self) -> Result<(), TxError> {
        match self {
            Message::Send(msg) => msg.validate_basic(),
            Message::EthereumTx(msg) => msg.validate_basic(),
            Message::RecvPacket(msg) => msg.validate_basic(),
        }
    }
}

// ---------------------------------------------------------------------------
// MsgSend
// ---------------------------------------------------------------------------

/// Move `amount` from `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSend {
    pub from: Address,
    pub to: Address,
    pub amount: Coins,
}

impl MsgSend {
    fn validate_basic(&self) -> Result<(), TxError> {
        if self.amount.is_zero() {
            return Err(TxError::InvalidMessage("send amount must be positive".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MsgEthereumTx
// ---------------------------------------------------------------------------

/// A legacy (EIP-155) Ethereum transaction.
///
/// `signature` is the 65-byte recoverable signature over [`Self::sighash`].
/// The declared `from` is never trusted on its own: the EVM signature
/// decorator recovers the signer and compares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgEthereumTx {
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub nonce: u64,
    /// Price per unit of gas, in the EVM denom.
    pub gas_price: u128,
    pub gas_limit: u64,
    pub value: u128,
    pub data: Vec<u8>,
    pub chain_id: u64,
    pub signature: Vec<u8>,
}

impl MsgEthereumTx {
    /// Canonical byte representation that gets signed.
    ///
    /// Fixed-width little-endian integers and length-prefixed byte fields.
    /// `from` and `signature` are excluded: the first is derived from the
    /// second.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128 + self.data.len());

        buf.extend_from_slice(&self.chain_id.to_le_bytes());
        buf.extend_from_slice(&self.nonce.to_le_bytes());
        buf.extend_from_slice(&self.gas_price.to_le_bytes());
        buf.extend_from_slice(&self.gas_limit.to_le_bytes());

        match &self.to {
            Some(to) => {
                buf.push(0x01);
                buf.extend_from_slice(to.as_bytes());
            }
            None => buf.push(0x00),
        }

        buf.extend_from_slice(&self.value.to_le_bytes());
        buf.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.data);

        buf
    }

    /// Keccak-256 of [`Self::signable_bytes`].
    pub fn sighash(&self) -> [u8; 32] {
        keccak256(&self.signable_bytes())
    }

    /// `gas_price * gas_limit`, the most this message can spend on gas.
    pub fn gas_fee(&self) -> u128 {
        self.gas_price.saturating_mul(u128::from(self.gas_limit))
    }

    /// Gas fee plus transferred value.
    pub fn cost(&self) -> u128 {
        self.gas_fee().saturating_add(self.value)
    }

    /// Contract creations have no recipient.
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }

    fn validate_basic(&self) -> Result<(), TxError> {
        if self.gas_limit == 0 {
            return Err(TxError::InvalidMessage("ethereum tx gas limit is zero".into()));
        }
        if self.signature.len() != RECOVERABLE_SIGNATURE_LENGTH {
            return Err(TxError::InvalidMessage(format!(
                "ethereum tx signature must be {} bytes, got {}",
                RECOVERABLE_SIGNATURE_LENGTH,
                self.signature.len()
            )));
        }
        if self.is_contract_creation() && self.data.is_empty() {
            return Err(TxError::InvalidMessage(
                "contract creation without init code".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MsgRecvPacket
// ---------------------------------------------------------------------------

/// An inter-chain packet delivered by a relayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRecvPacket {
    pub source_channel: String,
    pub destination_channel: String,
    pub sequence: u64,
    pub data: Vec<u8>,
    /// The relayer.
    pub signer: Address,
}

impl MsgRecvPacket {
    fn validate_basic(&self) -> Result<(), TxError> {
        if self.source_channel.is_empty() || self.destination_channel.is_empty() {
            return Err(TxError::InvalidMessage("packet channel ids must be set".into()));
        }
        if self.sequence == 0 {
            return Err(TxError::InvalidMessage("packet sequence must be > 0".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn eth_msg() -> MsgEthereumTx {
        MsgEthereumTx {
            from: Address::from_bytes([1; 20]),
            to: Some(Address::from_bytes([2; 20])),
            nonce: 0,
            gas_price: 10,
            gas_limit: 21_000,
            value: 5,
            data: Vec::new(),
            chain_id: 9_740,
            signature: vec![0; 65],
        }
    }

    #[test]
    fn eth_costs() {
        let msg = eth_msg();
        assert_eq!(msg.gas_fee(), 210_000);
        assert_eq!(msg.cost(), 210_005);
    }

    #[test]
    fn sighash_covers_payload_not_signature() {
        let a = eth_msg();
        let mut b = a.clone();
        b.signature = vec![7; 65];
        assert_eq!(a.sighash(), b.sighash());

        b.value += 1;
        assert_ne!(a.sighash(), b.sighash());

        let mut c = a.clone();
        c.chain_id = 1;
        assert_ne!(a.sighash(), c.sighash(), "chain id must be committed to");
    }

    #[test]
    fn eth_validate_basic() {
        assert!(Message::EthereumTx(eth_msg()).validate_basic().is_ok());

        let mut short_sig = eth_msg();
        short_sig.signature = vec![0; 64];
        assert!(Message::EthereumTx(short_sig).validate_basic().is_err());

        let mut empty_create = eth_msg();
        empty_create.to = None;
        assert!(Message::EthereumTx(empty_create).validate_basic().is_err());
    }

    #[test]
    fn signers_per_message_kind() {
        let send = Message::Send(MsgSend {
            from: Address::from_bytes([3; 20]),
            to: Address::from_bytes([4; 20]),
            amount: Coins::single("photon", 1),
        });
        assert_eq!(send.signers(), vec![Address::from_bytes([3; 20])]);

        let packet = Message::RecvPacket(MsgRecvPacket {
            source_channel: "channel-0".into(),
            destination_channel: "channel-7".into(),
            sequence: 1,
            data: vec![],
            signer: Address::from_bytes([5; 20]),
        });
        assert_eq!(packet.signers(), vec![Address::from_bytes([5; 20])]);
        assert!(packet.validate_basic().is_ok());
    }

    #[test]
    fn zero_send_is_invalid() {
        let send = Message::Send(MsgSend {
            from: Address::from_bytes([3; 20]),
            to: Address::from_bytes([4; 20]),
            amount: Coins::empty(),
        });
        assert!(send.validate_basic().is_err());
    }
}
