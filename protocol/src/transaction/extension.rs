//! Extension options: typed, tagged values attached to a transaction body.
//!
//! An extension option is a `(type_url, bytes)` pair. The type URL is what
//! the dispatcher routes on; the bytes are only decoded by the decorators
//! that care about the payload (the fee decorator for a delegated payer,
//! the EIP-712 verifier for the typed-data chain id).
//!
//! ```text
//! ExtensionOption { type_url: "/nova.types.v1.ExtensionOptionsWeb3Tx", value: bincode(..) }
//!        |
//!        +-- unpack() --> ExtensionValue::Web3Tx(ExtensionOptionsWeb3Tx { .. })
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::builder::Transaction;
use crate::config::{ETHEREUM_TX_TYPE_URL, WEB3_TX_TYPE_URL};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures while packing or unpacking an extension option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// No decoder registered for this type URL.
    #[error("unknown extension type url: {0}")]
    UnknownTypeUrl(String),

    /// The bytes do not decode as the type the URL names.
    #[error("failed to decode {type_url}: {reason}")]
    Decode { type_url: String, reason: String },

    /// Serialization failed while packing.
    #[error("failed to encode {type_url}: {reason}")]
    Encode { type_url: String, reason: String },
}

// ---------------------------------------------------------------------------
// Wire form
// ---------------------------------------------------------------------------

/// A packed extension option as carried in [`TxBody`](super::builder::TxBody).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionOption {
    pub type_url: String,
    pub value: Vec<u8>,
}

/// A payload type that can travel as an extension option.
pub trait TypedExtension: Serialize + DeserializeOwned {
    /// Tag written into [`ExtensionOption::type_url`].
    const TYPE_URL: &'static str;
}

// ---------------------------------------------------------------------------
// Known payloads
// ---------------------------------------------------------------------------

/// Marks a transaction as a wrapped Ethereum transaction. Carries no data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionOptionsEthereumTx {}

impl TypedExtension for ExtensionOptionsEthereumTx {
    const TYPE_URL: &'static str = ETHEREUM_TX_TYPE_URL;
}

/// Marks a transaction as signed with EIP-712 typed data, optionally naming
/// a third party that pays the fee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionOptionsWeb3Tx {
    /// Chain id the typed data was signed for. Must equal the EVM chain id.
    pub typed_data_chain_id: u64,
    /// Bech32 address of the fee payer. Empty means "first signer pays".
    pub fee_payer: String,
    /// The fee payer's recoverable signature over the same typed-data digest.
    pub fee_payer_sig: Vec<u8>,
}

impl TypedExtension for ExtensionOptionsWeb3Tx {
    const TYPE_URL: &'static str = WEB3_TX_TYPE_URL;
}

/// Decoded form of a recognized extension option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionValue {
    EthereumTx(ExtensionOptionsEthereumTx),
    Web3Tx(ExtensionOptionsWeb3Tx),
}

impl ExtensionValue {
    /// The tag this value packs under.
    pub fn type_url(&self) -> &'static str {
        match self {
            ExtensionValue::EthereumTx(_) => ExtensionOptionsEthereumTx::TYPE_URL,
            ExtensionValue::Web3Tx(_) => ExtensionOptionsWeb3Tx::TYPE_URL,
        }
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

impl ExtensionOption {
    /// Pack a typed payload.
    pub fn pack<T: TypedExtension>(value: &T) -> Result<Self, CodecError> {
        let bytes = bincode::serialize(value).map_err(|e| CodecError::Encode {
            type_url: T::TYPE_URL.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            type_url: T::TYPE_URL.to_string(),
            value: bytes,
        })
    }

    /// Decode the payload as `T`, checking the tag first.
    pub fn unpack_as<T: TypedExtension>(&self) -> Result<T, CodecError> {
        if self.type_url != T::TYPE_URL {
            return Err(CodecError::UnknownTypeUrl(self.type_url.clone()));
        }
        bincode::deserialize(&self.value).map_err(|e| CodecError::Decode {
            type_url: self.type_url.clone(),
            reason: e.to_string(),
        })
    }

    /// Decode into whichever known payload the tag names.
    pub fn unpack(&self) -> Result<ExtensionValue, CodecError> {
        match self.type_url.as_str() {
            ETHEREUM_TX_TYPE_URL => self.unpack_as().map(ExtensionValue::EthereumTx),
            WEB3_TX_TYPE_URL => self.unpack_as().map(ExtensionValue::Web3Tx),
            other => Err(CodecError::UnknownTypeUrl(other.to_string())),
        }
    }
}

/// Decode the first extension option of `tx`, if any. Later options are
/// never inspected.
pub fn unpack_first(tx: &Transaction) -> Result<Option<ExtensionValue>, CodecError> {
    tx.body
        .extension_options
        .first()
        .map(ExtensionOption::unpack)
        .transpose()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web3_option_packs_under_its_tag() {
        let ext = ExtensionOptionsWeb3Tx {
            typed_data_chain_id: 9_740,
            fee_payer: "nova1xyz".into(),
            fee_payer_sig: vec![1, 2, 3],
        };
        let packed = ExtensionOption::pack(&ext).unwrap();
        assert_eq!(packed.type_url, WEB3_TX_TYPE_URL);
        assert_eq!(packed.unpack().unwrap(), ExtensionValue::Web3Tx(ext));
    }

    #[test]
    fn ethereum_option_has_empty_payload() {
        let packed = ExtensionOption::pack(&ExtensionOptionsEthereumTx::default()).unwrap();
        assert_eq!(packed.type_url, ETHEREUM_TX_TYPE_URL);
        assert!(packed.value.is_empty());
        assert_eq!(
            packed.unpack().unwrap().type_url(),
            ETHEREUM_TX_TYPE_URL
        );
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let opt = ExtensionOption {
            type_url: "/evil.v1.Whatever".into(),
            value: vec![],
        };
        assert_eq!(
            opt.unpack(),
            Err(CodecError::UnknownTypeUrl("/evil.v1.Whatever".into()))
        );
    }

    #[test]
    fn truncated_payload_fails_to_decode() {
        let opt = ExtensionOption {
            type_url: WEB3_TX_TYPE_URL.into(),
            value: vec![1, 2],
        };
        assert!(matches!(opt.unpack(), Err(CodecError::Decode { .. })));
    }

    #[test]
    fn unpack_as_checks_tag() {
        let packed = ExtensionOption::pack(&ExtensionOptionsEthereumTx::default()).unwrap();
        assert!(packed.unpack_as::<ExtensionOptionsWeb3Tx>().is_err());
    }
}
