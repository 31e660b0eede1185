//! # Transaction Module
//!
//! The in-memory representation of a NOVA ledger transaction, plus the
//! helpers to build, sign and hash one. The admission pipeline in
//! [`crate::ante`] consumes [`Transaction`] values; nothing here touches
//! ledger state.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        — Coin, Coins, Fee
//! msgs.rs         — Message kinds (send, ethereum tx, inter-chain packet)
//! builder.rs      — Transaction / TxBody / AuthInfo and the fluent TransactionBuilder
//! extension.rs    — Extension options and their codec
//! verification.rs — Stateless validation (validate_basic) and TxError
//! typed_data.rs   — EIP-712 digest for web3-signed transactions
//! signing.rs      — Direct, EIP-712 and Ethereum signing helpers
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build** — Use [`TransactionBuilder`] to assemble body and auth info.
//! 2. **Sign** — [`sign_transaction`] (native), [`sign_eip712`] (web3
//!    wallets) or [`sign_ethereum_msg`] (wrapped Ethereum transactions).
//! 3. **Admit** — The node runs the transaction through
//!    [`AnteHandler::handle`](crate::ante::AnteHandler::handle).
//!
//! ## Design Decisions
//!
//! - All amounts are `u128` in the smallest denomination. No floating point
//!   anywhere near monetary values.
//! - The canonical encoding is bincode. It is deterministic for these types
//!   and compact, which matters because size gas is charged per byte.
//! - [`Coins`] normalizes on construction and on deserialization, so two
//!   equal amounts always encode to the same bytes.

pub mod builder;
pub mod extension;
pub mod msgs;
pub mod signing;
pub mod typed_data;
pub mod types;
pub mod verification;

pub use builder::{AuthInfo, SignerInfo, Transaction, TransactionBuilder, TxBody};
pub use extension::{
    unpack_first, CodecError, ExtensionOption, ExtensionOptionsEthereumTx,
    ExtensionOptionsWeb3Tx, ExtensionValue, TypedExtension,
};
pub use msgs::{Message, MsgEthereumTx, MsgRecvPacket, MsgSend};
pub use signing::{
    sign_bytes, sign_eip712, sign_ethereum_msg, sign_fee_payer_eip712, sign_transaction,
    SigningError,
};
pub use typed_data::{tx_digest, TypedDataContext};
pub use types::{Coin, Coins, Fee};
pub use verification::TxError;
