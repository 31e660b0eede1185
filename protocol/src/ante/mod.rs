//! # Ante Handler
//!
//! The transaction admission pipeline. Every transaction, whether it comes
//! from the mempool (CheckTx) or from a proposed block (DeliverTx), passes
//! through [`AnteHandler::handle`] before any message executes.
//!
//! ## Architecture
//!
//! ```text
//! context.rs   — Context (per-pass state) and the GasMeter
//! error.rs     — AnteError, the rejection taxonomy
//! chain.rs     — AnteDecorator trait and the AnteChain composer
//! basic.rs     — structural / stateless decorators
//! ibc.rs       — redundant packet screening
//! sigverify.rs — native public key, signature and sequence decorators
//! fee.rs       — fee payer resolution (incl. delegation) and collection
//! evm.rs       — decorators of the EVM chain
//! eip712.rs    — typed-data verifier of the delegated chain
//! handler.rs   — chain selection, the three chains, panic containment
//! ```
//!
//! ## Chains
//!
//! | Chain       | Selected by                          | Fee collected by     |
//! |-------------|--------------------------------------|----------------------|
//! | `standard`  | no extension options                 | `deduct_fee`         |
//! | `evm`       | `ExtensionOptionsEthereumTx` first   | `eth_gas_consume`    |
//! | `delegated` | `ExtensionOptionsWeb3Tx` first       | `deduct_fee`         |
//!
//! ## Rollback
//!
//! Decorators write straight to the ledger collaborators. A rejection does
//! not undo writes made by decorators that already ran (a collected fee
//! stays collected). Callers that need atomicity run the handler against a
//! cache-wrapped store and commit only on `Ok`.

pub mod basic;
pub mod chain;
pub mod context;
pub mod eip712;
pub mod error;
pub mod evm;
pub mod fee;
pub mod handler;
pub mod ibc;
pub mod sigverify;

#[cfg(test)]
pub(crate) mod testutil;

pub use chain::{AnteChain, AnteDecorator, AnteResult, Next};
pub use context::{Context, GasMeter, OutOfGas};
pub use error::AnteError;
pub use fee::{resolve_fee_payer, DeductFeeDecorator, FeePayer};
pub use handler::{select_chain, AnteHandler, ChainKind, HandlerOptions};
