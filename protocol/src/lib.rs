// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # NOVA Admission — Transaction Ante Pipeline
//!
//! Before a transaction is allowed anywhere near ledger state, it goes
//! through here. The pipeline decides which validation protocol applies
//! (native signatures, wrapped Ethereum transactions, or EIP-712 typed data
//! with optional fee delegation), runs that protocol's fixed chain of checks,
//! and collects the fee exactly once.
//!
//! ## Architecture
//!
//! - **ante** — The pipeline itself: context, decorators, chains, dispatcher.
//! - **transaction** — Transaction model, extension options, signing helpers.
//! - **ledger** — Collaborator traits plus an in-memory reference ledger.
//! - **crypto** — Hashes, Ed25519 / secp256k1 keys, recoverable ECDSA.
//! - **identity** — 20-byte addresses with Bech32 (`nova1...`) encoding.
//! - **config** — Protocol constants and the operator-facing `AnteConfig`.
//! - **metrics** — Prometheus counters for admission outcomes.
//! - **logging** — `tracing-subscriber` setup.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use nova_admission::ante::{AnteHandler, Context, HandlerOptions};
//! use nova_admission::config::AnteConfig;
//! use nova_admission::ledger::MemoryLedger;
//!
//! let ledger = Arc::new(MemoryLedger::new());
//! let config = AnteConfig::default();
//! ledger.register_module(&config.fee_collector_name);
//!
//! let handler = AnteHandler::new(HandlerOptions::from_ledger(ledger, config))?;
//! # let tx = nova_admission::transaction::Transaction::default();
//! let mut ctx = Context::new("nova-1", 42).with_check_tx(true);
//! match handler.handle(&mut ctx, &tx, false) {
//!     Ok(()) => println!("admitted, gas used {}", ctx.gas_meter().gas_consumed()),
//!     Err(e) => println!("rejected: {e}"),
//! }
//! # Ok::<(), nova_admission::config::ConfigError>(())
//! ```
//!
//! ## Design Philosophy
//!
//! 1. A bad transaction can be rejected. It can never take the node down.
//! 2. Chains are data: an ordered list you can print and test.
//! 3. Misconfiguration fails at startup, not on the thousandth transaction.
//! 4. If it touches money, it has tests. Plural.

pub mod ante;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod ledger;
pub mod logging;
pub mod metrics;
pub mod transaction;
