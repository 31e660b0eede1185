//! # Dispatcher & Failure Containment
//!
//! [`AnteHandler`] is the entry point the mempool and the block executor
//! call. It holds the three pre-built chains, picks one per transaction
//! from the first extension option's tag, runs it, and contains any panic
//! raised along the way.
//!
//! ```text
//! first extension option      chain
//! ---------------------------------------------
//! (none)                      standard
//! ExtensionOptionsEthereumTx  evm
//! ExtensionOptionsWeb3Tx      delegated
//! anything else               UnsupportedExtension, nothing runs
//! ```
//!
//! Panics are caught in exactly one place, [`AnteHandler::handle`]. An
//! [`OutOfGas`] payload becomes [`AnteError::OutOfGas`]; anything else
//! becomes [`AnteError::Internal`] carrying the panic message. Decorators
//! never catch panics themselves.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::basic::{
    ConsumeTxSizeGasDecorator, MempoolFeeDecorator, RejectExtensionOptionsDecorator,
    SetUpContextDecorator, TxTimeoutHeightDecorator, ValidateBasicDecorator,
    ValidateMemoDecorator, ValidateSigCountDecorator,
};
use super::chain::{AnteChain, AnteDecorator, AnteResult};
use super::context::{Context, OutOfGas};
use super::eip712::Eip712SigVerificationDecorator;
use super::error::AnteError;
use super::evm::{
    CanTransferDecorator, EthAccountVerificationDecorator, EthGasConsumeDecorator,
    EthIncrementSenderSequenceDecorator, EthNonceVerificationDecorator, EthSetUpContextDecorator,
    EthSigVerificationDecorator, EthValidateBasicDecorator,
};
use super::fee::DeductFeeDecorator;
use super::ibc::IbcPacketDecorator;
use super::sigverify::{
    IncrementSequenceDecorator, SetPubKeyDecorator, SigGasConsumeDecorator,
    SigVerificationDecorator,
};
use crate::config::{AnteConfig, ConfigError, ETHEREUM_TX_TYPE_URL, WEB3_TX_TYPE_URL};
use crate::ledger::{AccountKeeper, BankKeeper, MemoryLedger, PacketVerifier};
use crate::metrics::AnteMetrics;
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// Chain selection
// ---------------------------------------------------------------------------

/// The three admission protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainKind {
    /// Native signatures, no extension options.
    Standard,
    /// Wrapped Ethereum transactions.
    Evm,
    /// EIP-712 signed, optionally with a delegated fee payer.
    Delegated,
}

impl ChainKind {
    /// Label used in logs and metrics.
    pub fn label(self) -> &'static str {
        match self {
            ChainKind::Standard => "standard",
            ChainKind::Evm => "evm",
            ChainKind::Delegated => "delegated",
        }
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pick the chain for `tx`. Depends only on the transaction.
///
/// A transaction without a fee or without signers is malformed and gets no
/// chain at all.
pub fn select_chain(tx: &Transaction) -> Result<ChainKind, AnteError> {
    if tx.fee().is_none() {
        return Err(AnteError::MalformedTransaction(
            "transaction has no fee".into(),
        ));
    }
    if tx.signers().is_empty() {
        return Err(AnteError::MalformedTransaction(
            "transaction has no signers".into(),
        ));
    }

    let Some(first) = tx.body.extension_options.first() else {
        return Ok(ChainKind::Standard);
    };
    match first.type_url.as_str() {
        ETHEREUM_TX_TYPE_URL => Ok(ChainKind::Evm),
        WEB3_TX_TYPE_URL => Ok(ChainKind::Delegated),
        other => Err(AnteError::UnsupportedExtension(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Collaborators and parameters the handler is built from.
pub struct HandlerOptions {
    pub accounts: Arc<dyn AccountKeeper>,
    pub bank: Arc<dyn BankKeeper>,
    pub packets: Arc<dyn PacketVerifier>,
    pub config: AnteConfig,
    pub metrics: Option<AnteMetrics>,
}

impl HandlerOptions {
    /// Use one [`MemoryLedger`] for every collaborator.
    pub fn from_ledger(ledger: Arc<MemoryLedger>, config: AnteConfig) -> Self {
        Self {
            accounts: ledger.clone(),
            bank: ledger.clone(),
            packets: ledger,
            config,
            metrics: None,
        }
    }

    /// Record outcomes in `metrics`.
    pub fn with_metrics(mut self, metrics: AnteMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

// ---------------------------------------------------------------------------
// AnteHandler
// ---------------------------------------------------------------------------

fn step<D: AnteDecorator + 'static>(decorator: D) -> Arc<dyn AnteDecorator> {
    Arc::new(decorator)
}

/// The admission pipeline.
///
/// Immutable after construction and `Send + Sync`; share one instance
/// behind an `Arc` and call [`handle`](Self::handle) from as many threads
/// as needed. Each call owns its [`Context`].
pub struct AnteHandler {
    standard: AnteChain,
    evm: AnteChain,
    delegated: AnteChain,
    metrics: Option<AnteMetrics>,
}

impl AnteHandler {
    /// Validate the config, resolve the fee collector and build all three
    /// chains.
    pub fn new(options: HandlerOptions) -> Result<Self, ConfigError> {
        let HandlerOptions {
            accounts,
            bank,
            packets,
            config,
            metrics,
        } = options;
        config.validate()?;

        let fee_collector = accounts
            .get_module_address(&config.fee_collector_name)
            .ok_or_else(|| ConfigError::MissingModuleAccount(config.fee_collector_name.clone()))?;
        let evm_denom = config.evm.denom.clone();

        let standard = AnteChain::new(
            ChainKind::Standard.label(),
            vec![
                step(SetUpContextDecorator),
                step(RejectExtensionOptionsDecorator),
                step(MempoolFeeDecorator::new(config.min_gas_prices.clone())),
                step(ValidateBasicDecorator::new(config.max_tx_gas)),
                step(TxTimeoutHeightDecorator),
                step(ValidateMemoDecorator::new(config.max_memo_characters)),
                step(IbcPacketDecorator::new(packets)),
                step(ConsumeTxSizeGasDecorator::new(config.tx_size_cost_per_byte)),
                step(SetPubKeyDecorator::new(accounts.clone())),
                step(ValidateSigCountDecorator::new(config.tx_sig_limit)),
                step(DeductFeeDecorator::with_collector(
                    accounts.clone(),
                    bank.clone(),
                    fee_collector,
                )),
                step(SigGasConsumeDecorator::new(accounts.clone(), &config)),
                step(SigVerificationDecorator::new(accounts.clone())),
                step(IncrementSequenceDecorator::new(accounts.clone())),
            ],
        );

        let evm = AnteChain::new(
            ChainKind::Evm.label(),
            vec![
                step(EthSetUpContextDecorator),
                step(MempoolFeeDecorator::new(config.min_gas_prices.clone())),
                step(EthValidateBasicDecorator::new(config.evm.clone())),
                step(EthSigVerificationDecorator::new(config.evm.chain_id)),
                step(EthAccountVerificationDecorator::new(
                    accounts.clone(),
                    bank.clone(),
                    evm_denom.clone(),
                )),
                step(EthNonceVerificationDecorator::new(accounts.clone())),
                step(EthGasConsumeDecorator::new(
                    bank.clone(),
                    fee_collector,
                    evm_denom.clone(),
                )),
                step(CanTransferDecorator::new(bank.clone(), evm_denom)),
                step(EthIncrementSenderSequenceDecorator::new(accounts.clone())),
            ],
        );

        let delegated = AnteChain::new(
            ChainKind::Delegated.label(),
            vec![
                step(SetUpContextDecorator),
                step(MempoolFeeDecorator::new(config.min_gas_prices.clone())),
                step(ValidateBasicDecorator::new(config.max_tx_gas)),
                step(TxTimeoutHeightDecorator),
                step(ValidateMemoDecorator::new(config.max_memo_characters)),
                step(ConsumeTxSizeGasDecorator::new(config.tx_size_cost_per_byte)),
                step(SetPubKeyDecorator::new(accounts.clone())),
                step(ValidateSigCountDecorator::new(config.tx_sig_limit)),
                step(DeductFeeDecorator::with_collector(
                    accounts.clone(),
                    bank,
                    fee_collector,
                )),
                step(Eip712SigVerificationDecorator::new(accounts.clone(), &config)),
                step(IncrementSequenceDecorator::new(accounts)),
            ],
        );

        tracing::info!(
            fee_collector = %fee_collector,
            evm_chain_id = config.evm.chain_id,
            "ante handler ready"
        );

        Ok(Self {
            standard,
            evm,
            delegated,
            metrics,
        })
    }

    /// Assemble a handler from hand-built chains. Node operators never need
    /// this; it exists for custom pipelines and tests.
    pub fn from_chains(
        standard: AnteChain,
        evm: AnteChain,
        delegated: AnteChain,
        metrics: Option<AnteMetrics>,
    ) -> Self {
        Self {
            standard,
            evm,
            delegated,
            metrics,
        }
    }

    /// The pre-built chain for `kind`.
    pub fn chain(&self, kind: ChainKind) -> &AnteChain {
        match kind {
            ChainKind::Standard => &self.standard,
            ChainKind::Evm => &self.evm,
            ChainKind::Delegated => &self.delegated,
        }
    }

    pub fn metrics(&self) -> Option<&AnteMetrics> {
        self.metrics.as_ref()
    }

    /// Screen `tx`.
    ///
    /// `Ok(())` admits the transaction and `ctx` carries the gas used.
    /// On `Err` the caller must discard `ctx` and any store branch it ran
    /// against: decorators that already ran are not undone.
    pub fn handle(&self, ctx: &mut Context, tx: &Transaction, simulate: bool) -> AnteResult {
        let span = tracing::debug_span!(
            parent: ctx.logger(),
            "ante",
            tx = %tx.hash_hex(),
            height = ctx.block_height(),
            check_tx = ctx.is_check_tx(),
            simulate
        );
        let _entered = span.enter();

        let mut selected: Option<ChainKind> = None;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let kind = select_chain(tx)?;
            selected = Some(kind);
            tracing::debug!(chain = kind.label(), "chain selected");
            self.chain(kind).run(ctx, tx, simulate)
        }));

        let result = outcome.unwrap_or_else(|payload| Err(contain(payload)));
        let chain = selected.map_or("none", ChainKind::label);

        match &result {
            Ok(()) => {
                let gas = ctx.gas_meter().gas_consumed();
                tracing::debug!(chain, gas_used = gas, "transaction admitted");
                if let Some(metrics) = &self.metrics {
                    metrics.observe_admitted(chain, gas);
                }
            }
            Err(err) => {
                tracing::debug!(chain, reason = err.code(), error = %err, "transaction rejected");
                if let Some(metrics) = &self.metrics {
                    metrics.observe_rejected(chain, err.code());
                }
            }
        }
        result
    }
}

impl fmt::Debug for AnteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnteHandler")
            .field("standard", &self.standard)
            .field("evm", &self.evm)
            .field("delegated", &self.delegated)
            .finish()
    }
}

/// Turn a caught panic payload into a rejection.
fn contain(payload: Box<dyn Any + Send>) -> AnteError {
    if let Some(oog) = payload.downcast_ref::<OutOfGas>() {
        tracing::debug!(%oog, "out of gas");
        return AnteError::OutOfGas {
            descriptor: oog.descriptor.clone(),
            limit: oog.limit,
            consumed: oog.consumed,
        };
    }

    let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %message, "panic contained in ante handler");
    AnteError::Internal(message)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
