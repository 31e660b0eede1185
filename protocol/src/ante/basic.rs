//! Cheap, mostly stateless decorators shared by the standard and delegated
//! chains: context setup, the mempool fee floor, structural checks, the
//! timeout height, the memo and the per-byte size charge.

use super::chain::{AnteDecorator, AnteResult, Next};
use super::context::{Context, GasMeter};
use super::error::AnteError;
use crate::config::{DecCoin, SIMULATED_SIGNATURE_SIZE};
use crate::transaction::{Coin, Transaction};

// ---------------------------------------------------------------------------
// SetUpContextDecorator
// ---------------------------------------------------------------------------

/// Installs a gas meter limited to the transaction's declared gas. Must be
/// the outermost decorator: everything after it is charged against that
/// limit.
///
/// Simulation and genesis (height 0) get an infinite meter.
#[derive(Debug, Default)]
pub struct SetUpContextDecorator;

impl AnteDecorator for SetUpContextDecorator {
    fn name(&self) -> &'static str {
        "set_up_context"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        let fee = tx.fee().ok_or_else(|| {
            AnteError::MalformedTransaction("transaction must declare a gas limit".into())
        })?;

        let meter = if simulate || ctx.block_height() == 0 {
            GasMeter::infinite()
        } else {
            GasMeter::new(fee.gas_limit)
        };
        ctx.set_gas_meter(meter);

        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// RejectExtensionOptionsDecorator
// ---------------------------------------------------------------------------

/// Native transactions must not carry extension options.
#[derive(Debug, Default)]
pub struct RejectExtensionOptionsDecorator;

impl AnteDecorator for RejectExtensionOptionsDecorator {
    fn name(&self) -> &'static str {
        "reject_extension_options"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        if let Some(opt) = tx.body.extension_options.first() {
            return Err(AnteError::UnsupportedExtension(opt.type_url.clone()));
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// MempoolFeeDecorator
// ---------------------------------------------------------------------------

/// Local mempool fee floor.
///
/// Only enforced in CheckTx and never when simulating: block execution must
/// not depend on a node-local setting. The required fee per denom is
/// `ceil(min_gas_price * gas_limit)`; the offered fee must cover at least
/// one of them.
#[derive(Debug, Clone)]
pub struct MempoolFeeDecorator {
    min_gas_prices: Vec<DecCoin>,
}

impl MempoolFeeDecorator {
    pub fn new(min_gas_prices: Vec<DecCoin>) -> Self {
        Self { min_gas_prices }
    }
}

impl AnteDecorator for MempoolFeeDecorator {
    fn name(&self) -> &'static str {
        "mempool_fee"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        if ctx.is_check_tx() && !simulate {
            let fee = tx.fee().ok_or(AnteError::NotFeeBearing)?;
            let required: Vec<Coin> = self
                .min_gas_prices
                .iter()
                .filter(|price| !price.is_zero())
                .map(|price| Coin::new(price.denom.clone(), price.fee_for_gas(fee.gas_limit)))
                .collect();

            if !required.is_empty() && !fee.amount.is_any_gte(&required) {
                let required = required
                    .iter()
                    .map(Coin::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                tracing::debug!(offered = %fee.amount, %required, "fee below mempool floor");
                return Err(AnteError::InsufficientFee {
                    offered: fee.amount.to_string(),
                    required,
                });
            }
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// ValidateBasicDecorator
// ---------------------------------------------------------------------------

/// Stateless validation. Skipped on ReCheckTx: nothing stateless changed
/// since the first check.
#[derive(Debug, Clone)]
pub struct ValidateBasicDecorator {
    max_tx_gas: u64,
}

impl ValidateBasicDecorator {
    pub fn new(max_tx_gas: u64) -> Self {
        Self { max_tx_gas }
    }
}

impl AnteDecorator for ValidateBasicDecorator {
    fn name(&self) -> &'static str {
        "validate_basic"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        if !ctx.is_recheck_tx() {
            tx.validate_basic(self.max_tx_gas)?;
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// TxTimeoutHeightDecorator
// ---------------------------------------------------------------------------

/// Rejects transactions whose timeout height has passed.
#[derive(Debug, Default)]
pub struct TxTimeoutHeightDecorator;

impl AnteDecorator for TxTimeoutHeightDecorator {
    fn name(&self) -> &'static str {
        "tx_timeout_height"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        let timeout = tx.body.timeout_height;
        if timeout > 0 && ctx.block_height() > timeout {
            return Err(AnteError::TimeoutHeight {
                timeout,
                height: ctx.block_height(),
            });
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// ValidateMemoDecorator
// ---------------------------------------------------------------------------

/// Memo length limit, counted in characters.
#[derive(Debug, Clone)]
pub struct ValidateMemoDecorator {
    max_memo_characters: u64,
}

impl ValidateMemoDecorator {
    pub fn new(max_memo_characters: u64) -> Self {
        Self {
            max_memo_characters,
        }
    }
}

impl AnteDecorator for ValidateMemoDecorator {
    fn name(&self) -> &'static str {
        "validate_memo"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        let len = tx.body.memo.chars().count() as u64;
        if len > self.max_memo_characters {
            return Err(AnteError::MemoTooLarge {
                max: self.max_memo_characters,
                got: len,
            });
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// ConsumeTxSizeGasDecorator
// ---------------------------------------------------------------------------

/// Charges `cost_per_byte` for every byte of the encoded transaction.
///
/// When simulating, signatures are usually absent, so each missing one is
/// charged as if a [`SIMULATED_SIGNATURE_SIZE`]-byte signature were there.
/// Otherwise the estimate would come back too low.
#[derive(Debug, Clone)]
pub struct ConsumeTxSizeGasDecorator {
    cost_per_byte: u64,
}

impl ConsumeTxSizeGasDecorator {
    pub fn new(cost_per_byte: u64) -> Self {
        Self { cost_per_byte }
    }
}

impl AnteDecorator for ConsumeTxSizeGasDecorator {
    fn name(&self) -> &'static str {
        "consume_tx_size_gas"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        let size = tx.to_bytes()?.len() as u64;
        ctx.gas_meter_mut()
            .consume_gas(size.saturating_mul(self.cost_per_byte), "txSize");

        if simulate {
            let signers = tx.signers().len();
            let missing = (0..signers)
                .filter(|i| tx.signatures.get(*i).map_or(true, |s| s.is_empty()))
                .count() as u64;
            let extra = missing
                .saturating_mul(SIMULATED_SIGNATURE_SIZE)
                .saturating_mul(self.cost_per_byte);
            ctx.gas_meter_mut().consume_gas(extra, "txSize");
        }

        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// ValidateSigCountDecorator
// ---------------------------------------------------------------------------

/// Caps the number of public keys a transaction may declare.
#[derive(Debug, Clone)]
pub struct ValidateSigCountDecorator {
    tx_sig_limit: u64,
}

impl ValidateSigCountDecorator {
    pub fn new(tx_sig_limit: u64) -> Self {
        Self { tx_sig_limit }
    }
}

impl AnteDecorator for ValidateSigCountDecorator {
    fn name(&self) -> &'static str {
        "validate_sig_count"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        let count = tx
            .auth_info
            .signer_infos
            .iter()
            .filter(|info| info.public_key.is_some())
            .count() as u64;
        if count > self.tx_sig_limit {
            return Err(AnteError::TooManySignatures {
                limit: self.tx_sig_limit,
                got: count,
            });
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
