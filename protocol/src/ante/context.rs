//! # Execution Context & Gas Meter
//!
//! A [`Context`] is created fresh for every transaction the pipeline looks
//! at and is owned by exactly one validation pass. It carries block
//! metadata, the mode flags (CheckTx / ReCheckTx / DeliverTx), the gas
//! meter and a `tracing` span that every decorator logs under.
//!
//! The gas meter panics when it runs dry. That is deliberate: gas can be
//! consumed anywhere, deep inside a collaborator, and threading a `Result`
//! through every one of those call sites buys nothing. The panic carries an
//! [`OutOfGas`] payload and is caught exactly once, at the outermost
//! boundary in [`AnteHandler::handle`](super::AnteHandler::handle).

use chrono::{DateTime, Utc};
use std::fmt;

// ---------------------------------------------------------------------------
// Gas meter
// ---------------------------------------------------------------------------

/// Panic payload raised when a [`GasMeter`] is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfGas {
    /// What was being paid for when the meter ran out.
    pub descriptor: String,
    pub limit: u64,
    /// Gas the meter would have reached.
    pub consumed: u64,
}

impl fmt::Display for OutOfGas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "out of gas in location: {}; gasWanted: {}, gasUsed: {}",
            self.descriptor, self.limit, self.consumed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Panics past `limit`.
    Limited,
    /// Never panics, reports no limit.
    Infinite,
    /// Never panics, but reports `limit` (EVM: the gas wanted).
    InfiniteWithLimit,
}

/// Tracks gas spent by one validation pass.
#[derive(Debug, Clone)]
pub struct GasMeter {
    mode: Mode,
    limit: u64,
    consumed: u64,
}

impl GasMeter {
    /// A meter that panics with [`OutOfGas`] once `limit` is exceeded.
    pub fn new(limit: u64) -> Self {
        Self {
            mode: Mode::Limited,
            limit,
            consumed: 0,
        }
    }

    /// A meter that never runs out. Simulation and genesis use this.
    pub fn infinite() -> Self {
        Self {
            mode: Mode::Infinite,
            limit: 0,
            consumed: 0,
        }
    }

    /// Never runs out, but reports `limit` as the gas wanted.
    pub fn infinite_with_limit(limit: u64) -> Self {
        Self {
            mode: Mode::InfiniteWithLimit,
            limit,
            consumed: 0,
        }
    }

    /// Charge `amount` gas for `descriptor`.
    ///
    /// # Panics
    ///
    /// With an [`OutOfGas`] payload when a limited meter is exceeded, or on
    /// `u64` overflow in any mode.
    pub fn consume_gas(&mut self, amount: u64, descriptor: &str) {
        let Some(consumed) = self.consumed.checked_add(amount) else {
            std::panic::panic_any(OutOfGas {
                descriptor: format!("{} (gas overflow)", descriptor),
                limit: self.limit,
                consumed: u64::MAX,
            });
        };
        self.consumed = consumed;

        if self.mode == Mode::Limited && consumed > self.limit {
            std::panic::panic_any(OutOfGas {
                descriptor: descriptor.to_string(),
                limit: self.limit,
                consumed,
            });
        }
    }

    /// Gas spent so far.
    pub fn gas_consumed(&self) -> u64 {
        self.consumed
    }

    /// The limit, or `None` for a plain infinite meter.
    pub fn limit(&self) -> Option<u64> {
        match self.mode {
            Mode::Infinite => None,
            Mode::Limited | Mode::InfiniteWithLimit => Some(self.limit),
        }
    }

    /// `true` if this meter never panics.
    pub fn is_infinite(&self) -> bool {
        self.mode != Mode::Limited
    }

    /// Gas left before a limited meter panics.
    pub fn gas_remaining(&self) -> Option<u64> {
        match self.mode {
            Mode::Limited => Some(self.limit.saturating_sub(self.consumed)),
            Mode::Infinite | Mode::InfiniteWithLimit => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Per-transaction execution context.
#[derive(Debug, Clone)]
pub struct Context {
    chain_id: String,
    block_height: u64,
    block_time: DateTime<Utc>,
    check_tx: bool,
    recheck_tx: bool,
    gas_meter: GasMeter,
    logger: tracing::Span,
}

impl Context {
    /// DeliverTx context at `block_height` with an infinite gas meter.
    pub fn new(chain_id: impl Into<String>, block_height: u64) -> Self {
        Self {
            chain_id: chain_id.into(),
            block_height,
            block_time: Utc::now(),
            check_tx: false,
            recheck_tx: false,
            gas_meter: GasMeter::infinite(),
            logger: tracing::Span::current(),
        }
    }

    /// Mempool (CheckTx) mode.
    pub fn with_check_tx(mut self, check_tx: bool) -> Self {
        self.check_tx = check_tx;
        self
    }

    /// Mempool re-check after a block commit. Implies CheckTx.
    pub fn with_recheck_tx(mut self, recheck_tx: bool) -> Self {
        if recheck_tx {
            self.check_tx = true;
        }
        self.recheck_tx = recheck_tx;
        self
    }

    /// Override the block time.
    pub fn with_block_time(mut self, time: DateTime<Utc>) -> Self {
        self.block_time = time;
        self
    }

    /// Replace the logger span.
    pub fn with_logger(mut self, span: tracing::Span) -> Self {
        self.logger = span;
        self
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn block_time(&self) -> DateTime<Utc> {
        self.block_time
    }

    pub fn is_check_tx(&self) -> bool {
        self.check_tx
    }

    pub fn is_recheck_tx(&self) -> bool {
        self.recheck_tx
    }

    pub fn gas_meter(&self) -> &GasMeter {
        &self.gas_meter
    }

    pub fn gas_meter_mut(&mut self) -> &mut GasMeter {
        &mut self.gas_meter
    }

    /// Install a new gas meter, discarding the old one.
    pub fn set_gas_meter(&mut self, meter: GasMeter) {
        self.gas_meter = meter;
    }

    /// The span every decorator logs under.
    pub fn logger(&self) -> &tracing::Span {
        &self.logger
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn limited_meter_tracks_consumption() {
        let mut meter = GasMeter::new(100);
        meter.consume_gas(40, "a");
        meter.consume_gas(60, "b");
        assert_eq!(meter.gas_consumed(), 100);
        assert_eq!(meter.gas_remaining(), Some(0));
        assert_eq!(meter.limit(), Some(100));
    }

    #[test]
    fn limited_meter_panics_with_payload() {
        let mut meter = GasMeter::new(10);
        let payload = catch_unwind(AssertUnwindSafe(|| meter.consume_gas(11, "txSize")))
            .unwrap_err();
        let oog = payload.downcast::<OutOfGas>().unwrap();
        assert_eq!(oog.descriptor, "txSize");
        assert_eq!(oog.limit, 10);
        assert_eq!(oog.consumed, 11);
    }

    #[test]
    fn overflow_panics_even_when_infinite() {
        let mut meter = GasMeter::infinite();
        meter.consume_gas(u64::MAX, "big");
        let payload = catch_unwind(AssertUnwindSafe(|| meter.consume_gas(1, "more"))).unwrap_err();
        assert!(payload.downcast_ref::<OutOfGas>().is_some());
    }

    #[test]
    fn infinite_with_limit_reports_but_never_panics() {
        let mut meter = GasMeter::infinite_with_limit(21_000);
        meter.consume_gas(50_000, "evm");
        assert_eq!(meter.limit(), Some(21_000));
        assert!(meter.is_infinite());
        assert_eq!(meter.gas_remaining(), None);
    }

    #[test]
    fn recheck_implies_check() {
        let ctx = Context::new("nova-1", 5).with_recheck_tx(true);
        assert!(ctx.is_check_tx());
        assert!(ctx.is_recheck_tx());
        assert!(ctx.gas_meter().is_infinite());
    }
}
