//! # Decorators & Chain Composition
//!
//! A decorator is one named step of the pipeline. It receives the context,
//! the transaction, the simulate flag and `next`, the rest of the chain. It
//! either returns an error (aborting everything after it) or calls `next`.
//!
//! An [`AnteChain`] is built once from an ordered list of decorators by
//! folding the list right-to-left into nested continuations:
//!
//! ```text
//! [a, b, c]  ->  |ctx| a(ctx, |ctx| b(ctx, |ctx| c(ctx, |_| Ok(()))))
//! ```
//!
//! The list order is the whole definition of the pipeline. Nothing is
//! reordered or skipped at run time; only an error short-circuits.

use std::fmt;
use std::sync::Arc;

use super::context::Context;
use super::error::AnteError;
use crate::transaction::Transaction;

/// Outcome of a decorator or a whole chain.
pub type AnteResult = Result<(), AnteError>;

/// The remainder of a chain, as seen by one decorator.
pub type Next<'a> = &'a dyn Fn(&mut Context, &Transaction, bool) -> AnteResult;

type Handler = Box<dyn Fn(&mut Context, &Transaction, bool) -> AnteResult + Send + Sync>;

/// One step of an admission chain.
pub trait AnteDecorator: Send + Sync {
    /// Short snake_case name, used in logs and for inspecting chains.
    fn name(&self) -> &'static str;

    /// Run this step, then (on success) `next`.
    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult;
}

/// A composed, immutable pipeline.
pub struct AnteChain {
    label: &'static str,
    steps: Vec<&'static str>,
    handler: Handler,
}

impl AnteChain {
    /// Compose `decorators`, outermost first.
    pub fn new(label: &'static str, decorators: Vec<Arc<dyn AnteDecorator>>) -> Self {
        let steps = decorators.iter().map(|d| d.name()).collect();

        let terminal: Handler =
            Box::new(|_ctx: &mut Context, _tx: &Transaction, _simulate: bool| Ok(()));

        let handler = decorators
            .into_iter()
            .rev()
            .fold(terminal, |next, decorator| {
                let composed: Handler =
                    Box::new(move |ctx: &mut Context, tx: &Transaction, simulate: bool| {
                        decorator.ante_handle(ctx, tx, simulate, &*next)
                    });
                composed
            });

        Self {
            label,
            steps,
            handler,
        }
    }

    /// Run the whole chain.
    pub fn run(&self, ctx: &mut Context, tx: &Transaction, simulate: bool) -> AnteResult {
        (self.handler)(ctx, tx, simulate)
    }

    /// Chain label (`standard`, `evm`, `delegated`).
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Decorator names in execution order.
    pub fn step_names(&self) -> &[&'static str] {
        &self.steps
    }
}

impl fmt::Debug for AnteChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnteChain")
            .field("label", &self.label)
            .field("steps", &self.steps)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
