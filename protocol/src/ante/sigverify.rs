//! Signer authentication for native transactions: public-key binding, the
//! per-signature gas charge, direct-mode signature verification and the
//! sequence bump that makes every signature single-use.

use std::sync::Arc;

use super::chain::{AnteDecorator, AnteResult, Next};
use super::context::Context;
use super::error::AnteError;
use crate::config::AnteConfig;
use crate::crypto::keys::PublicKey;
use crate::identity::Address;
use crate::ledger::{Account, AccountKeeper};
use crate::transaction::{sign_bytes, Transaction};

/// Fetch a signer's account or reject.
pub(crate) fn signer_account(
    accounts: &dyn AccountKeeper,
    address: &Address,
) -> Result<Account, AnteError> {
    accounts
        .get_account(address)
        .ok_or(AnteError::UnknownAccount(*address))
}

// ---------------------------------------------------------------------------
// SetPubKeyDecorator
// ---------------------------------------------------------------------------

/// Binds signer-info public keys to accounts.
///
/// Every declared key must derive the address of the signer at the same
/// position. Accounts that have no key yet get this one stored. Must run
/// before anything that needs an account's key.
pub struct SetPubKeyDecorator {
    accounts: Arc<dyn AccountKeeper>,
}

impl SetPubKeyDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>) -> Self {
        Self { accounts }
    }
}

impl AnteDecorator for SetPubKeyDecorator {
    fn name(&self) -> &'static str {
        "set_pub_key"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        for (i, signer) in tx.signers().iter().enumerate() {
            let Some(pk) = tx
                .auth_info
                .signer_infos
                .get(i)
                .and_then(|info| info.public_key.as_ref())
            else {
                continue;
            };

            let derived = pk
                .address()
                .map_err(|e| AnteError::InvalidPubKey(e.to_string()))?;
            if derived != *signer {
                // Simulations may carry placeholder keys.
                if simulate {
                    continue;
                }
                return Err(AnteError::InvalidPubKey(format!(
                    "pubKey does not match signer address {} with signer index: {}",
                    signer, i
                )));
            }

            let mut account = signer_account(self.accounts.as_ref(), signer)?;
            if account.pub_key.is_none() {
                tracing::trace!(%signer, scheme = pk.scheme(), "binding public key");
                account.pub_key = Some(pk.clone());
                self.accounts.set_account(account);
            }
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// SigGasConsumeDecorator
// ---------------------------------------------------------------------------

/// Charges the verification cost of every signature up front, before the
/// (comparatively expensive) verification itself.
#[derive(Clone)]
pub struct SigGasConsumeDecorator {
    accounts: Arc<dyn AccountKeeper>,
    cost_ed25519: u64,
    cost_secp256k1: u64,
}

impl SigGasConsumeDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>, config: &AnteConfig) -> Self {
        Self {
            accounts,
            cost_ed25519: config.sig_verify_cost_ed25519,
            cost_secp256k1: config.sig_verify_cost_secp256k1,
        }
    }

    fn cost_of(&self, pk: &PublicKey) -> u64 {
        match pk {
            PublicKey::Ed25519(_) => self.cost_ed25519,
            PublicKey::Secp256k1(_) => self.cost_secp256k1,
        }
    }
}

impl AnteDecorator for SigGasConsumeDecorator {
    fn name(&self) -> &'static str {
        "sig_gas_consume"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        for signer in tx.signers() {
            let account = signer_account(self.accounts.as_ref(), &signer)?;
            let cost = match &account.pub_key {
                Some(pk) => self.cost_of(pk),
                // Simulations may come from a fresh account; assume the
                // pricier scheme so the estimate is an upper bound.
                None if simulate => self.cost_secp256k1,
                None => {
                    return Err(AnteError::InvalidPubKey(format!(
                        "pubkey on account {} is not set",
                        signer
                    )))
                }
            };
            let descriptor = match &account.pub_key {
                Some(pk) => format!("ante verify: {}", pk.scheme()),
                None => "ante verify: simulated".to_string(),
            };
            ctx.gas_meter_mut().consume_gas(cost, &descriptor);
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// SigVerificationDecorator
// ---------------------------------------------------------------------------

/// Direct-mode signature verification.
///
/// For every signer: the declared sequence must equal the account's, and
/// (unless simulating) the signature must verify over
/// [`sign_bytes`] bound to this chain id, account number and sequence.
pub struct SigVerificationDecorator {
    accounts: Arc<dyn AccountKeeper>,
}

impl SigVerificationDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>) -> Self {
        Self { accounts }
    }
}

impl AnteDecorator for SigVerificationDecorator {
    fn name(&self) -> &'static str {
        "sig_verification"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        let signers = tx.signers();
        if tx.signatures.len() != signers.len() {
            return Err(AnteError::Verification(format!(
                "invalid number of signers; expected: {}, got {}",
                signers.len(),
                tx.signatures.len()
            )));
        }

        for (i, signer) in signers.iter().enumerate() {
            let account = signer_account(self.accounts.as_ref(), signer)?;
            let declared = tx
                .auth_info
                .signer_infos
                .get(i)
                .map(|info| info.sequence)
                .ok_or_else(|| AnteError::MalformedTransaction(format!("no signer info for signer {}", i)))?;

            if declared != account.sequence {
                return Err(AnteError::WrongSequence {
                    expected: account.sequence,
                    got: declared,
                });
            }

            if simulate {
                continue;
            }

            let pk = account
                .pub_key
                .as_ref()
                .ok_or_else(|| AnteError::InvalidPubKey("pubkey on account is not set".into()))?;
            let bytes = sign_bytes(
                ctx.chain_id(),
                account.account_number,
                account.sequence,
                &tx.body,
                &tx.auth_info,
            )?;
            if !pk.verify(&bytes, &tx.signatures[i]) {
                tracing::debug!(%signer, "signature verification failed");
                return Err(AnteError::Verification(format!(
                    "signature verification failed; please verify account number ({}), sequence ({}) and chain-id ({})",
                    account.account_number,
                    account.sequence,
                    ctx.chain_id()
                )));
            }
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// IncrementSequenceDecorator
// ---------------------------------------------------------------------------

/// Bumps every signer's sequence by one. Innermost decorator of the native
/// and delegated chains, so it only runs when everything else passed.
///
/// Each bump is a compare-and-increment from the sequence declared in the
/// signer info, the one the signature was checked against. Two copies of
/// one transaction screened at the same time therefore cannot both land:
/// the slower one fails with [`AnteError::WrongSequence`].
pub struct IncrementSequenceDecorator {
    accounts: Arc<dyn AccountKeeper>,
}

impl IncrementSequenceDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>) -> Self {
        Self { accounts }
    }
}

impl AnteDecorator for IncrementSequenceDecorator {
    fn name(&self) -> &'static str {
        "increment_sequence"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        for (i, signer) in tx.signers().iter().enumerate() {
            let declared = tx
                .auth_info
                .signer_infos
                .get(i)
                .map(|info| info.sequence)
                .ok_or_else(|| AnteError::MalformedTransaction(format!("no signer info for signer {}", i)))?;
            let sequence = self.accounts.increment_sequence(signer, declared)?;
            tracing::trace!(%signer, sequence, "sequence incremented");
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
