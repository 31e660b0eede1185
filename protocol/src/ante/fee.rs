//! # Fee Resolution & Collection
//!
//! [`DeductFeeDecorator`] works out who pays and moves the fee to the fee
//! collector module account.
//!
//! ```text
//! payer = first signer
//! if first extension option is ExtensionOptionsWeb3Tx with a non-empty fee_payer:
//!     payer = parse(fee_payer)          // InvalidAddress on failure
//! account(payer) must exist             // UnknownPayerAccount
//! if fee != 0:
//!     bank.send_coins(payer -> fee_collector, fee)   // InsufficientFunds / Store
//! next()
//! ```
//!
//! Delegation is resolved here rather than in the dispatcher, so everything
//! else in a chain (signature checks, sequences) does not care who pays.
//! Whether the delegated payer actually agreed to pay is checked by the
//! EIP-712 verifier, which requires the payer's own signature.
//!
//! The fee collector's address is looked up once, when the decorator is
//! built. A node without that module account is misconfigured and refuses
//! to start; it never turns into a per-transaction error.
//!
//! Nothing is refunded here if a later decorator rejects the transaction.
//! Callers that need all-or-nothing semantics run the pipeline against a
//! branched store and drop the branch on rejection.

use std::sync::Arc;

use super::chain::{AnteDecorator, AnteResult, Next};
use super::context::Context;
use super::error::AnteError;
use crate::config::ConfigError;
use crate::identity::Address;
use crate::ledger::{AccountKeeper, BankKeeper};
use crate::transaction::{unpack_first, ExtensionValue, Transaction};

/// Who pays a transaction's fee, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePayer {
    pub address: Address,
    /// `true` when named by a web3 extension option rather than being the
    /// first signer.
    pub delegated: bool,
}

/// Resolve the effective fee payer of `tx` without touching any state.
pub fn resolve_fee_payer(tx: &Transaction) -> Result<FeePayer, AnteError> {
    if let Some(ExtensionValue::Web3Tx(ext)) = unpack_first(tx)? {
        if !ext.fee_payer.is_empty() {
            let address = ext.fee_payer.parse::<Address>().map_err(|e| {
                AnteError::InvalidAddress(format!(
                    "failed to parse feePayer {} from ExtensionOptionsWeb3Tx: {}",
                    ext.fee_payer, e
                ))
            })?;
            return Ok(FeePayer {
                address,
                delegated: true,
            });
        }
    }

    let address = tx
        .fee_payer()
        .ok_or_else(|| AnteError::MalformedTransaction("transaction has no signers".into()))?;
    Ok(FeePayer {
        address,
        delegated: false,
    })
}

/// Deducts the declared fee from the effective payer.
pub struct DeductFeeDecorator {
    accounts: Arc<dyn AccountKeeper>,
    bank: Arc<dyn BankKeeper>,
    fee_collector: Address,
}

impl DeductFeeDecorator {
    /// Resolve the fee collector module account named `fee_collector_name`.
    pub fn new(
        accounts: Arc<dyn AccountKeeper>,
        bank: Arc<dyn BankKeeper>,
        fee_collector_name: &str,
    ) -> Result<Self, ConfigError> {
        let fee_collector = accounts
            .get_module_address(fee_collector_name)
            .ok_or_else(|| ConfigError::MissingModuleAccount(fee_collector_name.to_string()))?;
        Ok(Self::with_collector(accounts, bank, fee_collector))
    }

    /// Use an already resolved fee collector address.
    pub fn with_collector(
        accounts: Arc<dyn AccountKeeper>,
        bank: Arc<dyn BankKeeper>,
        fee_collector: Address,
    ) -> Self {
        Self {
            accounts,
            bank,
            fee_collector,
        }
    }

    /// Where fees go.
    pub fn fee_collector(&self) -> Address {
        self.fee_collector
    }
}

impl AnteDecorator for DeductFeeDecorator {
    fn name(&self) -> &'static str {
        "deduct_fee"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        let fee = tx.fee().ok_or(AnteError::NotFeeBearing)?;
        let payer = resolve_fee_payer(tx)?;

        if self.accounts.get_account(&payer.address).is_none() {
            return Err(AnteError::UnknownPayerAccount(payer.address));
        }

        if !fee.amount.is_zero() {
            self.bank
                .send_coins(&payer.address, &self.fee_collector, &fee.amount)?;
            tracing::debug!(
                payer = %payer.address,
                delegated = payer.delegated,
                fee = %fee.amount,
                "fee deducted"
            );
        }

        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ante::testutil::{run_one, send_tx, Fixture};
    use crate::crypto::keys::Keypair;
    use crate::ledger::MemoryLedger;
    use crate::transaction::{Coins, ExtensionOption, ExtensionOptionsWeb3Tx};

    fn with_payer(mut tx: Transaction, fee_payer: &str) -> Transaction {
        let ext = ExtensionOptionsWeb3Tx {
            typed_data_chain_id: 9_740,
            fee_payer: fee_payer.to_string(),
            fee_payer_sig: Vec::new(),
        };
        tx.body.extension_options = vec![ExtensionOption::pack(&ext).unwrap()];
        tx
    }

    #[test]
    fn missing_fee_collector_is_a_config_error() {
        let ledger = Arc::new(MemoryLedger::new());
        let err = DeductFeeDecorator::new(ledger.clone(), ledger, "fee_collector")
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingModuleAccount(ref name) if name == "fee_collector"));
    }

    #[test]
    fn first_signer_pays_by_default() {
        let fx = Fixture::new();
        let kp = Keypair::generate_ed25519();
        fx.fund(&kp.address(), 100);
        let tx = fx.signed_send(&kp, 10, 100_000);

        let mut ctx = fx.ctx();
        run_one(&fx.deduct_fee(), &mut ctx, &tx, false).unwrap();

        assert_eq!(fx.ledger.balance(&kp.address(), "photon"), 90);
        assert_eq!(fx.ledger.balance(&fx.fee_collector, "photon"), 10);
    }

    #[test]
    fn delegated_payer_pays_instead() {
        let fx = Fixture::new();
        let signer = Keypair::generate_secp256k1();
        let payer = Keypair::generate_secp256k1();
        fx.fund(&signer.address(), 100);
        fx.fund(&payer.address(), 50);
        let tx = with_payer(
            fx.signed_send(&signer, 10, 100_000),
            &payer.address().to_bech32(),
        );

        let mut ctx = fx.ctx();
        run_one(&fx.deduct_fee(), &mut ctx, &tx, false).unwrap();

        assert_eq!(fx.ledger.balance(&signer.address(), "photon"), 100);
        assert_eq!(fx.ledger.balance(&payer.address(), "photon"), 40);
        assert_eq!(fx.ledger.balance(&fx.fee_collector, "photon"), 10);
    }

    #[test]
    fn empty_fee_payer_falls_back_to_signer() {
        let tx = with_payer(send_tx(10, 100_000), "");
        let resolved = resolve_fee_payer(&tx).unwrap();
        assert!(!resolved.delegated);
        assert_eq!(Some(resolved.address), tx.fee_payer());
    }

    #[test]
    fn unparsable_payer_moves_nothing() {
        let fx = Fixture::new();
        let kp = Keypair::generate_ed25519();
        fx.fund(&kp.address(), 100);
        let tx = with_payer(fx.signed_send(&kp, 10, 100_000), "nova1notanaddress");

        let mut ctx = fx.ctx();
        assert!(matches!(
            run_one(&fx.deduct_fee(), &mut ctx, &tx, false),
            Err(AnteError::InvalidAddress(_))
        ));
        assert_eq!(fx.ledger.balance(&kp.address(), "photon"), 100);
        assert!(fx.ledger.transfers().is_empty());
    }

    #[test]
    fn unknown_payer_account() {
        let fx = Fixture::new();
        let kp = Keypair::generate_ed25519();
        let tx = fx.signed_send(&kp, 10, 100_000);

        let mut ctx = fx.ctx();
        assert_eq!(
            run_one(&fx.deduct_fee(), &mut ctx, &tx, false),
            Err(AnteError::UnknownPayerAccount(kp.address()))
        );
    }

    #[test]
    fn insufficient_funds_propagates() {
        let fx = Fixture::new();
        let kp = Keypair::generate_ed25519();
        fx.fund(&kp.address(), 5);
        let tx = fx.signed_send(&kp, 10, 100_000);

        let mut ctx = fx.ctx();
        assert!(matches!(
            run_one(&fx.deduct_fee(), &mut ctx, &tx, false),
            Err(AnteError::InsufficientFunds(_))
        ));
        assert_eq!(fx.ledger.balance(&kp.address(), "photon"), 5);
    }

    #[test]
    fn zero_fee_skips_the_transfer() {
        let fx = Fixture::new();
        let kp = Keypair::generate_ed25519();
        fx.ledger.ensure_account(&kp.address());
        let mut tx = fx.signed_send(&kp, 0, 100_000);
        tx.auth_info.fee.as_mut().unwrap().amount = Coins::empty();

        let mut ctx = fx.ctx();
        run_one(&fx.deduct_fee(), &mut ctx, &tx, false).unwrap();
        assert!(fx.ledger.transfers().is_empty());
    }

    #[test]
    fn no_fee_is_not_fee_bearing() {
        let fx = Fixture::new();
        let mut tx = send_tx(10, 100_000);
        tx.auth_info.fee = None;
        let mut ctx = fx.ctx();
        assert_eq!(
            run_one(&fx.deduct_fee(), &mut ctx, &tx, false),
            Err(AnteError::NotFeeBearing)
        );
    }

    #[test]
    fn undecodable_extension_is_rejected() {
        let mut tx = send_tx(10, 100_000);
        tx.body.extension_options = vec![ExtensionOption {
            type_url: crate::config::WEB3_TX_TYPE_URL.into(),
            value: vec![0xff],
        }];
        assert!(matches!(
            resolve_fee_payer(&tx),
            Err(AnteError::ExtensionDecode(_))
        ));
    }
}
