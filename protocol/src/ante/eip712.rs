//! # EIP-712 Signature Verification
//!
//! The delegated chain's verifier. A web3 wallet signs the typed-data
//! digest of the transaction (see [`crate::transaction::typed_data`]), and
//! the digest commits to the fee payer. When someone other than the signer
//! pays, that payer must also sign the same digest and put the signature in
//! `ExtensionOptionsWeb3Tx::fee_payer_sig`. Without it anybody could name a
//! rich account as their fee payer.

use std::sync::Arc;

use super::chain::{AnteDecorator, AnteResult, Next};
use super::context::Context;
use super::error::AnteError;
use super::sigverify::signer_account;
use crate::config::AnteConfig;
use crate::crypto::ecdsa::recover_address;
use crate::identity::Address;
use crate::ledger::AccountKeeper;
use crate::transaction::{tx_digest, unpack_first, ExtensionValue, Transaction, TypedDataContext};

/// Verifies the single EIP-712 signature of a web3 transaction and, when
/// the fee is delegated, the fee payer's authorisation.
pub struct Eip712SigVerificationDecorator {
    accounts: Arc<dyn AccountKeeper>,
    evm_chain_id: u64,
    sig_cost: u64,
}

impl Eip712SigVerificationDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>, config: &AnteConfig) -> Self {
        Self {
            accounts,
            evm_chain_id: config.evm.chain_id,
            sig_cost: config.sig_verify_cost_secp256k1,
        }
    }
}

impl AnteDecorator for Eip712SigVerificationDecorator {
    fn name(&self) -> &'static str {
        "eip712_sig_verification"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        let signers = tx.signers();
        let [signer] = signers.as_slice() else {
            return Err(AnteError::Verification(format!(
                "invalid number of signers; expected: 1, got {}",
                signers.len()
            )));
        };
        let signer = *signer;
        if tx.signatures.len() != 1 {
            return Err(AnteError::Verification(format!(
                "invalid number of signatures; expected: 1, got {}",
                tx.signatures.len()
            )));
        }

        let ext = match unpack_first(tx)? {
            Some(ExtensionValue::Web3Tx(ext)) => ext,
            _ => {
                return Err(AnteError::Verification(
                    "first extension option must be ExtensionOptionsWeb3Tx".into(),
                ))
            }
        };
        if ext.typed_data_chain_id != self.evm_chain_id {
            return Err(AnteError::InvalidChainId {
                expected: self.evm_chain_id,
                got: ext.typed_data_chain_id,
            });
        }

        let account = signer_account(self.accounts.as_ref(), &signer)?;
        let declared = tx
            .auth_info
            .signer_infos
            .first()
            .map(|info| info.sequence)
            .ok_or_else(|| AnteError::MalformedTransaction("no signer info".into()))?;
        if declared != account.sequence {
            return Err(AnteError::WrongSequence {
                expected: account.sequence,
                got: declared,
            });
        }

        ctx.gas_meter_mut()
            .consume_gas(self.sig_cost, "ante verify: eip712 secp256k1");

        let fee_payer = if ext.fee_payer.is_empty() {
            signer
        } else {
            ext.fee_payer.parse::<Address>().map_err(|e| {
                AnteError::InvalidAddress(format!("feePayer {}: {}", ext.fee_payer, e))
            })?
        };

        if simulate {
            return next(ctx, tx, simulate);
        }

        let digest = tx_digest(
            tx,
            &TypedDataContext {
                chain_id: ctx.chain_id(),
                evm_chain_id: self.evm_chain_id,
                account_number: account.account_number,
                sequence: account.sequence,
                fee_payer,
            },
        )?;

        let recovered = recover_address(&digest, &tx.signatures[0])
            .map_err(|e| AnteError::Verification(format!("invalid eip712 signature: {}", e)))?;
        if recovered != signer {
            tracing::debug!(%signer, %recovered, "eip712 signer mismatch");
            return Err(AnteError::Verification(format!(
                "eip712 signature recovers {}, expected signer {}",
                recovered, signer
            )));
        }

        if fee_payer != signer {
            let payer = recover_address(&digest, &ext.fee_payer_sig).map_err(|e| {
                AnteError::Verification(format!("invalid fee payer signature: {}", e))
            })?;
            if payer != fee_payer {
                return Err(AnteError::Verification(format!(
                    "fee payer signature recovers {}, expected {}",
                    payer, fee_payer
                )));
            }
        }

        next(ctx, tx, simulate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ante::testutil::{run_one, Fixture};
    use crate::crypto::keys::Keypair;
    use crate::transaction::{ExtensionOption, ExtensionOptionsWeb3Tx};

    fn decorator(fx: &Fixture) -> Eip712SigVerificationDecorator {
        Eip712SigVerificationDecorator::new(fx.accounts(), &fx.config)
    }

    fn rewrite_ext(tx: &mut Transaction, edit: impl FnOnce(&mut ExtensionOptionsWeb3Tx)) {
        let mut ext: ExtensionOptionsWeb3Tx = tx.body.extension_options[0].unpack_as().unwrap();
        edit(&mut ext);
        tx.body.extension_options[0] = ExtensionOption::pack(&ext).unwrap();
    }

    #[test]
    fn accepts_self_paid_web3_tx() {
        let fx = Fixture::new();
        let signer = Keypair::generate_secp256k1();
        fx.bind_key(&signer);
        let tx = fx.signed_web3_send(&signer, None, 10, 100_000);

        let mut ctx = fx.ctx();
        run_one(&decorator(&fx), &mut ctx, &tx, false).unwrap();
        assert_eq!(ctx.gas_meter().gas_consumed(), fx.config.sig_verify_cost_secp256k1);
    }

    #[test]
    fn accepts_authorised_fee_payer() {
        let fx = Fixture::new();
        let signer = Keypair::generate_secp256k1();
        let payer = Keypair::generate_secp256k1();
        fx.bind_key(&signer);
        let tx = fx.signed_web3_send(&signer, Some(&payer), 10, 100_000);

        let mut ctx = fx.ctx();
        run_one(&decorator(&fx), &mut ctx, &tx, false).unwrap();
    }

    #[test]
    fn rejects_payer_without_authorisation() {
        let fx = Fixture::new();
        let signer = Keypair::generate_secp256k1();
        let payer = Keypair::generate_secp256k1();
        fx.bind_key(&signer);
        let mut tx = fx.signed_web3_send(&signer, Some(&payer), 10, 100_000);
        rewrite_ext(&mut tx, |ext| ext.fee_payer_sig.clear());

        let mut ctx = fx.ctx();
        assert!(matches!(
            run_one(&decorator(&fx), &mut ctx, &tx, false),
            Err(AnteError::Verification(_))
        ));
    }

    #[test]
    fn rejects_swapped_fee_payer() {
        let fx = Fixture::new();
        let signer = Keypair::generate_secp256k1();
        let payer = Keypair::generate_secp256k1();
        let victim = Keypair::generate_secp256k1();
        fx.bind_key(&signer);
        let mut tx = fx.signed_web3_send(&signer, Some(&payer), 10, 100_000);
        rewrite_ext(&mut tx, |ext| ext.fee_payer = victim.address().to_bech32());

        let mut ctx = fx.ctx();
        assert!(matches!(
            run_one(&decorator(&fx), &mut ctx, &tx, false),
            Err(AnteError::Verification(_))
        ));
    }

    #[test]
    fn rejects_wrong_typed_data_chain() {
        let fx = Fixture::new();
        let signer = Keypair::generate_secp256k1();
        fx.bind_key(&signer);
        let mut tx = fx.signed_web3_send(&signer, None, 10, 100_000);
        rewrite_ext(&mut tx, |ext| ext.typed_data_chain_id = 1);

        let mut ctx = fx.ctx();
        assert_eq!(
            run_one(&decorator(&fx), &mut ctx, &tx, false),
            Err(AnteError::InvalidChainId {
                expected: fx.config.evm.chain_id,
                got: 1
            })
        );
    }

    #[test]
    fn rejects_tampered_memo() {
        let fx = Fixture::new();
        let signer = Keypair::generate_secp256k1();
        fx.bind_key(&signer);
        let mut tx = fx.signed_web3_send(&signer, None, 10, 100_000);
        tx.body.memo = "sneaky".into();

        let mut ctx = fx.ctx();
        assert!(matches!(
            run_one(&decorator(&fx), &mut ctx, &tx, false),
            Err(AnteError::Verification(_))
        ));
    }

    #[test]
    fn simulation_skips_signature_but_not_sequence() {
        let fx = Fixture::new();
        let signer = Keypair::generate_secp256k1();
        fx.bind_key(&signer);
        let mut tx = fx.signed_web3_send(&signer, None, 10, 100_000);
        tx.signatures[0] = vec![0; 65];

        let mut ctx = fx.ctx();
        run_one(&decorator(&fx), &mut ctx, &tx, true).unwrap();

        tx.auth_info.signer_infos[0].sequence = 9;
        assert!(matches!(
            run_one(&decorator(&fx), &mut ctx, &tx, true),
            Err(AnteError::WrongSequence { .. })
        ));
    }
}
