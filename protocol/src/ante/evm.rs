//! # EVM Chain Decorators
//!
//! Decorators for transactions that wrap one or more [`MsgEthereumTx`]. Such
//! a transaction carries no native signatures: authorisation comes from the
//! recoverable signature inside each message, and the fee is the sum of the
//! messages' `gas_price * gas_limit`, paid by each sender to the fee
//! collector in the gas consumption step.
//!
//! ```text
//! eth_set_up_context -> mempool_fee -> eth_validate_basic -> eth_sig_verification
//!   -> eth_account_verification -> eth_nonce_verification -> eth_gas_consume
//!   -> can_transfer -> eth_increment_sender_sequence
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::chain::{AnteDecorator, AnteResult, Next};
use super::context::{Context, GasMeter};
use super::error::AnteError;
use crate::config::EvmParams;
use crate::crypto::ecdsa::recover_address;
use crate::identity::Address;
use crate::ledger::{AccountKeeper, BankKeeper};
use crate::transaction::{Coins, Message, MsgEthereumTx, Transaction};

/// Base cost of any Ethereum transaction.
pub const TX_GAS: u64 = 21_000;
/// Base cost of a contract creation.
pub const TX_GAS_CONTRACT_CREATION: u64 = 53_000;
/// Calldata cost per zero byte.
pub const TX_DATA_ZERO_GAS: u64 = 4;
/// Calldata cost per non-zero byte.
pub const TX_DATA_NON_ZERO_GAS: u64 = 16;

/// Minimum gas an Ethereum message needs before executing a single opcode.
pub fn intrinsic_gas(msg: &MsgEthereumTx) -> u64 {
    let base = if msg.is_contract_creation() {
        TX_GAS_CONTRACT_CREATION
    } else {
        TX_GAS
    };
    let zeros = msg.data.iter().filter(|b| **b == 0).count() as u64;
    let non_zeros = msg.data.len() as u64 - zeros;
    base.saturating_add(zeros.saturating_mul(TX_DATA_ZERO_GAS))
        .saturating_add(non_zeros.saturating_mul(TX_DATA_NON_ZERO_GAS))
}

fn eth_msgs(tx: &Transaction) -> Result<Vec<&MsgEthereumTx>, AnteError> {
    tx.body
        .messages
        .iter()
        .map(|msg| match msg {
            Message::EthereumTx(eth) => Ok(eth),
            other => Err(AnteError::InvalidEthereumTx(format!(
                "invalid message type {}, expected ethereum tx",
                other.type_name()
            ))),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// EthSetUpContextDecorator
// ---------------------------------------------------------------------------

/// EVM gas is accounted by the gas consumption step, so until then the
/// meter must not run dry.
#[derive(Debug, Default)]
pub struct EthSetUpContextDecorator;

impl AnteDecorator for EthSetUpContextDecorator {
    fn name(&self) -> &'static str {
        "eth_set_up_context"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        ctx.set_gas_meter(GasMeter::infinite());
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// EthValidateBasicDecorator
// ---------------------------------------------------------------------------

/// Structural checks for a wrapped Ethereum transaction.
///
/// Only [`MsgEthereumTx`] messages, exactly one extension option, no native
/// signatures or signer infos, and an auth-info fee that mirrors the
/// messages exactly. Skipped on ReCheckTx.
pub struct EthValidateBasicDecorator {
    evm: EvmParams,
}

impl EthValidateBasicDecorator {
    pub fn new(evm: EvmParams) -> Self {
        Self { evm }
    }
}

impl AnteDecorator for EthValidateBasicDecorator {
    fn name(&self) -> &'static str {
        "eth_validate_basic"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        if ctx.is_recheck_tx() {
            return next(ctx, tx, simulate);
        }

        if tx.body.messages.is_empty() {
            return Err(AnteError::InvalidEthereumTx("no messages".into()));
        }
        if tx.body.extension_options.len() != 1 {
            return Err(AnteError::InvalidEthereumTx(format!(
                "expected exactly one extension option, got {}",
                tx.body.extension_options.len()
            )));
        }
        if !tx.signatures.is_empty() || !tx.auth_info.signer_infos.is_empty() {
            return Err(AnteError::InvalidEthereumTx(
                "native signatures and signer infos must be empty".into(),
            ));
        }

        for msg in &tx.body.messages {
            msg.validate_basic()?;
        }

        let mut total_fee: u128 = 0;
        let mut total_gas: u64 = 0;
        for msg in eth_msgs(tx)? {
            total_fee = total_fee.saturating_add(msg.gas_fee());
            total_gas = total_gas.saturating_add(msg.gas_limit);
        }

        let fee = tx.fee().ok_or(AnteError::NotFeeBearing)?;
        let expected = Coins::single(self.evm.denom.clone(), total_fee);
        if fee.amount != expected {
            return Err(AnteError::InvalidEthereumTx(format!(
                "invalid fee {}, expected {}",
                fee.amount, expected
            )));
        }
        if fee.gas_limit != total_gas {
            return Err(AnteError::InvalidEthereumTx(format!(
                "invalid gas limit {}, expected {}",
                fee.gas_limit, total_gas
            )));
        }

        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// EthSigVerificationDecorator
// ---------------------------------------------------------------------------

/// Recovers each message's sender and checks it against the declared
/// `from`. The message must be signed for this EVM chain id.
pub struct EthSigVerificationDecorator {
    chain_id: u64,
}

impl EthSigVerificationDecorator {
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }
}

impl AnteDecorator for EthSigVerificationDecorator {
    fn name(&self) -> &'static str {
        "eth_sig_verification"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        for msg in eth_msgs(tx)? {
            if msg.chain_id != self.chain_id {
                return Err(AnteError::InvalidChainId {
                    expected: self.chain_id,
                    got: msg.chain_id,
                });
            }
            let sender = recover_address(&msg.sighash(), &msg.signature).map_err(|e| {
                AnteError::Verification(format!("couldn't retrieve sender address: {}", e))
            })?;
            if sender != msg.from {
                return Err(AnteError::Verification(format!(
                    "recovered sender {} does not match declared from {}",
                    sender, msg.from
                )));
            }
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// EthAccountVerificationDecorator
// ---------------------------------------------------------------------------

/// Senders get an account on first use. Contract accounts cannot send, and
/// every sender must hold enough to cover gas plus value of all its
/// messages in the transaction together.
pub struct EthAccountVerificationDecorator {
    accounts: Arc<dyn AccountKeeper>,
    bank: Arc<dyn BankKeeper>,
    denom: String,
}

impl EthAccountVerificationDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>, bank: Arc<dyn BankKeeper>, denom: String) -> Self {
        Self {
            accounts,
            bank,
            denom,
        }
    }
}

impl AnteDecorator for EthAccountVerificationDecorator {
    fn name(&self) -> &'static str {
        "eth_account_verification"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        let mut owed: HashMap<Address, u128> = HashMap::new();
        for msg in eth_msgs(tx)? {
            let account = match self.accounts.get_account(&msg.from) {
                Some(account) => account,
                None => {
                    tracing::debug!(sender = %msg.from, "creating account for new evm sender");
                    self.accounts.new_account(&msg.from)
                }
            };
            if account.is_contract() {
                return Err(AnteError::InvalidEthereumTx(format!(
                    "the sender is not an EOA: address {}",
                    msg.from
                )));
            }

            let total = owed.entry(msg.from).or_insert(0);
            *total = total.saturating_add(msg.cost());
            let balance = self.bank.balance(&msg.from, &self.denom);
            if balance < *total {
                return Err(AnteError::InsufficientFunds(format!(
                    "sender balance {}{} < tx cost {}{}",
                    balance, self.denom, total, self.denom
                )));
            }
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// EthNonceVerificationDecorator
// ---------------------------------------------------------------------------

/// Each message's nonce must equal the sender's sequence, counting earlier
/// messages from the same sender in this transaction.
pub struct EthNonceVerificationDecorator {
    accounts: Arc<dyn AccountKeeper>,
}

impl EthNonceVerificationDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>) -> Self {
        Self { accounts }
    }
}

impl AnteDecorator for EthNonceVerificationDecorator {
    fn name(&self) -> &'static str {
        "eth_nonce_verification"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        let mut expected: HashMap<Address, u64> = HashMap::new();
        for msg in eth_msgs(tx)? {
            let nonce = match expected.get(&msg.from) {
                Some(n) => *n,
                None => {
                    self.accounts
                        .get_account(&msg.from)
                        .ok_or(AnteError::UnknownAccount(msg.from))?
                        .sequence
                }
            };
            if msg.nonce != nonce {
                return Err(AnteError::InvalidNonce {
                    expected: nonce,
                    got: msg.nonce,
                });
            }
            let following = nonce
                .checked_add(1)
                .ok_or(AnteError::SequenceOverflow(msg.from))?;
            expected.insert(msg.from, following);
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// EthGasConsumeDecorator
// ---------------------------------------------------------------------------

/// Checks the intrinsic gas of every message, moves the gas fees from each
/// sender to the fee collector, and hands the rest of the pass a meter that
/// reports the total gas wanted.
///
/// Fees are summed per sender and every sender's balance is checked before
/// the first transfer, so a sender whose messages together cost more than
/// it holds moves nothing. Each sender then pays in one transfer.
pub struct EthGasConsumeDecorator {
    bank: Arc<dyn BankKeeper>,
    fee_collector: Address,
    denom: String,
}

impl EthGasConsumeDecorator {
    pub fn new(bank: Arc<dyn BankKeeper>, fee_collector: Address, denom: String) -> Self {
        Self {
            bank,
            fee_collector,
            denom,
        }
    }
}

impl AnteDecorator for EthGasConsumeDecorator {
    fn name(&self) -> &'static str {
        "eth_gas_consume"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        let mut gas_wanted: u64 = 0;
        let mut intrinsic_total: u64 = 0;
        let mut fees: Vec<(Address, u128)> = Vec::new();

        for msg in eth_msgs(tx)? {
            let intrinsic = intrinsic_gas(msg);
            if msg.gas_limit < intrinsic {
                return Err(AnteError::InvalidEthereumTx(format!(
                    "gas limit {} is below intrinsic gas {}",
                    msg.gas_limit, intrinsic
                )));
            }
            gas_wanted = gas_wanted.saturating_add(msg.gas_limit);
            intrinsic_total = intrinsic_total.saturating_add(intrinsic);

            match fees.iter_mut().find(|(sender, _)| *sender == msg.from) {
                Some((_, owed)) => *owed = owed.saturating_add(msg.gas_fee()),
                None => fees.push((msg.from, msg.gas_fee())),
            }
        }

        for (sender, owed) in &fees {
            let balance = self.bank.balance(sender, &self.denom);
            if balance < *owed {
                return Err(AnteError::InsufficientFunds(format!(
                    "{} holds {}{} but owes {}{} in gas fees",
                    sender, balance, self.denom, owed, self.denom
                )));
            }
        }
        for (sender, owed) in fees {
            let fee = Coins::single(self.denom.clone(), owed);
            if !fee.is_zero() {
                self.bank.send_coins(&sender, &self.fee_collector, &fee)?;
                tracing::debug!(%sender, %fee, "evm gas fee deducted");
            }
        }

        let mut meter = GasMeter::infinite_with_limit(gas_wanted);
        meter.consume_gas(intrinsic_total, "intrinsic gas");
        ctx.set_gas_meter(meter);

        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// CanTransferDecorator
// ---------------------------------------------------------------------------

/// After gas has been paid, each sender must still hold the value it wants
/// to transfer.
pub struct CanTransferDecorator {
    bank: Arc<dyn BankKeeper>,
    denom: String,
}

impl CanTransferDecorator {
    pub fn new(bank: Arc<dyn BankKeeper>, denom: String) -> Self {
        Self { bank, denom }
    }
}

impl AnteDecorator for CanTransferDecorator {
    fn name(&self) -> &'static str {
        "can_transfer"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        for msg in eth_msgs(tx)? {
            if msg.value == 0 {
                continue;
            }
            let balance = self.bank.balance(&msg.from, &self.denom);
            if balance < msg.value {
                return Err(AnteError::InsufficientFunds(format!(
                    "failed to transfer {}{} from {}: balance {}{}",
                    msg.value, self.denom, msg.from, balance, self.denom
                )));
            }
        }
        next(ctx, tx, simulate)
    }
}

// ---------------------------------------------------------------------------
// EthIncrementSenderSequenceDecorator
// ---------------------------------------------------------------------------

/// Bumps the sender's sequence for every call message. Contract creations
/// are left alone: executing the creation bumps the nonce.
///
/// A sender's first message pins the sequence its nonce was verified
/// against, and every bump is a compare-and-increment from there, so a
/// replay screened concurrently with the original fails with
/// [`AnteError::WrongSequence`].
pub struct EthIncrementSenderSequenceDecorator {
    accounts: Arc<dyn AccountKeeper>,
}

impl EthIncrementSenderSequenceDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>) -> Self {
        Self { accounts }
    }
}

impl AnteDecorator for EthIncrementSenderSequenceDecorator {
    fn name(&self) -> &'static str {
        "eth_increment_sender_sequence"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        let mut stored: HashMap<Address, u64> = HashMap::new();
        for msg in eth_msgs(tx)? {
            let expected = *stored.entry(msg.from).or_insert(msg.nonce);
            if msg.is_contract_creation() {
                continue;
            }
            let sequence = self.accounts.increment_sequence(&msg.from, expected)?;
            stored.insert(msg.from, sequence);
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
    use crate::ante::testutil::{run_one, Fixture};
    use crate::crypto::keys::Keypair;
    use crate::transaction::{
        sign_ethereum_msg, ExtensionOption, ExtensionOptionsEthereumTx, TransactionBuilder,
    };

    fn eth_msg(kp: &Keypair, nonce: u64, value: u128) -> MsgEthereumTx {
        let mut msg = MsgEthereumTx {
            from: kp.address(),
            to: Some(Address::from_bytes([0xAB; 20])),
            nonce,
            gas_price: 2,
            gas_limit: 30_000,
            value,
            data: vec![0, 1, 2],
            chain_id: 9_740,
            signature: Vec::new(),
        };
        sign_ethereum_msg(&mut msg, kp).unwrap();
        msg
    }

    fn eth_tx(msgs: Vec<MsgEthereumTx>) -> Transaction {
        let fee: u128 = msgs.iter().map(|m| m.gas_fee()).sum();
        let gas: u64 = msgs.iter().map(|m| m.gas_limit).sum();
        let mut builder = TransactionBuilder::new()
            .fee(Coins::single("photon", fee), gas)
            .extension_option(ExtensionOption::pack(&ExtensionOptionsEthereumTx::default()).unwrap());
        for msg in msgs {
            builder = builder.message(Message::EthereumTx(msg));
        }
        builder.build()
    }

    #[test]
    fn intrinsic_gas_counts_calldata() {
        let kp = Keypair::generate_secp256k1();
        let msg = eth_msg(&kp, 0, 0);
        assert_eq!(intrinsic_gas(&msg), 21_000 + 4 + 16 * 2);

        let mut create = msg.clone();
        create.to = None;
        assert_eq!(intrinsic_gas(&create), 53_000 + 4 + 16 * 2);
    }

    #[test]
    fn validate_basic_requires_matching_fee() {
        let fx = Fixture::new();
        let kp = Keypair::generate_secp256k1();
        let decorator = EthValidateBasicDecorator::new(fx.config.evm.clone());

        let tx = eth_tx(vec![eth_msg(&kp, 0, 0)]);
        let mut ctx = fx.ctx();
        run_one(&decorator, &mut ctx, &tx, false).unwrap();

        let mut overpaid = tx.clone();
        overpaid.auth_info.fee.as_mut().unwrap().amount = Coins::single("photon", 1);
        assert!(matches!(
            run_one(&decorator, &mut ctx, &overpaid, false),
            Err(AnteError::InvalidEthereumTx(_))
        ));

        let mut signed = tx;
        signed.signatures.push(vec![1; 64]);
        assert!(matches!(
            run_one(&decorator, &mut ctx, &signed, false),
            Err(AnteError::InvalidEthereumTx(_))
        ));
    }

    #[test]
    fn sig_verification_recovers_sender() {
        let kp = Keypair::generate_secp256k1();
        let decorator = EthSigVerificationDecorator::new(9_740);
        let fx = Fixture::new();
        let mut ctx = fx.ctx();

        run_one(&decorator, &mut ctx, &eth_tx(vec![eth_msg(&kp, 0, 0)]), false).unwrap();

        let mut forged = eth_msg(&kp, 0, 0);
        forged.from = Keypair::generate_secp256k1().address();
        assert!(matches!(
            run_one(&decorator, &mut ctx, &eth_tx(vec![forged]), false),
            Err(AnteError::Verification(_))
        ));

        let mut other_chain = eth_msg(&kp, 0, 0);
        other_chain.chain_id = 1;
        sign_ethereum_msg(&mut other_chain, &kp).unwrap();
        assert_eq!(
            run_one(&decorator, &mut ctx, &eth_tx(vec![other_chain]), false),
            Err(AnteError::InvalidChainId {
                expected: 9_740,
                got: 1
            })
        );
    }

    #[test]
    fn account_verification_creates_sender_and_checks_balance() {
        let fx = Fixture::new();
        let kp = Keypair::generate_secp256k1();
        let decorator =
            EthAccountVerificationDecorator::new(fx.accounts(), fx.bank(), "photon".into());
        let tx = eth_tx(vec![eth_msg(&kp, 0, 0)]);

        let mut ctx = fx.ctx();
        assert!(matches!(
            run_one(&decorator, &mut ctx, &tx, false),
            Err(AnteError::InsufficientFunds(_))
        ));
        assert!(fx.ledger.get_account(&kp.address()).is_some());

        fx.fund(&kp.address(), 60_000);
        run_one(&decorator, &mut ctx, &tx, false).unwrap();
    }

    #[test]
    fn contract_accounts_cannot_send() {
        let fx = Fixture::new();
        let kp = Keypair::generate_secp256k1();
        let mut account = fx.ledger.ensure_account(&kp.address());
        account.code_hash = Some([1; 32]);
        fx.ledger.set_account(account);
        fx.fund(&kp.address(), 1_000_000);

        let decorator =
            EthAccountVerificationDecorator::new(fx.accounts(), fx.bank(), "photon".into());
        let mut ctx = fx.ctx();
        assert!(matches!(
            run_one(&decorator, &mut ctx, &eth_tx(vec![eth_msg(&kp, 0, 0)]), false),
            Err(AnteError::InvalidEthereumTx(_))
        ));
    }

    #[test]
    fn nonces_are_sequential_within_a_tx() {
        let fx = Fixture::new();
        let kp = Keypair::generate_secp256k1();
        fx.ledger.ensure_account(&kp.address());
        let decorator = EthNonceVerificationDecorator::new(fx.accounts());
        let mut ctx = fx.ctx();

        let ok = eth_tx(vec![eth_msg(&kp, 0, 0), eth_msg(&kp, 1, 0)]);
        run_one(&decorator, &mut ctx, &ok, false).unwrap();

        let replay = eth_tx(vec![eth_msg(&kp, 0, 0), eth_msg(&kp, 0, 0)]);
        assert_eq!(
            run_one(&decorator, &mut ctx, &replay, false),
            Err(AnteError::InvalidNonce {
                expected: 1,
                got: 0
            })
        );
    }

    #[test]
    fn gas_consume_pays_collector_and_reports_gas_wanted() {
        let fx = Fixture::new();
        let kp = Keypair::generate_secp256k1();
        fx.fund(&kp.address(), 100_000);
        let decorator = EthGasConsumeDecorator::new(fx.bank(), fx.fee_collector, "photon".into());

        let msg = eth_msg(&kp, 0, 0);
        let intrinsic = intrinsic_gas(&msg);
        let mut ctx = fx.ctx();
        run_one(&decorator, &mut ctx, &eth_tx(vec![msg]), false).unwrap();

        assert_eq!(fx.ledger.balance(&kp.address(), "photon"), 40_000);
        assert_eq!(fx.ledger.balance(&fx.fee_collector, "photon"), 60_000);
        assert_eq!(ctx.gas_meter().limit(), Some(30_000));
        assert_eq!(ctx.gas_meter().gas_consumed(), intrinsic);
    }

    #[test]
    fn gas_limit_below_intrinsic_is_rejected() {
        let fx = Fixture::new();
        let kp = Keypair::generate_secp256k1();
        let mut msg = eth_msg(&kp, 0, 0);
        msg.gas_limit = 20_000;
        let decorator = EthGasConsumeDecorator::new(fx.bank(), fx.fee_collector, "photon".into());
        let mut ctx = fx.ctx();
        assert!(matches!(
            run_one(&decorator, &mut ctx, &eth_tx(vec![msg]), false),
            Err(AnteError::InvalidEthereumTx(_))
        ));
        assert!(fx.ledger.transfers().is_empty());
    }

    #[test]
    fn can_transfer_checks_value() {
        let fx = Fixture::new();
        let kp = Keypair::generate_secp256k1();
        fx.fund(&kp.address(), 99);
        let decorator = CanTransferDecorator::new(fx.bank(), "photon".into());
        let mut ctx = fx.ctx();
        assert!(matches!(
            run_one(&decorator, &mut ctx, &eth_tx(vec![eth_msg(&kp, 0, 100)]), false),
            Err(AnteError::InsufficientFunds(_))
        ));
        run_one(&decorator, &mut ctx, &eth_tx(vec![eth_msg(&kp, 0, 99)]), false).unwrap();
    }

    #[test]
    fn increment_skips_contract_creation() {
        let fx = Fixture::new();
        let kp = Keypair::generate_secp256k1();
        fx.ledger.ensure_account(&kp.address());
        let decorator = EthIncrementSenderSequenceDecorator::new(fx.accounts());

        let mut create = eth_msg(&kp, 0, 0);
        create.to = None;
        let mut ctx = fx.ctx();
        run_one(&decorator, &mut ctx, &eth_tx(vec![create]), false).unwrap();
        assert_eq!(fx.ledger.get_account(&kp.address()).unwrap().sequence, 0);

        run_one(&decorator, &mut ctx, &eth_tx(vec![eth_msg(&kp, 0, 0)]), false).unwrap();
        assert_eq!(fx.ledger.get_account(&kp.address()).unwrap().sequence, 1);
    }

    #[test]
    fn account_verification_sums_costs_per_sender() {
        let fx = Fixture::new();
        let kp = Keypair::generate_secp256k1();
        fx.fund(&kp.address(), 100_000);
        let decorator =
            EthAccountVerificationDecorator::new(fx.accounts(), fx.bank(), "photon".into());
        let mut ctx = fx.ctx();

        run_one(&decorator, &mut ctx, &eth_tx(vec![eth_msg(&kp, 0, 0)]), false).unwrap();
        assert!(matches!(
            run_one(
                &decorator,
                &mut ctx,
                &eth_tx(vec![eth_msg(&kp, 0, 0), eth_msg(&kp, 1, 0)]),
                false
            ),
            Err(AnteError::InsufficientFunds(_))
        ));
    }

    #[test]
    fn nonce_at_max_is_rejected() {
        let fx = Fixture::new();
        let kp = Keypair::generate_secp256k1();
        let mut account = fx.ledger.ensure_account(&kp.address());
        account.sequence = u64::MAX;
        fx.ledger.set_account(account);
        let decorator = EthNonceVerificationDecorator::new(fx.accounts());

        assert_eq!(
            run_one(&decorator, &mut fx.ctx(), &eth_tx(vec![eth_msg(&kp, u64::MAX, 0)]), false),
            Err(AnteError::SequenceOverflow(kp.address()))
        );
    }

    #[test]
    fn gas_consume_moves_nothing_when_a_sender_cannot_cover_all_its_messages() {
        let fx = Fixture::new();
        let kp = Keypair::generate_secp256k1();
        fx.fund(&kp.address(), 100_000);
        let decorator = EthGasConsumeDecorator::new(fx.bank(), fx.fee_collector, "photon".into());

        let tx = eth_tx(vec![eth_msg(&kp, 0, 0), eth_msg(&kp, 1, 0)]);
        assert!(matches!(
            run_one(&decorator, &mut fx.ctx(), &tx, false),
            Err(AnteError::InsufficientFunds(_))
        ));
        assert!(fx.ledger.transfers().is_empty());
        assert_eq!(fx.ledger.balance(&kp.address(), "photon"), 100_000);
    }

    #[test]
    fn gas_consume_charges_each_sender_once() {
        let fx = Fixture::new();
        let kp = Keypair::generate_secp256k1();
        fx.fund(&kp.address(), 150_000);
        let decorator = EthGasConsumeDecorator::new(fx.bank(), fx.fee_collector, "photon".into());

        let tx = eth_tx(vec![eth_msg(&kp, 0, 0), eth_msg(&kp, 1, 0)]);
        let mut ctx = fx.ctx();
        run_one(&decorator, &mut ctx, &tx, false).unwrap();

        let transfers = fx.ledger.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].amount, Coins::single("photon", 120_000));
        assert_eq!(ctx.gas_meter().limit(), Some(60_000));
    }

    #[test]
    fn increment_bumps_from_the_verified_nonce_only() {
        let fx = Fixture::new();
        let kp = Keypair::generate_secp256k1();
        fx.ledger.ensure_account(&kp.address());
        let decorator = EthIncrementSenderSequenceDecorator::new(fx.accounts());

        let tx = eth_tx(vec![eth_msg(&kp, 0, 0), eth_msg(&kp, 1, 0)]);
        run_one(&decorator, &mut fx.ctx(), &tx, false).unwrap();
        assert_eq!(fx.ledger.get_account(&kp.address()).unwrap().sequence, 2);

        assert_eq!(
            run_one(&decorator, &mut fx.ctx(), &tx, false),
            Err(AnteError::WrongSequence {
                expected: 2,
                got: 0
            })
        );
        assert_eq!(fx.ledger.get_account(&kp.address()).unwrap().sequence, 2);
    }
}
