//! Shared fixtures for decorator unit tests.

use std::sync::Arc;

use super::chain::{AnteDecorator, AnteResult};
use super::context::Context;
use super::fee::DeductFeeDecorator;
use crate::config::AnteConfig;
use crate::crypto::keys::Keypair;
use crate::identity::Address;
use crate::ledger::{AccountKeeper, BankKeeper, MemoryLedger};
use crate::transaction::{
    sign_eip712, sign_fee_payer_eip712, sign_transaction, Coins, ExtensionOption,
    ExtensionOptionsWeb3Tx, Message, MsgSend, Transaction, TransactionBuilder, TypedDataContext,
};

pub const TEST_CHAIN_ID: &str = "nova-test-1";
pub const TEST_HEIGHT: u64 = 5;

/// Run a single decorator with a terminal `next` that admits.
pub fn run_one(
    decorator: &dyn AnteDecorator,
    ctx: &mut Context,
    tx: &Transaction,
    simulate: bool,
) -> AnteResult {
    let terminal = |_: &mut Context, _: &Transaction, _: bool| -> AnteResult { Ok(()) };
    decorator.ante_handle(ctx, tx, simulate, &terminal)
}

/// An unsigned-but-plausible send: fixed key, one dummy signature.
pub fn send_tx(fee: u128, gas: u64) -> Transaction {
    let kp = Keypair::ed25519_from_seed(&[7; 32]);
    let mut tx = TransactionBuilder::new()
        .message(Message::Send(MsgSend {
            from: kp.address(),
            to: Address::from_bytes([9; 20]),
            amount: Coins::single("photon", 1),
        }))
        .fee(Coins::single("photon", fee), gas)
        .signer(Some(kp.public_key()), 0)
        .build();
    tx.signatures.push(vec![0u8; 64]);
    tx
}

/// A ledger with the fee collector registered, plus the default config.
pub struct Fixture {
    pub ledger: Arc<MemoryLedger>,
    pub config: AnteConfig,
    pub fee_collector: Address,
}

impl Fixture {
    pub fn new() -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let config = AnteConfig::default();
        let fee_collector = ledger.register_module(&config.fee_collector_name);
        Self {
            ledger,
            config,
            fee_collector,
        }
    }

    pub fn accounts(&self) -> Arc<dyn AccountKeeper> {
        self.ledger.clone()
    }

    pub fn bank(&self) -> Arc<dyn BankKeeper> {
        self.ledger.clone()
    }

    pub fn ctx(&self) -> Context {
        Context::new(TEST_CHAIN_ID, TEST_HEIGHT)
    }

    pub fn fund(&self, address: &Address, photons: u128) {
        self.ledger.fund(address, &Coins::single("photon", photons));
    }

    pub fn deduct_fee(&self) -> DeductFeeDecorator {
        match DeductFeeDecorator::new(self.accounts(), self.bank(), &self.config.fee_collector_name)
        {
            Ok(d) => d,
            Err(e) => panic!("fee collector registered by Fixture::new: {e}"),
        }
    }

    /// Account exists with `kp`'s key bound and 1_000_000 photon.
    pub fn bind_key(&self, kp: &Keypair) {
        let mut account = self.ledger.ensure_account(&kp.address());
        account.pub_key = Some(kp.public_key());
        self.ledger.set_account(account);
        self.fund(&kp.address(), 1_000_000);
    }

    /// A direct-mode signed send from `kp` at its current account number
    /// and sequence. Does not create the account.
    pub fn signed_send(&self, kp: &Keypair, fee: u128, gas: u64) -> Transaction {
        let (account_number, sequence) = self
            .ledger
            .get_account(&kp.address())
            .map(|a| (a.account_number, a.sequence))
            .unwrap_or((0, 0));

        let mut tx = TransactionBuilder::new()
            .message(Message::Send(MsgSend {
                from: kp.address(),
                to: Address::from_bytes([9; 20]),
                amount: Coins::single("photon", 1),
            }))
            .fee(Coins::single("photon", fee), gas)
            .signer(Some(kp.public_key()), sequence)
            .build();
        sign_transaction(&mut tx, kp, TEST_CHAIN_ID, account_number, sequence).unwrap();
        tx
    }

    /// A web3 send from `signer`, EIP-712 signed. With `payer`, the fee is
    /// delegated and the payer's authorisation is attached.
    pub fn signed_web3_send(
        &self,
        signer: &Keypair,
        payer: Option<&Keypair>,
        fee: u128,
        gas: u64,
    ) -> Transaction {
        let (account_number, sequence) = self
            .ledger
            .get_account(&signer.address())
            .map(|a| (a.account_number, a.sequence))
            .unwrap_or((0, 0));

        let mut ext = ExtensionOptionsWeb3Tx {
            typed_data_chain_id: self.config.evm.chain_id,
            fee_payer: payer.map(|p| p.address().to_bech32()).unwrap_or_default(),
            fee_payer_sig: Vec::new(),
        };
        let mut tx = TransactionBuilder::new()
            .message(Message::Send(MsgSend {
                from: signer.address(),
                to: Address::from_bytes([9; 20]),
                amount: Coins::single("photon", 1),
            }))
            .fee(Coins::single("photon", fee), gas)
            .signer(Some(signer.public_key()), sequence)
            .extension(&ext)
            .unwrap()
            .build();

        let typed = TypedDataContext {
            chain_id: TEST_CHAIN_ID,
            evm_chain_id: self.config.evm.chain_id,
            account_number,
            sequence,
            fee_payer: payer.map(|p| p.address()).unwrap_or_else(|| signer.address()),
        };
        sign_eip712(&mut tx, signer, &typed).unwrap();
        if let Some(payer) = payer {
            ext.fee_payer_sig = sign_fee_payer_eip712(&tx, payer, &typed).unwrap();
            tx.body.extension_options[0] = ExtensionOption::pack(&ext).unwrap();
        }
        tx
    }
}
