// Admission pipeline benchmarks.
//
// Covers pure chain selection and a full `AnteHandler::handle` pass for each
// of the three chains. Every handle iteration gets a fresh ledger (built
// outside the timed section), since an admitted transaction bumps the
// sender's sequence and cannot be admitted twice.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use nova_admission::ante::{select_chain, AnteHandler, Context, HandlerOptions};
use nova_admission::config::AnteConfig;
use nova_admission::crypto::Keypair;
use nova_admission::identity::Address;
use nova_admission::ledger::MemoryLedger;
use nova_admission::transaction::{
    sign_eip712, sign_ethereum_msg, sign_transaction, Coins, ExtensionOptionsEthereumTx,
    ExtensionOptionsWeb3Tx, Message, MsgEthereumTx, MsgSend, Transaction, TransactionBuilder,
    TypedDataContext,
};

const CHAIN_ID: &str = "nova-bench-1";

fn setup() -> (Arc<MemoryLedger>, AnteHandler, AnteConfig) {
    let ledger = Arc::new(MemoryLedger::new());
    let config = AnteConfig::default();
    ledger.register_module(&config.fee_collector_name);
    let handler = AnteHandler::new(HandlerOptions::from_ledger(ledger.clone(), config.clone()))
        .expect("handler");
    (ledger, handler, config)
}

fn send(from: &Keypair) -> Message {
    Message::Send(MsgSend {
        from: from.address(),
        to: Address::from_bytes([0xEE; 20]),
        amount: Coins::single("photon", 1),
    })
}

fn native_tx(ledger: &MemoryLedger, kp: &Keypair) -> Transaction {
    let account = ledger.ensure_account(&kp.address());
    ledger.fund(&kp.address(), &Coins::single("photon", 1_000_000));
    let mut tx = TransactionBuilder::new()
        .message(send(kp))
        .fee(Coins::single("photon", 10), 200_000)
        .signer(Some(kp.public_key()), 0)
        .build();
    sign_transaction(&mut tx, kp, CHAIN_ID, account.account_number, 0).expect("sign");
    tx
}

fn web3_tx(ledger: &MemoryLedger, config: &AnteConfig, kp: &Keypair) -> Transaction {
    let account = ledger.ensure_account(&kp.address());
    ledger.fund(&kp.address(), &Coins::single("photon", 1_000_000));
    let ext = ExtensionOptionsWeb3Tx {
        typed_data_chain_id: config.evm.chain_id,
        ..Default::default()
    };
    let mut tx = TransactionBuilder::new()
        .message(send(kp))
        .fee(Coins::single("photon", 10), 200_000)
        .signer(Some(kp.public_key()), 0)
        .extension(&ext)
        .expect("pack")
        .build();
    let typed = TypedDataContext {
        chain_id: CHAIN_ID,
        evm_chain_id: config.evm.chain_id,
        account_number: account.account_number,
        sequence: 0,
        fee_payer: kp.address(),
    };
    sign_eip712(&mut tx, kp, &typed).expect("sign");
    tx
}

fn eth_tx(ledger: &MemoryLedger, config: &AnteConfig, kp: &Keypair) -> Transaction {
    ledger.fund(&kp.address(), &Coins::single("photon", 1_000_000));
    let mut msg = MsgEthereumTx {
        from: kp.address(),
        to: Some(Address::from_bytes([0xCA; 20])),
        nonce: 0,
        gas_price: 1,
        gas_limit: 21_000,
        value: 0,
        data: Vec::new(),
        chain_id: config.evm.chain_id,
        signature: Vec::new(),
    };
    sign_ethereum_msg(&mut msg, kp).expect("sign");
    TransactionBuilder::new()
        .fee(Coins::single("photon", msg.gas_fee()), msg.gas_limit)
        .message(Message::EthereumTx(msg))
        .extension(&ExtensionOptionsEthereumTx::default())
        .expect("pack")
        .build()
}

fn bench_select_chain(c: &mut Criterion) {
    let (ledger, _, config) = setup();
    let kp = Keypair::generate_secp256k1();
    let tx = web3_tx(&ledger, &config, &kp);

    c.bench_function("ante/select_chain", |b| {
        b.iter(|| select_chain(&tx));
    });
}

fn bench_handle(c: &mut Criterion) {
    let mut group = c.benchmark_group("ante/handle");
    let ed = Keypair::generate_ed25519();
    let secp = Keypair::generate_secp256k1();

    group.bench_function("standard", |b| {
        b.iter_batched(
            || {
                let (ledger, handler, _) = setup();
                let tx = native_tx(&ledger, &ed);
                (handler, tx)
            },
            |(handler, tx)| {
                let mut ctx = Context::new(CHAIN_ID, 10);
                handler.handle(&mut ctx, &tx, false)
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("evm", |b| {
        b.iter_batched(
            || {
                let (ledger, handler, config) = setup();
                let tx = eth_tx(&ledger, &config, &secp);
                (handler, tx)
            },
            |(handler, tx)| {
                let mut ctx = Context::new(CHAIN_ID, 10);
                handler.handle(&mut ctx, &tx, false)
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("delegated", |b| {
        b.iter_batched(
            || {
                let (ledger, handler, config) = setup();
                let tx = web3_tx(&ledger, &config, &secp);
                (handler, tx)
            },
            |(handler, tx)| {
                let mut ctx = Context::new(CHAIN_ID, 10);
                handler.handle(&mut ctx, &tx, false)
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_select_chain, bench_handle);
criterion_main!(benches);
