//! Inter-chain packet screening.
//!
//! Relayers race each other to deliver the same packet. Only the first
//! delivery does anything; the rest would still pay fees and fill blocks.
//! In CheckTx and ReCheckTx a transaction whose packet messages are all
//! already received is turned away. A transaction with at least one fresh
//! packet is let through, as are transactions without packets. DeliverTx is
//! never affected: the packet handler itself deals with duplicates.

use std::sync::Arc;

use super::chain::{AnteDecorator, AnteResult, Next};
use super::context::Context;
use super::error::AnteError;
use crate::ledger::PacketVerifier;
use crate::transaction::{Message, Transaction};

/// Rejects transactions made up only of redundant packet deliveries.
pub struct IbcPacketDecorator {
    packets: Arc<dyn PacketVerifier>,
}

impl IbcPacketDecorator {
    pub fn new(packets: Arc<dyn PacketVerifier>) -> Self {
        Self { packets }
    }
}

impl AnteDecorator for IbcPacketDecorator {
    fn name(&self) -> &'static str {
        "ibc_packet"
    }

    fn ante_handle(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult {
        if !ctx.is_check_tx() {
            return next(ctx, tx, simulate);
        }

        let mut packets = 0usize;
        let mut redundant = 0usize;
        for msg in &tx.body.messages {
            if let Message::RecvPacket(packet) = msg {
                packets += 1;
                if self
                    .packets
                    .has_packet_receipt(&packet.destination_channel, packet.sequence)
                {
                    redundant += 1;
                }
            }
        }

        if packets > 0 && packets == redundant {
            return Err(AnteError::PacketRejected(format!(
                "all {} packet messages are redundant",
                packets
            )));
        }
        next(ctx, tx, simulate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ante::testutil::{run_one, send_tx, Fixture};
    use crate::identity::Address;
    use crate::transaction::MsgRecvPacket;

    fn packet(sequence: u64) -> Message {
        Message::RecvPacket(MsgRecvPacket {
            source_channel: "channel-0".into(),
            destination_channel: "channel-7".into(),
            sequence,
            data: b"{}".to_vec(),
            signer: Address::from_bytes([3; 20]),
        })
    }

    #[test]
    fn redundant_packets_rejected_in_check_tx_only() {
        let fx = Fixture::new();
        fx.ledger.record_packet_receipt("channel-7", 1);
        let decorator = IbcPacketDecorator::new(fx.ledger.clone());

        let mut tx = send_tx(10, 100_000);
        tx.body.messages = vec![packet(1)];

        let mut check = fx.ctx().with_check_tx(true);
        assert!(matches!(
            run_one(&decorator, &mut check, &tx, false),
            Err(AnteError::PacketRejected(_))
        ));

        let mut recheck = fx.ctx().with_recheck_tx(true);
        assert!(run_one(&decorator, &mut recheck, &tx, false).is_err());

        let mut deliver = fx.ctx();
        assert!(run_one(&decorator, &mut deliver, &tx, false).is_ok());
    }

    #[test]
    fn one_fresh_packet_is_enough() {
        let fx = Fixture::new();
        fx.ledger.record_packet_receipt("channel-7", 1);
        let decorator = IbcPacketDecorator::new(fx.ledger.clone());

        let mut tx = send_tx(10, 100_000);
        tx.body.messages = vec![packet(1), packet(2)];
        let mut check = fx.ctx().with_check_tx(true);
        assert!(run_one(&decorator, &mut check, &tx, false).is_ok());
    }

    #[test]
    fn no_packets_passes() {
        let fx = Fixture::new();
        let decorator = IbcPacketDecorator::new(fx.ledger.clone());
        let mut check = fx.ctx().with_check_tx(true);
        assert!(run_one(&decorator, &mut check, &send_tx(10, 100_000), false).is_ok());
    }
}
