use tracing::{info, trace};

use crate::engine::engine::Engine;
use crate::engine::handles::{DeliveryId, DeliveryTag, Disposition, LinkId};
use crate::message::codec::{EncodeError, MessageCodec};
use crate::message::message::Message;
use crate::peer::context::PeerContext;
use crate::util::buf::EncodeBuffer;

/// The remote attached a receiving link, making this endpoint a sender: name the target
///  address, complete the attach and remember the link for timer wakes.
pub fn on_link_remote_open(engine: &mut impl Engine, ctx: &mut PeerContext, link: LinkId) {
    engine.link_set_target_address(link, &ctx.config.address);
    engine.link_open(link);
    ctx.sender = Some(link);
}

/// The peer granted credit. Transmit until either the credit or the configured message
///  count is exhausted - never beyond the credit, oversending is a protocol violation.
pub fn on_link_flow(
    engine: &mut impl Engine,
    codec: &impl MessageCodec,
    ctx: &mut PeerContext,
    link: LinkId,
) -> anyhow::Result<()> {
    while engine.link_credit(link) > 0 && ctx.sent < ctx.config.count {
        let sequence = ctx.sent;
        ctx.sent += 1;

        // the sequence number doubles as the delivery tag - unique within the link
        engine.delivery(link, DeliveryTag(sequence as u64));
        let len = encode_message(&mut ctx.buffer, codec, sequence)?;
        engine.send(link, &ctx.buffer.as_slice()[..len])?;
        engine.advance(link);
        trace!(sequence, "transmitted message");
    }
    Ok(())
}

/// The peer updated a delivery we sent. Once every transmitted message is accepted,
///  initiate the connection close; events keep being handled until the engine reports
///  the transport closed, so the close handshake can finish cleanly.
pub fn on_delivery(engine: &mut impl Engine, ctx: &mut PeerContext, delivery: DeliveryId) {
    if engine.delivery_remote_disposition(delivery) != Some(Disposition::Accepted) {
        return;
    }

    ctx.acknowledged += 1;
    if ctx.acknowledged == ctx.config.count {
        info!("{} messages sent and acknowledged", ctx.acknowledged);
        let link = engine.delivery_link(delivery);
        let session = engine.link_session(link);
        let connection = engine.session_connection(session);
        engine.connection_close(connection);
    }
}

/// Encode a message with the given sequence number into the shared buffer, doubling its
///  capacity until the encoding fits. Any non-overflow codec error is fatal to the run.
fn encode_message(
    buffer: &mut EncodeBuffer,
    codec: &impl MessageCodec,
    sequence: u32,
) -> anyhow::Result<usize> {
    let message = Message::with_sequence(sequence);
    loop {
        match codec.encode(&message, buffer.as_mut_slice()) {
            Ok(len) => return Ok(len),
            Err(EncodeError::Overflow) => buffer.grow(),
            Err(EncodeError::Malformed(e)) => return Err(e.context("error encoding message")),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use anyhow::anyhow;
    use rstest::rstest;

    use crate::engine::engine::MockEngine;
    use crate::engine::handles::ListenerId;
    use crate::message::codec::MockMessageCodec;
    use crate::message::wire::WireCodec;
    use crate::peer::config::PeerConfig;

    use super::*;

    fn test_context(count: u32) -> PeerContext {
        let mut config = PeerConfig::new("test");
        config.count = count;
        PeerContext::new(config, ListenerId(1))
    }

    /// Mock engine for the send loop: tracks a credit balance that every send
    ///  decrements, and records the sequence numbers of the transmitted messages.
    fn send_loop_engine(credit: Arc<Mutex<u32>>, sent_sequences: Arc<Mutex<Vec<i64>>>) -> MockEngine {
        let mut engine = MockEngine::new();
        engine.expect_link_credit().returning({
            let credit = credit.clone();
            move |_| *credit.lock().unwrap()
        });
        engine.expect_delivery().returning(|_, tag| DeliveryId(tag.0));
        engine.expect_send().returning(move |_, bytes| {
            let mut credit = credit.lock().unwrap();
            assert!(*credit > 0, "transmitted without credit");
            *credit -= 1;

            let message = WireCodec.decode(bytes).unwrap();
            sent_sequences.lock().unwrap().push(message.sequence().unwrap());
            Ok(())
        });
        engine.expect_advance().return_const(());
        engine
    }

    #[rstest]
    #[case::credit_is_the_limit(3, 5, vec![0, 1, 2])]
    #[case::count_is_the_limit(100, 3, vec![0, 1, 2])]
    #[case::exact_fit(5, 5, vec![0, 1, 2, 3, 4])]
    #[case::no_credit(0, 5, vec![])]
    #[case::count_zero(10, 0, vec![])]
    fn test_flow_sends_min_of_credit_and_count(
        #[case] credit: u32,
        #[case] count: u32,
        #[case] expected_sequences: Vec<i64>,
    ) {
        let credit = Arc::new(Mutex::new(credit));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut engine = send_loop_engine(credit, sent.clone());
        let mut ctx = test_context(count);

        on_link_flow(&mut engine, &WireCodec, &mut ctx, LinkId(4)).unwrap();

        assert_eq!(*sent.lock().unwrap(), expected_sequences);
        assert_eq!(ctx.sent, expected_sequences.len() as u32);
    }

    #[test]
    fn test_cumulative_credit_grants_resume_the_sequence() {
        let credit = Arc::new(Mutex::new(3));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut engine = send_loop_engine(credit.clone(), sent.clone());
        let mut ctx = test_context(5);

        on_link_flow(&mut engine, &WireCodec, &mut ctx, LinkId(4)).unwrap();
        assert_eq!(*sent.lock().unwrap(), vec![0, 1, 2]);

        // a later grant continues where the first one left off
        *credit.lock().unwrap() = 4;
        on_link_flow(&mut engine, &WireCodec, &mut ctx, LinkId(4)).unwrap();
        assert_eq!(*sent.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(ctx.sent, 5);
    }

    #[test]
    fn test_link_remote_open_attaches_and_registers_sender() {
        let mut engine = MockEngine::new();
        engine.expect_link_set_target_address()
            .withf(|link, address| *link == LinkId(4) && address == "example")
            .times(1)
            .return_const(());
        engine.expect_link_open()
            .withf(|link| *link == LinkId(4))
            .times(1)
            .return_const(());
        let mut ctx = test_context(5);

        on_link_remote_open(&mut engine, &mut ctx, LinkId(4));

        assert_eq!(ctx.sender, Some(LinkId(4)));
    }

    #[test]
    fn test_connection_closes_only_after_the_last_ack() {
        let mut engine = MockEngine::new();
        engine.expect_delivery_remote_disposition()
            .returning(|_| Some(Disposition::Accepted));
        engine.expect_delivery_link().return_const(LinkId(4));
        engine.expect_link_session().return_const(crate::engine::handles::SessionId(3));
        engine.expect_session_connection().return_const(crate::engine::handles::ConnectionId(2));
        engine.expect_connection_close()
            .withf(|conn| *conn == crate::engine::handles::ConnectionId(2))
            .times(1)
            .return_const(());
        let mut ctx = test_context(5);
        ctx.sent = 5;

        for i in 0..4 {
            on_delivery(&mut engine, &mut ctx, DeliveryId(i));
            assert_eq!(ctx.acknowledged, i as u32 + 1);
        }
        // four acks must not have closed anything: the close expectation still allows
        //  exactly one call, which the fifth ack consumes
        on_delivery(&mut engine, &mut ctx, DeliveryId(4));
        assert_eq!(ctx.acknowledged, 5);
    }

    #[rstest]
    #[case::pending(None)]
    #[case::rejected(Some(Disposition::Rejected))]
    #[case::released(Some(Disposition::Released))]
    fn test_non_accepted_dispositions_are_not_acks(#[case] disposition: Option<Disposition>) {
        let mut engine = MockEngine::new();
        engine.expect_delivery_remote_disposition().return_const(disposition);
        let mut ctx = test_context(5);

        on_delivery(&mut engine, &mut ctx, DeliveryId(0));

        assert_eq!(ctx.acknowledged, 0);
    }

    #[test]
    fn test_encode_grows_the_buffer_until_the_message_fits() {
        let mut codec = MockMessageCodec::new();
        codec.expect_encode().returning(|_, buf| {
            if buf.len() < 1024 {
                Err(EncodeError::Overflow)
            } else {
                Ok(777)
            }
        });
        let mut buffer = EncodeBuffer::new();

        let len = encode_message(&mut buffer, &codec, 0).unwrap();

        assert_eq!(len, 777);
        assert_eq!(buffer.capacity(), 1024);
    }

    #[test]
    fn test_malformed_message_aborts() {
        let mut codec = MockMessageCodec::new();
        codec.expect_encode()
            .returning(|_, _| Err(EncodeError::Malformed(anyhow!("broken"))));
        let mut buffer = EncodeBuffer::new();

        assert!(encode_message(&mut buffer, &codec, 0).is_err());
        // the failed attempt must not have grown anything
        assert_eq!(buffer.capacity(), EncodeBuffer::INITIAL_CAPACITY);
    }
}
