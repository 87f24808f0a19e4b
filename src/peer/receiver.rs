use tracing::{info, warn};

use crate::engine::engine::Engine;
use crate::engine::handles::{DeliveryId, Disposition, LinkId};
use crate::message::codec::MessageCodec;
use crate::peer::context::PeerContext;

/// Credit granted per batch when receiving without bound.
pub const BATCH: u32 = 1000;

/// The remote attached a sending link, making this endpoint a receiver: complete the
///  attach and grant initial credit - the whole expected count when bounded, one batch
///  otherwise.
pub fn on_link_remote_open(engine: &mut impl Engine, ctx: &PeerContext, link: LinkId) {
    engine.link_open(link);
    let initial = if ctx.config.count > 0 { ctx.config.count } else { BATCH };
    engine.link_flow(link, initial);
}

/// A delivery arrived. Deliveries whose payload has not fully arrived yet are left
///  alone - a later event delivers the remainder.
///
/// Reading and decoding the payload is for inspection only: a payload that cannot be
///  read or decoded is logged, and the delivery is accepted and settled all the same.
pub fn on_delivery(
    engine: &mut impl Engine,
    codec: &impl MessageCodec,
    ctx: &mut PeerContext,
    delivery: DeliveryId,
) {
    if !engine.delivery_readable(delivery) || engine.delivery_partial(delivery) {
        return;
    }
    let link = engine.delivery_link(delivery);

    let pending = engine.delivery_pending(delivery);
    let mut payload = vec![0u8; pending];
    match engine.recv(link, &mut payload) {
        Ok(len) if len == pending => {
            match codec.decode(&payload) {
                Ok(message) => info!("received message: {:?}", message.body),
                Err(e) => warn!("could not decode received message: {}", e),
            }
        }
        Ok(len) => warn!("short read on delivery: {} of {} bytes", len, pending),
        Err(e) => warn!("error receiving delivery payload: {}", e),
    }

    engine.delivery_update(delivery, Disposition::Accepted);
    engine.advance(link);
    engine.delivery_settle(delivery);

    if ctx.config.count == 0 {
        // unbounded: top the credit back up once it falls below the low-water mark,
        //  rather than granting per message
        let credit = engine.link_credit(link);
        if credit < BATCH / 2 {
            engine.link_flow(link, BATCH - credit);
        }
    } else {
        ctx.received += 1;
        if ctx.received >= ctx.config.count {
            info!("{} messages received", ctx.received);
            let session = engine.link_session(link);
            let connection = engine.session_connection(session);
            engine.link_close(link);
            engine.session_close(session);
            engine.connection_close(connection);
        }
    }
}
