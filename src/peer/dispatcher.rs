use tracing::{debug, info};

use crate::engine::engine::Engine;
use crate::engine::event::Event;
use crate::engine::handles::LinkRole;
use crate::message::codec::MessageCodec;
use crate::peer::condition::report_condition;
use crate::peer::config::PeerConfig;
use crate::peer::context::PeerContext;
use crate::peer::{receiver, sender};

const BACKLOG: u32 = 16;

/// Counters of a finished run, as observed by the peer itself.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RunStats {
    pub sent: u32,
    pub acknowledged: u32,
    pub received: u32,
    /// True if any condition was reported during the run; maps to a nonzero exit code.
    pub failed: bool,
}

/// Bind the listener, then pull event batches from the engine and handle every event in
///  delivered order until the engine reports global inactivity.
///
/// Protocol faults are handled by closing the affected connection and do not abort the
///  run (they surface in [RunStats::failed]); only unrecoverable errors - a message
///  that cannot be encoded at any size - end it early.
pub fn run<E: Engine, C: MessageCodec>(
    engine: &mut E,
    codec: &C,
    config: PeerConfig,
) -> anyhow::Result<RunStats> {
    let listener = engine.listen(&config.host, &config.port, BACKLOG)?;
    debug!(host = %display_host(&config), port = %config.port, "bound listener");
    let mut ctx = PeerContext::new(config, listener);

    'run: loop {
        let batch = engine.next_batch();
        for event in batch {
            if !handle(engine, codec, &mut ctx, event)? {
                break 'run;
            }
        }
        engine.batch_done();
    }

    Ok(RunStats {
        sent: ctx.sent,
        acknowledged: ctx.acknowledged,
        received: ctx.received,
        failed: ctx.failed,
    })
}

fn display_host(config: &PeerConfig) -> &str {
    if config.host.is_empty() { "*" } else { &config.host }
}

/// The connection lifecycle state machine: handle one event, returning `false` exactly
///  when the engine reported global inactivity. Link-level events are delegated to the
///  sender or receiver role depending on the link's direction.
fn handle<E: Engine, C: MessageCodec>(
    engine: &mut E,
    codec: &C,
    ctx: &mut PeerContext,
    event: Event,
) -> anyhow::Result<bool> {
    let event_name = event.name();
    match event {
        Event::ListenerOpen { .. } => info!("listening"),
        Event::ListenerAccept { listener } => {
            engine.accept(listener);
        }
        Event::ConnectionInit { connection } => {
            engine.connection_set_container(connection, &ctx.config.container_id);
        }
        Event::ConnectionBound { connection } => {
            // the demo peer runs without transport security
            engine.transport_require_auth(connection, false);
            engine.transport_allowed_mechs(connection, "ANONYMOUS");
        }
        Event::ConnectionRemoteOpen { connection } => engine.connection_open(connection),
        Event::SessionRemoteOpen { session } => engine.session_open(session),

        // any remote-initiated close or detach tears down the whole connection rather
        //  than attempting partial recovery
        Event::ConnectionRemoteClose { connection, condition } => {
            report_condition(engine, ctx, event_name, Some(connection), condition.as_ref());
            engine.connection_close(connection);
        }
        Event::SessionRemoteClose { session, condition } => {
            let connection = engine.session_connection(session);
            report_condition(engine, ctx, event_name, Some(connection), condition.as_ref());
            engine.connection_close(connection);
        }
        Event::LinkRemoteClose { link, condition } | Event::LinkRemoteDetach { link, condition } => {
            let connection = engine.session_connection(engine.link_session(link));
            report_condition(engine, ctx, event_name, Some(connection), condition.as_ref());
            engine.connection_close(connection);
        }

        Event::TransportClosed { connection, condition } => {
            report_condition(engine, ctx, event_name, Some(connection), condition.as_ref());
            if let Some(sender) = ctx.sender {
                if engine.session_connection(engine.link_session(sender)) == connection {
                    ctx.sender = None;
                }
            }
            engine.listener_close(ctx.listener);
        }
        Event::ListenerClose { condition, .. } => {
            report_condition(engine, ctx, event_name, None, condition.as_ref());
        }

        Event::Timeout => match ctx.sender {
            Some(link) => {
                let connection = engine.session_connection(engine.link_session(link));
                engine.connection_wake(connection);
            }
            // a pure-receiver run has no sender link; a timer may still fire
            None => debug!("timer fired without a sender link - nothing to wake"),
        },
        Event::ConnectionWake { .. } => {}

        Event::Inactive => return Ok(false),

        Event::LinkRemoteOpen { link } => match engine.link_role(link) {
            LinkRole::Sender => sender::on_link_remote_open(engine, ctx, link),
            LinkRole::Receiver => receiver::on_link_remote_open(engine, ctx, link),
        },
        Event::LinkFlow { link } => {
            if engine.link_role(link) == LinkRole::Sender {
                sender::on_link_flow(engine, codec, ctx, link)?;
            }
        }
        Event::Delivery { delivery } => {
            let link = engine.delivery_link(delivery);
            match engine.link_role(link) {
                LinkRole::Sender => sender::on_delivery(engine, ctx, delivery),
                LinkRole::Receiver => receiver::on_delivery(engine, codec, ctx, delivery),
            }
        }
    }
    Ok(true)
}
