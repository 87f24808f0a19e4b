use tracing::error;

use crate::engine::condition::Condition;
use crate::engine::engine::Engine;
use crate::engine::handles::ConnectionId;
use crate::peer::context::PeerContext;

/// Report a condition attached to an event: log it, mark the run as failed and close
///  the connection it belongs to. A protocol fault stays local to its connection - the
///  listener and other connections keep running.
///
/// Calling this with `None` is a no-op, so every lifecycle handler can route through
///  here unconditionally.
pub fn report_condition(
    engine: &mut impl Engine,
    ctx: &mut PeerContext,
    event_name: &str,
    connection: Option<ConnectionId>,
    condition: Option<&Condition>,
) {
    let Some(condition) = condition else {
        return;
    };

    error!("{}: {}: {}", event_name, condition.name, condition.description);
    ctx.failed = true;
    if let Some(connection) = connection {
        engine.connection_close(connection);
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use crate::engine::engine::MockEngine;
    use crate::engine::handles::ListenerId;
    use crate::peer::config::PeerConfig;

    use super::*;

    fn test_context() -> PeerContext {
        PeerContext::new(PeerConfig::new("test"), ListenerId(1))
    }

    #[rstest]
    #[case::with_connection(Some(ConnectionId(7)))]
    #[case::without_connection(None)]
    fn test_set_condition_is_reported(#[case] connection: Option<ConnectionId>) {
        let mut engine = MockEngine::new();
        if let Some(conn) = connection {
            engine.expect_connection_close()
                .withf(move |c| *c == conn)
                .times(1)
                .return_const(());
        }
        let mut ctx = test_context();

        let condition = Condition::new("amqp:resource-limit-exceeded", "out of memory");
        report_condition(&mut engine, &mut ctx, "connection-remote-close", connection, Some(&condition));

        assert!(ctx.failed);
    }

    #[test]
    fn test_unset_condition_is_a_no_op() {
        // no expectations: any engine call would panic
        let mut engine = MockEngine::new();
        let mut ctx = test_context();

        report_condition(&mut engine, &mut ctx, "listener-close", Some(ConnectionId(1)), None);
        report_condition(&mut engine, &mut ctx, "listener-close", Some(ConnectionId(1)), None);

        assert!(!ctx.failed);
    }
}
