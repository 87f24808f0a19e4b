use crate::engine::condition::Condition;
use crate::engine::handles::{ConnectionId, DeliveryId, LinkId, ListenerId, SessionId};

/// One protocol-level occurrence delivered by the engine. Events for a given peer are
///  delivered strictly in order, and that order is the only ordering guarantee the
///  engine makes.
///
/// Conditions are carried on the variants they belong to rather than fetched through
///  separate accessors - an event is plain data.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Event {
    ListenerOpen { listener: ListenerId },
    ListenerAccept { listener: ListenerId },
    ListenerClose { listener: ListenerId, condition: Option<Condition> },

    ConnectionInit { connection: ConnectionId },
    ConnectionBound { connection: ConnectionId },
    ConnectionRemoteOpen { connection: ConnectionId },
    ConnectionRemoteClose { connection: ConnectionId, condition: Option<Condition> },
    ConnectionWake { connection: ConnectionId },

    SessionRemoteOpen { session: SessionId },
    SessionRemoteClose { session: SessionId, condition: Option<Condition> },

    LinkRemoteOpen { link: LinkId },
    LinkRemoteClose { link: LinkId, condition: Option<Condition> },
    LinkRemoteDetach { link: LinkId, condition: Option<Condition> },
    LinkFlow { link: LinkId },

    Delivery { delivery: DeliveryId },

    /// The transport below a connection is gone; the final event for that connection.
    TransportClosed { connection: ConnectionId, condition: Option<Condition> },

    /// The engine's timer fired.
    Timeout,

    /// Nothing left alive in the engine - listeners, connections and timers are all gone.
    Inactive,
}

impl Event {
    /// Stable name of the event type, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Event::ListenerOpen { .. } => "listener-open",
            Event::ListenerAccept { .. } => "listener-accept",
            Event::ListenerClose { .. } => "listener-close",
            Event::ConnectionInit { .. } => "connection-init",
            Event::ConnectionBound { .. } => "connection-bound",
            Event::ConnectionRemoteOpen { .. } => "connection-remote-open",
            Event::ConnectionRemoteClose { .. } => "connection-remote-close",
            Event::ConnectionWake { .. } => "connection-wake",
            Event::SessionRemoteOpen { .. } => "session-remote-open",
            Event::SessionRemoteClose { .. } => "session-remote-close",
            Event::LinkRemoteOpen { .. } => "link-remote-open",
            Event::LinkRemoteClose { .. } => "link-remote-close",
            Event::LinkRemoteDetach { .. } => "link-remote-detach",
            Event::LinkFlow { .. } => "link-flow",
            Event::Delivery { .. } => "delivery",
            Event::TransportClosed { .. } => "transport-closed",
            Event::Timeout => "timeout",
            Event::Inactive => "inactive",
        }
    }
}
