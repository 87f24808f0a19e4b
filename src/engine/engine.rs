#[cfg(test)] use mockall::automock;

use crate::engine::event::Event;
use crate::engine::handles::{
    ConnectionId, DeliveryId, DeliveryTag, Disposition, LinkId, LinkRole, ListenerId, SessionId,
};

/// The narrow interface the peer consumes the external engine through. The engine owns
///  sockets, transport security and socket readiness; the peer owns all protocol
///  decisions.
///
/// The contract is strictly single-threaded: the peer calls into the engine only while
///  handling an event (or setting up the listener), and the engine delivers events only
///  when asked via [Engine::next_batch]. Open/close operations are one-way transition
///  requests, acknowledged later through the corresponding remote-open / remote-close /
///  transport-closed events.
#[cfg_attr(test, automock)]
pub trait Engine {
    /// Bind a listener. `port` may be a numeric port or a service name.
    fn listen(&mut self, host: &str, port: &str, backlog: u32) -> anyhow::Result<ListenerId>;

    /// Block until the next batch of events is available. A returned batch is never
    ///  empty; global inactivity is reported as [Event::Inactive].
    fn next_batch(&mut self) -> Vec<Event>;
    /// Signal that the previous batch is fully processed so the engine can reclaim
    ///  per-batch resources.
    fn batch_done(&mut self);

    /// Accept the inbound connection currently offered on `listener`.
    fn accept(&mut self, listener: ListenerId) -> ConnectionId;
    fn listener_close(&mut self, listener: ListenerId);

    fn connection_set_container(&mut self, connection: ConnectionId, container_id: &str);
    /// Whether the transport under this connection insists on authentication.
    fn transport_require_auth(&mut self, connection: ConnectionId, required: bool);
    /// Restrict the security mechanisms the transport may negotiate.
    fn transport_allowed_mechs(&mut self, connection: ConnectionId, mechs: &str);
    fn connection_open(&mut self, connection: ConnectionId);
    fn connection_close(&mut self, connection: ConnectionId);
    /// Nudge a connection out of idle wait; surfaces as [Event::ConnectionWake].
    fn connection_wake(&mut self, connection: ConnectionId);

    fn session_open(&mut self, session: SessionId);
    fn session_close(&mut self, session: SessionId);
    fn session_connection(&self, session: SessionId) -> ConnectionId;

    fn link_open(&mut self, link: LinkId);
    fn link_close(&mut self, link: LinkId);
    fn link_session(&self, link: LinkId) -> SessionId;
    fn link_role(&self, link: LinkId) -> LinkRole;
    fn link_set_target_address(&mut self, link: LinkId, address: &str);
    /// Grant the remote sender `credit` more deliveries on a receiving link.
    fn link_flow(&mut self, link: LinkId, credit: u32);
    /// Remaining credit on the link. The engine decrements this implicitly on every
    ///  send / receive.
    fn link_credit(&self, link: LinkId) -> u32;

    /// Create the next outgoing delivery on a sending link.
    fn delivery(&mut self, link: LinkId, tag: DeliveryTag) -> DeliveryId;
    /// Transmit payload bytes for the link's current delivery. Sending without credit is
    ///  a protocol violation and fails.
    fn send(&mut self, link: LinkId, bytes: &[u8]) -> anyhow::Result<()>;
    /// Move the link's delivery cursor to the next delivery.
    fn advance(&mut self, link: LinkId);

    fn delivery_link(&self, delivery: DeliveryId) -> LinkId;
    fn delivery_readable(&self, delivery: DeliveryId) -> bool;
    /// True while only part of the delivery's payload has arrived.
    fn delivery_partial(&self, delivery: DeliveryId) -> bool;
    /// Number of payload bytes available to read.
    fn delivery_pending(&self, delivery: DeliveryId) -> usize;
    fn delivery_update(&mut self, delivery: DeliveryId, disposition: Disposition);
    /// Finalize the delivery and release its resources on this side.
    fn delivery_settle(&mut self, delivery: DeliveryId);
    fn delivery_remote_disposition(&self, delivery: DeliveryId) -> Option<Disposition>;

    /// Read payload bytes of the link's current delivery into `buf`, returning the
    ///  number of bytes read.
    fn recv(&mut self, link: LinkId, buf: &mut [u8]) -> anyhow::Result<usize>;
}
