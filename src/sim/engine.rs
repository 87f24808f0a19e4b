use std::collections::VecDeque;

use anyhow::bail;
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::engine::condition::Condition;
use crate::engine::engine::Engine;
use crate::engine::event::Event;
use crate::engine::handles::{
    ConnectionId, DeliveryId, DeliveryTag, Disposition, LinkId, LinkRole, ListenerId, SessionId,
};
use crate::message::codec::MessageCodec;
use crate::message::message::Message;
use crate::message::wire::WireCodec;
use crate::sim::remote::{RemoteConfig, RemoteRole};

/// Credit window a receiving remote client grants when it has no message count of its
///  own.
const CREDIT_WINDOW: u32 = 1000;

/// An [Engine] over in-memory entity tables. Calls made by the peer while handling a
///  batch queue their reaction events; they are delivered with the next batch. The
///  scripted remote client reacts synchronously, so an empty queue means nothing will
///  ever happen again - which is exactly the engine's inactivity condition.
pub struct SimEngine {
    remote: RemoteConfig,
    events: VecDeque<Event>,
    id_counter: u64,

    listeners: FxHashMap<ListenerId, ListenerState>,
    connections: FxHashMap<ConnectionId, ConnectionState>,
    sessions: FxHashMap<SessionId, SessionState>,
    links: FxHashMap<LinkId, LinkState>,
    deliveries: FxHashMap<DeliveryId, DeliveryState>,

    /// messages the remote sending client has transmitted so far
    remote_sent: u32,
    /// messages the remote receiving client has accepted so far
    remote_received: u32,
}

struct ListenerState {
    open: bool,
}

struct ConnectionState {
    container_id: Option<String>,
    auth_required: bool,
    allowed_mechs: Option<String>,
    local_open: bool,
    local_closed: bool,
    remote_closed: bool,
    transport_closed: bool,
    session_attached: bool,
}

struct SessionState {
    connection: ConnectionId,
    local_open: bool,
    local_closed: bool,
    link_attached: bool,
}

struct LinkState {
    session: SessionId,
    role: LinkRole,
    target_address: Option<String>,
    credit: u32,
    local_open: bool,
    local_closed: bool,
    /// outgoing delivery under the link's cursor (sender links)
    current_out: Option<DeliveryId>,
    /// received deliveries not yet advanced over (receiver links)
    incoming: VecDeque<DeliveryId>,
}

struct DeliveryState {
    link: LinkId,
    tag: DeliveryTag,
    payload: Option<Vec<u8>>,
    remote_disposition: Option<Disposition>,
    local_disposition: Option<Disposition>,
    settled: bool,
}

impl SimEngine {
    pub fn new(remote: RemoteConfig) -> SimEngine {
        SimEngine {
            remote,
            events: VecDeque::new(),
            id_counter: 0,
            listeners: Default::default(),
            connections: Default::default(),
            sessions: Default::default(),
            links: Default::default(),
            deliveries: Default::default(),
            remote_sent: 0,
            remote_received: 0,
        }
    }

    /// Messages the scripted receiving client accepted so far.
    pub fn remote_received(&self) -> u32 {
        self.remote_received
    }

    fn mint_id(&mut self) -> u64 {
        self.id_counter += 1;
        self.id_counter
    }

    fn connection(&self, id: ConnectionId) -> &ConnectionState {
        self.connections.get(&id).expect("unknown connection handle")
    }

    fn connection_mut(&mut self, id: ConnectionId) -> &mut ConnectionState {
        self.connections.get_mut(&id).expect("unknown connection handle")
    }

    fn session(&self, id: SessionId) -> &SessionState {
        self.sessions.get(&id).expect("unknown session handle")
    }

    fn link(&self, id: LinkId) -> &LinkState {
        self.links.get(&id).expect("unknown link handle")
    }

    fn link_mut(&mut self, id: LinkId) -> &mut LinkState {
        self.links.get_mut(&id).expect("unknown link handle")
    }

    fn delivery_state(&self, id: DeliveryId) -> &DeliveryState {
        self.deliveries.get(&id).expect("unknown delivery handle")
    }

    fn delivery_mut(&mut self, id: DeliveryId) -> &mut DeliveryState {
        self.deliveries.get_mut(&id).expect("unknown delivery handle")
    }

    /// The remote's half of the connection close handshake.
    fn remote_close_connection(&mut self, connection: ConnectionId, condition: Option<Condition>) {
        let conn = self.connection_mut(connection);
        if conn.remote_closed {
            return;
        }
        conn.remote_closed = true;
        self.events.push_back(Event::ConnectionRemoteClose { connection, condition });
    }

    /// The remote sending client: transmit while it has both credit and messages left,
    ///  then close its end of the connection.
    fn pump_remote_sender(&mut self, link_id: LinkId) {
        loop {
            let link = self.link(link_id);
            if link.role != LinkRole::Receiver || link.credit == 0 || self.remote_sent >= self.remote.count {
                break;
            }

            let sequence = self.remote_sent;
            self.remote_sent += 1;
            self.link_mut(link_id).credit -= 1;

            let delivery = DeliveryId(self.mint_id());
            self.deliveries.insert(delivery, DeliveryState {
                link: link_id,
                tag: DeliveryTag(sequence as u64),
                payload: Some(encode_demo_payload(sequence)),
                remote_disposition: None,
                local_disposition: None,
                settled: false,
            });
            self.link_mut(link_id).incoming.push_back(delivery);
            self.events.push_back(Event::Delivery { delivery });
            trace!(sequence, "remote client transmitted a message");
        }

        if self.remote.count > 0 && self.remote_sent >= self.remote.count {
            let connection = self.session(self.link(link_id).session).connection;
            debug!("remote client is done sending - closing its connection");
            self.remote_close_connection(connection, None);
        }
    }
}

impl Engine for SimEngine {
    fn listen(&mut self, host: &str, port: &str, _backlog: u32) -> anyhow::Result<ListenerId> {
        let listener = ListenerId(self.mint_id());
        self.listeners.insert(listener, ListenerState { open: true });
        debug!(%host, %port, "simulated listener bound");
        self.events.push_back(Event::ListenerOpen { listener });
        // the scripted client connects as soon as the listener is up
        self.events.push_back(Event::ListenerAccept { listener });
        Ok(listener)
    }

    fn next_batch(&mut self) -> Vec<Event> {
        if self.events.is_empty() {
            // the remote script only ever reacts to local calls, so a drained queue
            //  means nothing is left alive
            return vec![Event::Inactive];
        }
        self.events.drain(..).collect()
    }

    fn batch_done(&mut self) {
        trace!("event batch released");
    }

    fn accept(&mut self, listener: ListenerId) -> ConnectionId {
        assert!(self.listeners.get(&listener).expect("unknown listener handle").open);
        let connection = ConnectionId(self.mint_id());
        self.connections.insert(connection, ConnectionState {
            container_id: None,
            auth_required: true,
            allowed_mechs: None,
            local_open: false,
            local_closed: false,
            remote_closed: false,
            transport_closed: false,
            session_attached: false,
        });
        self.events.push_back(Event::ConnectionInit { connection });
        self.events.push_back(Event::ConnectionBound { connection });
        self.events.push_back(Event::ConnectionRemoteOpen { connection });
        connection
    }

    fn listener_close(&mut self, listener: ListenerId) {
        let state = self.listeners.get_mut(&listener).expect("unknown listener handle");
        if !state.open {
            return;
        }
        state.open = false;
        self.events.push_back(Event::ListenerClose { listener, condition: None });
    }

    fn connection_set_container(&mut self, connection: ConnectionId, container_id: &str) {
        self.connection_mut(connection).container_id = Some(container_id.to_string());
    }

    fn transport_require_auth(&mut self, connection: ConnectionId, required: bool) {
        self.connection_mut(connection).auth_required = required;
    }

    fn transport_allowed_mechs(&mut self, connection: ConnectionId, mechs: &str) {
        self.connection_mut(connection).allowed_mechs = Some(mechs.to_string());
    }

    fn connection_open(&mut self, connection: ConnectionId) {
        let conn = self.connection_mut(connection);
        if conn.local_open {
            return;
        }
        conn.local_open = true;

        if let Some(condition) = self.remote.failure.take() {
            self.remote_close_connection(connection, Some(condition));
            return;
        }
        if !self.connection(connection).session_attached {
            self.connection_mut(connection).session_attached = true;
            let session = SessionId(self.mint_id());
            self.sessions.insert(session, SessionState {
                connection,
                local_open: false,
                local_closed: false,
                link_attached: false,
            });
            self.events.push_back(Event::SessionRemoteOpen { session });
        }
    }

    fn connection_close(&mut self, connection: ConnectionId) {
        let conn = self.connection_mut(connection);
        if conn.local_closed {
            return;
        }
        conn.local_closed = true;
        // the remote completes the close handshake promptly, after which the engine
        //  reports the transport gone
        conn.remote_closed = true;
        if !conn.transport_closed {
            conn.transport_closed = true;
            self.events.push_back(Event::TransportClosed { connection, condition: None });
        }
    }

    fn connection_wake(&mut self, connection: ConnectionId) {
        self.connection(connection);
        self.events.push_back(Event::ConnectionWake { connection });
    }

    fn session_open(&mut self, session: SessionId) {
        let state = self.sessions.get_mut(&session).expect("unknown session handle");
        if state.local_open {
            return;
        }
        state.local_open = true;

        if !state.link_attached {
            state.link_attached = true;
            // the remote's link endpoint role determines ours: a receiving client
            //  makes the local link a sender and vice versa
            let role = match self.remote.role {
                RemoteRole::Receiver => LinkRole::Sender,
                RemoteRole::Sender => LinkRole::Receiver,
            };
            let link = LinkId(self.mint_id());
            self.links.insert(link, LinkState {
                session,
                role,
                target_address: None,
                credit: 0,
                local_open: false,
                local_closed: false,
                current_out: None,
                incoming: VecDeque::new(),
            });
            self.events.push_back(Event::LinkRemoteOpen { link });
        }
    }

    fn session_close(&mut self, session: SessionId) {
        self.sessions.get_mut(&session).expect("unknown session handle").local_closed = true;
    }

    fn session_connection(&self, session: SessionId) -> ConnectionId {
        self.session(session).connection
    }

    fn link_open(&mut self, link: LinkId) {
        let state = self.link_mut(link);
        if state.local_open {
            return;
        }
        state.local_open = true;

        if state.role == LinkRole::Sender {
            // the receiving client opens the tap
            let grant = if self.remote.count > 0 { self.remote.count } else { CREDIT_WINDOW };
            self.link_mut(link).credit += grant;
            self.events.push_back(Event::LinkFlow { link });
        }
    }

    fn link_close(&mut self, link: LinkId) {
        self.link_mut(link).local_closed = true;
    }

    fn link_session(&self, link: LinkId) -> SessionId {
        self.link(link).session
    }

    fn link_role(&self, link: LinkId) -> LinkRole {
        self.link(link).role
    }

    fn link_set_target_address(&mut self, link: LinkId, address: &str) {
        self.link_mut(link).target_address = Some(address.to_string());
    }

    fn link_flow(&mut self, link: LinkId, credit: u32) {
        self.link_mut(link).credit += credit;
        self.pump_remote_sender(link);
    }

    fn link_credit(&self, link: LinkId) -> u32 {
        self.link(link).credit
    }

    fn delivery(&mut self, link: LinkId, tag: DeliveryTag) -> DeliveryId {
        let delivery = DeliveryId(self.mint_id());
        self.deliveries.insert(delivery, DeliveryState {
            link,
            tag,
            payload: None,
            remote_disposition: None,
            local_disposition: None,
            settled: false,
        });
        self.link_mut(link).current_out = Some(delivery);
        delivery
    }

    fn send(&mut self, link: LinkId, bytes: &[u8]) -> anyhow::Result<()> {
        let state = self.link(link);
        if state.role != LinkRole::Sender {
            bail!("attempt to send on a receiving link {:?}", link);
        }
        if state.credit == 0 {
            bail!("attempt to send without credit on link {:?}", link);
        }
        let Some(delivery) = state.current_out else {
            bail!("no current delivery on link {:?}", link);
        };

        self.link_mut(link).credit -= 1;
        self.delivery_mut(delivery).payload = Some(bytes.to_vec());

        // the receiving client inspects and accepts right away
        let tag = self.delivery_state(delivery).tag;
        match WireCodec.decode(bytes) {
            Ok(message) => trace!(?tag, sequence = ?message.sequence(), "remote client received a message"),
            Err(e) => warn!(?tag, "remote client received an undecodable message: {}", e),
        }
        self.remote_received += 1;
        self.delivery_mut(delivery).remote_disposition = Some(Disposition::Accepted);
        self.events.push_back(Event::Delivery { delivery });
        Ok(())
    }

    fn advance(&mut self, link: LinkId) {
        let state = self.link_mut(link);
        match state.role {
            LinkRole::Sender => state.current_out = None,
            LinkRole::Receiver => {
                state.incoming.pop_front();
            }
        }
    }

    fn delivery_link(&self, delivery: DeliveryId) -> LinkId {
        self.delivery_state(delivery).link
    }

    fn delivery_readable(&self, delivery: DeliveryId) -> bool {
        let state = self.delivery_state(delivery);
        state.payload.is_some() && self.link(state.link).role == LinkRole::Receiver
    }

    fn delivery_partial(&self, _delivery: DeliveryId) -> bool {
        // the simulated transport always hands over complete payloads
        false
    }

    fn delivery_pending(&self, delivery: DeliveryId) -> usize {
        self.delivery_state(delivery).payload.as_ref().map(Vec::len).unwrap_or(0)
    }

    fn delivery_update(&mut self, delivery: DeliveryId, disposition: Disposition) {
        self.delivery_mut(delivery).local_disposition = Some(disposition);
    }

    fn delivery_settle(&mut self, delivery: DeliveryId) {
        self.delivery_mut(delivery).settled = true;
    }

    fn delivery_remote_disposition(&self, delivery: DeliveryId) -> Option<Disposition> {
        self.delivery_state(delivery).remote_disposition
    }

    fn recv(&mut self, link: LinkId, buf: &mut [u8]) -> anyhow::Result<usize> {
        let Some(&delivery) = self.link(link).incoming.front() else {
            bail!("no incoming delivery on link {:?}", link);
        };
        let Some(payload) = self.delivery_state(delivery).payload.as_ref() else {
            bail!("delivery {:?} has no payload", delivery);
        };
        let n = usize::min(payload.len(), buf.len());
        buf[..n].copy_from_slice(&payload[..n]);
        Ok(n)
    }
}

fn encode_demo_payload(sequence: u32) -> Vec<u8> {
    let message = Message::with_sequence(sequence);
    let mut buf = vec![0u8; 64];
    let len = WireCodec.encode(&message, &mut buf)
        .unwrap_or_else(|e| panic!("a demo message must always fit: {:?}", e));
    buf.truncate(len);
    buf
}
