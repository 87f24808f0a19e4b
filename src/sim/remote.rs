use crate::engine::condition::Condition;

/// Which end of a link the scripted remote client attaches.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RemoteRole {
    /// The remote sends; the local peer acts as receiver.
    Sender,
    /// The remote receives; the local peer acts as sender.
    Receiver,
}

/// Script for the simulated remote client.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub role: RemoteRole,
    /// As a sender: how many messages to transmit before closing the connection.
    ///  As a receiver: how much credit to grant (`0` grants a default window).
    pub count: u32,
    /// If set, the remote closes the connection with this condition right after the
    ///  handshake instead of attaching a link.
    pub failure: Option<Condition>,
}

impl RemoteConfig {
    /// A client that consumes what the local peer sends.
    pub fn receiving_client(count: u32) -> RemoteConfig {
        RemoteConfig {
            role: RemoteRole::Receiver,
            count,
            failure: None,
        }
    }

    /// A client that sends `count` messages to the local peer, then closes.
    pub fn sending_client(count: u32) -> RemoteConfig {
        RemoteConfig {
            role: RemoteRole::Sender,
            count,
            failure: None,
        }
    }

    pub fn with_failure(mut self, condition: Condition) -> RemoteConfig {
        self.failure = Some(condition);
        self
    }
}
