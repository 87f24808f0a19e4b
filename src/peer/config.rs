/// Static configuration for one peer run.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// Container identity presented on every connection; should be unique across runs.
    pub container_id: String,
    /// Host to listen on; empty means the wildcard address.
    pub host: String,
    /// Port or service name to listen on.
    pub port: String,
    /// Node address messages are sent to.
    pub address: String,
    /// Number of messages to send or receive. `0` makes the receiver role run without
    ///  bound; the sender role sends nothing.
    pub count: u32,
}

impl PeerConfig {
    pub fn new(container_id: impl Into<String>) -> PeerConfig {
        PeerConfig {
            container_id: container_id.into(),
            host: String::new(),
            port: "amqp".to_string(),
            address: "example".to_string(),
            count: 10,
        }
    }
}
