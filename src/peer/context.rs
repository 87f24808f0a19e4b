use crate::engine::handles::{LinkId, ListenerId};
use crate::peer::config::PeerConfig;
use crate::util::buf::EncodeBuffer;

/// All mutable state of one peer run. There is exactly one instance, owned by the event
///  loop and mutated only from within event handling - never concurrently.
pub struct PeerContext {
    pub config: PeerConfig,
    pub listener: ListenerId,
    /// Scratch buffer reused across all encode calls; grows, never shrinks.
    pub buffer: EncodeBuffer,

    /// The sender link, once the remote has attached one. Cleared when the link's
    ///  connection is torn down so a late timer wake cannot touch a dead handle.
    pub sender: Option<LinkId>,
    pub sent: u32,
    pub acknowledged: u32,

    pub received: u32,

    /// Set as soon as any condition was reported; decides the process exit code.
    pub failed: bool,
}

impl PeerContext {
    pub fn new(config: PeerConfig, listener: ListenerId) -> PeerContext {
        PeerContext {
            config,
            listener,
            buffer: EncodeBuffer::new(),
            sender: None,
            sent: 0,
            acknowledged: 0,
            received: 0,
            failed: false,
        }
    }
}
