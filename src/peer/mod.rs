//! The peer core: one blocking event loop that accepts connections and - depending on
//!  the direction of the link the remote attaches - sends a bounded number of messages
//!  and waits for acknowledgement, or receives and settles them.

pub mod condition;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod receiver;
pub mod sender;
