//! The boundary to the external transport/security/codec engine.
//!
//! The peer never touches sockets, TLS or SASL itself: it drives an [engine::Engine]
//!  through opaque entity handles and reacts to the [event::Event]s the engine delivers
//!  in batches. A production implementation would wrap a real proactor; the crate ships
//!  an in-memory one in [crate::sim] for demonstration and testing.

pub mod condition;
pub mod engine;
pub mod event;
pub mod handles;
