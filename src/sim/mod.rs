//! In-memory engine for demonstration and testing.
//!
//! [engine::SimEngine] implements the full [crate::engine::engine::Engine] contract
//!  against entity tables and an event queue instead of sockets. A scripted remote
//!  client ([remote::RemoteConfig]) connects to the listener as soon as it opens and
//!  plays the counterpart role: a receiving client grants credit and accepts
//!  deliveries, a sending client transmits a configured number of messages and then
//!  closes. This makes a complete peer run - handshake, transfer, shutdown - possible
//!  in a single process without any I/O.
//!
//! Handles are validated strictly: passing a handle the engine never minted is a
//!  programming error and panics.

pub mod engine;
pub mod remote;
