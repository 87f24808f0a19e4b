//! The logical message and its codec boundary.
//!
//! The peer treats encoding and decoding as an external concern behind
//!  [codec::MessageCodec]; [wire::WireCodec] is the concrete codec the simulation
//!  engine and the demo binary use.

pub mod codec;
pub mod message;
pub mod wire;
