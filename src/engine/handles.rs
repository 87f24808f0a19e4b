use std::fmt::{Debug, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Handles are opaque identifiers minted by the engine. They stay valid until the entity
///  they refer to is torn down; holding on to a handle past that point is allowed (they
///  are plain values), dereferencing it through the engine is not.

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ConnectionId(pub u64);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SessionId(pub u64);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LinkId(pub u64);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DeliveryId(pub u64);

/// Identifies one transfer attempt within a link's lifetime. The sender derives tags from
///  its transmit counter, which keeps them unique without any coordination.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct DeliveryTag(pub u64);

impl Debug for DeliveryTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "dtag:{:08x}", self.0)
    }
}

/// Direction of the local link endpoint.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LinkRole {
    Sender,
    Receiver,
}

/// Outcome assigned to a delivery, using the standard AMQP outcome codes. An undetermined
///  outcome ("pending") is represented as the absence of a disposition.
#[repr(u64)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
pub enum Disposition {
    Accepted = 0x24,
    Rejected = 0x25,
    Released = 0x26,
}
