#[cfg(test)] use mockall::automock;

use crate::message::message::Message;

/// Why an encode attempt did not produce bytes.
#[derive(Debug)]
pub enum EncodeError {
    /// The provided buffer is too small. Recoverable: retry with a larger buffer.
    Overflow,
    /// The message cannot be encoded at any size. Not recoverable.
    Malformed(anyhow::Error),
}

/// Boundary to the wire-level message codec.
///
/// `encode` writes the full encoding into `buf` and returns the encoded length, or
///  [EncodeError::Overflow] if `buf` is too small - the caller grows its buffer and
///  retries. `decode` is the inverse over a complete encoded frame.
#[cfg_attr(test, automock)]
pub trait MessageCodec {
    fn encode(&self, message: &Message, buf: &mut [u8]) -> Result<usize, EncodeError>;
    fn decode(&self, buf: &[u8]) -> anyhow::Result<Message>;
}
