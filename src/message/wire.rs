use anyhow::anyhow;
use bytes::{Buf, BufMut};
use bytes_varint::{VarIntSupport, VarIntSupportMut};
use crc::Crc;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::message::codec::{EncodeError, MessageCodec};
use crate::message::message::{Message, Value};
use crate::util::buf::{put_string, try_get_string};

/// Compact binary encoding of a [Message] - all numbers var-length encoded except the
///  fixed header:
///
/// ```ascii
/// 0:  CRC-32 checksum (ISCSI polynomial) of the rest of the frame, starting after
///      the checksum: u32 BE
/// 4:  protocol version (u8)
/// 5:  message id (varint i64)
/// *:  number of body entries (varint)
/// *:  (repeated) key (varint length + UTF-8 bytes),
///      value kind (u8, see [ValueKind]),
///      value (varint i64, or varint length + UTF-8 bytes)
/// ```
pub struct WireCodec;

impl WireCodec {
    pub const PROTOCOL_VERSION: u8 = 1;

    /// Frames larger than this are refused outright rather than reported as overflow,
    ///  so a runaway message cannot drive unbounded buffer growth.
    pub const MAX_ENCODED_SIZE: usize = 256 * 1024;

    /// checksum + version
    const HEADER_LEN: usize = 5;

    fn encoded_len(message: &Message) -> usize {
        let mut len = Self::HEADER_LEN;
        len += varint_len(zigzag(message.id));
        len += varint_len(message.body.len() as u64);
        for (key, value) in &message.body {
            len += varint_len(key.len() as u64) + key.len();
            len += 1;
            len += match value {
                Value::Int(n) => varint_len(zigzag(*n)),
                Value::Str(s) => varint_len(s.len() as u64) + s.len(),
            };
        }
        len
    }
}

impl MessageCodec for WireCodec {
    fn encode(&self, message: &Message, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let needed = Self::encoded_len(message);
        if needed > Self::MAX_ENCODED_SIZE {
            return Err(EncodeError::Malformed(anyhow!(
                "encoded message would be {} bytes, exceeding the limit of {}",
                needed,
                Self::MAX_ENCODED_SIZE
            )));
        }
        if needed > buf.len() {
            return Err(EncodeError::Overflow);
        }

        let mut out = &mut buf[..needed];
        out.put_u32(0); // checksum, patched below
        out.put_u8(Self::PROTOCOL_VERSION);
        out.put_i64_varint(message.id);
        out.put_usize_varint(message.body.len());
        for (key, value) in &message.body {
            put_string(&mut out, key);
            match value {
                Value::Int(n) => {
                    out.put_u8(ValueKind::Int.into());
                    out.put_i64_varint(*n);
                }
                Value::Str(s) => {
                    out.put_u8(ValueKind::Str.into());
                    put_string(&mut out, s);
                }
            }
        }
        debug_assert!(out.is_empty());

        let hasher = Crc::<u32>::new(&crc::CRC_32_ISCSI);
        let mut digest = hasher.digest();
        digest.update(&buf[4..needed]);
        let checksum = digest.finalize();
        buf[..4].copy_from_slice(&checksum.to_be_bytes());

        Ok(needed)
    }

    fn decode(&self, buf: &[u8]) -> anyhow::Result<Message> {
        let mut buf = buf;
        let checksum = buf.try_get_u32()?;

        let hasher = Crc::<u32>::new(&crc::CRC_32_ISCSI);
        let mut digest = hasher.digest();
        digest.update(buf);
        if digest.finalize() != checksum {
            return Err(anyhow!("checksum error in encoded message"));
        }

        let version = buf.try_get_u8()?;
        if version != Self::PROTOCOL_VERSION {
            return Err(anyhow!("unsupported protocol version: {}", version));
        }

        let id = buf.try_get_i64_varint()?;
        let num_entries = buf.try_get_usize_varint()?;
        let mut body = Vec::new();
        for _ in 0..num_entries {
            let key = try_get_string(&mut buf)?;
            let value = match ValueKind::try_from_primitive(buf.try_get_u8()?)? {
                ValueKind::Int => Value::Int(buf.try_get_i64_varint()?),
                ValueKind::Str => Value::Str(try_get_string(&mut buf)?),
            };
            body.push((key, value));
        }
        if buf.has_remaining() {
            return Err(anyhow!("trailing bytes after encoded message"));
        }

        Ok(Message { id, body })
    }
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
enum ValueKind {
    Int = 1,
    Str = 2,
}

fn zigzag(v: i64) -> u64 {
    (v.wrapping_shl(1) ^ v.wrapping_shr(63)) as u64
}

fn varint_len(v: u64) -> usize {
    let bits = 64 - v.leading_zeros() as usize;
    usize::max(1, bits.div_ceil(7))
}
