use bytes::{Buf, BufMut};
use bytes_varint::{VarIntSupport, VarIntSupportMut};

pub fn put_string(buf: &mut impl BufMut, s: &str) {
    buf.put_usize_varint(s.len());
    buf.put_slice(s.as_bytes());
}

pub fn try_get_string(buf: &mut impl Buf) -> anyhow::Result<String> {
    let len = buf.try_get_usize_varint()?;
    let mut result = Vec::with_capacity(len.min(256));
    for _ in 0..len {
        result.push(buf.try_get_u8()?);
    }

    let s = String::from_utf8(result)?;
    Ok(s)
}

/// The single reusable encode buffer: capacity starts small, doubles on demand and
///  never shrinks for the lifetime of the owning context. Encoded bytes written into
///  it stay valid only until the next encode call.
pub struct EncodeBuffer {
    buf: Vec<u8>,
}

impl EncodeBuffer {
    pub const INITIAL_CAPACITY: usize = 128;

    pub fn new() -> EncodeBuffer {
        EncodeBuffer {
            buf: vec![0; Self::INITIAL_CAPACITY],
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Double the buffer's capacity, retaining existing contents.
    pub fn grow(&mut self) {
        let new_capacity = self.buf.len() * 2;
        self.buf.resize(new_capacity, 0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Default for EncodeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use bytes::BytesMut;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::empty("", b"\0")]
    #[case::simple("abc", b"\x03abc")]
    fn test_put_string(#[case] s: &str, #[case] expected: &[u8]) {
        let mut buf = BytesMut::new();
        put_string(&mut buf, s);
        assert_eq!(&buf, expected);
    }

    #[rstest]
    #[case::empty(b"\0", Some(""), b"")]
    #[case::simple(b"\x03abc", Some("abc"), b"")]
    #[case::remainder(b"\x02abc", Some("ab"), b"c")]
    #[case::truncated(b"\x05ab", None, b"")]
    fn test_try_get_string(#[case] mut buf: &[u8], #[case] expected: Option<&str>, #[case] buf_after: &[u8]) {
        match try_get_string(&mut buf) {
            Ok(actual) => {
                assert_eq!(Some(actual.as_str()), expected);
                assert_eq!(buf, buf_after);
            }
            Err(_) => {
                assert!(expected.is_none());
            }
        }
    }

    #[test]
    fn test_encode_buffer_growth_is_monotonic() {
        let mut buffer = EncodeBuffer::new();
        assert_eq!(buffer.capacity(), EncodeBuffer::INITIAL_CAPACITY);

        let mut prev = buffer.capacity();
        for _ in 0..5 {
            buffer.grow();
            assert_eq!(buffer.capacity(), prev * 2);
            assert!(buffer.capacity() > prev);
            prev = buffer.capacity();
        }
    }

    #[test]
    fn test_encode_buffer_grow_retains_contents() {
        let mut buffer = EncodeBuffer::new();
        buffer.as_mut_slice()[..4].copy_from_slice(b"abcd");
        buffer.grow();
        assert_eq!(&buffer.as_slice()[..4], b"abcd");
    }
}
