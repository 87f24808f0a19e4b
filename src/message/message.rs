/// A single body value. The demo workload only ever sends integers, but the codec
///  handles the string case symmetrically so received bodies round-trip.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Value {
    Int(i64),
    Str(String),
}

/// The logical payload of one delivery: an identifier plus a body holding key-value
///  pairs. The demo workload uses the sequence number as the identifier and a
///  single-entry body `{"sequence": N}`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Message {
    pub id: i64,
    pub body: Vec<(String, Value)>,
}

impl Message {
    pub const SEQUENCE_KEY: &'static str = "sequence";

    pub fn with_sequence(sequence: u32) -> Message {
        Message {
            id: sequence as i64,
            body: vec![(Self::SEQUENCE_KEY.to_string(), Value::Int(sequence as i64))],
        }
    }

    /// The body's sequence number, if it has one.
    pub fn sequence(&self) -> Option<i64> {
        self.body.iter()
            .find(|(key, _)| key == Self::SEQUENCE_KEY)
            .and_then(|(_, value)| match value {
                Value::Int(n) => Some(*n),
                Value::Str(_) => None,
            })
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::zero(0)]
    #[case::some(17)]
    #[case::max(u32::MAX)]
    fn test_with_sequence(#[case] sequence: u32) {
        let message = Message::with_sequence(sequence);
        assert_eq!(message.id, sequence as i64);
        assert_eq!(message.sequence(), Some(sequence as i64));
    }

    #[rstest]
    #[case::empty(vec![], None)]
    #[case::wrong_key(vec![("other".to_string(), Value::Int(3))], None)]
    #[case::string_valued(vec![("sequence".to_string(), Value::Str("3".to_string()))], None)]
    #[case::present(vec![("sequence".to_string(), Value::Int(3))], Some(3))]
    fn test_sequence(#[case] body: Vec<(String, Value)>, #[case] expected: Option<i64>) {
        let message = Message { id: 0, body };
        assert_eq!(message.sequence(), expected);
    }
}
