use std::fmt::{Debug, Formatter};

/// An error descriptor the engine attaches to lifecycle events when a local or remote
///  protocol fault occurred. Events carry `Option<Condition>`; `None` means the
///  transition was clean.
#[derive(Clone, Eq, PartialEq)]
pub struct Condition {
    pub name: String,
    pub description: String,
}

impl Condition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Condition {
        Condition {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl Debug for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:?})", self.name, self.description)
    }
}
