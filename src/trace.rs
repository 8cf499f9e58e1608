use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a lock handle inside one fixture.
///
/// Tracking is by spelled identity only: two distinct identifiers are two
/// distinct locks, and a copy or alias of a handle is a different handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleId(String);

impl HandleId {
    pub fn new(name: impl Into<String>) -> Self {
        HandleId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The lock-lifecycle operations the checker consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockOp {
    Init,
    Destroy,
}

impl fmt::Display for LockOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockOp::Init => write!(f, "init"),
            LockOp::Destroy => write!(f, "destroy"),
        }
    }
}

/// One call to a lock-lifecycle function, as it appears in the fixture.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LockEvent {
    pub op: LockOp,
    pub handle: HandleId,
    /// Callee name as written, e.g. `pthread_mutex_init`.
    pub callee: String,
    pub line: usize,
    pub column: usize,
}

/// Ordered sequence of lock events for one fixture.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Trace {
    pub file: String,
    pub events: Vec<LockEvent>,
}

impl Trace {
    pub fn new(file: impl Into<String>) -> Self {
        Trace {
            file: file.into(),
            events: Vec::new(),
        }
    }
}
