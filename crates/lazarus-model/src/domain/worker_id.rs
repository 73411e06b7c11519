use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a worker process.
///
/// The id is the only link between a worker, its heartbeat key and its
/// per-worker queues, so it must be unique across the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    /// Build an id of the form `{name}-{uuid}`.
    ///
    /// The random suffix keeps two processes on the same host apart.
    pub fn with_prefix(name: &str) -> Self {
        Self(format!("{}-{}", name, uuid::Uuid::new_v4()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WorkerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
