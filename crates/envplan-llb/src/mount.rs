use serde::{Deserialize, Serialize};
use std::fmt;

/// How concurrent builds may use the same cache directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSharing {
    /// Any number of builds read and write at once.
    Shared,
    /// Each concurrent build gets its own copy.
    Private,
    /// Builds wait for exclusive access.
    Locked,
}

impl fmt::Display for CacheSharing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheSharing::Shared => f.write_str("shared"),
            CacheSharing::Private => f.write_str("private"),
            CacheSharing::Locked => f.write_str("locked"),
        }
    }
}

/// Persistent cache directory bound into one exec step.
///
/// The engine keeps the directory across builds, keyed by `id`. A cache mount
/// has no existence of its own: it is metadata on the [`crate::ExecOp`] that
/// declares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheMount {
    pub target: String,
    pub id: String,
    pub sharing: CacheSharing,
}

impl CacheMount {
    /// Cache mount keyed by its own target path.
    pub fn new(target: impl Into<String>, sharing: CacheSharing) -> Self {
        let target = target.into();
        Self {
            id: target.clone(),
            target,
            sharing,
        }
    }

    pub fn shared(target: impl Into<String>) -> Self {
        Self::new(target, CacheSharing::Shared)
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl fmt::Display for CacheMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type=cache,target={},id={},sharing={}",
            self.target, self.id, self.sharing
        )
    }
}
