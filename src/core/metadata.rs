//! Entry metadata.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Expiration metadata attached to a cache entry.
///
/// `None` means the corresponding expiration never triggers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Maximum time the entry lives after its last write.
    pub lifespan: Option<Duration>,
    /// Maximum time the entry lives after its last access.
    pub max_idle: Option<Duration>,
}

impl Metadata {
    /// Metadata for an entry that never expires.
    pub fn immortal() -> Self {
        Self::default()
    }

    /// Create metadata from optional millisecond values.
    pub fn from_millis(lifespan_ms: Option<u64>, max_idle_ms: Option<u64>) -> Self {
        Self {
            lifespan: lifespan_ms.map(Duration::from_millis),
            max_idle: max_idle_ms.map(Duration::from_millis),
        }
    }

    /// Check if neither lifespan nor max-idle is set.
    pub fn is_immortal(&self) -> bool {
        self.lifespan.is_none() && self.max_idle.is_none()
    }
}
