use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::validator::ValidationMode;

/// Configuration knobs for [`Discover`](super::Discover).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverOptions {
    pub validation_mode: ValidationMode,
    pub connect_timeout_ms: u64,
    pub dns_timeout_ms: u64,
    pub parallel_ports: bool,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            validation_mode: ValidationMode::Strict,
            connect_timeout_ms: 3_000,
            dns_timeout_ms: 3_000,
            parallel_ports: false,
        }
    }
}

impl DiscoverOptions {
    /// Per-connection deadline. Every probe is bounded, so zero is raised
    /// to one millisecond.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.max(1))
    }

    /// Per-query DNS deadline, same floor as [`Self::connect_timeout`].
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeouts_are_clamped() {
        let options = DiscoverOptions {
            connect_timeout_ms: 0,
            dns_timeout_ms: 0,
            ..DiscoverOptions::default()
        };
        assert_eq!(options.connect_timeout(), Duration::from_millis(1));
        assert_eq!(options.dns_timeout(), Duration::from_millis(1));
    }

    #[test]
    fn defaults() {
        let options = DiscoverOptions::default();
        assert_eq!(options.connect_timeout(), Duration::from_secs(3));
        assert!(!options.parallel_ports);
    }
}
