//! Pool configuration types.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Floor applied to [`PoolConfig::resize_interval`] at the point of use so a
/// zero interval cannot spin the maintenance timer.
pub const MIN_RESIZE_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration for the pool manager.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolConfig {
    /// Whether pooling is active. When turned off, every pooled entry is
    /// destroyed and add/get become no-ops until re-enabled.
    pub enabled: bool,
    /// Maximum number of pooled entries per type before eviction begins.
    pub max_size: usize,
    /// Interval between eviction passes of the maintenance timer.
    pub resize_interval: Duration,
    /// Maximum number of entries evicted per bucket per pass.
    pub destroy_count: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: 150,
            resize_interval: Duration::from_secs(10),
            destroy_count: 50,
        }
    }
}

impl PoolConfig {
    /// Validate the configuration, returning an error if invalid.
    ///
    /// # Errors
    /// Returns an error if `max_size` or `destroy_count` is zero. A too-small
    /// `resize_interval` is not an error — it is clamped by
    /// [`effective_interval`](Self::effective_interval).
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::configuration("max_size must be greater than 0"));
        }
        if self.destroy_count == 0 {
            return Err(Error::configuration("destroy_count must be greater than 0"));
        }
        Ok(())
    }

    /// The resize interval the maintenance timer actually sleeps for,
    /// clamped to [`MIN_RESIZE_INTERVAL`].
    #[must_use]
    pub fn effective_interval(&self) -> Duration {
        self.resize_interval.max(MIN_RESIZE_INTERVAL)
    }
}
