//! Background maintenance — the periodic resize timer.
//!
//! The timer reschedules itself after every pass instead of running on a
//! fixed-rate clock: a paused or unresponsive host simply delays eviction
//! rather than racing it. Configuration changes wake the task so a new
//! `resize_interval` restarts the sleep immediately.

use tokio_util::sync::CancellationToken;

use crate::manager::PoolManager;

/// Handle to the background resize task.
///
/// Spawned with [`spawn`](Self::spawn); the task runs until
/// [`shutdown`](Self::shutdown) is called or the runtime stops. Dropping the
/// handle does not stop the task.
#[derive(Debug)]
pub struct PoolMaintainer {
    cancel: CancellationToken,
}

impl PoolMaintainer {
    /// Spawn the maintenance task for `manager` on the current runtime.
    ///
    /// Every `resize_interval` (clamped to the configured floor) the task
    /// runs one [`PoolManager::resize_pools`] pass, then unconditionally
    /// reschedules — even when the pass evicted nothing — keeping the
    /// cadence steady.
    #[must_use]
    pub fn spawn(manager: PoolManager) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            loop {
                let interval = manager.config().effective_interval();
                tokio::select! {
                    () = tokio::time::sleep(interval) => {
                        manager.resize_pools();
                    }
                    // Config changed — loop around and sleep with the new
                    // interval.
                    () = manager.config_changed() => {}
                    () = token.cancelled() => break,
                }
            }
            #[cfg(feature = "tracing")]
            tracing::debug!("pool maintenance stopped");
        });

        Self { cancel }
    }

    /// Stop the maintenance task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
