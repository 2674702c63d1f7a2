//! Pool manager — type-bucketed pools, bounded eviction, and introspection.
//!
//! Entries are bucketed by concrete type. The bucket map and the per-bucket
//! entry lists are guarded separately (two-level locking): the sharded map
//! lock covers bucket insert/lookup, a per-bucket mutex covers the scan and
//! mutation of its contents, always taken in that order. The `Arc` for a
//! bucket is cloned out of the map before the inner mutex is taken, so a
//! slow scan of one bucket never blocks insertions for unrelated types.
//!
//! No lock is held across a call into entry-owned code (`recycle`, the
//! destroy handler): entries are removed or drained under the lock and
//! operated on after it is released.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{Notify, broadcast};

use crate::config::PoolConfig;
use crate::error::Result;
use crate::events::{DestroyReason, EventBus, PoolEvent};
use crate::guard::PoolGuard;
use crate::poolable::Poolable;
use crate::registry::TypeRegistry;

// ---------------------------------------------------------------------------
// Bucket
// ---------------------------------------------------------------------------

/// The pooled entries for one concrete type.
///
/// Entries are appended at the back; retrieval scans from the back (a
/// just-released entry is the cheapest to reuse), eviction takes from the
/// front (oldest first, sparing still-warm entries).
struct Bucket {
    type_name: &'static str,
    entries: Mutex<Vec<Box<dyn Poolable>>>,
}

impl Bucket {
    fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            entries: Mutex::new(Vec::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Cumulative and current pool statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Total entries handed to the pool.
    pub total_added: u64,
    /// Total entries retrieved for reuse.
    pub total_reused: u64,
    /// Total entries evicted by resize passes.
    pub total_evicted: u64,
    /// Total entries ever destroyed (evicted, cleared, or disabled).
    pub total_destroyed: u64,
    /// Current number of entries sitting in buckets.
    pub pooled: usize,
    /// Current number of buckets.
    pub buckets: usize,
}

/// Per-bucket snapshot for debug introspection.
#[derive(Debug, Clone)]
pub struct BucketStats {
    /// The bucket's registry slot.
    pub slot: u32,
    /// Concrete type name of the bucket's entries.
    pub type_name: &'static str,
    /// Current number of entries in the bucket.
    pub size: usize,
}

// ---------------------------------------------------------------------------
// PoolManager
// ---------------------------------------------------------------------------

/// Host callback that releases an entry's native resource.
type DestroyFn = dyn Fn(Box<dyn Poolable>) + Send + Sync;

struct ManagerInner {
    registry: TypeRegistry,
    buckets: DashMap<u32, Arc<Bucket>>,
    config: RwLock<PoolConfig>,
    destroy: RwLock<Option<Arc<DestroyFn>>>,
    events: EventBus,
    config_changed: Notify,
    stats: Mutex<PoolStats>,
}

/// Type-bucketed object pool manager.
///
/// Cheap to clone — clones share the same buckets, registry, and
/// configuration. Construct one per subsystem that needs pooling and pass it
/// by value; there is no process-global instance.
pub struct PoolManager {
    inner: Arc<ManagerInner>,
}

impl Clone for PoolManager {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolManager {
    /// Create a manager with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(PoolConfig::default())
    }

    /// Create a manager with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                registry: TypeRegistry::new(),
                buckets: DashMap::new(),
                config: RwLock::new(config),
                destroy: RwLock::new(None),
                events: EventBus::default(),
                config_changed: Notify::new(),
                stats: Mutex::new(PoolStats::default()),
            }),
        }
    }

    /// Register the host callback invoked for every permanently removed
    /// entry, typically to release its native resource. Without one, entries
    /// are simply dropped.
    pub fn set_destroy_handler<F>(&self, handler: F)
    where
        F: Fn(Box<dyn Poolable>) + Send + Sync + 'static,
    {
        *self.inner.destroy.write() = Some(Arc::new(handler));
    }

    /// Subscribe to pool lifecycle events.
    ///
    /// [`PoolEvent::Destroyed`] is the disposed-notification: owners holding
    /// cached references to pooled entries listen for it and clear them.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.inner.events.subscribe()
    }

    /// A clone of the live configuration.
    #[must_use]
    pub fn config(&self) -> PoolConfig {
        self.inner.config.read().clone()
    }

    /// Whether pooling is currently enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.config.read().enabled
    }

    /// Replace the live configuration.
    ///
    /// Disabling pooling destroys every currently pooled entry and turns
    /// [`add_to_pool`](Self::add_to_pool) / [`get_from_pool`](Self::get_from_pool)
    /// into no-ops until re-enabled. The maintenance timer is woken so a
    /// changed `resize_interval` takes effect immediately.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid; the live
    /// configuration is left untouched.
    pub fn set_config(&self, config: PoolConfig) -> Result<()> {
        config.validate()?;
        let disabling = {
            let mut live = self.inner.config.write();
            let disabling = live.enabled && !config.enabled;
            *live = config;
            disabling
        };
        if disabling {
            #[cfg(feature = "tracing")]
            tracing::info!("pooling disabled, destroying pooled entries");
            self.destroy_pooled(DestroyReason::Disabled);
        }
        self.inner.config_changed.notify_waiters();
        Ok(())
    }

    /// The stable bucket slot for `T`, registering it on first use.
    pub fn type_slot<T: Poolable>(&self) -> u32 {
        self.inner.registry.slot(TypeId::of::<T>())
    }

    /// Hand an entry to the pool.
    ///
    /// The entry must already have finished whatever return preparation it
    /// needs on the caller's side; teardown that is still in flight is
    /// covered by [`Poolable::pool_complete`] staying false. When pooling is
    /// disabled the entry goes straight to the destroy path so its native
    /// resource is still released.
    pub fn add_to_pool<T: Poolable>(&self, entry: T) {
        self.add_boxed(Box::new(entry));
    }

    /// [`add_to_pool`](Self::add_to_pool) for an already type-erased entry.
    pub fn add_boxed(&self, entry: Box<dyn Poolable>) {
        if !self.is_enabled() {
            self.destroy_entry(entry, DestroyReason::Disabled);
            return;
        }

        let any: &dyn Any = &*entry;
        let slot = self.inner.registry.slot(any.type_id());
        let type_name = entry.type_name();

        let bucket = {
            let bucket = self
                .inner
                .buckets
                .entry(slot)
                .or_insert_with(|| Arc::new(Bucket::new(type_name)));
            Arc::clone(bucket.value())
        };
        bucket.entries.lock().push(entry);

        self.inner.stats.lock().total_added += 1;
        self.inner.events.emit(PoolEvent::Added { type_name });
        #[cfg(feature = "tracing")]
        tracing::trace!(type_name, slot, "entry returned to pool");
    }

    /// Retrieve the most recently added eligible entry of type `T`.
    ///
    /// Scans the bucket from the back and takes the first entry that is
    /// neither locked nor mid-teardown, recycling it before hand-back.
    /// `None` means the caller must construct fresh — bucket absent, empty,
    /// pooling disabled, or every entry ineligible. Not an error.
    pub fn get_from_pool<T: Poolable>(&self) -> Option<T> {
        if !self.is_enabled() {
            return None;
        }
        let slot = self.inner.registry.lookup(TypeId::of::<T>())?;
        let bucket = self
            .inner
            .buckets
            .get(&slot)
            .map(|bucket| Arc::clone(bucket.value()))?;

        let mut entry = {
            let mut entries = bucket.entries.lock();
            let index = entries
                .iter()
                .rposition(|entry| !entry.locked() && entry.pool_complete())?;
            entries.remove(index)
        };
        entry.recycle();

        let type_name = entry.type_name();
        self.inner.stats.lock().total_reused += 1;
        self.inner.events.emit(PoolEvent::Reused { type_name });
        #[cfg(feature = "tracing")]
        tracing::trace!(type_name, slot, "entry reused from pool");

        let entry: Box<dyn Any> = entry;
        match entry.downcast::<T>() {
            Ok(entry) => Some(*entry),
            Err(_) => {
                debug_assert!(false, "bucket keyed by TypeId held a foreign type");
                None
            }
        }
    }

    /// [`get_from_pool`](Self::get_from_pool), wrapped so that dropping the
    /// guard returns the entry to the pool.
    pub fn get_guard<T: Poolable>(&self) -> Option<PoolGuard<T>> {
        let entry = self.get_from_pool::<T>()?;
        Some(PoolGuard::new(entry, self.clone()))
    }

    /// Run one eviction pass over every bucket.
    ///
    /// A bucket holding more than `max_size` entries loses
    /// `min(destroy_count, len - max_size)` of them, oldest first. Entries
    /// that are locked or mid-teardown are skipped and stay for a later
    /// pass — eviction is advisory, never forced.
    pub fn resize_pools(&self) {
        let config = self.config();
        if !config.enabled {
            return;
        }

        let buckets: Vec<Arc<Bucket>> = self
            .inner
            .buckets
            .iter()
            .map(|bucket| Arc::clone(bucket.value()))
            .collect();

        #[cfg(feature = "tracing")]
        let mut evicted_total = 0usize;
        for bucket in buckets {
            let victims = {
                let mut entries = bucket.entries.lock();
                let quota = config
                    .destroy_count
                    .min(entries.len().saturating_sub(config.max_size));
                let mut victims = Vec::with_capacity(quota);
                let mut index = 0;
                while victims.len() < quota && index < entries.len() {
                    if entries[index].pool_complete() && !entries[index].locked() {
                        victims.push(entries.remove(index));
                    } else {
                        index += 1;
                    }
                }
                victims
            };

            #[cfg(feature = "tracing")]
            {
                evicted_total += victims.len();
            }
            for victim in victims {
                self.inner.stats.lock().total_evicted += 1;
                self.destroy_entry(victim, DestroyReason::Evicted);
            }
        }

        #[cfg(feature = "tracing")]
        if evicted_total > 0 {
            tracing::debug!(evicted = evicted_total, "resize pass evicted entries");
        }
    }

    /// Destroy every pooled entry and forget every bucket and type
    /// registration.
    ///
    /// The bucket list is snapshotted before destruction, so a concurrent
    /// add lands either in the snapshot or in a fresh bucket — never in a
    /// collection being iterated. Retired registry slots are not reused.
    pub fn clear_pool(&self) {
        let buckets: Vec<Arc<Bucket>> = self
            .inner
            .buckets
            .iter()
            .map(|bucket| Arc::clone(bucket.value()))
            .collect();
        self.inner.buckets.clear();
        self.inner.registry.clear();

        for bucket in buckets {
            self.drain_bucket(&bucket, DestroyReason::Cleared);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("pool cleared");
    }

    /// Cumulative counters plus current pooled/bucket counts.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let mut stats = self.inner.stats.lock().clone();
        stats.pooled = self
            .inner
            .buckets
            .iter()
            .map(|bucket| bucket.value().entries.lock().len())
            .sum();
        stats.buckets = self.inner.buckets.len();
        stats
    }

    /// Per-bucket sizes, ordered by slot.
    #[must_use]
    pub fn bucket_stats(&self) -> Vec<BucketStats> {
        let mut stats: Vec<BucketStats> = self
            .inner
            .buckets
            .iter()
            .map(|bucket| BucketStats {
                slot: *bucket.key(),
                type_name: bucket.value().type_name,
                size: bucket.value().entries.lock().len(),
            })
            .collect();
        stats.sort_by_key(|bucket| bucket.slot);
        stats
    }

    /// Resolves when the configuration changes. Used by the maintenance
    /// task to restart its timer.
    pub(crate) async fn config_changed(&self) {
        self.inner.config_changed.notified().await;
    }

    /// Destroy all pooled entries, keeping buckets and registrations.
    fn destroy_pooled(&self, reason: DestroyReason) {
        let buckets: Vec<Arc<Bucket>> = self
            .inner
            .buckets
            .iter()
            .map(|bucket| Arc::clone(bucket.value()))
            .collect();
        for bucket in buckets {
            self.drain_bucket(&bucket, reason);
        }
    }

    fn drain_bucket(&self, bucket: &Bucket, reason: DestroyReason) {
        let drained: Vec<Box<dyn Poolable>> = {
            let mut entries = bucket.entries.lock();
            entries.drain(..).collect()
        };
        for entry in drained {
            self.destroy_entry(entry, reason);
        }
    }

    /// Permanently remove one entry: hand it to the destroy handler (or
    /// drop it) and broadcast the disposed-notification.
    fn destroy_entry(&self, entry: Box<dyn Poolable>, reason: DestroyReason) {
        let type_name = entry.type_name();
        let handler = self.inner.destroy.read().clone();
        match handler {
            Some(handler) => handler(entry),
            None => drop(entry),
        }
        self.inner.stats.lock().total_destroyed += 1;
        self.inner.events.emit(PoolEvent::Destroyed { type_name, reason });
        #[cfg(feature = "tracing")]
        tracing::trace!(type_name, ?reason, "entry destroyed");
    }
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        // Remaining entries still own native resources; route them through
        // the handler one last time. No events — the bus dies with us.
        let Some(handler) = self.destroy.get_mut().take() else {
            return;
        };
        let buckets = std::mem::take(&mut self.buckets);
        for (_, bucket) in buckets {
            let drained: Vec<Box<dyn Poolable>> = {
                let mut entries = bucket.entries.lock();
                entries.drain(..).collect()
            };
            for entry in drained {
                handler(entry);
            }
        }
    }
}

impl std::fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolManager")
            .field("stats", &self.stats())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Billboard {
        id: u32,
        dirty: bool,
    }

    impl Billboard {
        fn new(id: u32) -> Self {
            Self { id, dirty: true }
        }
    }

    impl Poolable for Billboard {
        fn recycle(&mut self) {
            self.dirty = false;
        }
    }

    #[derive(Debug)]
    struct Label;

    impl Poolable for Label {
        fn recycle(&mut self) {}
    }

    #[test]
    fn empty_pool_returns_none() {
        let manager = PoolManager::new();
        assert!(manager.get_from_pool::<Billboard>().is_none());
    }

    #[test]
    fn add_then_get_returns_recycled_entry() {
        let manager = PoolManager::new();
        manager.add_to_pool(Billboard::new(7));

        let entry = manager.get_from_pool::<Billboard>().unwrap();
        assert_eq!(entry.id, 7);
        assert!(!entry.dirty, "recycle must run before hand-back");
        assert!(manager.get_from_pool::<Billboard>().is_none());
    }

    #[test]
    fn buckets_are_per_type() {
        let manager = PoolManager::new();
        manager.add_to_pool(Billboard::new(1));
        manager.add_to_pool(Label);

        assert!(manager.get_from_pool::<Label>().is_some());
        assert!(manager.get_from_pool::<Billboard>().is_some());
        assert!(manager.get_from_pool::<Label>().is_none());
    }

    #[test]
    fn retrieval_is_recency_biased() {
        let manager = PoolManager::new();
        manager.add_to_pool(Billboard::new(1));
        manager.add_to_pool(Billboard::new(2));
        manager.add_to_pool(Billboard::new(3));

        assert_eq!(manager.get_from_pool::<Billboard>().unwrap().id, 3);
        assert_eq!(manager.get_from_pool::<Billboard>().unwrap().id, 2);
        assert_eq!(manager.get_from_pool::<Billboard>().unwrap().id, 1);
    }

    #[test]
    fn type_slot_is_stable() {
        let manager = PoolManager::new();
        let slot = manager.type_slot::<Billboard>();
        assert_eq!(manager.type_slot::<Billboard>(), slot);
        assert_ne!(manager.type_slot::<Label>(), slot);
    }

    #[test]
    fn clear_pool_destroys_everything_and_resets_registry() {
        let manager = PoolManager::new();
        let destroyed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&destroyed);
        manager.set_destroy_handler(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        manager.add_to_pool(Billboard::new(1));
        manager.add_to_pool(Billboard::new(2));
        manager.add_to_pool(Label);
        let billboard_slot = manager.type_slot::<Billboard>();

        manager.clear_pool();

        assert_eq!(destroyed.load(Ordering::SeqCst), 3);
        assert!(manager.get_from_pool::<Billboard>().is_none());
        let stats = manager.stats();
        assert_eq!(stats.pooled, 0);
        assert_eq!(stats.buckets, 0);
        assert_eq!(stats.total_destroyed, 3);

        // Fresh registrations after a clear get fresh slots.
        assert_ne!(manager.type_slot::<Label>(), billboard_slot);
    }

    #[test]
    fn stats_track_lifecycle() {
        let manager = PoolManager::new();
        manager.add_to_pool(Billboard::new(1));
        manager.add_to_pool(Billboard::new(2));
        let _ = manager.get_from_pool::<Billboard>();

        let stats = manager.stats();
        assert_eq!(stats.total_added, 2);
        assert_eq!(stats.total_reused, 1);
        assert_eq!(stats.pooled, 1);
        assert_eq!(stats.buckets, 1);
    }

    #[test]
    fn bucket_stats_report_sizes() {
        let manager = PoolManager::new();
        manager.add_to_pool(Billboard::new(1));
        manager.add_to_pool(Billboard::new(2));
        manager.add_to_pool(Label);

        let stats = manager.bucket_stats();
        assert_eq!(stats.len(), 2);
        let sizes: Vec<usize> = stats.iter().map(|bucket| bucket.size).collect();
        assert!(sizes.contains(&2));
        assert!(sizes.contains(&1));
    }

    #[test]
    fn invalid_config_rejected() {
        let config = PoolConfig {
            max_size: 0,
            ..Default::default()
        };
        assert!(PoolManager::with_config(config).is_err());

        let manager = PoolManager::new();
        let config = PoolConfig {
            destroy_count: 0,
            ..Default::default()
        };
        assert!(manager.set_config(config).is_err());
        // Live config untouched.
        assert_eq!(manager.config().destroy_count, 50);
    }

    #[test]
    fn dropping_manager_routes_entries_through_handler() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        {
            let manager = PoolManager::new();
            let counter = Arc::clone(&destroyed);
            manager.set_destroy_handler(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            manager.add_to_pool(Billboard::new(1));
            manager.add_to_pool(Label);
        }
        assert_eq!(destroyed.load(Ordering::SeqCst), 2);
    }
}
