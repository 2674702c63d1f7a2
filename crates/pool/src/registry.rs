//! Stable type-to-slot registry.
//!
//! Buckets are keyed by a small integer slot instead of the `TypeId` itself,
//! so the bucket map never re-hashes a 128-bit id on the hot path and the
//! slot doubles as a compact, human-readable bucket label in stats.

use std::any::TypeId;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;

/// Maps each registered `TypeId` to a stable `u32` slot.
///
/// Slots are assigned on first use and hold for the lifetime of the
/// registry: once a slot is handed to a type it is never reassigned to a
/// different one, even after [`clear`](Self::clear) — the map is emptied but
/// the counter keeps advancing.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    slots: DashMap<TypeId, u32>,
    next: AtomicU32,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `type_id`, registering it on first use.
    ///
    /// Concurrent registration of the same type observes a single slot; the
    /// sharded map's entry lock makes the get-or-insert atomic per key.
    pub fn slot(&self, type_id: TypeId) -> u32 {
        *self
            .slots
            .entry(type_id)
            .or_insert_with(|| self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// The slot for `type_id` if it has been registered, without
    /// registering it.
    #[must_use]
    pub fn lookup(&self, type_id: TypeId) -> Option<u32> {
        self.slots.get(&type_id).map(|slot| *slot)
    }

    /// Forget all registrations. Already-assigned slots are retired, never
    /// recycled: the counter is left untouched.
    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
