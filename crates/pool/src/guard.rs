//! RAII wrapper that returns an entry to its pool on drop.

use crate::manager::PoolManager;
use crate::poolable::Poolable;

/// RAII guard for a retrieved pool entry.
///
/// When the guard is dropped, the entry goes back to its bucket through
/// [`PoolManager::add_to_pool`]. Use [`into_inner`](Self::into_inner) to
/// take ownership without returning it.
pub struct PoolGuard<T: Poolable> {
    entry: Option<T>,
    manager: PoolManager,
}

impl<T: Poolable> PoolGuard<T> {
    pub(crate) fn new(entry: T, manager: PoolManager) -> Self {
        Self {
            entry: Some(entry),
            manager,
        }
    }

    /// Take the entry out of the guard, preventing the return to the pool.
    #[must_use]
    pub fn into_inner(mut self) -> T {
        self.entry.take().expect("guard used after into_inner")
    }
}

impl<T: Poolable> std::ops::Deref for PoolGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.entry.as_ref().expect("guard used after into_inner")
    }
}

impl<T: Poolable> std::ops::DerefMut for PoolGuard<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.entry.as_mut().expect("guard used after into_inner")
    }
}

impl<T: Poolable> Drop for PoolGuard<T> {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.manager.add_to_pool(entry);
        }
    }
}

impl<T: Poolable + std::fmt::Debug> std::fmt::Debug for PoolGuard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolGuard")
            .field("entry", &self.entry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Marker(u32);

    impl Poolable for Marker {
        fn recycle(&mut self) {
            self.0 = 0;
        }
    }

    #[test]
    fn guard_deref() {
        let manager = PoolManager::new();
        let guard = PoolGuard::new(Marker(42), manager);
        assert_eq!(guard.0, 42);
    }

    #[test]
    fn guard_deref_mut() {
        let manager = PoolManager::new();
        let mut guard = PoolGuard::new(Marker(1), manager);
        guard.0 = 7;
        assert_eq!(guard.0, 7);
    }

    #[test]
    fn drop_returns_entry_to_pool() {
        let manager = PoolManager::new();
        {
            let _guard = PoolGuard::new(Marker(5), manager.clone());
        }
        // The entry went back to its bucket, recycled on the way out.
        let entry = manager.get_from_pool::<Marker>().unwrap();
        assert_eq!(entry, Marker(0));
    }

    #[test]
    fn into_inner_prevents_return() {
        let manager = PoolManager::new();
        let guard = PoolGuard::new(Marker(5), manager.clone());
        let entry = guard.into_inner();
        assert_eq!(entry, Marker(5));
        assert!(manager.get_from_pool::<Marker>().is_none());
    }
}
