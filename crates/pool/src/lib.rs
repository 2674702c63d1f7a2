//! # Atlas Pool
//!
//! Scene-object pooling for the Atlas runtime. Provides type-bucketed
//! object pools with recency-biased reuse, a recycle lifecycle contract for
//! pooled entries, periodic bounded eviction, and lifecycle event
//! broadcasting for owners that cache references into the pool.
//!
//! Constructing and destroying native scene objects is the host's business:
//! the pool only ever sees it through the destroy handler registered on the
//! manager and the `Destroyed` event it broadcasts.

pub mod config;
pub mod error;
pub mod events;
pub mod guard;
pub mod maintenance;
pub mod manager;
pub mod poolable;
pub mod registry;

pub use config::{MIN_RESIZE_INTERVAL, PoolConfig};
pub use error::{Error, Result};
pub use events::{DestroyReason, EventBus, PoolEvent};
pub use guard::PoolGuard;
pub use maintenance::PoolMaintainer;
pub use manager::{BucketStats, PoolManager, PoolStats};
pub use poolable::Poolable;
pub use registry::TypeRegistry;
