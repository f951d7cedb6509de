/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Generic bounded object pool.
//!
//! Messages and fields are recycled through this pool by the wire codec.
//! Objects are reset before being parked so a borrower always receives a
//! clean instance. Borrowing from an exhausted pool constructs a fresh
//! object; returning to a full pool drops the object.

use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// An object that can be recycled through an [`ObjectPool`].
pub trait Poolable: Send {
    /// Restores the object to its pristine state before it is parked.
    fn reset(&mut self);
}

impl Poolable for flatfix_core::TagValue {
    fn reset(&mut self) {
        flatfix_core::TagValue::reset(self);
    }
}

/// A bounded, lock-free pool of reusable objects.
///
/// Safe for concurrent borrow and return across threads. Never blocks:
/// exhaustion constructs fresh objects through the factory.
pub struct ObjectPool<T: Poolable> {
    queue: ArrayQueue<T>,
    factory: Box<dyn Fn() -> T + Send + Sync>,
    created: AtomicU64,
}

impl<T: Poolable> ObjectPool<T> {
    /// Creates a pool of at most `capacity` parked objects.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of parked objects
    /// * `factory` - Constructor used on first borrow and on exhaustion
    #[must_use]
    pub fn new(capacity: usize, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
            factory: Box::new(factory),
            created: AtomicU64::new(0),
        }
    }

    /// Borrows an object, constructing one if the pool is exhausted.
    #[must_use]
    pub fn borrow(&self) -> T {
        self.queue.pop().unwrap_or_else(|| {
            let created = self.created.fetch_add(1, Ordering::Relaxed) + 1;
            if created.is_power_of_two() {
                debug!(created, "object pool miss, constructing fresh");
            }
            (self.factory)()
        })
    }

    /// Resets `object` and parks it. Dropped silently if the pool is full.
    pub fn release(&self, mut object: T) {
        object.reset();
        let _ = self.queue.push(object);
    }

    /// Total number of objects ever constructed (diagnostic).
    #[must_use]
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Number of objects currently parked.
    #[must_use]
    pub fn pooled(&self) -> usize {
        self.queue.len()
    }
}

impl<T: Poolable> std::fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool")
            .field("pooled", &self.queue.len())
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}
