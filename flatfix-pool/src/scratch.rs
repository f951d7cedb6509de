/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Pooled integer scratch arrays.
//!
//! Group indexing and other position-shuffling operations need short-lived
//! integer arrays. This pool hands out cleared `Vec<i32>` instances and
//! reclaims them on drop, keeping their grown capacity.

use crossbeam_queue::ArrayQueue;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Default number of scratch arrays retained.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 32;

/// A bounded pool of `Vec<i32>` scratch arrays.
#[derive(Debug)]
pub struct ScratchPool {
    queue: ArrayQueue<Vec<i32>>,
    created: AtomicU64,
}

impl ScratchPool {
    /// Creates a pool retaining up to `capacity` arrays.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
            created: AtomicU64::new(0),
        }
    }

    /// The process-wide shared pool.
    pub fn global() -> &'static Arc<ScratchPool> {
        static GLOBAL: OnceLock<Arc<ScratchPool>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(ScratchPool::new(DEFAULT_SCRATCH_CAPACITY)))
    }

    /// Borrows an empty scratch array. Allocates fresh when the pool is
    /// exhausted; never blocks.
    #[must_use]
    pub fn borrow(self: &Arc<Self>) -> ScratchArray {
        let vec = self.queue.pop().unwrap_or_else(|| {
            let created = self.created.fetch_add(1, Ordering::Relaxed) + 1;
            if created.is_power_of_two() {
                debug!(created, "scratch pool miss, allocating fresh");
            }
            Vec::new()
        });
        ScratchArray {
            vec,
            pool: Arc::clone(self),
        }
    }

    /// Total number of arrays ever allocated (diagnostic).
    #[must_use]
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Number of arrays currently parked.
    #[must_use]
    pub fn pooled(&self) -> usize {
        self.queue.len()
    }

    fn give_back(&self, mut vec: Vec<i32>) {
        vec.clear();
        let _ = self.queue.push(vec);
    }
}

/// An integer scratch array borrowed from a [`ScratchPool`].
///
/// Dereferences to `Vec<i32>`; cleared and returned on drop.
#[derive(Debug)]
pub struct ScratchArray {
    vec: Vec<i32>,
    pool: Arc<ScratchPool>,
}

impl Deref for ScratchArray {
    type Target = Vec<i32>;

    #[inline]
    fn deref(&self) -> &Vec<i32> {
        &self.vec
    }
}

impl DerefMut for ScratchArray {
    #[inline]
    fn deref_mut(&mut self) -> &mut Vec<i32> {
        &mut self.vec
    }
}

impl Drop for ScratchArray {
    fn drop(&mut self) {
        let vec = std::mem::take(&mut self.vec);
        self.pool.give_back(vec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrow_starts_empty() {
        let pool = Arc::new(ScratchPool::new(2));
        let mut scratch = pool.borrow();
        scratch.extend_from_slice(&[1, 2, 3]);
        drop(scratch);

        let scratch = pool.borrow();
        assert!(scratch.is_empty(), "recycled array must be cleared");
    }

    #[test]
    fn test_capacity_survives_recycling() {
        let pool = Arc::new(ScratchPool::new(2));
        let mut scratch = pool.borrow();
        scratch.reserve(256);
        let cap = scratch.capacity();
        drop(scratch);

        let scratch = pool.borrow();
        assert!(scratch.capacity() >= cap);
    }

    #[test]
    fn test_bounded() {
        let pool = Arc::new(ScratchPool::new(1));
        let a = pool.borrow();
        let b = pool.borrow();
        drop(a);
        drop(b);
        assert_eq!(pool.pooled(), 1);
    }
}
