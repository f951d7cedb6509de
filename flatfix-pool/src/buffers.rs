/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Size-bucketed byte buffer pool.
//!
//! Buffers are pooled per exact length: borrowing a 48-byte buffer and a
//! 64-byte buffer draws from two independent buckets, so a returned buffer
//! is always the right size for the next borrower. Buckets are bounded
//! lock-free queues; exhaustion falls back to a fresh allocation and is
//! never an error.

use crossbeam_queue::ArrayQueue;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Default number of buffers retained per length bucket.
pub const DEFAULT_BUCKET_CAPACITY: usize = 64;

/// A size-bucketed pool of byte buffers.
///
/// Safe for concurrent borrow and return from many threads. Bounded: each
/// bucket retains at most its capacity; surplus returns are dropped.
#[derive(Debug)]
pub struct BytePool {
    buckets: RwLock<HashMap<usize, Arc<ArrayQueue<Vec<u8>>>>>,
    bucket_capacity: usize,
    created: AtomicU64,
    misses: AtomicU64,
}

impl BytePool {
    /// Creates a pool retaining up to `bucket_capacity` buffers per length.
    #[must_use]
    pub fn new(bucket_capacity: usize) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            bucket_capacity: bucket_capacity.max(1),
            created: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The process-wide shared pool.
    pub fn global() -> &'static Arc<BytePool> {
        static GLOBAL: OnceLock<Arc<BytePool>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(BytePool::new(DEFAULT_BUCKET_CAPACITY)))
    }

    /// Borrows a zero-filled buffer of exactly `len` bytes.
    ///
    /// Never blocks and never fails: if the bucket is empty a fresh buffer
    /// is allocated and the miss is counted.
    #[must_use]
    pub fn borrow(self: &Arc<Self>, len: usize) -> PooledBuf {
        let bucket = self.bucket(len);
        let buf = match bucket.pop() {
            Some(mut buf) => {
                buf.iter_mut().for_each(|b| *b = 0);
                buf
            }
            None => {
                self.created.fetch_add(1, Ordering::Relaxed);
                let misses = self.misses.fetch_add(1, Ordering::Relaxed) + 1;
                if misses.is_power_of_two() {
                    debug!(len, misses, "byte pool miss, allocating fresh");
                }
                vec![0u8; len]
            }
        };
        PooledBuf {
            buf,
            pool: Arc::clone(self),
        }
    }

    /// Total number of buffers ever allocated by this pool (diagnostic).
    #[must_use]
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Number of borrows that missed the pool (diagnostic).
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of buffers currently parked in the bucket for `len`.
    #[must_use]
    pub fn pooled(&self, len: usize) -> usize {
        self.buckets
            .read()
            .get(&len)
            .map_or(0, |bucket| bucket.len())
    }

    fn bucket(&self, len: usize) -> Arc<ArrayQueue<Vec<u8>>> {
        if let Some(bucket) = self.buckets.read().get(&len) {
            return Arc::clone(bucket);
        }
        let mut buckets = self.buckets.write();
        Arc::clone(
            buckets
                .entry(len)
                .or_insert_with(|| Arc::new(ArrayQueue::new(self.bucket_capacity))),
        )
    }

    fn give_back(&self, buf: Vec<u8>) {
        if let Some(bucket) = self.buckets.read().get(&buf.len()) {
            // A full bucket silently drops the buffer; the pool is bounded.
            let _ = bucket.push(buf);
        }
    }
}

/// A byte buffer borrowed from a [`BytePool`].
///
/// Dereferences to `[u8]` of the requested length. Returned to its bucket
/// on drop.
#[derive(Debug)]
pub struct PooledBuf {
    buf: Vec<u8>,
    pool: Arc<BytePool>,
}

impl PooledBuf {
    /// Length of the buffer in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if the buffer has zero length.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Deref for PooledBuf {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledBuf {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Clone for PooledBuf {
    /// Deep-copies the bytes into a fresh borrow from the same pool.
    fn clone(&self) -> Self {
        let mut copy = self.pool.borrow(self.buf.len());
        copy.copy_from_slice(&self.buf);
        copy
    }
}

impl Drop for PooledBuf {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.pool.give_back(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_borrow_len_and_zeroing() {
        let pool = Arc::new(BytePool::new(4));
        let mut buf = pool.borrow(16);
        assert_eq!(buf.len(), 16);
        buf[0] = 0xAB;
        drop(buf);

        let buf = pool.borrow(16);
        assert_eq!(buf[0], 0, "recycled buffer must be zeroed");
    }

    #[test]
    fn test_buckets_are_per_length() {
        let pool = Arc::new(BytePool::new(4));
        drop(pool.borrow(8));
        drop(pool.borrow(24));
        assert_eq!(pool.pooled(8), 1);
        assert_eq!(pool.pooled(24), 1);
        assert_eq!(pool.pooled(16), 0);
    }

    #[test]
    fn test_bounded_returns() {
        let pool = Arc::new(BytePool::new(2));
        let a = pool.borrow(4);
        let b = pool.borrow(4);
        let c = pool.borrow(4);
        drop(a);
        drop(b);
        drop(c);
        assert_eq!(pool.pooled(4), 2, "third return drops on the floor");
    }

    #[test]
    fn test_exhaustion_allocates_fresh() {
        let pool = Arc::new(BytePool::new(1));
        let a = pool.borrow(4);
        let b = pool.borrow(4);
        assert_eq!(pool.created(), 2);
        assert_eq!(pool.misses(), 2);
        drop(a);
        drop(b);
    }

    #[test]
    fn test_clone_is_deep() {
        let pool = Arc::new(BytePool::new(4));
        let mut original = pool.borrow(4);
        original.copy_from_slice(b"abcd");
        let copy = original.clone();
        original[0] = b'z';
        assert_eq!(&*copy, b"abcd");
    }

    #[test]
    fn test_concurrent_borrow_return() {
        let pool = Arc::new(BytePool::new(8));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for i in 0..1000 {
                        let len = 8 + (i % 3) * 8;
                        let mut buf = pool.borrow(len);
                        buf[0] = i as u8;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
