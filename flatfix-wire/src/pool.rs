/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Bounded concurrent pools for messages and standalone field values.
//!
//! A message borrowed from a [`MessagePool`] carries a from-pool flag so
//! the engine knows to hand it back after use, and a user-owned flag that
//! blocks reclamation once ownership has passed to caller code. Release is
//! explicit; dropping a pooled message simply deallocates it.

use flatfix_core::TagValue;
use flatfix_message::FixMessage;
use flatfix_pool::ObjectPool;

/// Bounded concurrent pool of [`FixMessage`] instances.
#[derive(Debug)]
pub struct MessagePool {
    inner: ObjectPool<FixMessage>,
}

impl MessagePool {
    /// A pool parking at most `capacity` idle messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: ObjectPool::new(capacity, FixMessage::new),
        }
    }

    /// Borrows a cleared message flagged as pool-originated. Falls back to
    /// fresh construction when the pool is empty.
    #[must_use]
    pub fn borrow(&self) -> FixMessage {
        let mut msg = self.inner.borrow();
        msg.set_from_pool(true);
        msg
    }

    /// Returns a message to the pool unconditionally. The message is reset
    /// before parking and dropped if the pool is full.
    pub fn release(&self, msg: FixMessage) {
        self.inner.release(msg);
    }

    /// Engine-side release after use: reclaims the message unless user
    /// code has taken ownership, in which case it is handed back.
    pub fn auto_release(&self, msg: FixMessage) -> Option<FixMessage> {
        if msg.is_user_owned() {
            return Some(msg);
        }
        self.inner.release(msg);
        None
    }

    /// Total messages ever constructed by this pool.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.inner.created()
    }
}

/// Bounded concurrent pool of standalone [`TagValue`] fields.
#[derive(Debug)]
pub struct FieldPool {
    inner: ObjectPool<TagValue>,
}

impl FieldPool {
    /// A pool parking at most `capacity` idle fields.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: ObjectPool::new(capacity, TagValue::empty),
        }
    }

    /// Borrows a reset field, constructing fresh on exhaustion.
    #[must_use]
    pub fn borrow(&self) -> TagValue {
        self.inner.borrow()
    }

    /// Returns a field to the pool.
    pub fn release(&self, field: TagValue) {
        self.inner.release(field);
    }

    /// Total fields ever constructed by this pool.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.inner.created()
    }
}
