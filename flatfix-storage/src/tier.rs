/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! The three byte-storage tiers cooperating per message.
//!
//! - *Original*: the received wire bytes, shared zero-copy with the caller's
//!   receive buffer. Valid until the message goes standalone.
//! - *Arena*: one append-only buffer per message. New and relocated values
//!   are appended; overwritten values are abandoned in place until the
//!   message is cleared. Never compacted.
//! - *Per-field*: one pooled buffer per field, used once the arena is over
//!   its soft capacity.
//!
//! Tier selection lives in [`crate::store`]; this module only moves bytes.

use bytes::BytesMut;
use flatfix_pool::{BytePool, PooledBuf};
use std::sync::Arc;

/// Soft capacity of the arena before relocations spill to per-field
/// buffers.
pub const DEFAULT_ARENA_SOFT_CAP: usize = 64 * 1024;

/// The three byte tiers of one message.
#[derive(Debug)]
pub struct ByteTiers {
    /// The received wire bytes, while attached.
    original: Option<BytesMut>,
    /// Append-only value storage.
    arena: Vec<u8>,
    arena_soft_cap: usize,
    /// Per-field overflow buffers, addressed by handle.
    per_field: Vec<Option<PooledBuf>>,
    /// Recycled per-field handles.
    free_handles: Vec<u32>,
    pool: Arc<BytePool>,
}

impl ByteTiers {
    /// Creates empty tiers drawing per-field buffers from `pool`.
    #[must_use]
    pub fn new(pool: Arc<BytePool>) -> Self {
        Self {
            original: None,
            arena: Vec::new(),
            arena_soft_cap: DEFAULT_ARENA_SOFT_CAP,
            per_field: Vec::new(),
            free_handles: Vec::new(),
            pool,
        }
    }

    /// Overrides the arena soft capacity. Useful in tests and for small
    /// embedded deployments.
    pub fn set_arena_soft_cap(&mut self, cap: usize) {
        self.arena_soft_cap = cap;
    }

    /// Attaches the received wire bytes as the original tier.
    pub fn attach_original(&mut self, buffer: BytesMut) {
        self.original = Some(buffer);
    }

    /// Returns true while the original tier is attached.
    #[inline]
    #[must_use]
    pub fn has_original(&self) -> bool {
        self.original.is_some()
    }

    /// Drops the original tier. Entries still homed there must have been
    /// migrated first; see [`crate::store::IndexedStorage::make_standalone`].
    pub fn detach_original(&mut self) {
        self.original = None;
    }

    /// Reads `len` bytes at `offset` from the original tier.
    ///
    /// # Panics
    /// Panics if the original tier is detached or the range is out of
    /// bounds; both are programming errors.
    #[must_use]
    pub fn original_slice(&self, offset: u32, len: u32) -> &[u8] {
        let original = self
            .original
            .as_ref()
            .expect("original tier already detached");
        &original[offset as usize..(offset + len) as usize]
    }

    /// Overwrites bytes in the original tier at `offset`.
    ///
    /// # Panics
    /// Panics if the original tier is detached or the write is out of
    /// bounds.
    pub fn original_write(&mut self, offset: u32, value: &[u8]) {
        let original = self
            .original
            .as_mut()
            .expect("original tier already detached");
        original[offset as usize..offset as usize + value.len()].copy_from_slice(value);
    }

    /// Copies a range of the original tier into the arena, returning the
    /// arena offset. Used by the standalone transition, which always
    /// targets the arena regardless of its soft capacity.
    ///
    /// # Panics
    /// Panics if the original tier is detached.
    pub fn migrate_original(&mut self, offset: u32, len: u32) -> u32 {
        let original = self
            .original
            .as_ref()
            .expect("original tier already detached");
        let start = self.arena.len() as u32;
        self.arena
            .extend_from_slice(&original[offset as usize..(offset + len) as usize]);
        start
    }

    /// Returns true if the arena may accept another relocation.
    #[inline]
    #[must_use]
    pub fn arena_has_room(&self) -> bool {
        self.arena.len() < self.arena_soft_cap
    }

    /// Appends `value` to the arena, returning its offset.
    pub fn arena_append(&mut self, value: &[u8]) -> u32 {
        let offset = self.arena.len() as u32;
        self.arena.extend_from_slice(value);
        offset
    }

    /// Overwrites arena bytes at `offset`. The caller guarantees the write
    /// stays within the range originally appended for this field.
    pub fn arena_write(&mut self, offset: u32, value: &[u8]) {
        self.arena[offset as usize..offset as usize + value.len()].copy_from_slice(value);
    }

    /// Reads `len` bytes at `offset` from the arena.
    #[must_use]
    pub fn arena_slice(&self, offset: u32, len: u32) -> &[u8] {
        &self.arena[offset as usize..(offset + len) as usize]
    }

    /// Allocates a per-field buffer holding `value`, returning its handle.
    pub fn alloc_per_field(&mut self, value: &[u8]) -> u32 {
        let mut buf = self.pool.borrow(value.len());
        buf[..value.len()].copy_from_slice(value);
        match self.free_handles.pop() {
            Some(handle) => {
                self.per_field[handle as usize] = Some(buf);
                handle
            }
            None => {
                self.per_field.push(Some(buf));
                (self.per_field.len() - 1) as u32
            }
        }
    }

    /// Overwrites the start of a per-field buffer.
    ///
    /// # Panics
    /// Panics if the handle is free or the write exceeds the buffer.
    pub fn per_field_write(&mut self, handle: u32, value: &[u8]) {
        let buf = self.per_field[handle as usize]
            .as_mut()
            .expect("per-field handle already freed");
        buf[..value.len()].copy_from_slice(value);
    }

    /// Reads `len` bytes at `offset` from a per-field buffer.
    ///
    /// # Panics
    /// Panics if the handle is free.
    #[must_use]
    pub fn per_field_slice(&self, handle: u32, offset: u32, len: u32) -> &[u8] {
        let buf = self.per_field[handle as usize]
            .as_ref()
            .expect("per-field handle already freed");
        &buf[offset as usize..(offset + len) as usize]
    }

    /// Capacity of a per-field buffer, for in-place decisions.
    #[must_use]
    pub fn per_field_capacity(&self, handle: u32) -> usize {
        self.per_field[handle as usize]
            .as_ref()
            .map_or(0, |buf| buf.len())
    }

    /// Releases one per-field buffer back to the pool.
    pub fn free_per_field(&mut self, handle: u32) {
        if let Some(buf) = self.per_field[handle as usize].take() {
            drop(buf);
            self.free_handles.push(handle);
        }
    }

    /// Resets all tiers, retaining arena capacity and returning per-field
    /// buffers to the pool.
    pub fn clear(&mut self) {
        self.original = None;
        self.arena.clear();
        self.per_field.clear();
        self.free_handles.clear();
    }
}

impl Clone for ByteTiers {
    /// Deep copy: the original view, arena bytes, and per-field buffers are
    /// all copied, so a copy never aliases the source message.
    fn clone(&self) -> Self {
        Self {
            original: self.original.clone(),
            arena: self.arena.clone(),
            arena_soft_cap: self.arena_soft_cap,
            per_field: self.per_field.clone(),
            free_handles: self.free_handles.clone(),
            pool: Arc::clone(&self.pool),
        }
    }
}
