/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Indexed storage: the orchestration layer joining the tag index and the
//! three byte tiers.
//!
//! Every mutation funnels through one decision procedure:
//! 1. Original tier, prepared: in place only if the value shrinks or stays.
//! 2. Original tier, unprepared: in place only at exactly equal length -
//!    changing length would corrupt the shared received bytes.
//! 3. Arena or per-field: in place when the new length fits the old length
//!    or the cached in-place capacity recorded the last time the field
//!    grew.
//! 4. Otherwise relocate: arena while it has room, per-field after.
//!
//! Reads resolve position -> owning tier -> byte range. Positions out of
//! range are programming errors and panic.

use crate::index::{IndexEntry, TagIndex, ValueHome};
use crate::tier::ByteTiers;
use bytes::BytesMut;
use flatfix_pool::BytePool;
use std::sync::Arc;

/// One message's worth of indexed field storage.
#[derive(Debug, Clone)]
pub struct IndexedStorage {
    index: TagIndex,
    tiers: ByteTiers,
    prepared: bool,
}

impl IndexedStorage {
    /// Creates empty storage drawing overflow buffers from `pool`.
    #[must_use]
    pub fn new(pool: Arc<BytePool>) -> Self {
        Self {
            index: TagIndex::new(),
            tiers: ByteTiers::new(pool),
            prepared: false,
        }
    }

    /// Creates empty storage on the process-wide byte pool.
    #[must_use]
    pub fn with_global_pool() -> Self {
        Self::new(Arc::clone(BytePool::global()))
    }

    /// Number of stored fields (tag occurrences).
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.index.len()
    }

    /// Returns true if no fields are stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Attaches the received wire bytes; subsequent [`Self::append_parsed`]
    /// calls reference ranges of this buffer zero-copy.
    pub fn attach_original(&mut self, buffer: BytesMut) {
        self.tiers.attach_original(buffer);
    }

    /// Returns true while the message still references its received bytes.
    #[inline]
    #[must_use]
    pub fn has_original(&self) -> bool {
        self.tiers.has_original()
    }

    /// Commits a parsed field as a zero-copy range of the attached original
    /// buffer. Returns the field's position.
    ///
    /// # Panics
    /// Panics if no original buffer is attached.
    pub fn append_parsed(&mut self, tag: u32, offset: u32, len: u32) -> usize {
        assert!(self.tiers.has_original(), "no original buffer attached");
        self.index
            .push(IndexEntry::new(tag, offset, len, ValueHome::Original))
    }

    /// Position of the first occurrence of `tag`.
    #[inline]
    #[must_use]
    pub fn position_of(&self, tag: u32) -> Option<usize> {
        self.index.position_of(tag)
    }

    /// Position of the `occurrence`-th (1-based) occurrence of `tag`.
    #[inline]
    #[must_use]
    pub fn position_of_occurrence(&self, tag: u32, occurrence: usize) -> Option<usize> {
        self.index.position_of_occurrence(tag, occurrence)
    }

    /// Number of occurrences of `tag`.
    #[inline]
    #[must_use]
    pub fn occurrences(&self, tag: u32) -> usize {
        self.index.occurrences(tag)
    }

    /// Value bytes of the first occurrence of `tag`.
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&[u8]> {
        self.position_of(tag).map(|pos| self.value_at(pos))
    }

    /// Value bytes of the `occurrence`-th occurrence of `tag`.
    #[must_use]
    pub fn get_occurrence(&self, tag: u32, occurrence: usize) -> Option<&[u8]> {
        self.position_of_occurrence(tag, occurrence)
            .map(|pos| self.value_at(pos))
    }

    /// Tag number at a flat position.
    ///
    /// # Panics
    /// Panics if `pos` is out of range.
    #[inline]
    #[must_use]
    pub fn tag_at(&self, pos: usize) -> u32 {
        self.index.entry(pos).tag
    }

    /// Value bytes at a flat position, resolved through the owning tier.
    ///
    /// # Panics
    /// Panics if `pos` is out of range.
    #[must_use]
    pub fn value_at(&self, pos: usize) -> &[u8] {
        let entry = self.index.entry(pos);
        match entry.home {
            ValueHome::Original => self.tiers.original_slice(entry.offset, entry.len),
            ValueHome::Arena => self.tiers.arena_slice(entry.offset, entry.len),
            ValueHome::PerField { buf } => self.tiers.per_field_slice(buf, 0, entry.len),
        }
    }

    /// Sets `tag` to `value`: updates the first occurrence in place where
    /// the decision procedure allows, otherwise relocates; appends a new
    /// field when the tag is absent. Returns the field's position.
    pub fn set(&mut self, tag: u32, value: &[u8]) -> usize {
        match self.position_of(tag) {
            Some(pos) => {
                self.update_at(pos, value);
                pos
            }
            None => self.add(tag, value),
        }
    }

    /// Appends a new occurrence of `tag` holding `value`. Returns its
    /// position.
    pub fn add(&mut self, tag: u32, value: &[u8]) -> usize {
        let (home, offset) = self.place(value);
        self.index
            .push(IndexEntry::new(tag, offset, value.len() as u32, home))
    }

    /// Inserts a new field at an arbitrary flat position.
    ///
    /// # Panics
    /// Panics if `pos > field_count()`.
    pub fn insert_at(&mut self, pos: usize, tag: u32, value: &[u8]) {
        let (home, offset) = self.place(value);
        self.index
            .insert_at(pos, IndexEntry::new(tag, offset, value.len() as u32, home));
    }

    /// Overwrites the value at `pos` per the in-place decision procedure.
    ///
    /// # Panics
    /// Panics if `pos` is out of range.
    pub fn update_at(&mut self, pos: usize, value: &[u8]) {
        let entry = *self.index.entry(pos);
        let new_len = value.len() as u32;

        let in_place = match entry.home {
            ValueHome::Original => {
                self.tiers.has_original()
                    && if entry.prepared {
                        new_len <= entry.len
                    } else {
                        new_len == entry.len
                    }
            }
            ValueHome::Arena | ValueHome::PerField { .. } => {
                new_len <= entry.len || new_len <= entry.in_place_cap
            }
        };

        if !in_place {
            self.relocate(pos, value);
            return;
        }

        match entry.home {
            ValueHome::Original => self.tiers.original_write(entry.offset, value),
            ValueHome::Arena => self.tiers.arena_write(entry.offset, value),
            ValueHome::PerField { buf } => self.tiers.per_field_write(buf, value),
        }
        let e = self.index.entry_mut(pos);
        e.in_place_cap = e.in_place_cap.max(e.len);
        e.len = new_len;
    }

    /// Removes the first occurrence of `tag`. Returns true if present.
    pub fn remove(&mut self, tag: u32) -> bool {
        match self.position_of(tag) {
            Some(pos) => {
                self.remove_at(pos);
                true
            }
            None => false,
        }
    }

    /// Removes the field at `pos`, returning its tag.
    ///
    /// # Panics
    /// Panics if `pos` is out of range.
    pub fn remove_at(&mut self, pos: usize) -> u32 {
        let entry = self.index.remove_at(pos);
        if let ValueHome::PerField { buf } = entry.home {
            self.tiers.free_per_field(buf);
        }
        entry.tag
    }

    /// Marks the message prepared (or not). While prepared, original-tier
    /// values accept shrinking in-place overwrites.
    pub fn set_prepared(&mut self, prepared: bool) {
        self.prepared = prepared;
        for pos in 0..self.index.len() {
            let e = self.index.entry_mut(pos);
            if matches!(e.home, ValueHome::Original) {
                e.prepared = prepared;
            }
        }
    }

    /// Returns true while the message is in prepared mode.
    #[inline]
    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Copies every original-tier value into the arena and drops the
    /// borrowed original buffer. After this the message owns all its bytes.
    pub fn make_standalone(&mut self) {
        if !self.tiers.has_original() {
            return;
        }
        for pos in 0..self.index.len() {
            let entry = *self.index.entry(pos);
            if entry.home != ValueHome::Original {
                continue;
            }
            let offset = self.tiers.migrate_original(entry.offset, entry.len);
            let e = self.index.entry_mut(pos);
            e.home = ValueHome::Arena;
            e.offset = offset;
            e.in_place_cap = e.len;
            e.prepared = false;
        }
        self.tiers.detach_original();
    }

    /// Resets the index and all tiers, retaining buffer capacity.
    pub fn clear(&mut self) {
        self.index.clear();
        self.tiers.clear();
        self.prepared = false;
    }

    /// Sum of the serialized `tag=value<SOH>` lengths of every field except
    /// the given excluded tags (conventionally 8, 9, and 10).
    #[must_use]
    pub fn wire_length_excluding(&self, excluded: &[u32]) -> usize {
        let mut total = 0;
        for pos in 0..self.index.len() {
            let entry = self.index.entry(pos);
            if excluded.contains(&entry.tag) {
                continue;
            }
            total += decimal_width(entry.tag) + 1 + entry.len as usize + 1;
        }
        total
    }

    fn place(&mut self, value: &[u8]) -> (ValueHome, u32) {
        if self.tiers.arena_has_room() {
            (ValueHome::Arena, self.tiers.arena_append(value))
        } else {
            let buf = self.tiers.alloc_per_field(value);
            (ValueHome::PerField { buf }, 0)
        }
    }

    fn relocate(&mut self, pos: usize, value: &[u8]) {
        let entry = *self.index.entry(pos);
        if let ValueHome::PerField { buf } = entry.home {
            self.tiers.free_per_field(buf);
        }
        let (home, offset) = self.place(value);
        let e = self.index.entry_mut(pos);
        e.home = home;
        e.offset = offset;
        e.len = value.len() as u32;
        e.in_place_cap = value.len() as u32;
        e.prepared = false;
    }

    #[cfg(test)]
    pub(crate) fn home_at(&self, pos: usize) -> ValueHome {
        self.index.entry(pos).home
    }

    #[cfg(test)]
    pub(crate) fn set_arena_soft_cap(&mut self, cap: usize) {
        self.tiers.set_arena_soft_cap(cap);
    }
}

/// Number of ASCII digits in a tag number.
fn decimal_width(mut tag: u32) -> usize {
    let mut width = 1;
    while tag >= 10 {
        tag /= 10;
        width += 1;
    }
    width
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> IndexedStorage {
        IndexedStorage::new(Arc::new(BytePool::new(8)))
    }

    #[test]
    fn test_set_get_remove() {
        let mut s = storage();
        s.set(35, b"D");
        s.set(49, b"SENDER");
        assert_eq!(s.get(35), Some(&b"D"[..]));
        assert_eq!(s.get(49), Some(&b"SENDER"[..]));
        assert_eq!(s.get(56), None);

        assert!(s.remove(35));
        assert!(!s.remove(35));
        assert_eq!(s.get(35), None);
        assert_eq!(s.get(49), Some(&b"SENDER"[..]));
    }

    #[test]
    fn test_shrink_stays_in_place_grow_relocates() {
        let mut s = storage();
        let pos = s.set(58, b"Hello");
        let entry_before = s.home_at(pos);

        // Shrink always fits in place.
        s.update_at(pos, b"Hi");
        assert_eq!(s.value_at(pos), b"Hi");
        assert_eq!(s.home_at(pos), entry_before);

        // Regrowth within the cached capacity also stays in place.
        s.update_at(pos, b"Howdy");
        assert_eq!(s.value_at(pos), b"Howdy");
        assert_eq!(s.home_at(pos), entry_before);

        // Growth past the recorded capacity relocates.
        s.update_at(pos, b"Hello World");
        assert_eq!(s.value_at(pos), b"Hello World");
    }

    #[test]
    fn test_original_tier_rules() {
        let mut s = storage();
        s.attach_original(BytesMut::from(&b"8=FIX.4.2\x0135=A\x01"[..]));
        let pos8 = s.append_parsed(8, 2, 7);
        let pos35 = s.append_parsed(35, 13, 1);

        // Equal length overwrites in place.
        s.update_at(pos8, b"FIX.4.4");
        assert_eq!(s.value_at(pos8), b"FIX.4.4");
        assert_eq!(s.home_at(pos8), ValueHome::Original);

        // Unprepared, length change relocates.
        s.update_at(pos35, b"AB");
        assert_eq!(s.value_at(pos35), b"AB");
        assert_eq!(s.home_at(pos35), ValueHome::Arena);
    }

    #[test]
    fn test_prepared_allows_shrink_on_original() {
        let mut s = storage();
        s.attach_original(BytesMut::from(&b"44=123.45\x01"[..]));
        let pos = s.append_parsed(44, 3, 6);
        s.set_prepared(true);

        s.update_at(pos, b"99");
        assert_eq!(s.value_at(pos), b"99");
        assert_eq!(s.home_at(pos), ValueHome::Original);

        // Growth still relocates even when prepared.
        s.update_at(pos, b"123.456");
        assert_eq!(s.home_at(pos), ValueHome::Arena);
    }

    #[test]
    fn test_make_standalone_migrates_everything() {
        let mut s = storage();
        s.attach_original(BytesMut::from(&b"8=FIX.4.2\x0135=A\x01"[..]));
        s.append_parsed(8, 2, 7);
        s.append_parsed(35, 13, 1);
        s.set(55, b"EURUSD");

        s.make_standalone();
        assert!(!s.has_original());
        assert_eq!(s.get(8), Some(&b"FIX.4.2"[..]));
        assert_eq!(s.get(35), Some(&b"A"[..]));
        assert_eq!(s.get(55), Some(&b"EURUSD"[..]));
        assert_eq!(s.home_at(0), ValueHome::Arena);
    }

    #[test]
    fn test_arena_overflow_spills_to_per_field() {
        let mut s = storage();
        s.set_arena_soft_cap(4);
        s.set(1, b"abcd"); // fills the arena to its cap
        let pos = s.set(2, b"overflow value");
        assert!(matches!(s.home_at(pos), ValueHome::PerField { .. }));
        assert_eq!(s.value_at(pos), b"overflow value");

        // Per-field values still honor the in-place rules.
        s.update_at(pos, b"small");
        assert_eq!(s.value_at(pos), b"small");
        assert!(matches!(s.home_at(pos), ValueHome::PerField { .. }));
    }

    #[test]
    fn test_duplicate_tags() {
        let mut s = storage();
        s.add(448, b"A");
        s.add(55, b"X");
        s.add(448, b"B");
        s.add(448, b"C");

        assert_eq!(s.occurrences(448), 3);
        assert_eq!(s.get_occurrence(448, 1), Some(&b"A"[..]));
        assert_eq!(s.get_occurrence(448, 2), Some(&b"B"[..]));
        assert_eq!(s.get_occurrence(448, 3), Some(&b"C"[..]));
        assert_eq!(s.get_occurrence(448, 4), None);
    }

    #[test]
    fn test_clear_then_reuse() {
        let mut s = storage();
        s.set(35, b"D");
        s.set(58, b"text");
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.get(35), None);

        s.set(35, b"8");
        assert_eq!(s.get(35), Some(&b"8"[..]));
        assert_eq!(s.field_count(), 1);
    }

    #[test]
    fn test_deep_copy_does_not_alias() {
        let mut s = storage();
        let pos = s.set(58, b"Hello");
        let copy = s.clone();
        s.update_at(pos, b"HELLO");
        assert_eq!(copy.value_at(pos), b"Hello");
        assert_eq!(s.value_at(pos), b"HELLO");
    }

    #[test]
    fn test_wire_length_excluding() {
        let mut s = storage();
        s.set(8, b"FIX.4.2");
        s.set(9, b"5");
        s.set(35, b"A");
        s.set(10, b"000");
        // Only 35=A| counts: "35=A\x01" is 5 bytes.
        assert_eq!(s.wire_length_excluding(&[8, 9, 10]), 5);
    }

    #[test]
    fn test_insert_at_keeps_order() {
        let mut s = storage();
        s.set(8, b"FIX.4.2");
        s.set(10, b"000");
        s.insert_at(1, 35, b"A");
        assert_eq!(s.tag_at(0), 8);
        assert_eq!(s.tag_at(1), 35);
        assert_eq!(s.tag_at(2), 10);
    }
}
