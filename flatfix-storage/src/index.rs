/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! The tag index: a flat array of fixed-width entries in wire order plus an
//! open-addressing hash table mapping tag -> first index position.
//!
//! Duplicate tags are allowed; the hash table tracks only the first
//! occurrence and later occurrences are found by a forward linear scan;
//! duplicate tags are rare in FIX so the scan stays short.
//!
//! The hash table is rehashed from scratch when it grows. Removal either
//! splices a single slot to empty, or triggers an in-place rehash when the
//! removal would leave an unreachable gap between two probe sequences or
//! would renumber the first occurrence of a duplicated tag.

use smallvec::SmallVec;

/// Number of index entries kept inline before spilling to the heap.
const INLINE_ENTRIES: usize = 16;

/// Which storage tier owns an entry's bytes. Exactly one per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueHome {
    /// A range of the message's original received bytes.
    Original,
    /// A range of the message's append-only arena.
    Arena,
    /// An independent pooled buffer, by handle.
    PerField {
        /// Handle into the per-field buffer table.
        buf: u32,
    },
}

/// One tag occurrence, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// The field tag number.
    pub tag: u32,
    /// Value offset within the owning tier.
    pub offset: u32,
    /// Value length in bytes.
    pub len: u32,
    /// The tier owning the value bytes.
    pub home: ValueHome,
    /// Max length writable in place without relocation, recorded the last
    /// time the field grew. Amortizes repeated numeric updates of
    /// fluctuating width.
    pub in_place_cap: u32,
    /// Whether this tag participates in a prepared (partially
    /// pre-serialized) message.
    pub prepared: bool,
}

impl IndexEntry {
    /// Creates an entry whose in-place capacity equals its length.
    #[must_use]
    pub const fn new(tag: u32, offset: u32, len: u32, home: ValueHome) -> Self {
        Self {
            tag,
            offset,
            len,
            home,
            in_place_cap: len,
            prepared: false,
        }
    }
}

const EMPTY_SLOT: i32 = -1;
const INITIAL_SLOTS: usize = 16;

/// Growable flat index of tag occurrences with hash lookup.
#[derive(Debug, Clone)]
pub struct TagIndex {
    entries: SmallVec<[IndexEntry; INLINE_ENTRIES]>,
    /// Open-addressing table: entry position, or `EMPTY_SLOT`. Length is
    /// always a power of two and at least twice the entry count.
    slots: Vec<i32>,
}

impl TagIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: SmallVec::new(),
            slots: vec![EMPTY_SLOT; INITIAL_SLOTS],
        }
    }

    /// Number of entries (tag occurrences).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index holds no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the first occurrence of `tag`.
    #[must_use]
    pub fn position_of(&self, tag: u32) -> Option<usize> {
        self.find_slot(tag).map(|slot| self.slots[slot] as usize)
    }

    /// Position of the `occurrence`-th (1-based) occurrence of `tag`.
    ///
    /// The first occurrence comes from the hash table; later ones from a
    /// forward linear scan.
    #[must_use]
    pub fn position_of_occurrence(&self, tag: u32, occurrence: usize) -> Option<usize> {
        if occurrence == 0 {
            return None;
        }
        let first = self.position_of(tag)?;
        if occurrence == 1 {
            return Some(first);
        }
        let mut remaining = occurrence - 1;
        for (pos, entry) in self.entries.iter().enumerate().skip(first + 1) {
            if entry.tag == tag {
                remaining -= 1;
                if remaining == 0 {
                    return Some(pos);
                }
            }
        }
        None
    }

    /// Number of occurrences of `tag`.
    #[must_use]
    pub fn occurrences(&self, tag: u32) -> usize {
        match self.position_of(tag) {
            None => 0,
            Some(first) => {
                1 + self.entries[first + 1..]
                    .iter()
                    .filter(|entry| entry.tag == tag)
                    .count()
            }
        }
    }

    /// Appends an entry, returning its position.
    pub fn push(&mut self, entry: IndexEntry) -> usize {
        self.grow_if_needed();
        let pos = self.entries.len();
        self.entries.push(entry);
        self.insert_hash(entry.tag, pos);
        pos
    }

    /// Inserts an entry at an arbitrary position, shifting later entries and
    /// every hash pointer at or beyond the insertion point.
    ///
    /// # Panics
    /// Panics if `pos > len()`; positions are a programming contract.
    pub fn insert_at(&mut self, pos: usize, entry: IndexEntry) {
        assert!(pos <= self.entries.len(), "index position out of range");
        self.grow_if_needed();
        self.entries.insert(pos, entry);
        for slot in &mut self.slots {
            if *slot != EMPTY_SLOT && *slot as usize >= pos {
                *slot += 1;
            }
        }
        match self.find_slot(entry.tag) {
            // The inserted occurrence precedes the mapped one: repoint.
            Some(slot) if self.slots[slot] as usize > pos => self.slots[slot] = pos as i32,
            Some(_) => {}
            None => self.insert_hash(entry.tag, pos),
        }
    }

    /// Removes the entry at `pos` and returns it, shifting later entries and
    /// hash pointers down.
    ///
    /// # Panics
    /// Panics if `pos >= len()`.
    pub fn remove_at(&mut self, pos: usize) -> IndexEntry {
        assert!(pos < self.entries.len(), "index position out of range");
        let tag = self.entries[pos].tag;
        let slot = self
            .find_slot(tag)
            .expect("indexed tag missing from hash table");
        let first = self.slots[slot] as usize;
        let duplicated = self.occurrences(tag) > 1;

        let removed = self.entries.remove(pos);
        for s in &mut self.slots {
            if *s != EMPTY_SLOT && *s as usize > pos {
                *s -= 1;
            }
        }

        if duplicated || first != pos {
            // First-occurrence renumbering: cheapest correct answer is a
            // full in-place rehash. Duplicate tags are rare.
            self.rehash_in_place();
        } else {
            let len = self.slots.len();
            if self.slots[(slot + 1) & (len - 1)] != EMPTY_SLOT {
                // The next slot may belong to a probe sequence that ran
                // through this one; clearing it would cut that chain.
                self.rehash_in_place();
            } else {
                self.slots[slot] = EMPTY_SLOT;
            }
        }
        removed
    }

    /// The entry at `pos`.
    ///
    /// # Panics
    /// Panics if `pos >= len()`.
    #[inline]
    #[must_use]
    pub fn entry(&self, pos: usize) -> &IndexEntry {
        &self.entries[pos]
    }

    /// Mutable access to the entry at `pos`.
    ///
    /// The caller must not change `tag`; retagging requires remove + insert
    /// so the hash table stays consistent.
    ///
    /// # Panics
    /// Panics if `pos >= len()`.
    #[inline]
    pub fn entry_mut(&mut self, pos: usize) -> &mut IndexEntry {
        &mut self.entries[pos]
    }

    /// Iterates entries in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Removes all entries, keeping allocated capacity.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.slots.fill(EMPTY_SLOT);
    }

    /// Probes for the slot holding `tag`'s first-occurrence mapping.
    fn find_slot(&self, tag: u32) -> Option<usize> {
        let mask = self.slots.len() - 1;
        let mut slot = (tag as usize) & mask;
        loop {
            let value = self.slots[slot];
            if value == EMPTY_SLOT {
                return None;
            }
            if self.entries[value as usize].tag == tag {
                return Some(slot);
            }
            slot = (slot + 1) & mask;
        }
    }

    /// Inserts `tag -> pos` unless the tag is already mapped.
    fn insert_hash(&mut self, tag: u32, pos: usize) {
        let mask = self.slots.len() - 1;
        let mut slot = (tag as usize) & mask;
        let mut probed = 0;
        loop {
            let value = self.slots[slot];
            if value == EMPTY_SLOT {
                self.slots[slot] = pos as i32;
                return;
            }
            if self.entries[value as usize].tag == tag {
                return;
            }
            slot = (slot + 1) & mask;
            probed += 1;
            assert!(probed <= self.slots.len(), "hash table full");
        }
    }

    /// Doubles the hash table when the next push would exceed half load,
    /// rehashing from scratch.
    fn grow_if_needed(&mut self) {
        if (self.entries.len() + 1) * 2 <= self.slots.len() {
            return;
        }
        let new_len = (self.slots.len() * 2).max(INITIAL_SLOTS);
        self.slots = vec![EMPTY_SLOT; new_len];
        self.reinsert_all();
    }

    /// Clears the table in place (ratio 1) and reinserts every first
    /// occurrence; used to close structural gaps without growing.
    fn rehash_in_place(&mut self) {
        self.slots.fill(EMPTY_SLOT);
        self.reinsert_all();
    }

    fn reinsert_all(&mut self) {
        for pos in 0..self.entries.len() {
            let tag = self.entries[pos].tag;
            self.insert_hash(tag, pos);
        }
    }
}

impl Default for TagIndex {
    fn default() -> Self {
        Self::new()
    }
}
