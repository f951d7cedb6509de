/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Record arenas for the repeating-group index.
//!
//! Group and entry records live in growable vectors and refer to each other
//! by index handle, never by reference. Handles stay valid for the life of
//! one indexing pass; records of removed entries are left in place as dead
//! slots rather than spliced out, so no handle is ever reused or renumbered.
//! Every flat Field-Index position is stored in exactly one record field,
//! which lets position-shift propagation visit each stored position once.

/// One ordered child of a group entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Child {
    /// A plain tag at a flat Field-Index position.
    Tag(u32),
    /// A nested group, by group handle.
    Group(u32),
}

/// One entry (repetition) of a repeating group.
#[derive(Debug, Clone)]
pub(crate) struct EntryRecord {
    /// Handle of the owning group.
    pub group: u32,
    /// Ordered child links. Plain tags carry their flat position; nested
    /// groups are linked by handle and carry their own positions.
    pub children: Vec<Child>,
    /// Flat position one past the last field covered by this entry,
    /// nested group contents included. Equals the insertion point while
    /// the entry is empty.
    pub end: u32,
}

/// One declared repeating group, materialized or hidden.
#[derive(Debug, Clone)]
pub(crate) struct GroupRecord {
    /// The NumInGroup tag announcing this group.
    pub leading_tag: u32,
    /// Flat position of the leading tag, or `None` while the group is
    /// hidden (zero entries, absent from the wire).
    pub leading_pos: Option<u32>,
    /// Entry handles in wire order.
    pub entries: Vec<u32>,
    /// Entry containing this group, or `None` for a top-level group.
    pub parent_entry: Option<u32>,
}

impl GroupRecord {
    /// A hidden record for a declared group with no wire presence yet.
    pub fn hidden(leading_tag: u32, parent_entry: Option<u32>) -> Self {
        Self {
            leading_tag,
            leading_pos: None,
            entries: Vec::new(),
            parent_entry,
        }
    }
}
