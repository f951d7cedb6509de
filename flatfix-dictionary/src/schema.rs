/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Schema definitions for repeating-group metadata.
//!
//! A [`GroupInfo`] describes one declared repeating group: the NumInGroup
//! leading tag, the delimiter tag that must open every entry, the plain
//! child tags, and any nested groups. Trees of these feed the
//! [`crate::GroupRegistry`].

use serde::{Deserialize, Serialize};

/// Declaration of one repeating group within a message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    /// Tag of the count field (NumInGroup).
    pub leading_tag: u32,
    /// Tag of the first field in each group entry.
    pub delimiter_tag: u32,
    /// Plain (non-group) tags allowed in each entry. The delimiter tag need
    /// not be repeated here.
    pub child_tags: Vec<u32>,
    /// Groups nested within each entry.
    pub nested: Vec<GroupInfo>,
}

impl GroupInfo {
    /// Creates a group declaration with no children beyond the delimiter.
    #[must_use]
    pub fn new(leading_tag: u32, delimiter_tag: u32) -> Self {
        Self {
            leading_tag,
            delimiter_tag,
            child_tags: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Adds a plain child tag.
    #[must_use]
    pub fn with_child(mut self, tag: u32) -> Self {
        self.child_tags.push(tag);
        self
    }

    /// Adds a nested group.
    #[must_use]
    pub fn with_nested(mut self, nested: GroupInfo) -> Self {
        self.nested.push(nested);
        self
    }
}
