/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Tag and tag-value types.
//!
//! This module provides:
//! - [`FieldTag`]: type-safe wrapper for FIX field tag numbers
//! - [`TagValue`]: a (tag, byte-range) pair referencing a shared buffer
//!
//! A [`TagValue`] owns no bytes itself; it references a refcounted buffer
//! plus an offset and length. Values handed out by a message are marked
//! read-only so mutation goes through the message API.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// FIX field tag number.
///
/// Tags are positive integers identifying fields within a FIX message.
/// Standard tags live in the 1-5000 range; user-defined tags use 5001+.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct FieldTag(u32);

impl FieldTag {
    /// Creates a new field tag.
    ///
    /// # Arguments
    /// * `tag` - The tag number (must be > 0)
    #[inline]
    #[must_use]
    pub const fn new(tag: u32) -> Self {
        Self(tag)
    }

    /// Returns the raw tag number.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns true if this is a standard FIX tag (1-5000).
    #[inline]
    #[must_use]
    pub const fn is_standard(self) -> bool {
        self.0 >= 1 && self.0 <= 5000
    }

    /// Returns true if this is a user-defined tag (5001+).
    #[inline]
    #[must_use]
    pub const fn is_user_defined(self) -> bool {
        self.0 > 5000
    }
}

impl From<u32> for FieldTag {
    fn from(tag: u32) -> Self {
        Self(tag)
    }
}

impl From<FieldTag> for u32 {
    fn from(tag: FieldTag) -> Self {
        tag.0
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A (tag, byte-range) pair referencing a shared buffer.
///
/// Created transiently for reads or drawn from a pool for reuse. The
/// referenced buffer is refcounted (`Bytes`), so a `TagValue` stays valid
/// even after the message it came from is released, without copying.
#[derive(Debug, Clone)]
pub struct TagValue {
    tag: u32,
    buffer: Bytes,
    offset: usize,
    len: usize,
    read_only: bool,
}

impl TagValue {
    /// Creates a new tag value referencing `buffer[offset..offset + len]`.
    ///
    /// # Arguments
    /// * `tag` - The field tag number
    /// * `buffer` - The shared buffer holding the value bytes
    /// * `offset` - Start of the value within the buffer
    /// * `len` - Length of the value in bytes
    ///
    /// # Panics
    /// Panics if the range does not lie within the buffer; an out-of-range
    /// view is a programming error.
    #[must_use]
    pub fn new(tag: u32, buffer: Bytes, offset: usize, len: usize) -> Self {
        assert!(
            offset + len <= buffer.len(),
            "tag value range out of buffer bounds"
        );
        Self {
            tag,
            buffer,
            offset,
            len,
            read_only: false,
        }
    }

    /// Creates an empty placeholder, for pool storage.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tag: 0,
            buffer: Bytes::new(),
            offset: 0,
            len: 0,
            read_only: false,
        }
    }

    /// Marks this value read-only, as done when returning it from a message.
    #[inline]
    #[must_use]
    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Returns the field tag.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> FieldTag {
        FieldTag(self.tag)
    }

    /// Returns the value bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[self.offset..self.offset + self.len]
    }

    /// Returns the value as a string slice, or `None` if not valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }

    /// Returns true if mutation through this view is forbidden.
    #[inline]
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns the length of the value in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the value is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Repoints this value at a new range, reusing the allocation-free shell.
    ///
    /// Used by pools when recycling `TagValue` instances.
    pub fn repoint(&mut self, tag: u32, buffer: Bytes, offset: usize, len: usize) {
        assert!(
            offset + len <= buffer.len(),
            "tag value range out of buffer bounds"
        );
        self.tag = tag;
        self.buffer = buffer;
        self.offset = offset;
        self.len = len;
        self.read_only = false;
    }

    /// Clears this value back to the empty placeholder state.
    pub fn reset(&mut self) {
        self.tag = 0;
        self.buffer = Bytes::new();
        self.offset = 0;
        self.len = 0;
        self.read_only = false;
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "{}={}", self.tag, s),
            None => write!(f, "{}=<{} bytes>", self.tag, self.len),
        }
    }
}
