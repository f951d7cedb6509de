/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Error types for the FlatFix engine.
//!
//! This module provides a unified error hierarchy using `thiserror` for typed,
//! domain-specific errors across all FlatFix operations:
//! - [`GarbledError`]: malformed wire input, never retried
//! - [`FieldError`]: missing or undecodable fields
//! - [`FormatError`]: FIX primitive values failing byte-level validation
//! - [`GroupError`]: repeating-group dictionary violations
//!
//! Internal invariant violations (index position out of range, hash table
//! reported full) are programming errors and panic; they are deliberately
//! absent from this taxonomy.

use std::fmt;
use thiserror::Error;

/// Result type alias using [`FixError`] as the error type.
pub type Result<T> = std::result::Result<T, FixError>;

/// Top-level error type for all FlatFix operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FixError {
    /// Malformed wire input; the caller must discard the message.
    #[error("garbled message: {0}")]
    Garbled(#[from] GarbledError),

    /// Missing or undecodable field.
    #[error("field error: {0}")]
    Field(#[from] FieldError),

    /// A primitive value failed format validation.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// A repeating-group dictionary violation.
    #[error("group error: {0}")]
    Group(#[from] GroupError),
}

/// Malformed wire input. A garbled message cannot be repaired; the caller
/// must discard it and request retransmission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GarbledError {
    /// A byte that is neither a digit nor `=` appeared while scanning a tag.
    #[error("non-numeric byte 0x{byte:02x} in tag number at offset {offset}")]
    NonNumericTag {
        /// The offending byte.
        byte: u8,
        /// Byte offset into the input buffer.
        offset: usize,
    },

    /// The buffer ended without a trailing delimiter after the last value.
    #[error("message not terminated by delimiter (ends at offset {offset})")]
    Unterminated {
        /// Byte offset where the scan stopped.
        offset: usize,
    },

    /// A tag with no digits before `=`.
    #[error("empty tag number at offset {offset}")]
    EmptyTag {
        /// Byte offset into the input buffer.
        offset: usize,
    },

    /// The length-prefix tag preceding a raw/binary tag did not parse as an
    /// integer.
    #[error("unparsable length prefix for raw tag {tag}")]
    InvalidRawLength {
        /// The raw/binary tag whose length could not be resolved.
        tag: u32,
    },
}

/// Missing or undecodable field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Read of an absent tag.
    #[error("field not found: tag {tag}")]
    NotFound {
        /// The tag number that was requested.
        tag: u32,
    },

    /// Read of an absent occurrence of a tag that may be present fewer times.
    #[error("occurrence {occurrence} of tag {tag} not found")]
    OccurrenceNotFound {
        /// The tag number that was requested.
        tag: u32,
        /// The 1-based occurrence that was requested.
        occurrence: usize,
    },

    /// A present field whose bytes failed decoding as the requested type.
    #[error("invalid value for tag {tag}: {source}")]
    Invalid {
        /// The tag number of the offending field.
        tag: u32,
        /// The underlying format violation.
        #[source]
        source: FormatError,
    },
}

/// A FIX primitive value failing byte-level format validation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// Not a valid ASCII integer.
    #[error("invalid integer encoding")]
    InvalidInt,

    /// Integer magnitude exceeds the representable range.
    #[error("integer overflow")]
    IntOverflow,

    /// Not a valid decimal number.
    #[error("invalid decimal encoding")]
    InvalidDecimal,

    /// Booleans must be exactly one byte, `Y` or `N`.
    #[error("invalid boolean: expected single 'Y' or 'N'")]
    InvalidBoolean,

    /// Single-character fields must be exactly one ASCII byte.
    #[error("invalid single-character value")]
    InvalidChar,

    /// A calendar value failed width, separator, or bounds validation.
    #[error("invalid {0} encoding")]
    InvalidCalendar(CalendarShape),
}

/// The calendar shape that failed validation, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarShape {
    /// `YYYYMMDD`.
    Date,
    /// `HH:MM:SS` with optional fraction.
    TimeOnly,
    /// `YYYYMMDD-HH:MM:SS` with optional fraction.
    Timestamp,
    /// Time-only with a timezone offset.
    ZonedTime,
    /// Timestamp with a timezone offset.
    ZonedTimestamp,
}

impl fmt::Display for CalendarShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Date => "date",
            Self::TimeOnly => "time-only",
            Self::Timestamp => "timestamp",
            Self::ZonedTime => "zoned time",
            Self::ZonedTimestamp => "zoned timestamp",
        };
        write!(f, "{name}")
    }
}

/// Repeating-group dictionary violations, raised only in validation mode.
///
/// Each variant carries the offending tag plus the FIX version and message
/// type under which the dictionary was consulted. The failing operation
/// aborts and the message is left in the state at the point of failure;
/// callers must discard it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GroupError {
    /// The same leading tag opened twice at one nesting scope.
    #[error("duplicate leading tag {tag} in {begin_string}/{msg_type}")]
    DuplicateLeadingTag {
        /// The leading tag that appeared twice.
        tag: u32,
        /// FIX version (BeginString) of the dictionary consulted.
        begin_string: String,
        /// Message type of the dictionary consulted.
        msg_type: String,
    },

    /// The same child tag declared twice for one group.
    #[error("duplicate child tag {tag} for group {leading_tag} in {begin_string}/{msg_type}")]
    DuplicateChildTag {
        /// The child tag that appeared twice.
        tag: u32,
        /// The leading tag of the group.
        leading_tag: u32,
        /// FIX version (BeginString) of the dictionary consulted.
        begin_string: String,
        /// Message type of the dictionary consulted.
        msg_type: String,
    },

    /// A tag inside a group entry is not declared for that group.
    #[error("tag {tag} not declared for group {leading_tag} in {begin_string}/{msg_type}")]
    UndeclaredChildTag {
        /// The undeclared tag.
        tag: u32,
        /// The leading tag of the group being consumed.
        leading_tag: u32,
        /// FIX version (BeginString) of the dictionary consulted.
        begin_string: String,
        /// Message type of the dictionary consulted.
        msg_type: String,
    },

    /// The first tag after a leading tag was not the declared delimiter.
    #[error(
        "group {leading_tag} expected delimiter {expected}, found {found} in {begin_string}/{msg_type}"
    )]
    DelimiterMismatch {
        /// The leading tag of the group.
        leading_tag: u32,
        /// The declared delimiter tag.
        expected: u32,
        /// The tag actually found.
        found: u32,
        /// FIX version (BeginString) of the dictionary consulted.
        begin_string: String,
        /// Message type of the dictionary consulted.
        msg_type: String,
    },

    /// A leading tag value that is not a valid repetition count.
    #[error("unresolvable repetition count for leading tag {tag} in {begin_string}/{msg_type}")]
    InvalidGroupCount {
        /// The leading tag whose value could not be resolved.
        tag: u32,
        /// FIX version (BeginString) of the dictionary consulted.
        begin_string: String,
        /// Message type of the dictionary consulted.
        msg_type: String,
    },

    /// A declared group tag appeared outside any open group.
    #[error("group tag {tag} outside any declared group in {begin_string}/{msg_type}")]
    TagOutsideGroup {
        /// The stray group tag.
        tag: u32,
        /// FIX version (BeginString) of the dictionary consulted.
        begin_string: String,
        /// Message type of the dictionary consulted.
        msg_type: String,
    },

    /// A group operation was attempted before indexing or after the index
    /// was invalidated by a clear/release.
    #[error("repeating-group index not initialized")]
    NotIndexed,
}
