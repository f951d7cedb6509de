/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! # FlatFix
//!
//! The message-storage and wire-codec core of a FIX protocol engine.
//!
//! FlatFix keeps each message as a flat sequence of tag=value fields whose
//! bytes live in one of three tiers: the original received buffer (zero
//! copy), a per-message append-only arena, or pooled per-field buffers.
//! A hash-backed tag index gives constant-time lookup, a dictionary-driven
//! group index handles repeating groups, and the wire codec parses and
//! serializes with garbled detection, raw/binary tags, and masking.
//!
//! ## Features
//!
//! - **Zero-copy parsing**: field values reference the received buffer
//! - **In-place mutation**: updates that fit stay where they are; only
//!   growth relocates
//! - **Repeating groups**: indexed, validated, and mutable while the flat
//!   field order stays consistent
//! - **Pooling**: bounded concurrent pools for buffers, messages, fields,
//!   and scratch arrays
//!
//! ## Quick Start
//!
//! ```rust
//! use flatfix::prelude::*;
//!
//! let mut msg = FixMessage::new();
//! let buffer = bytes::BytesMut::from(&b"8=FIX.4.2\x019=5\x0135=A\x0110=178\x01"[..]);
//! Parser::new().parse(buffer, &mut msg).unwrap();
//! assert_eq!(msg.msg_type(), Some("A"));
//!
//! let mut out = Vec::new();
//! Serializer::new().serialize(&msg, &mut out);
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: scalar and calendar codecs, checksums, errors
//! - [`pool`]: process-wide buffer and object pools
//! - [`storage`]: the tag index and multi-tier byte storage
//! - [`dictionary`]: read-only repeating-group metadata
//! - [`groups`]: repeating-group indexing and mutation
//! - [`message`]: the typed message facade
//! - [`wire`]: parser, serializer, and message pools

pub mod core {
    //! Scalar and calendar codecs, checksums, and error definitions.
    pub use flatfix_core::*;
}

pub mod pool {
    //! Process-wide buffer and object pools.
    pub use flatfix_pool::*;
}

pub mod storage {
    //! The tag index and multi-tier byte storage.
    pub use flatfix_storage::*;
}

pub mod dictionary {
    //! Read-only repeating-group metadata.
    pub use flatfix_dictionary::*;
}

pub mod groups {
    //! Repeating-group indexing and mutation.
    pub use flatfix_groups::*;
}

pub mod message {
    //! The typed message facade.
    pub use flatfix_message::*;
}

pub mod wire {
    //! Wire parsing, serialization, and message pools.
    pub use flatfix_wire::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use flatfix_core::{
        Date, FieldError, FixError, FormatError, GarbledError, GroupError, Precision, Result,
        TagValue, TimeOnly, Timestamp, TzOffset, ZonedTime, ZonedTimestamp,
    };

    // Pools
    pub use flatfix_pool::{BytePool, ObjectPool, Poolable, ScratchPool};

    // Storage
    pub use flatfix_storage::IndexedStorage;

    // Dictionary
    pub use flatfix_dictionary::{GroupInfo, GroupRegistry, MessageGroups};

    // Groups
    pub use flatfix_groups::{GroupIndex, IndexState};

    // Message
    pub use flatfix_message::FixMessage;

    // Wire codec
    pub use flatfix_wire::{FieldPool, MessagePool, Parser, Serializer, TagMasker};
}
