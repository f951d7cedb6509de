/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Flat, index-addressed storage for FIX message fields.
//!
//! A message is a sequence of tag=value fields kept in wire order. The bytes
//! of every value live in exactly one of three tiers:
//!
//! - **Original**: a view into the received wire bytes (zero copy on parse)
//! - **Arena**: an append-only per-message growth buffer
//! - **Per-field**: an independent pooled buffer for values that outgrow
//!   the arena's soft cap
//!
//! [`TagIndex`] maps tags to positions through an open-addressing hash
//! table, [`ByteTiers`] owns the bytes, and [`IndexedStorage`] composes the
//! two and implements the in-place versus relocate update rules.

pub mod index;
pub mod store;
pub mod tier;

pub use index::{IndexEntry, TagIndex, ValueHome};
pub use store::IndexedStorage;
pub use tier::{ByteTiers, DEFAULT_ARENA_SOFT_CAP};
