/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! # FlatFix Groups
//!
//! Repeating-group indexing and mutation for the FlatFix engine.
//!
//! This crate provides:
//! - **Indexing**: a one-time dictionary-driven scan classifying every
//!   leading tag and nesting groups, with or without validation
//! - **Mutation**: add/remove entries and per-entry tags while the flat
//!   Field-Index, entry links, group records, and hidden leading tags stay
//!   mutually consistent
//! - **Lifecycle**: the uninitialized / indexed / invalidated state machine
//!   tied to message clear and release

pub mod index;
mod records;

pub use index::{GroupIndex, IndexState};
