/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! # FlatFix Dictionary
//!
//! Read-only repeating-group metadata for the FlatFix engine.
//!
//! This crate provides:
//! - **Schema definitions**: [`GroupInfo`] group declaration trees
//! - **Registry**: [`GroupRegistry`] keyed by `(BeginString, MsgType)`
//! - **Lookup views**: flattened [`MessageGroups`] consumed by the group
//!   indexer
//!
//! Dictionary *loading* (QuickFIX XML or otherwise) is out of scope; callers
//! populate the registry programmatically.

pub mod registry;
pub mod schema;

pub use registry::{GroupRegistry, MessageGroups};
pub use schema::GroupInfo;
