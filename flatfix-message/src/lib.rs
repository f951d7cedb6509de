/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! # FlatFix Message
//!
//! The message facade of the FlatFix engine.
//!
//! This crate provides:
//! - **Typed access**: getters and setters for every FIX scalar and
//!   date/time shape over flat indexed storage
//! - **Group operations**: dictionary-driven repeating-group reads and
//!   mutations behind one type
//! - **Lifecycle**: clear, deep clone, standalone conversion, and pool
//!   integration via [`flatfix_pool::Poolable`]

pub mod message;

pub use message::FixMessage;
