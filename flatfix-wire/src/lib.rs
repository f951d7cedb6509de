/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! # FlatFix Wire
//!
//! The tag=value wire codec of the FlatFix engine.
//!
//! This crate provides:
//! - **Parsing**: a single-pass scanner with garbled-message detection and
//!   length-prefixed raw/binary tag support, committing fields zero-copy
//! - **Serialization**: Field-Index-order emission with BodyLength and
//!   CheckSum recomputation, a do-not-serialize set, and length-preserving
//!   masking of sensitive tags
//! - **Pools**: bounded concurrent [`MessagePool`] and [`FieldPool`]

pub mod parser;
pub mod pool;
pub mod serializer;

pub use parser::{DEFAULT_RAW_TAGS, Parser};
pub use pool::{FieldPool, MessagePool};
pub use serializer::{MASK_FILL, Serializer, TagMasker};
