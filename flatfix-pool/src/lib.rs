/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! # FlatFix Pool
//!
//! Process-wide pools for the FlatFix engine:
//! - [`BytePool`]: size-bucketed byte buffers (one bucket per exact length)
//! - [`ScratchPool`]: integer scratch arrays for group indexing
//! - [`ObjectPool`]: generic bounded pool for messages and fields
//!
//! All pools share the same contract: concurrent borrow and return from
//! independent threads, bounded capacity, and graceful fallback to fresh
//! allocation on exhaustion. Pool misses are logged at debug level and are
//! never surfaced as errors.

pub mod buffers;
pub mod objects;
pub mod scratch;

pub use buffers::{BytePool, DEFAULT_BUCKET_CAPACITY, PooledBuf};
pub use objects::{ObjectPool, Poolable};
pub use scratch::{DEFAULT_SCRATCH_CAPACITY, ScratchArray, ScratchPool};
