/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! # FlatFix Core
//!
//! Core types, errors, and FIX primitive-type codecs for the FlatFix engine.
//!
//! This crate provides the building blocks shared by all FlatFix crates:
//! - **Error types**: unified typed hierarchy with `thiserror`
//! - **Tag types**: `FieldTag` and the `TagValue` byte-range view
//! - **Scalar codecs**: integer, decimal, boolean, char
//! - **Calendar codecs**: date, time, timestamp, and timezone-qualified
//!   variants with milli/micro/nanosecond fractions, all byte-exact
//! - **Checksum helpers**: tag 10 computation and 3-digit encoding
//!
//! All codecs operate directly on byte ranges with no intermediate text
//! object, so the hot parse/serialize paths allocate nothing.

pub mod calendar;
pub mod checksum;
pub mod error;
pub mod scalar;
pub mod tag;
pub mod zoned;

pub use calendar::{Date, Precision, TimeOnly, Timestamp};
pub use checksum::{checksum_of, decode_checksum, encode_checksum};
pub use error::{
    CalendarShape, FieldError, FixError, FormatError, GarbledError, GroupError, Result,
};
pub use tag::{FieldTag, TagValue};
pub use zoned::{TzOffset, ZonedTime, ZonedTimestamp};

/// The FIX field delimiter byte (SOH).
pub const SOH: u8 = 0x01;

/// The byte separating a tag number from its value.
pub const EQUALS: u8 = b'=';

/// Standard session-layer tag numbers used throughout the engine.
pub mod tags {
    /// BeginString (8).
    pub const BEGIN_STRING: u32 = 8;
    /// BodyLength (9).
    pub const BODY_LENGTH: u32 = 9;
    /// CheckSum (10).
    pub const CHECKSUM: u32 = 10;
    /// MsgType (35).
    pub const MSG_TYPE: u32 = 35;
    /// Password (554).
    pub const PASSWORD: u32 = 554;
    /// NewPassword (925).
    pub const NEW_PASSWORD: u32 = 925;
}
