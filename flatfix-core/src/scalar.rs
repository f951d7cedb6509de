/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Stateless parse/format routines for FIX scalar types.
//!
//! All routines operate directly on byte ranges with no intermediate text
//! object. Parsing is overflow-safe; formatting produces the exact byte
//! sequence FIX expects, independent of locale.

use crate::error::FormatError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a signed integer from ASCII bytes.
///
/// Accepts an optional leading minus sign followed by one or more digits.
/// Accumulation is overflow-checked.
///
/// # Errors
/// [`FormatError::InvalidInt`] on empty input, a bare minus, or any
/// non-digit byte; [`FormatError::IntOverflow`] when the magnitude exceeds
/// `i64`.
pub fn parse_int(bytes: &[u8]) -> Result<i64, FormatError> {
    let (negative, digits) = match bytes.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some(_) => (false, bytes),
        None => return Err(FormatError::InvalidInt),
    };
    if digits.is_empty() {
        return Err(FormatError::InvalidInt);
    }

    let mut magnitude: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(FormatError::InvalidInt);
        }
        magnitude = magnitude
            .checked_mul(10)
            .and_then(|m| m.checked_add(i64::from(b - b'0')))
            .ok_or(FormatError::IntOverflow)?;
    }

    if negative {
        Ok(-magnitude)
    } else {
        Ok(magnitude)
    }
}

/// Parses an unsigned integer from ASCII bytes.
///
/// # Errors
/// [`FormatError::InvalidInt`] on empty input or any non-digit byte;
/// [`FormatError::IntOverflow`] when the value exceeds `u64`.
pub fn parse_uint(bytes: &[u8]) -> Result<u64, FormatError> {
    if bytes.is_empty() {
        return Err(FormatError::InvalidInt);
    }

    let mut value: u64 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return Err(FormatError::InvalidInt);
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(b - b'0')))
            .ok_or(FormatError::IntOverflow)?;
    }

    Ok(value)
}

/// Formats a signed integer as ASCII, appending to `out`.
///
/// Returns the number of bytes written.
pub fn format_int(value: i64, out: &mut Vec<u8>) -> usize {
    let mut buf = itoa::Buffer::new();
    let s = buf.format(value);
    out.extend_from_slice(s.as_bytes());
    s.len()
}

/// Formats an unsigned integer as ASCII, appending to `out`.
///
/// Returns the number of bytes written.
pub fn format_uint(value: u64, out: &mut Vec<u8>) -> usize {
    let mut buf = itoa::Buffer::new();
    let s = buf.format(value);
    out.extend_from_slice(s.as_bytes());
    s.len()
}

/// Returns the formatted byte length of a signed integer without writing it.
///
/// Used by the indexed storage to decide in-place overwrites before
/// formatting.
#[must_use]
pub fn int_len(value: i64) -> usize {
    let mut buf = itoa::Buffer::new();
    buf.format(value).len()
}

/// Parses a decimal number from ASCII bytes.
///
/// # Errors
/// [`FormatError::InvalidDecimal`] if the bytes are not a valid decimal.
pub fn parse_decimal(bytes: &[u8]) -> Result<Decimal, FormatError> {
    let s = std::str::from_utf8(bytes).map_err(|_| FormatError::InvalidDecimal)?;
    if s.is_empty() {
        return Err(FormatError::InvalidDecimal);
    }
    Decimal::from_str(s).map_err(|_| FormatError::InvalidDecimal)
}

/// Formats a decimal, appending to `out`. Trailing fractional zeros are
/// preserved as carried by the `Decimal` scale, so a value parsed from the
/// wire formats back to the same bytes.
///
/// Returns the number of bytes written.
pub fn format_decimal(value: &Decimal, out: &mut Vec<u8>) -> usize {
    let s = value.to_string();
    out.extend_from_slice(s.as_bytes());
    s.len()
}

/// Parses a FIX boolean. Only a single `Y` or `N` byte is valid.
///
/// # Errors
/// [`FormatError::InvalidBoolean`] for any other byte or any length != 1.
pub fn parse_bool(bytes: &[u8]) -> Result<bool, FormatError> {
    match bytes {
        b"Y" => Ok(true),
        b"N" => Ok(false),
        _ => Err(FormatError::InvalidBoolean),
    }
}

/// Returns the single-byte FIX encoding of a boolean.
#[inline]
#[must_use]
pub const fn format_bool(value: bool) -> &'static [u8] {
    if value { b"Y" } else { b"N" }
}

/// Parses a single-character field.
///
/// # Errors
/// [`FormatError::InvalidChar`] unless the value is exactly one ASCII byte.
pub fn parse_char(bytes: &[u8]) -> Result<char, FormatError> {
    match bytes {
        [b] if b.is_ascii() => Ok(*b as char),
        _ => Err(FormatError::InvalidChar),
    }
}
