/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! FIX checksum helpers.
//!
//! The checksum (tag 10) is the byte sum of the serialized message up to and
//! excluding the checksum field itself, modulo 256, emitted as exactly three
//! ASCII digits.

/// Computes the checksum over `data`: byte sum modulo 256.
#[inline]
#[must_use]
pub fn checksum_of(data: &[u8]) -> u8 {
    let sum: u32 = data.iter().map(|&b| u32::from(b)).sum();
    (sum % 256) as u8
}

/// Encodes a checksum as three zero-padded ASCII digits.
#[inline]
#[must_use]
pub fn encode_checksum(checksum: u8) -> [u8; 3] {
    [
        b'0' + checksum / 100,
        b'0' + (checksum / 10) % 10,
        b'0' + checksum % 10,
    ]
}

/// Decodes a three-digit ASCII checksum, or `None` if malformed.
#[inline]
#[must_use]
pub fn decode_checksum(bytes: &[u8]) -> Option<u8> {
    let [a, b, c] = bytes else { return None };
    let (a, b, c) = (
        a.checked_sub(b'0')?,
        b.checked_sub(b'0')?,
        c.checked_sub(b'0')?,
    );
    if a > 9 || b > 9 || c > 9 {
        return None;
    }
    // Sum cannot exceed 255 from three digits only if a <= 2; reject e.g. "999".
    let value = u32::from(a) * 100 + u32::from(b) * 10 + u32::from(c);
    u8::try_from(value).ok()
}
