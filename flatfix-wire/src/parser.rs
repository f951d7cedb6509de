/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Wire parser: one left-to-right scan over a received buffer.
//!
//! Tags accumulate digit by digit until `=`; values run to the next SOH,
//! except for registered raw/binary tags whose value length is read from
//! the immediately preceding field's integer value and whose bytes are
//! skipped verbatim (they may contain SOH). Field ranges are committed
//! zero-copy against the received buffer, which the parsed message takes
//! over as its original tier.

use std::collections::HashSet;

use bytes::BytesMut;
use memchr::memchr;
use smallvec::SmallVec;

use flatfix_core::error::GarbledError;
use flatfix_core::{EQUALS, SOH};
use flatfix_message::FixMessage;

/// Raw/binary value tags whose length prefix is the preceding field:
/// SecureData (91), RawData (96), EncodedText (213/355 family).
pub const DEFAULT_RAW_TAGS: [u32; 4] = [91, 96, 213, 355];

/// Fields collected per scan before spilling to the heap.
const INLINE_FIELDS: usize = 32;

/// Parses `tag=value<SOH>` buffers into messages.
#[derive(Debug, Clone)]
pub struct Parser {
    raw_tags: HashSet<u32>,
}

impl Parser {
    /// A parser recognizing [`DEFAULT_RAW_TAGS`] as length-prefixed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw_tags: DEFAULT_RAW_TAGS.into_iter().collect(),
        }
    }

    /// A parser with a caller-supplied raw tag set.
    #[must_use]
    pub fn with_raw_tags(tags: impl IntoIterator<Item = u32>) -> Self {
        Self {
            raw_tags: tags.into_iter().collect(),
        }
    }

    /// Registers one more raw/binary tag.
    pub fn add_raw_tag(&mut self, tag: u32) {
        self.raw_tags.insert(tag);
    }

    /// Parses `buffer` into `msg`, replacing its previous contents. On
    /// success the message owns the buffer as its original tier, every
    /// field is a zero-copy range into it, and the message is marked
    /// prepared.
    ///
    /// # Errors
    /// A [`GarbledError`] naming the offending byte or offset. The message
    /// is left cleared; garbled input cannot be partially committed.
    pub fn parse(&self, buffer: BytesMut, msg: &mut FixMessage) -> Result<(), GarbledError> {
        msg.clear();
        let fields = self.scan(&buffer)?;
        msg.attach_original(buffer);
        for &(tag, offset, len) in &fields {
            msg.storage_mut().append_parsed(tag, offset, len);
        }
        msg.set_prepared(true);
        Ok(())
    }

    /// Scans the buffer into `(tag, offset, len)` triples without copying.
    fn scan(&self, bytes: &[u8]) -> Result<SmallVec<[(u32, u32, u32); INLINE_FIELDS]>, GarbledError> {
        let mut fields: SmallVec<[(u32, u32, u32); INLINE_FIELDS]> = SmallVec::new();
        let len = bytes.len();
        let mut i = 0;
        while i < len {
            let tag_start = i;
            let mut tag: u32 = 0;
            loop {
                if i >= len {
                    return Err(GarbledError::Unterminated { offset: len });
                }
                let b = bytes[i];
                if b == EQUALS {
                    break;
                }
                if !b.is_ascii_digit() {
                    return Err(GarbledError::NonNumericTag { byte: b, offset: i });
                }
                tag = tag * 10 + u32::from(b - b'0');
                i += 1;
            }
            if i == tag_start {
                return Err(GarbledError::EmptyTag { offset: tag_start });
            }
            i += 1;
            let value_start = i;

            if self.raw_tags.contains(&tag) {
                let value_len = self
                    .preceding_length(&fields, bytes)
                    .ok_or(GarbledError::InvalidRawLength { tag })?;
                // The length came off the wire; it can be absurd.
                i = match value_start.checked_add(value_len) {
                    Some(end) if end < len => end,
                    _ => return Err(GarbledError::Unterminated { offset: len }),
                };
                if bytes[i] != SOH {
                    return Err(GarbledError::Unterminated { offset: i });
                }
                fields.push((tag, value_start as u32, value_len as u32));
            } else {
                let Some(rel) = memchr(SOH, &bytes[i..]) else {
                    return Err(GarbledError::Unterminated { offset: len });
                };
                i += rel;
                fields.push((tag, value_start as u32, (i - value_start) as u32));
            }
            i += 1;
        }
        Ok(fields)
    }

    /// Integer value of the field immediately preceding a raw tag.
    fn preceding_length(
        &self,
        fields: &[(u32, u32, u32)],
        bytes: &[u8],
    ) -> Option<usize> {
        let &(_, offset, len) = fields.last()?;
        let value = &bytes[offset as usize..(offset + len) as usize];
        flatfix_core::scalar::parse_uint(value)
            .ok()
            .map(|v| v as usize)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds wire bytes from a `|`-delimited literal.
    fn wire(s: &str) -> BytesMut {
        BytesMut::from(s.replace('|', "\x01").as_bytes())
    }

    #[test]
    fn test_parse_logon() {
        let mut msg = FixMessage::new();
        let parser = Parser::new();
        parser.parse(wire("8=FIX.4.2|9=5|35=A|10=000|"), &mut msg).unwrap();

        assert_eq!(msg.field_count(), 4);
        assert_eq!(msg.get_str(8), Some("FIX.4.2"));
        assert_eq!(msg.get_str(9), Some("5"));
        assert_eq!(msg.get_str(35), Some("A"));
        assert_eq!(msg.get_str(10), Some("000"));
        assert!(msg.is_prepared());
        assert!(!msg.is_standalone());
        assert_eq!(msg.body_length(), 5);
    }

    #[test]
    fn test_parse_empty_value() {
        let mut msg = FixMessage::new();
        Parser::new().parse(wire("35=D|58=|"), &mut msg).unwrap();
        assert_eq!(msg.get_bytes(58), Some(&b""[..]));
    }

    #[test]
    fn test_raw_value_may_contain_delimiter() {
        let mut msg = FixMessage::new();
        let mut raw = b"95=5|96=".to_vec();
        raw.extend_from_slice(b"ab\x01cd");
        raw.extend_from_slice(b"|35=D|");
        let buffer = BytesMut::from(raw.replace_pipes().as_slice());

        Parser::new().parse(buffer, &mut msg).unwrap();
        assert_eq!(msg.get_bytes(96), Some(&b"ab\x01cd"[..]));
        assert_eq!(msg.get_str(35), Some("D"));
    }

    #[test]
    fn test_non_numeric_tag_is_garbled() {
        let mut msg = FixMessage::new();
        let err = Parser::new().parse(wire("8=FIX.4.2|3x=A|"), &mut msg).unwrap_err();
        assert_eq!(
            err,
            GarbledError::NonNumericTag {
                byte: b'x',
                offset: 11,
            }
        );
        assert!(msg.is_empty());
    }

    #[test]
    fn test_missing_trailing_delimiter_is_garbled() {
        let mut msg = FixMessage::new();
        let err = Parser::new().parse(wire("8=FIX.4.2|35=A"), &mut msg).unwrap_err();
        assert!(matches!(err, GarbledError::Unterminated { .. }));
    }

    #[test]
    fn test_empty_tag_is_garbled() {
        let mut msg = FixMessage::new();
        let err = Parser::new().parse(wire("35=A|=B|"), &mut msg).unwrap_err();
        assert_eq!(err, GarbledError::EmptyTag { offset: 5 });
    }

    #[test]
    fn test_unparsable_raw_length_is_garbled() {
        let mut msg = FixMessage::new();
        let err = Parser::new()
            .parse(wire("95=five|96=abcde|"), &mut msg)
            .unwrap_err();
        assert_eq!(err, GarbledError::InvalidRawLength { tag: 96 });
    }

    #[test]
    fn test_overlong_raw_length_is_garbled() {
        let mut msg = FixMessage::new();
        let err = Parser::new()
            .parse(wire("95=18446744073709551615|96=x|"), &mut msg)
            .unwrap_err();
        assert!(matches!(err, GarbledError::Unterminated { .. }));
        assert!(msg.is_empty());

        // A length that overruns the buffer without overflowing.
        let mut msg = FixMessage::new();
        let err = Parser::new()
            .parse(wire("95=500|96=x|"), &mut msg)
            .unwrap_err();
        assert!(matches!(err, GarbledError::Unterminated { .. }));
    }

    #[test]
    fn test_raw_tag_without_preceding_field_is_garbled() {
        let mut msg = FixMessage::new();
        let err = Parser::new().parse(wire("96=abcde|"), &mut msg).unwrap_err();
        assert_eq!(err, GarbledError::InvalidRawLength { tag: 96 });
    }

    #[test]
    fn test_reparse_after_clear_matches_fresh() {
        let parser = Parser::new();
        let mut reused = FixMessage::new();
        parser.parse(wire("8=FIX.4.2|35=D|55=EURUSD|"), &mut reused).unwrap();
        reused.set_str(55, "GBPUSD");

        parser.parse(wire("8=FIX.4.2|35=A|"), &mut reused).unwrap();
        let mut fresh = FixMessage::new();
        parser.parse(wire("8=FIX.4.2|35=A|"), &mut fresh).unwrap();

        assert_eq!(reused.field_count(), fresh.field_count());
        assert_eq!(reused.get_str(35), fresh.get_str(35));
        assert_eq!(reused.get_str(55), None);
    }

    /// Replaces `|` bytes with SOH in raw byte vectors built by hand.
    trait ReplacePipes {
        fn replace_pipes(&self) -> Vec<u8>;
    }

    impl ReplacePipes for Vec<u8> {
        fn replace_pipes(&self) -> Vec<u8> {
            self.iter()
                .map(|&b| if b == b'|' { SOH } else { b })
                .collect()
        }
    }
}
