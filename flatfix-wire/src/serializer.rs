/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Wire serializer: emits a message's fields in Field-Index order.
//!
//! BodyLength (9) and CheckSum (10) are recomputed from the emitted bytes
//! rather than re-sent as stored, so a mutated message stays well-formed.
//! Fields in the message's do-not-serialize set are skipped, and masked
//! tags are emitted as fill bytes of the original length.

use std::collections::HashSet;

use flatfix_core::scalar::format_uint;
use flatfix_core::{SOH, checksum_of, encode_checksum, tags};
use flatfix_message::FixMessage;

/// Byte written in place of each masked value byte.
pub const MASK_FILL: u8 = b'*';

/// Predicate for sensitive tags whose values must not appear on the wire
/// in logs or captures. Masking preserves value length.
#[derive(Debug, Clone)]
pub struct TagMasker {
    masked: HashSet<u32>,
    fill: u8,
}

impl TagMasker {
    /// Masks the default sensitive tags, Password (554) and
    /// NewPassword (925).
    #[must_use]
    pub fn new() -> Self {
        Self {
            masked: [tags::PASSWORD, tags::NEW_PASSWORD].into_iter().collect(),
            fill: MASK_FILL,
        }
    }

    /// Masks a caller-supplied tag set.
    #[must_use]
    pub fn with_tags(tags: impl IntoIterator<Item = u32>) -> Self {
        Self {
            masked: tags.into_iter().collect(),
            fill: MASK_FILL,
        }
    }

    /// Returns true if `tag`'s value must be masked.
    #[inline]
    #[must_use]
    pub fn is_masked(&self, tag: u32) -> bool {
        self.masked.contains(&tag)
    }
}

impl Default for TagMasker {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes messages back to `tag=value<SOH>` bytes.
#[derive(Debug, Clone, Default)]
pub struct Serializer {
    masker: TagMasker,
}

impl Serializer {
    /// A serializer with the default masking policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            masker: TagMasker::new(),
        }
    }

    /// A serializer with a caller-supplied masking policy.
    #[must_use]
    pub fn with_masker(masker: TagMasker) -> Self {
        Self { masker }
    }

    /// Appends the message's wire form to `out`. Returns the number of
    /// bytes written.
    pub fn serialize(&self, msg: &FixMessage, out: &mut Vec<u8>) -> usize {
        let start = out.len();
        let storage = msg.storage();
        let skip = msg.skip_tags();

        // BodyLength counts every emitted field except tags 8, 9 and 10.
        let mut body = 0usize;
        for p in 0..storage.field_count() {
            let tag = storage.tag_at(p);
            if skip.contains(&tag) || is_session_tag(tag) {
                continue;
            }
            body += digit_count(tag) + 1 + storage.value_at(p).len() + 1;
        }

        for p in 0..storage.field_count() {
            let tag = storage.tag_at(p);
            if skip.contains(&tag) {
                continue;
            }
            if tag == tags::BODY_LENGTH {
                self.emit(out, tag, &uint_bytes(body as u64));
            } else if tag == tags::CHECKSUM {
                let sum = checksum_of(&out[start..]);
                self.emit(out, tag, &encode_checksum(sum));
            } else if self.masker.is_masked(tag) {
                let fill = vec![self.fill(); storage.value_at(p).len()];
                self.emit(out, tag, &fill);
            } else {
                self.emit(out, tag, storage.value_at(p));
            }
        }
        out.len() - start
    }

    fn emit(&self, out: &mut Vec<u8>, tag: u32, value: &[u8]) {
        format_uint(u64::from(tag), out);
        out.push(flatfix_core::EQUALS);
        out.extend_from_slice(value);
        out.push(SOH);
    }

    fn fill(&self) -> u8 {
        self.masker.fill
    }
}

fn is_session_tag(tag: u32) -> bool {
    tag == tags::BEGIN_STRING || tag == tags::BODY_LENGTH || tag == tags::CHECKSUM
}

fn digit_count(tag: u32) -> usize {
    let mut n = tag;
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

fn uint_bytes(value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(20);
    format_uint(value, &mut buf);
    buf
}
