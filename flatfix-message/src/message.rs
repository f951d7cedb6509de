/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! The message facade: typed field access over [`IndexedStorage`] plus
//! repeating-group operations through a lazily built [`GroupIndex`].
//!
//! Accessor policy: byte and string getters return `Option` (absent
//! marker), every typed getter returns `Result` with
//! [`FieldError::NotFound`] for an absent tag. Both conventions are kept
//! deliberately; callers reading free-text fields branch on presence,
//! callers decoding typed fields propagate errors.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use rust_decimal::Decimal;

use flatfix_core::error::{FieldError, GroupError};
use flatfix_core::scalar::{
    format_bool, format_decimal, format_int, format_uint, parse_bool, parse_char, parse_decimal,
    parse_int, parse_uint,
};
use flatfix_core::{
    Date, TagValue, TimeOnly, Timestamp, ZonedTime, ZonedTimestamp, tags,
};
use flatfix_dictionary::MessageGroups;
use flatfix_groups::GroupIndex;
use flatfix_pool::Poolable;
use flatfix_storage::IndexedStorage;

/// One FIX message: flat tag=value fields in wire order with typed access
/// and group mutation.
#[derive(Debug)]
pub struct FixMessage {
    storage: IndexedStorage,
    dict: Option<Arc<MessageGroups>>,
    groups: Option<GroupIndex>,
    skip_tags: HashSet<u32>,
    from_pool: bool,
    user_owned: bool,
}

impl FixMessage {
    /// Creates an empty message with no dictionary attached. Group
    /// operations require [`FixMessage::with_dictionary`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: IndexedStorage::with_global_pool(),
            dict: None,
            groups: None,
            skip_tags: HashSet::new(),
            from_pool: false,
            user_owned: true,
        }
    }

    /// Creates an empty message bound to one message type's group
    /// dictionary.
    #[must_use]
    pub fn with_dictionary(dict: Arc<MessageGroups>) -> Self {
        let mut msg = Self::new();
        msg.dict = Some(dict);
        msg
    }

    /// Attaches or replaces the group dictionary. Any existing group index
    /// is discarded.
    pub fn set_dictionary(&mut self, dict: Arc<MessageGroups>) {
        self.dict = Some(dict);
        self.groups = None;
    }

    /// The underlying indexed storage.
    #[must_use]
    pub fn storage(&self) -> &IndexedStorage {
        &self.storage
    }

    /// Mutable access to the underlying storage, used by the wire codec.
    pub fn storage_mut(&mut self) -> &mut IndexedStorage {
        &mut self.storage
    }

    /// Number of fields in the message.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.storage.field_count()
    }

    /// Returns true if the message has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    // ---- lifecycle -------------------------------------------------------

    /// Removes every field and invalidates the group index. The message is
    /// afterwards indistinguishable from a freshly created one.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.skip_tags.clear();
        if let Some(groups) = self.groups.as_mut() {
            groups.invalidate();
        }
    }

    /// Copies every original-buffer value into owned arena storage and
    /// releases the received buffer.
    pub fn make_standalone(&mut self) {
        self.storage.make_standalone();
    }

    /// Returns true if no field still references externally received bytes.
    #[must_use]
    pub fn is_standalone(&self) -> bool {
        !self.storage.has_original()
    }

    /// Hands the received wire buffer to this message. The parser commits
    /// field ranges against it.
    pub fn attach_original(&mut self, buffer: BytesMut) {
        self.storage.attach_original(buffer);
    }

    /// Marks the message prepared: untouched original-buffer fields may be
    /// re-emitted byte for byte at serialization.
    pub fn set_prepared(&mut self, prepared: bool) {
        self.storage.set_prepared(prepared);
    }

    /// Returns true if the message is in the prepared state.
    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.storage.is_prepared()
    }

    /// Returns true if this instance was borrowed from a message pool.
    #[must_use]
    pub fn is_from_pool(&self) -> bool {
        self.from_pool
    }

    /// Flags pool provenance. Called by message pools on borrow.
    pub fn set_from_pool(&mut self, from_pool: bool) {
        self.from_pool = from_pool;
    }

    /// Returns true if ownership has passed to user code, which keeps a
    /// pool from reclaiming the instance on release.
    #[must_use]
    pub fn is_user_owned(&self) -> bool {
        self.user_owned
    }

    /// Transfers or revokes user ownership.
    pub fn set_user_owned(&mut self, user_owned: bool) {
        self.user_owned = user_owned;
    }

    // ---- untyped access --------------------------------------------------

    /// Value bytes of the first occurrence of `tag`, or `None` if absent.
    #[must_use]
    pub fn get_bytes(&self, tag: u32) -> Option<&[u8]> {
        self.storage.get(tag)
    }

    /// Value bytes of the 1-based `occurrence`-th occurrence of `tag`.
    #[must_use]
    pub fn get_bytes_occurrence(&self, tag: u32, occurrence: usize) -> Option<&[u8]> {
        self.storage.get_occurrence(tag, occurrence)
    }

    /// Value of `tag` as UTF-8, or `None` if absent or not valid UTF-8.
    #[must_use]
    pub fn get_str(&self, tag: u32) -> Option<&str> {
        std::str::from_utf8(self.storage.get(tag)?).ok()
    }

    /// Number of occurrences of `tag`.
    #[must_use]
    pub fn occurrences(&self, tag: u32) -> usize {
        self.storage.occurrences(tag)
    }

    /// Flat position of the first occurrence of `tag`.
    #[must_use]
    pub fn position_of(&self, tag: u32) -> Option<usize> {
        self.storage.position_of(tag)
    }

    /// A detached read-only view of `tag`'s value. The bytes are copied,
    /// so the view survives later mutation of the message.
    #[must_use]
    pub fn view(&self, tag: u32) -> Option<TagValue> {
        let bytes = self.storage.get(tag)?;
        let buffer = Bytes::copy_from_slice(bytes);
        let len = buffer.len();
        Some(TagValue::new(tag, buffer, 0, len).into_read_only())
    }

    /// BeginString (tag 8), if present.
    #[must_use]
    pub fn begin_string(&self) -> Option<&str> {
        self.get_str(tags::BEGIN_STRING)
    }

    /// MsgType (tag 35), if present.
    #[must_use]
    pub fn msg_type(&self) -> Option<&str> {
        self.get_str(tags::MSG_TYPE)
    }

    // ---- typed getters ---------------------------------------------------

    /// Decodes `tag` as a signed integer.
    ///
    /// # Errors
    /// [`FieldError::NotFound`] if absent, [`FieldError::Invalid`] if the
    /// bytes do not decode.
    pub fn get_int(&self, tag: u32) -> Result<i64, FieldError> {
        let bytes = self.require(tag)?;
        parse_int(bytes).map_err(|source| FieldError::Invalid { tag, source })
    }

    /// Decodes `tag` as an unsigned integer.
    ///
    /// # Errors
    /// See [`FixMessage::get_int`].
    pub fn get_uint(&self, tag: u32) -> Result<u64, FieldError> {
        let bytes = self.require(tag)?;
        parse_uint(bytes).map_err(|source| FieldError::Invalid { tag, source })
    }

    /// Decodes `tag` as a decimal with preserved scale.
    ///
    /// # Errors
    /// See [`FixMessage::get_int`].
    pub fn get_decimal(&self, tag: u32) -> Result<Decimal, FieldError> {
        let bytes = self.require(tag)?;
        parse_decimal(bytes).map_err(|source| FieldError::Invalid { tag, source })
    }

    /// Decodes `tag` as a FIX boolean (`Y`/`N`).
    ///
    /// # Errors
    /// See [`FixMessage::get_int`].
    pub fn get_bool(&self, tag: u32) -> Result<bool, FieldError> {
        let bytes = self.require(tag)?;
        parse_bool(bytes).map_err(|source| FieldError::Invalid { tag, source })
    }

    /// Decodes `tag` as a single character.
    ///
    /// # Errors
    /// See [`FixMessage::get_int`].
    pub fn get_char(&self, tag: u32) -> Result<char, FieldError> {
        let bytes = self.require(tag)?;
        parse_char(bytes).map_err(|source| FieldError::Invalid { tag, source })
    }

    /// Decodes `tag` as a `YYYYMMDD` date.
    ///
    /// # Errors
    /// See [`FixMessage::get_int`].
    pub fn get_date(&self, tag: u32) -> Result<Date, FieldError> {
        let bytes = self.require(tag)?;
        Date::parse(bytes).map_err(|source| FieldError::Invalid { tag, source })
    }

    /// Decodes `tag` as a time-of-day value at any supported precision.
    ///
    /// # Errors
    /// See [`FixMessage::get_int`].
    pub fn get_time(&self, tag: u32) -> Result<TimeOnly, FieldError> {
        let bytes = self.require(tag)?;
        TimeOnly::parse(bytes).map_err(|source| FieldError::Invalid { tag, source })
    }

    /// Decodes `tag` as a UTC timestamp at any supported precision.
    ///
    /// # Errors
    /// See [`FixMessage::get_int`].
    pub fn get_timestamp(&self, tag: u32) -> Result<Timestamp, FieldError> {
        let bytes = self.require(tag)?;
        Timestamp::parse(bytes).map_err(|source| FieldError::Invalid { tag, source })
    }

    /// Decodes `tag` as a timezone-qualified time.
    ///
    /// # Errors
    /// See [`FixMessage::get_int`].
    pub fn get_zoned_time(&self, tag: u32) -> Result<ZonedTime, FieldError> {
        let bytes = self.require(tag)?;
        ZonedTime::parse(bytes).map_err(|source| FieldError::Invalid { tag, source })
    }

    /// Decodes `tag` as a timezone-qualified timestamp.
    ///
    /// # Errors
    /// See [`FixMessage::get_int`].
    pub fn get_zoned_timestamp(&self, tag: u32) -> Result<ZonedTimestamp, FieldError> {
        let bytes = self.require(tag)?;
        ZonedTimestamp::parse(bytes).map_err(|source| FieldError::Invalid { tag, source })
    }

    fn require(&self, tag: u32) -> Result<&[u8], FieldError> {
        self.storage.get(tag).ok_or(FieldError::NotFound { tag })
    }

    // ---- setters ---------------------------------------------------------

    /// Sets `tag` to raw bytes, updating the first occurrence in place
    /// where the storage rules allow and relocating otherwise.
    pub fn set_bytes(&mut self, tag: u32, value: &[u8]) {
        self.storage.set(tag, value);
    }

    /// Sets `tag` to a string value.
    pub fn set_str(&mut self, tag: u32, value: &str) {
        self.storage.set(tag, value.as_bytes());
    }

    /// Appends a new occurrence of `tag` at the end of the message.
    pub fn add_bytes(&mut self, tag: u32, value: &[u8]) {
        self.storage.add(tag, value);
    }

    /// Sets `tag` to a signed integer.
    pub fn set_int(&mut self, tag: u32, value: i64) {
        let mut buf = Vec::with_capacity(20);
        format_int(value, &mut buf);
        self.storage.set(tag, &buf);
    }

    /// Sets `tag` to an unsigned integer.
    pub fn set_uint(&mut self, tag: u32, value: u64) {
        let mut buf = Vec::with_capacity(20);
        format_uint(value, &mut buf);
        self.storage.set(tag, &buf);
    }

    /// Sets `tag` to a decimal, preserving its scale.
    pub fn set_decimal(&mut self, tag: u32, value: &Decimal) {
        let mut buf = Vec::with_capacity(32);
        format_decimal(value, &mut buf);
        self.storage.set(tag, &buf);
    }

    /// Sets `tag` to `Y` or `N`.
    pub fn set_bool(&mut self, tag: u32, value: bool) {
        self.storage.set(tag, format_bool(value));
    }

    /// Sets `tag` to a date.
    pub fn set_date(&mut self, tag: u32, value: &Date) {
        let mut buf = Vec::with_capacity(Date::WIRE_LEN);
        value.format(&mut buf);
        self.storage.set(tag, &buf);
    }

    /// Sets `tag` to a time of day.
    pub fn set_time(&mut self, tag: u32, value: &TimeOnly) {
        let mut buf = Vec::with_capacity(18);
        value.format(&mut buf);
        self.storage.set(tag, &buf);
    }

    /// Sets `tag` to a UTC timestamp.
    pub fn set_timestamp(&mut self, tag: u32, value: &Timestamp) {
        let mut buf = Vec::with_capacity(27);
        value.format(&mut buf);
        self.storage.set(tag, &buf);
    }

    /// Sets `tag` to a timezone-qualified time.
    pub fn set_zoned_time(&mut self, tag: u32, value: &ZonedTime) {
        let mut buf = Vec::with_capacity(24);
        value.format(&mut buf);
        self.storage.set(tag, &buf);
    }

    /// Sets `tag` to a timezone-qualified timestamp.
    pub fn set_zoned_timestamp(&mut self, tag: u32, value: &ZonedTimestamp) {
        let mut buf = Vec::with_capacity(33);
        value.format(&mut buf);
        self.storage.set(tag, &buf);
    }

    /// Removes the first occurrence of `tag`. Returns true if removed.
    pub fn remove(&mut self, tag: u32) -> bool {
        self.storage.remove(tag)
    }

    // ---- serialization hints --------------------------------------------

    /// Excludes `tag` from serialized output without removing it from the
    /// message.
    pub fn set_no_serialize(&mut self, tag: u32) {
        self.skip_tags.insert(tag);
    }

    /// Tags excluded from serialization.
    #[must_use]
    pub fn skip_tags(&self) -> &HashSet<u32> {
        &self.skip_tags
    }

    /// Wire length of the body: every field's `tag=value<SOH>` footprint
    /// excluding BeginString, BodyLength and CheckSum.
    #[must_use]
    pub fn body_length(&self) -> usize {
        self.storage
            .wire_length_excluding(&[tags::BEGIN_STRING, tags::BODY_LENGTH, tags::CHECKSUM])
    }

    /// Splits the flat field sequence into messages, starting a new one at
    /// each occurrence of `delimiter_tag`. Values are copied; the returned
    /// messages are standalone and share this message's dictionary.
    #[must_use]
    pub fn split(&self, delimiter_tag: u32) -> Vec<FixMessage> {
        let mut out = Vec::new();
        let mut current = self.fresh_like();
        for p in 0..self.storage.field_count() {
            let tag = self.storage.tag_at(p);
            if tag == delimiter_tag && !current.is_empty() {
                out.push(std::mem::replace(&mut current, self.fresh_like()));
            }
            current.storage.add(tag, self.storage.value_at(p));
        }
        if !current.is_empty() {
            out.push(current);
        }
        out
    }

    fn fresh_like(&self) -> FixMessage {
        match &self.dict {
            Some(dict) => FixMessage::with_dictionary(Arc::clone(dict)),
            None => FixMessage::new(),
        }
    }

    // ---- repeating groups ------------------------------------------------

    /// Builds (or rebuilds) the repeating-group index from the attached
    /// dictionary.
    ///
    /// # Errors
    /// [`GroupError::NotIndexed`] if no dictionary is attached; any
    /// dictionary violation in validation mode.
    pub fn index_groups(&mut self, validate: bool) -> Result<(), GroupError> {
        let dict = self.dict.clone().ok_or(GroupError::NotIndexed)?;
        let groups = self.groups.get_or_insert_with(|| GroupIndex::new(dict));
        groups.index(&self.storage, validate)
    }

    /// Handle of a declared top-level group.
    ///
    /// # Errors
    /// [`GroupError::NotIndexed`] before [`FixMessage::index_groups`].
    pub fn group(&self, leading_tag: u32) -> Result<u32, GroupError> {
        self.groups_ref()?.outer_group(leading_tag)
    }

    /// Handle of a group nested in `entry`.
    ///
    /// # Errors
    /// See [`GroupIndex::nested_group`].
    pub fn nested_group(&mut self, entry: u32, leading_tag: u32) -> Result<u32, GroupError> {
        self.groups_mut()?.nested_group(entry, leading_tag)
    }

    /// Number of entries in a group.
    ///
    /// # Errors
    /// [`GroupError::NotIndexed`] before indexing.
    pub fn group_entry_count(&self, group: u32) -> Result<usize, GroupError> {
        Ok(self.groups_ref()?.entry_count(group))
    }

    /// Handle of the `i`-th entry of a group.
    ///
    /// # Errors
    /// [`GroupError::NotIndexed`] before indexing.
    pub fn group_entry_at(&self, group: u32, i: usize) -> Result<Option<u32>, GroupError> {
        Ok(self.groups_ref()?.entry_at(group, i))
    }

    /// Appends one entry to a group, materializing a hidden leading tag.
    ///
    /// # Errors
    /// See [`GroupIndex::add_entry`].
    pub fn add_group_entry(&mut self, group: u32) -> Result<u32, GroupError> {
        let groups = self.groups.as_mut().ok_or(GroupError::NotIndexed)?;
        groups.add_entry(&mut self.storage, group)
    }

    /// Sets or updates `tag` within a group entry.
    ///
    /// # Errors
    /// See [`GroupIndex::set_in_entry`].
    pub fn set_in_entry(&mut self, entry: u32, tag: u32, value: &[u8]) -> Result<(), GroupError> {
        let groups = self.groups.as_mut().ok_or(GroupError::NotIndexed)?;
        groups.set_in_entry(&mut self.storage, entry, tag, value)
    }

    /// Value bytes of `tag` within a group entry.
    #[must_use]
    pub fn get_bytes_in_entry(&self, entry: u32, tag: u32) -> Option<&[u8]> {
        let groups = self.groups.as_ref()?;
        let pos = groups.position_in_entry(&self.storage, entry, tag)?;
        Some(self.storage.value_at(pos))
    }

    /// Removes `tag` from a group entry.
    ///
    /// # Errors
    /// See [`GroupIndex::remove_in_entry`].
    pub fn remove_in_entry(&mut self, entry: u32, tag: u32) -> Result<bool, GroupError> {
        let groups = self.groups.as_mut().ok_or(GroupError::NotIndexed)?;
        groups.remove_in_entry(&mut self.storage, entry, tag)
    }

    /// Removes one group entry and everything it covers.
    ///
    /// # Errors
    /// See [`GroupIndex::remove_entry`].
    pub fn remove_group_entry(&mut self, entry: u32) -> Result<(), GroupError> {
        let groups = self.groups.as_mut().ok_or(GroupError::NotIndexed)?;
        groups.remove_entry(&mut self.storage, entry)
    }

    /// Removes every entry of a group, hiding its leading tag.
    ///
    /// # Errors
    /// See [`GroupIndex::remove_group`].
    pub fn remove_group(&mut self, group: u32) -> Result<(), GroupError> {
        let groups = self.groups.as_mut().ok_or(GroupError::NotIndexed)?;
        groups.remove_group(&mut self.storage, group)
    }

    fn groups_ref(&self) -> Result<&GroupIndex, GroupError> {
        self.groups.as_ref().ok_or(GroupError::NotIndexed)
    }

    fn groups_mut(&mut self) -> Result<&mut GroupIndex, GroupError> {
        self.groups.as_mut().ok_or(GroupError::NotIndexed)
    }
}

impl Default for FixMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for FixMessage {
    /// Deep copy. The clone never aliases the source's buffers, is never
    /// pool-owned, and always starts user-owned.
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            dict: self.dict.clone(),
            groups: self.groups.clone(),
            skip_tags: self.skip_tags.clone(),
            from_pool: false,
            user_owned: true,
        }
    }
}

impl Poolable for FixMessage {
    fn reset(&mut self) {
        self.clear();
        self.user_owned = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatfix_core::error::FormatError;
    use flatfix_core::{Precision, TzOffset};
    use flatfix_dictionary::GroupInfo;

    fn order_dict() -> Arc<MessageGroups> {
        let groups = vec![GroupInfo::new(73, 11).with_child(38)];
        Arc::new(MessageGroups::build("FIX.4.4", "E", &groups).unwrap())
    }

    #[test]
    fn test_bytes_and_str_return_option() {
        let mut msg = FixMessage::new();
        msg.set_str(55, "EURUSD");
        assert_eq!(msg.get_str(55), Some("EURUSD"));
        assert_eq!(msg.get_bytes(55), Some(&b"EURUSD"[..]));
        assert_eq!(msg.get_str(56), None);
        assert_eq!(msg.get_bytes(56), None);
    }

    #[test]
    fn test_typed_getters_return_result() {
        let mut msg = FixMessage::new();
        msg.set_int(34, 42);
        assert_eq!(msg.get_int(34), Ok(42));
        assert_eq!(msg.get_int(9), Err(FieldError::NotFound { tag: 9 }));

        msg.set_str(34, "forty-two");
        assert_eq!(
            msg.get_int(34),
            Err(FieldError::Invalid {
                tag: 34,
                source: FormatError::InvalidInt,
            })
        );
    }

    #[test]
    fn test_scalar_round_trips() {
        let mut msg = FixMessage::new();
        msg.set_uint(38, 1_000_000);
        msg.set_bool(43, true);
        msg.set_decimal(44, &"1.2500".parse().unwrap());

        assert_eq!(msg.get_uint(38), Ok(1_000_000));
        assert_eq!(msg.get_bool(43), Ok(true));
        assert_eq!(msg.get_bytes(43), Some(&b"Y"[..]));
        // Scale preserved: four decimal places survive the round trip.
        assert_eq!(msg.get_bytes(44), Some(&b"1.2500"[..]));
        assert_eq!(msg.get_decimal(44), Ok("1.2500".parse().unwrap()));
    }

    #[test]
    fn test_calendar_round_trips() {
        let mut msg = FixMessage::new();
        let ts = Timestamp::parse(b"20260315-12:30:45.123").unwrap();
        msg.set_timestamp(52, &ts);
        assert_eq!(msg.get_bytes(52), Some(&b"20260315-12:30:45.123"[..]));
        assert_eq!(msg.get_timestamp(52), Ok(ts));

        let zt = ZonedTime::parse(b"07:39:20-05:00").unwrap();
        msg.set_zoned_time(1079, &zt);
        assert_eq!(msg.get_bytes(1079), Some(&b"07:39:20-05:00"[..]));
        let decoded = msg.get_zoned_time(1079).unwrap();
        assert_eq!(
            decoded.offset(),
            TzOffset::HoursMinutes {
                negative: true,
                hours: 5,
                minutes: 0
            }
        );
        assert_eq!(decoded.time().precision(), Precision::Second);
    }

    #[test]
    fn test_clear_is_indistinguishable_from_fresh() {
        let mut msg = FixMessage::new();
        msg.set_str(35, "D");
        msg.set_no_serialize(35);
        msg.clear();

        assert!(msg.is_empty());
        assert!(msg.skip_tags().is_empty());
        assert_eq!(msg.get_str(35), None);

        msg.set_str(35, "A");
        let fresh = {
            let mut m = FixMessage::new();
            m.set_str(35, "A");
            m
        };
        assert_eq!(msg.field_count(), fresh.field_count());
        assert_eq!(msg.get_str(35), fresh.get_str(35));
    }

    #[test]
    fn test_body_length_excludes_session_tags() {
        let mut msg = FixMessage::new();
        msg.add_bytes(8, b"FIX.4.2");
        msg.add_bytes(9, b"5");
        msg.add_bytes(35, b"A");
        msg.add_bytes(10, b"000");
        // Only "35=A<SOH>" counts.
        assert_eq!(msg.body_length(), 5);
    }

    #[test]
    fn test_view_is_detached() {
        let mut msg = FixMessage::new();
        msg.set_str(58, "Hello");
        let view = msg.view(58).unwrap();
        msg.set_str(58, "Changed");
        assert_eq!(view.as_bytes(), b"Hello");
        assert!(view.is_read_only());
        assert!(msg.view(59).is_none());
    }

    #[test]
    fn test_split_on_delimiter_tag() {
        let mut msg = FixMessage::new();
        msg.add_bytes(8, b"FIX.4.4");
        msg.add_bytes(35, b"A");
        msg.add_bytes(8, b"FIX.4.4");
        msg.add_bytes(35, b"D");
        msg.add_bytes(55, b"EURUSD");

        let parts = msg.split(8);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].msg_type(), Some("A"));
        assert_eq!(parts[1].msg_type(), Some("D"));
        assert_eq!(parts[1].get_str(55), Some("EURUSD"));
        assert!(parts.iter().all(FixMessage::is_standalone));
    }

    #[test]
    fn test_group_round_trip_via_facade() {
        let mut msg = FixMessage::with_dictionary(order_dict());
        msg.set_str(35, "E");
        msg.index_groups(true).unwrap();

        let g = msg.group(73).unwrap();
        let e = msg.add_group_entry(g).unwrap();
        msg.set_in_entry(e, 11, b"ORD-1").unwrap();
        msg.set_in_entry(e, 38, b"100").unwrap();

        assert_eq!(msg.group_entry_count(g), Ok(1));
        assert_eq!(msg.get_bytes_in_entry(e, 38), Some(&b"100"[..]));
        assert_eq!(msg.get_uint(73), Ok(1));

        msg.remove_group_entry(e).unwrap();
        assert_eq!(msg.get_bytes(73), None);
    }

    #[test]
    fn test_group_ops_require_index() {
        let mut msg = FixMessage::new();
        assert_eq!(msg.group(73), Err(GroupError::NotIndexed));
        assert_eq!(msg.index_groups(true), Err(GroupError::NotIndexed));
        assert_eq!(
            msg.set_in_entry(0, 11, b"x"),
            Err(GroupError::NotIndexed)
        );
    }

    #[test]
    fn test_clone_is_deep_and_user_owned() {
        let mut msg = FixMessage::new();
        msg.set_from_pool(true);
        msg.set_user_owned(false);
        msg.set_str(55, "EURUSD");

        let mut copy = msg.clone();
        assert!(!copy.is_from_pool());
        assert!(copy.is_user_owned());
        copy.set_str(55, "GBPUSD");
        assert_eq!(msg.get_str(55), Some("EURUSD"));
        assert_eq!(copy.get_str(55), Some("GBPUSD"));
    }

    #[test]
    fn test_poolable_reset() {
        let mut msg = FixMessage::new();
        msg.set_str(55, "EURUSD");
        msg.set_user_owned(true);
        msg.reset();
        assert!(msg.is_empty());
        assert!(!msg.is_user_owned());
    }
}
