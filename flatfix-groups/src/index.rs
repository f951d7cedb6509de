/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! The repeating-group index: a dictionary-driven view over the flat tag
//! sequence of one message.
//!
//! Indexing walks the flat sequence once, opening a group whenever a
//! declared leading tag is met, requiring the declared delimiter tag to
//! start every entry, and descending recursively into nested groups. The
//! resulting records support group mutations that keep four structures
//! consistent: the flat Field-Index, the entry records, the group records,
//! and the hidden state of groups at zero entries.
//!
//! Every mutation that inserts or removes one flat position runs a single
//! shift-propagation pass over all records. Each stored position lives in
//! exactly one record field, so one pass suffices; the only ambiguity is an
//! insertion at a position where one entry ends and another begins, which
//! is resolved by walking the receiving entry's parent chain.

use std::sync::Arc;

use tracing::debug;

use flatfix_core::GroupError;
use flatfix_core::scalar::{format_uint, parse_uint};
use flatfix_pool::ScratchPool;
use flatfix_storage::IndexedStorage;

use flatfix_dictionary::MessageGroups;

use crate::records::{Child, EntryRecord, GroupRecord};

/// Lifecycle of a [`GroupIndex`] for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// No indexing pass has run yet.
    Uninitialized,
    /// Records reflect the message; group operations are available.
    Indexed,
    /// The message was cleared or a pass failed; records are stale and a
    /// new indexing pass is required.
    Invalidated,
}

/// Dictionary-driven repeating-group index over one message's flat fields.
///
/// Group and entry handles returned by this type stay valid until the
/// entry or group they name is removed, or until the index is invalidated.
/// Operating on a removed handle is a caller error.
#[derive(Debug, Clone)]
pub struct GroupIndex {
    dict: Arc<MessageGroups>,
    state: IndexState,
    validate: bool,
    groups: Vec<GroupRecord>,
    entries: Vec<EntryRecord>,
}

impl GroupIndex {
    /// Creates an uninitialized index bound to one message type's
    /// dictionary view.
    #[must_use]
    pub fn new(dict: Arc<MessageGroups>) -> Self {
        Self {
            dict,
            state: IndexState::Uninitialized,
            validate: false,
            groups: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// The dictionary view this index consults.
    #[must_use]
    pub fn dict(&self) -> &Arc<MessageGroups> {
        &self.dict
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> IndexState {
        self.state
    }

    /// Returns true if group operations are currently available.
    #[inline]
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        self.state == IndexState::Indexed
    }

    /// Marks the records stale. Called on message clear or release; the
    /// index must be rebuilt with [`GroupIndex::index`] before reuse.
    pub fn invalidate(&mut self) {
        self.state = IndexState::Invalidated;
    }

    /// Runs the one-time indexing scan over the message's flat fields.
    ///
    /// With `validate` set, dictionary violations abort the scan; without
    /// it the scan is best-effort and malformed group regions are left as
    /// plain fields. `validate` also governs later mutations on this index.
    ///
    /// # Errors
    /// Any [`GroupError`] dictionary violation, validation mode only. On
    /// error the index is left invalidated and the message should be
    /// discarded.
    pub fn index(&mut self, storage: &IndexedStorage, validate: bool) -> Result<(), GroupError> {
        if self.state == IndexState::Indexed {
            debug!(
                msg_type = self.dict.msg_type(),
                "re-indexing repeating groups over a live index"
            );
        }
        self.groups.clear();
        self.entries.clear();
        self.validate = validate;
        self.state = IndexState::Invalidated;

        let len = storage.field_count();
        let mut p = 0;
        while p < len {
            let tag = storage.tag_at(p);
            if self.dict.outer_leading_tags().contains(&tag) {
                if validate
                    && self
                        .scope_record(None, tag)
                        .is_some_and(|h| self.groups[h as usize].leading_pos.is_some())
                {
                    return Err(GroupError::DuplicateLeadingTag {
                        tag,
                        begin_string: self.bs(),
                        msg_type: self.mt(),
                    });
                }
                p = self.consume_group(storage, p, tag, None)?;
            } else if validate && self.dict.is_group_tag(tag) {
                return Err(GroupError::TagOutsideGroup {
                    tag,
                    begin_string: self.bs(),
                    msg_type: self.mt(),
                });
            } else {
                p += 1;
            }
        }

        // Declared outer groups absent from the wire become hidden records
        // so they can be grown later.
        for i in 0..self.dict.outer_leading_tags().len() {
            let lt = self.dict.outer_leading_tags()[i];
            if self.scope_record(None, lt).is_none() {
                self.groups.push(GroupRecord::hidden(lt, None));
            }
        }
        self.state = IndexState::Indexed;
        Ok(())
    }

    /// Consumes one group starting at the leading tag position `p`.
    /// Returns the position after the group's last consumed field.
    fn consume_group(
        &mut self,
        storage: &IndexedStorage,
        p: usize,
        leading_tag: u32,
        parent_entry: Option<u32>,
    ) -> Result<usize, GroupError> {
        let delim = self
            .dict
            .delimiter_of(leading_tag)
            .expect("leading tag is declared");
        let Ok(count) = parse_uint(storage.value_at(p)) else {
            if self.validate {
                return Err(GroupError::InvalidGroupCount {
                    tag: leading_tag,
                    begin_string: self.bs(),
                    msg_type: self.mt(),
                });
            }
            // Best effort: leave the unparsable leading tag as a plain field.
            return Ok(p + 1);
        };

        let gh = self.groups.len() as u32;
        self.groups.push(GroupRecord {
            leading_tag,
            leading_pos: Some(p as u32),
            entries: Vec::new(),
            parent_entry,
        });
        if let Some(pe) = parent_entry {
            self.entries[pe as usize].children.push(Child::Group(gh));
        }

        let len = storage.field_count();
        let mut p = p + 1;
        for _ in 0..count {
            let found = if p < len { storage.tag_at(p) } else { 0 };
            if found != delim {
                if self.validate {
                    return Err(GroupError::DelimiterMismatch {
                        leading_tag,
                        expected: delim,
                        found,
                        begin_string: self.bs(),
                        msg_type: self.mt(),
                    });
                }
                // Best effort: the group ends short of its declared count.
                break;
            }

            let eh = self.entries.len() as u32;
            self.entries.push(EntryRecord {
                group: gh,
                children: Vec::new(),
                end: p as u32,
            });
            self.groups[gh as usize].entries.push(eh);

            let mut first = true;
            while p < len {
                let t = storage.tag_at(p);
                if t == delim && !first {
                    break;
                }
                if t != delim && !self.dict.is_child_of(leading_tag, t) {
                    break;
                }
                if t != delim && self.dict.is_leading_tag(t) {
                    if self.validate
                        && self
                            .scope_record(Some(eh), t)
                            .is_some_and(|h| self.groups[h as usize].leading_pos.is_some())
                    {
                        return Err(GroupError::DuplicateLeadingTag {
                            tag: t,
                            begin_string: self.bs(),
                            msg_type: self.mt(),
                        });
                    }
                    p = self.consume_group(storage, p, t, Some(eh))?;
                } else {
                    self.entries[eh as usize].children.push(Child::Tag(p as u32));
                    p += 1;
                }
                first = false;
            }
            self.entries[eh as usize].end = p as u32;
        }
        Ok(p)
    }

    /// Handle of a declared top-level group, materialized or hidden.
    ///
    /// # Errors
    /// [`GroupError::NotIndexed`] before indexing;
    /// [`GroupError::TagOutsideGroup`] if `leading_tag` is not a declared
    /// top-level leading tag for this message type.
    pub fn outer_group(&self, leading_tag: u32) -> Result<u32, GroupError> {
        self.check_indexed()?;
        self.scope_record(None, leading_tag)
            .ok_or_else(|| GroupError::TagOutsideGroup {
                tag: leading_tag,
                begin_string: self.bs(),
                msg_type: self.mt(),
            })
    }

    /// Handle of a group nested in `entry`, creating a hidden record on
    /// first use.
    ///
    /// # Errors
    /// [`GroupError::NotIndexed`] before indexing;
    /// [`GroupError::UndeclaredChildTag`] if the entry's group does not
    /// declare `leading_tag` as a nested group.
    pub fn nested_group(&mut self, entry: u32, leading_tag: u32) -> Result<u32, GroupError> {
        self.check_indexed()?;
        let parent_leading = self.groups[self.entries[entry as usize].group as usize].leading_tag;
        if !self.dict.nested_of(parent_leading).contains(&leading_tag) {
            return Err(GroupError::UndeclaredChildTag {
                tag: leading_tag,
                leading_tag: parent_leading,
                begin_string: self.bs(),
                msg_type: self.mt(),
            });
        }
        if let Some(h) = self.scope_record(Some(entry), leading_tag) {
            return Ok(h);
        }
        let h = self.groups.len() as u32;
        self.groups.push(GroupRecord::hidden(leading_tag, Some(entry)));
        Ok(h)
    }

    /// Number of live entries in a group.
    #[must_use]
    pub fn entry_count(&self, group: u32) -> usize {
        self.groups[group as usize].entries.len()
    }

    /// Handle of the `i`-th entry (0-based, wire order) of a group.
    #[must_use]
    pub fn entry_at(&self, group: u32, i: usize) -> Option<u32> {
        self.groups[group as usize].entries.get(i).copied()
    }

    /// Returns true if the group currently has no wire presence.
    #[must_use]
    pub fn is_hidden(&self, group: u32) -> bool {
        self.groups[group as usize].leading_pos.is_none()
    }

    /// Flat position of the group's leading tag, if materialized.
    #[must_use]
    pub fn leading_pos(&self, group: u32) -> Option<usize> {
        self.groups[group as usize].leading_pos.map(|p| p as usize)
    }

    /// Flat position of `tag` within `entry`, nested groups excluded.
    #[must_use]
    pub fn position_in_entry(
        &self,
        storage: &IndexedStorage,
        entry: u32,
        tag: u32,
    ) -> Option<usize> {
        self.entries[entry as usize]
            .children
            .iter()
            .find_map(|c| match c {
                Child::Tag(pos) if storage.tag_at(*pos as usize) == tag => Some(*pos as usize),
                _ => None,
            })
    }

    /// Appends one entry to a group, materializing the leading tag first
    /// if the group was hidden. The leading tag's stored value is kept
    /// equal to the live entry count. The new entry starts empty.
    ///
    /// # Errors
    /// [`GroupError::NotIndexed`] before indexing.
    pub fn add_entry(&mut self, storage: &mut IndexedStorage, group: u32) -> Result<u32, GroupError> {
        self.check_indexed()?;
        let leading_tag = self.groups[group as usize].leading_tag;
        if self.groups[group as usize].leading_pos.is_none() {
            let p = self.materialize_pos(storage, group);
            storage.insert_at(p as usize, leading_tag, b"0");
            let container = self.groups[group as usize].parent_entry;
            self.shift_insert(p, container);
            self.groups[group as usize].leading_pos = Some(p);
            if let Some(pe) = container {
                self.splice_group_link(pe, group);
            }
        }

        let insert_at = match self.groups[group as usize].entries.last() {
            Some(&last) => self.entries[last as usize].end,
            None => self.groups[group as usize].leading_pos.expect("materialized") + 1,
        };
        let eh = self.entries.len() as u32;
        self.entries.push(EntryRecord {
            group,
            children: Vec::new(),
            end: insert_at,
        });
        self.groups[group as usize].entries.push(eh);

        let count = self.groups[group as usize].entries.len();
        let lp = self.groups[group as usize].leading_pos.expect("materialized");
        self.write_count(storage, lp, count);
        Ok(eh)
    }

    /// Sets `tag` in `entry`: updates the value in place if the tag is
    /// already present, otherwise inserts it. The delimiter tag is placed
    /// first in the entry; other tags go after existing plain tags and
    /// before any nested groups. Nested leading tags are rejected; grow
    /// nested groups through [`GroupIndex::nested_group`] and
    /// [`GroupIndex::add_entry`].
    ///
    /// # Errors
    /// [`GroupError::NotIndexed`] before indexing;
    /// [`GroupError::UndeclaredChildTag`] for a nested leading tag, or in
    /// validation mode for any tag not declared for the entry's group.
    pub fn set_in_entry(
        &mut self,
        storage: &mut IndexedStorage,
        entry: u32,
        tag: u32,
        value: &[u8],
    ) -> Result<(), GroupError> {
        self.check_indexed()?;
        if let Some(pos) = self.position_in_entry(storage, entry, tag) {
            storage.update_at(pos, value);
            return Ok(());
        }
        let leading_tag = self.groups[self.entries[entry as usize].group as usize].leading_tag;
        let undeclared = || GroupError::UndeclaredChildTag {
            tag,
            leading_tag,
            begin_string: self.bs(),
            msg_type: self.mt(),
        };
        if self.dict.is_leading_tag(tag) {
            return Err(undeclared());
        }
        if self.validate && !self.dict.is_child_of(leading_tag, tag) {
            return Err(undeclared());
        }

        let delim = self.dict.delimiter_of(leading_tag).expect("declared group");
        let (p, ci) = if tag == delim {
            (self.entry_start(entry), 0)
        } else {
            let rec = &self.entries[entry as usize];
            let mut p = rec.end;
            let mut ci = rec.children.len();
            for (i, c) in rec.children.iter().enumerate() {
                if let Child::Group(h) = c {
                    p = self.groups[*h as usize]
                        .leading_pos
                        .expect("linked groups are materialized");
                    ci = i;
                    break;
                }
            }
            (p, ci)
        };
        storage.insert_at(p as usize, tag, value);
        self.shift_insert(p, Some(entry));
        self.entries[entry as usize].children.insert(ci, Child::Tag(p));
        Ok(())
    }

    /// Removes `tag` from `entry` if present. Removing the last field of
    /// an entry removes the entry itself, cascading exactly like
    /// [`GroupIndex::remove_entry`].
    ///
    /// # Errors
    /// [`GroupError::NotIndexed`] before indexing.
    pub fn remove_in_entry(
        &mut self,
        storage: &mut IndexedStorage,
        entry: u32,
        tag: u32,
    ) -> Result<bool, GroupError> {
        self.check_indexed()?;
        let Some(pos) = self.position_in_entry(storage, entry, tag) else {
            return Ok(false);
        };
        storage.remove_at(pos);
        self.shift_remove(pos as u32);
        let children = &mut self.entries[entry as usize].children;
        children.retain(|c| !matches!(c, Child::Tag(p) if *p as usize == pos));
        if self.entries[entry as usize].children.is_empty() {
            self.drop_entry(storage, entry);
        }
        Ok(true)
    }

    /// Removes one entry and everything it covers, nested groups included.
    /// Decrements the group count, hiding the leading tag when the count
    /// reaches zero; if that empties the entry of a parent group, the
    /// parent entry is removed recursively.
    ///
    /// # Errors
    /// [`GroupError::NotIndexed`] before indexing.
    pub fn remove_entry(&mut self, storage: &mut IndexedStorage, entry: u32) -> Result<(), GroupError> {
        self.check_indexed()?;
        let mut scratch = ScratchPool::global().borrow();
        self.collect_positions(entry, &mut scratch);
        scratch.sort_unstable();
        for &pos in scratch.iter().rev() {
            storage.remove_at(pos as usize);
            self.shift_remove(pos as u32);
        }
        self.detach_subtree(entry);
        self.entries[entry as usize].children.clear();
        self.drop_entry(storage, entry);
        Ok(())
    }

    /// Removes every entry of a group, leaving it hidden.
    ///
    /// # Errors
    /// [`GroupError::NotIndexed`] before indexing.
    pub fn remove_group(&mut self, storage: &mut IndexedStorage, group: u32) -> Result<(), GroupError> {
        self.check_indexed()?;
        while let Some(&last) = self.groups[group as usize].entries.last() {
            self.remove_entry(storage, last)?;
        }
        // A group parsed with an explicit zero count still carries its
        // leading tag; removal hides that too.
        if let Some(lp) = self.groups[group as usize].leading_pos {
            storage.remove_at(lp as usize);
            self.groups[group as usize].leading_pos = None;
            self.shift_remove(lp);
        }
        Ok(())
    }

    fn check_indexed(&self) -> Result<(), GroupError> {
        if self.state == IndexState::Indexed {
            Ok(())
        } else {
            Err(GroupError::NotIndexed)
        }
    }

    fn bs(&self) -> String {
        self.dict.begin_string().to_string()
    }

    fn mt(&self) -> String {
        self.dict.msg_type().to_string()
    }

    /// Record handle for `leading_tag` directly under `parent` (an entry,
    /// or `None` for top level).
    fn scope_record(&self, parent: Option<u32>, leading_tag: u32) -> Option<u32> {
        (0..self.groups.len() as u32).find(|&h| {
            let g = &self.groups[h as usize];
            g.leading_tag == leading_tag && g.parent_entry == parent
        })
    }

    /// Flat position of the first field covered by an entry, or its
    /// insertion point while empty.
    fn entry_start(&self, entry: u32) -> u32 {
        let rec = &self.entries[entry as usize];
        match rec.children.first() {
            Some(Child::Tag(pos)) => *pos,
            Some(Child::Group(h)) => self.groups[*h as usize]
                .leading_pos
                .expect("linked groups are materialized"),
            None => rec.end,
        }
    }

    /// Flat position one past a materialized group's last covered field.
    fn extent_end(&self, group: u32) -> u32 {
        let g = &self.groups[group as usize];
        match g.entries.last() {
            Some(&last) => self.entries[last as usize].end,
            None => g.leading_pos.expect("materialized") + 1,
        }
    }

    /// Where a hidden group's leading tag goes when it gains its first
    /// entry: after the nearest preceding materialized sibling, else
    /// before the nearest following one, else at the scope's natural end
    /// (the parent entry's end, or just before the checksum field for a
    /// top-level group).
    fn materialize_pos(&self, storage: &IndexedStorage, group: u32) -> u32 {
        let g = &self.groups[group as usize];
        let parent = g.parent_entry;
        let siblings: Vec<u32> = match parent {
            Some(pe) => {
                let parent_leading =
                    self.groups[self.entries[pe as usize].group as usize].leading_tag;
                self.dict.nested_of(parent_leading).to_vec()
            }
            None => self.dict.outer_leading_tags().to_vec(),
        };
        let my_idx = siblings
            .iter()
            .position(|&t| t == g.leading_tag)
            .expect("group is declared in its scope");

        for &s in siblings[..my_idx].iter().rev() {
            if let Some(h) = self.scope_record(parent, s) {
                if self.groups[h as usize].leading_pos.is_some() {
                    return self.extent_end(h);
                }
            }
        }
        for &s in &siblings[my_idx + 1..] {
            if let Some(h) = self.scope_record(parent, s) {
                if let Some(lp) = self.groups[h as usize].leading_pos {
                    return lp;
                }
            }
        }
        match parent {
            Some(pe) => self.entries[pe as usize].end,
            None => storage
                .position_of(10)
                .unwrap_or(storage.field_count()) as u32,
        }
    }

    /// Splices the nested-group link for `group` into its parent entry's
    /// children, after all plain tags and in declared order among sibling
    /// groups.
    fn splice_group_link(&mut self, parent_entry: u32, group: u32) {
        let parent_leading =
            self.groups[self.entries[parent_entry as usize].group as usize].leading_tag;
        let declared = self.dict.nested_of(parent_leading);
        let my_idx = declared
            .iter()
            .position(|&t| t == self.groups[group as usize].leading_tag)
            .expect("group is declared in its scope");

        let children = &self.entries[parent_entry as usize].children;
        let mut at = children.len();
        for (i, c) in children.iter().enumerate() {
            if let Child::Group(h) = c {
                let idx = declared
                    .iter()
                    .position(|&t| t == self.groups[*h as usize].leading_tag)
                    .expect("linked group is declared");
                if idx > my_idx {
                    at = i;
                    break;
                }
            }
        }
        self.entries[parent_entry as usize]
            .children
            .insert(at, Child::Group(group));
    }

    /// Rewrites the leading tag's stored value to the live entry count.
    fn write_count(&self, storage: &mut IndexedStorage, leading_pos: u32, count: usize) {
        let mut buf = Vec::with_capacity(12);
        format_uint(count as u64, &mut buf);
        storage.update_at(leading_pos as usize, &buf);
    }

    /// Collects every flat position covered by an entry, nested group
    /// contents and leading tags included.
    fn collect_positions(&self, entry: u32, out: &mut Vec<i32>) {
        for c in &self.entries[entry as usize].children {
            match c {
                Child::Tag(pos) => out.push(*pos as i32),
                Child::Group(h) => {
                    if let Some(lp) = self.groups[*h as usize].leading_pos {
                        out.push(lp as i32);
                    }
                    for &e in &self.groups[*h as usize].entries {
                        self.collect_positions(e, out);
                    }
                }
            }
        }
    }

    /// Marks all records under an entry dead after their positions have
    /// been removed from storage.
    fn detach_subtree(&mut self, entry: u32) {
        let children = self.entries[entry as usize].children.clone();
        for c in children {
            if let Child::Group(h) = c {
                let nested = self.groups[h as usize].entries.clone();
                for e in nested {
                    self.detach_subtree(e);
                    self.entries[e as usize].children.clear();
                }
                self.groups[h as usize].entries.clear();
                self.groups[h as usize].leading_pos = None;
            }
        }
    }

    /// Unlinks a content-empty entry from its group and updates the count,
    /// hiding the leading tag at zero and cascading to a parent entry that
    /// becomes empty in turn.
    fn drop_entry(&mut self, storage: &mut IndexedStorage, entry: u32) {
        let group = self.entries[entry as usize].group;
        self.groups[group as usize].entries.retain(|&e| e != entry);
        let count = self.groups[group as usize].entries.len();
        if count > 0 {
            let lp = self.groups[group as usize].leading_pos.expect("materialized");
            self.write_count(storage, lp, count);
            return;
        }
        if let Some(lp) = self.groups[group as usize].leading_pos {
            storage.remove_at(lp as usize);
            self.groups[group as usize].leading_pos = None;
            self.shift_remove(lp);
        }
        if let Some(pe) = self.groups[group as usize].parent_entry {
            self.entries[pe as usize]
                .children
                .retain(|c| !matches!(c, Child::Group(h) if *h == group));
            if self.entries[pe as usize].children.is_empty() {
                self.drop_entry(storage, pe);
            }
        }
    }

    /// Shifts every stored flat position `>= p` up by one after an insert
    /// at `p`. An entry ending exactly at `p` grows only if it is the
    /// receiving entry or one of its ancestors.
    fn shift_insert(&mut self, p: u32, container: Option<u32>) {
        for g in &mut self.groups {
            if let Some(lp) = g.leading_pos.as_mut() {
                if *lp >= p {
                    *lp += 1;
                }
            }
        }
        for e in &mut self.entries {
            for c in &mut e.children {
                if let Child::Tag(pos) = c {
                    if *pos >= p {
                        *pos += 1;
                    }
                }
            }
            if e.end > p {
                e.end += 1;
            }
        }
        let mut cursor = container;
        while let Some(e) = cursor {
            if self.entries[e as usize].end == p {
                self.entries[e as usize].end += 1;
            }
            cursor = self.groups[self.entries[e as usize].group as usize].parent_entry;
        }
    }

    /// Shifts every stored flat position `> p` down by one after a removal
    /// at `p`.
    fn shift_remove(&mut self, p: u32) {
        for g in &mut self.groups {
            if let Some(lp) = g.leading_pos.as_mut() {
                if *lp > p {
                    *lp -= 1;
                }
            }
        }
        for e in &mut self.entries {
            for c in &mut e.children {
                if let Child::Tag(pos) = c {
                    if *pos > p {
                        *pos -= 1;
                    }
                }
            }
            if e.end > p {
                e.end -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatfix_dictionary::GroupInfo;

    fn md_dict() -> Arc<MessageGroups> {
        let groups = vec![
            GroupInfo::new(268, 269)
                .with_child(270)
                .with_child(271)
                .with_nested(GroupInfo::new(453, 448).with_child(447)),
        ];
        Arc::new(MessageGroups::build("FIX.4.4", "W", &groups).unwrap())
    }

    fn order_dict() -> Arc<MessageGroups> {
        let groups = vec![
            GroupInfo::new(73, 11).with_child(38).with_child(40),
            GroupInfo::new(552, 54).with_child(1),
        ];
        Arc::new(MessageGroups::build("FIX.4.4", "E", &groups).unwrap())
    }

    fn storage_from(fields: &[(u32, &str)]) -> IndexedStorage {
        let mut storage = IndexedStorage::with_global_pool();
        for &(tag, value) in fields {
            storage.add(tag, value.as_bytes());
        }
        storage
    }

    fn tags_of(storage: &IndexedStorage) -> Vec<u32> {
        (0..storage.field_count()).map(|p| storage.tag_at(p)).collect()
    }

    #[test]
    fn test_index_flat_group() {
        let storage = storage_from(&[
            (35, "W"),
            (268, "2"),
            (269, "0"),
            (270, "1.25"),
            (269, "1"),
            (270, "1.30"),
            (271, "500"),
        ]);
        let mut index = GroupIndex::new(md_dict());
        index.index(&storage, true).unwrap();

        let g = index.outer_group(268).unwrap();
        assert!(!index.is_hidden(g));
        assert_eq!(index.leading_pos(g), Some(1));
        assert_eq!(index.entry_count(g), 2);

        let e0 = index.entry_at(g, 0).unwrap();
        let e1 = index.entry_at(g, 1).unwrap();
        assert_eq!(index.position_in_entry(&storage, e0, 270), Some(3));
        assert_eq!(index.position_in_entry(&storage, e1, 271), Some(6));
        assert_eq!(index.position_in_entry(&storage, e0, 271), None);
    }

    #[test]
    fn test_index_nested_group() {
        let storage = storage_from(&[
            (35, "W"),
            (268, "1"),
            (269, "0"),
            (270, "1.25"),
            (453, "2"),
            (448, "BROKER-A"),
            (447, "D"),
            (448, "BROKER-B"),
            (271, "500"),
        ]);
        let mut index = GroupIndex::new(md_dict());
        index.index(&storage, true).unwrap();

        let g = index.outer_group(268).unwrap();
        assert_eq!(index.entry_count(g), 1);
        let e0 = index.entry_at(g, 0).unwrap();

        let nested = index.nested_group(e0, 453).unwrap();
        assert!(!index.is_hidden(nested));
        assert_eq!(index.entry_count(nested), 2);
        let n0 = index.entry_at(nested, 0).unwrap();
        assert_eq!(index.position_in_entry(&storage, n0, 447), Some(6));
        // Tag 271 after the nested group still belongs to the outer entry.
        assert_eq!(index.position_in_entry(&storage, e0, 271), Some(8));
    }

    #[test]
    fn test_absent_group_is_hidden() {
        let storage = storage_from(&[(35, "E"), (10, "000")]);
        let mut index = GroupIndex::new(order_dict());
        index.index(&storage, true).unwrap();

        let g = index.outer_group(73).unwrap();
        assert!(index.is_hidden(g));
        assert_eq!(index.entry_count(g), 0);
    }

    #[test]
    fn test_materialize_before_checksum() {
        // Adding one entry to a hidden group writes the leading tag with
        // count 1 immediately before the entry's first child tag.
        let mut storage = storage_from(&[(35, "E"), (10, "000")]);
        let mut index = GroupIndex::new(order_dict());
        index.index(&storage, true).unwrap();

        let g = index.outer_group(73).unwrap();
        let e = index.add_entry(&mut storage, g).unwrap();
        index.set_in_entry(&mut storage, e, 11, b"ORD-1").unwrap();
        index.set_in_entry(&mut storage, e, 38, b"100").unwrap();

        assert_eq!(tags_of(&storage), vec![35, 73, 11, 38, 10]);
        let lp = index.leading_pos(g).unwrap();
        assert_eq!(storage.value_at(lp), b"1");
    }

    #[test]
    fn test_count_tracks_entries() {
        let mut storage = storage_from(&[(35, "E")]);
        let mut index = GroupIndex::new(order_dict());
        index.index(&storage, true).unwrap();

        let g = index.outer_group(73).unwrap();
        for i in 0..3 {
            let e = index.add_entry(&mut storage, g).unwrap();
            index
                .set_in_entry(&mut storage, e, 11, format!("ORD-{i}").as_bytes())
                .unwrap();
        }
        let lp = index.leading_pos(g).unwrap();
        assert_eq!(storage.value_at(lp), b"3");

        let e1 = index.entry_at(g, 1).unwrap();
        index.remove_entry(&mut storage, e1).unwrap();
        let lp = index.leading_pos(g).unwrap();
        assert_eq!(storage.value_at(lp), b"2");
        assert_eq!(storage.get(11), Some(&b"ORD-0"[..]));
    }

    #[test]
    fn test_removing_all_entries_hides_leading_tag() {
        let mut storage = storage_from(&[(35, "E"), (73, "1"), (11, "ORD-1"), (38, "100")]);
        let mut index = GroupIndex::new(order_dict());
        index.index(&storage, true).unwrap();

        let g = index.outer_group(73).unwrap();
        let e = index.entry_at(g, 0).unwrap();
        index.remove_entry(&mut storage, e).unwrap();

        assert!(index.is_hidden(g));
        assert_eq!(index.entry_count(g), 0);
        assert_eq!(tags_of(&storage), vec![35]);
        assert_eq!(storage.get(73), None);
    }

    #[test]
    fn test_remove_last_tag_cascades() {
        let mut storage = storage_from(&[(35, "E"), (73, "1"), (11, "ORD-1")]);
        let mut index = GroupIndex::new(order_dict());
        index.index(&storage, true).unwrap();

        let g = index.outer_group(73).unwrap();
        let e = index.entry_at(g, 0).unwrap();
        assert!(index.remove_in_entry(&mut storage, e, 11).unwrap());

        assert!(index.is_hidden(g));
        assert_eq!(tags_of(&storage), vec![35]);
    }

    #[test]
    fn test_nested_removal_cascades_to_parent() {
        // The outer entry holds nothing but a nested group; emptying the
        // nested group empties the outer entry, which empties the outer
        // group.
        let storage_fields = [
            (35, "W"),
            (268, "1"),
            (269, "0"),
            (453, "1"),
            (448, "BROKER-A"),
        ];
        let mut storage = storage_from(&storage_fields);
        let mut index = GroupIndex::new(md_dict());
        index.index(&storage, true).unwrap();

        let g = index.outer_group(268).unwrap();
        let e0 = index.entry_at(g, 0).unwrap();
        // 269 is the delimiter; removing it leaves only the nested group.
        assert!(index.remove_in_entry(&mut storage, e0, 269).unwrap());
        let nested = index.nested_group(e0, 453).unwrap();
        let n0 = index.entry_at(nested, 0).unwrap();
        index.remove_entry(&mut storage, n0).unwrap();

        assert!(index.is_hidden(g));
        assert_eq!(tags_of(&storage), vec![35]);
    }

    #[test]
    fn test_delimiter_mismatch_validated() {
        let storage = storage_from(&[(35, "E"), (552, "2"), (54, "1"), (1, "ACCT"), (38, "100")]);
        let mut index = GroupIndex::new(order_dict());
        let err = index.index(&storage, true).unwrap_err();
        assert!(matches!(
            err,
            GroupError::DelimiterMismatch {
                leading_tag: 552,
                expected: 54,
                found: 38,
                ..
            }
        ));
        assert!(!index.is_indexed());
    }

    #[test]
    fn test_delimiter_mismatch_tolerated() {
        let storage = storage_from(&[(35, "E"), (552, "2"), (54, "1"), (1, "ACCT"), (38, "100")]);
        let mut index = GroupIndex::new(order_dict());
        index.index(&storage, false).unwrap();

        let g = index.outer_group(552).unwrap();
        assert_eq!(index.entry_count(g), 1);
    }

    #[test]
    fn test_invalid_count_validated() {
        let storage = storage_from(&[(35, "E"), (73, "x")]);
        let mut index = GroupIndex::new(order_dict());
        let err = index.index(&storage, true).unwrap_err();
        assert!(matches!(err, GroupError::InvalidGroupCount { tag: 73, .. }));
    }

    #[test]
    fn test_group_tag_outside_group_validated() {
        // Delimiter tag 54 with no open 552 group.
        let storage = storage_from(&[(35, "E"), (54, "1")]);
        let mut index = GroupIndex::new(order_dict());
        let err = index.index(&storage, true).unwrap_err();
        assert!(matches!(err, GroupError::TagOutsideGroup { tag: 54, .. }));
    }

    #[test]
    fn test_duplicate_leading_tag_validated() {
        let storage = storage_from(&[(35, "E"), (73, "1"), (11, "A"), (73, "1"), (11, "B")]);
        let mut index = GroupIndex::new(order_dict());
        let err = index.index(&storage, true).unwrap_err();
        assert!(matches!(err, GroupError::DuplicateLeadingTag { tag: 73, .. }));
    }

    #[test]
    fn test_undeclared_child_rejected() {
        let mut storage = storage_from(&[(35, "E"), (73, "1"), (11, "ORD-1")]);
        let mut index = GroupIndex::new(order_dict());
        index.index(&storage, true).unwrap();

        let g = index.outer_group(73).unwrap();
        let e = index.entry_at(g, 0).unwrap();
        let err = index.set_in_entry(&mut storage, e, 55, b"EURUSD").unwrap_err();
        assert!(matches!(
            err,
            GroupError::UndeclaredChildTag {
                tag: 55,
                leading_tag: 73,
                ..
            }
        ));
    }

    #[test]
    fn test_insert_shifts_later_entries() {
        let mut storage = storage_from(&[
            (35, "E"),
            (73, "2"),
            (11, "ORD-1"),
            (11, "ORD-2"),
            (38, "200"),
        ]);
        let mut index = GroupIndex::new(order_dict());
        index.index(&storage, true).unwrap();

        let g = index.outer_group(73).unwrap();
        let e0 = index.entry_at(g, 0).unwrap();
        let e1 = index.entry_at(g, 1).unwrap();
        index.set_in_entry(&mut storage, e0, 38, b"100").unwrap();

        // The second entry's links still resolve after the shift.
        assert_eq!(tags_of(&storage), vec![35, 73, 11, 38, 11, 38]);
        let p = index.position_in_entry(&storage, e1, 38).unwrap();
        assert_eq!(storage.value_at(p), b"200");
        let p = index.position_in_entry(&storage, e0, 38).unwrap();
        assert_eq!(storage.value_at(p), b"100");
    }

    #[test]
    fn test_update_in_place_via_set() {
        let mut storage = storage_from(&[(35, "E"), (73, "1"), (11, "ORD-1"), (38, "100")]);
        let mut index = GroupIndex::new(order_dict());
        index.index(&storage, true).unwrap();

        let g = index.outer_group(73).unwrap();
        let e = index.entry_at(g, 0).unwrap();
        index.set_in_entry(&mut storage, e, 38, b"250").unwrap();

        assert_eq!(tags_of(&storage), vec![35, 73, 11, 38]);
        let p = index.position_in_entry(&storage, e, 38).unwrap();
        assert_eq!(storage.value_at(p), b"250");
    }

    #[test]
    fn test_remove_group_with_explicit_zero_count() {
        let mut storage = storage_from(&[(35, "E"), (73, "0"), (10, "000")]);
        let mut index = GroupIndex::new(order_dict());
        index.index(&storage, true).unwrap();

        let g = index.outer_group(73).unwrap();
        assert!(!index.is_hidden(g));
        assert_eq!(index.entry_count(g), 0);

        index.remove_group(&mut storage, g).unwrap();
        assert!(index.is_hidden(g));
        assert_eq!(tags_of(&storage), vec![35, 10]);
    }

    #[test]
    fn test_state_machine() {
        let mut storage = storage_from(&[(35, "E")]);
        let mut index = GroupIndex::new(order_dict());
        assert_eq!(index.state(), IndexState::Uninitialized);
        assert!(matches!(index.outer_group(73), Err(GroupError::NotIndexed)));

        index.index(&storage, true).unwrap();
        assert_eq!(index.state(), IndexState::Indexed);
        let g = index.outer_group(73).unwrap();

        index.invalidate();
        assert!(matches!(
            index.add_entry(&mut storage, g),
            Err(GroupError::NotIndexed)
        ));
    }

    #[test]
    fn test_grow_nested_group_in_new_entry() {
        let mut storage = storage_from(&[(35, "W")]);
        let mut index = GroupIndex::new(md_dict());
        index.index(&storage, true).unwrap();

        let g = index.outer_group(268).unwrap();
        let e = index.add_entry(&mut storage, g).unwrap();
        index.set_in_entry(&mut storage, e, 269, b"0").unwrap();
        index.set_in_entry(&mut storage, e, 270, b"1.25").unwrap();

        let nested = index.nested_group(e, 453).unwrap();
        assert!(index.is_hidden(nested));
        let n = index.add_entry(&mut storage, nested).unwrap();
        index.set_in_entry(&mut storage, n, 448, b"BROKER-A").unwrap();
        index.set_in_entry(&mut storage, n, 447, b"D").unwrap();

        assert_eq!(tags_of(&storage), vec![35, 268, 269, 270, 453, 448, 447]);
        let lp = index.leading_pos(nested).unwrap();
        assert_eq!(storage.value_at(lp), b"1");
        // Plain tags added later still land before the nested group.
        index.set_in_entry(&mut storage, e, 271, b"500").unwrap();
        assert_eq!(tags_of(&storage), vec![35, 268, 269, 270, 271, 453, 448, 447]);
    }
}
