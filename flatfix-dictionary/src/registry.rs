/******************************************************************************
   FlatFix - FIX message storage and wire-codec core
   License: MIT
******************************************************************************/

//! Registry and lookup view for repeating-group metadata.
//!
//! [`GroupRegistry`] maps a `(BeginString, MsgType)` pair to a prebuilt
//! [`MessageGroups`] view. The view flattens the [`GroupInfo`] tree into
//! per-leading-tag lookups so the group indexer never walks the tree at
//! parse time. Both types are read-only after construction.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use flatfix_core::GroupError;

use crate::schema::GroupInfo;

/// Flattened metadata for one declared group.
#[derive(Debug, Clone)]
struct GroupMeta {
    delimiter_tag: u32,
    /// Every tag that may appear in an entry: the delimiter, the declared
    /// plain children, and the leading tags of nested groups.
    children: HashSet<u32>,
    nested_leading: Vec<u32>,
}

/// Per-message-type lookup view over all declared repeating groups.
#[derive(Debug, Clone)]
pub struct MessageGroups {
    begin_string: String,
    msg_type: String,
    metas: HashMap<u32, GroupMeta>,
    outer_leading: Vec<u32>,
    group_tags: HashSet<u32>,
}

impl MessageGroups {
    /// Builds the view from a tree of group declarations.
    ///
    /// # Errors
    /// Returns [`GroupError::DuplicateLeadingTag`] if a leading tag is
    /// declared twice, or [`GroupError::DuplicateChildTag`] if one group
    /// declares the same child tag twice.
    pub fn build(
        begin_string: &str,
        msg_type: &str,
        groups: &[GroupInfo],
    ) -> Result<Self, GroupError> {
        let mut view = Self {
            begin_string: begin_string.to_string(),
            msg_type: msg_type.to_string(),
            metas: HashMap::new(),
            outer_leading: Vec::new(),
            group_tags: HashSet::new(),
        };
        for info in groups {
            view.outer_leading.push(info.leading_tag);
            view.flatten(info)?;
        }
        Ok(view)
    }

    fn flatten(&mut self, info: &GroupInfo) -> Result<(), GroupError> {
        let mut children = HashSet::new();
        children.insert(info.delimiter_tag);
        for &tag in &info.child_tags {
            if !children.insert(tag) && tag != info.delimiter_tag {
                return Err(GroupError::DuplicateChildTag {
                    tag,
                    leading_tag: info.leading_tag,
                    begin_string: self.begin_string.clone(),
                    msg_type: self.msg_type.clone(),
                });
            }
        }
        let mut nested_leading = Vec::with_capacity(info.nested.len());
        for nested in &info.nested {
            children.insert(nested.leading_tag);
            nested_leading.push(nested.leading_tag);
        }

        self.group_tags.insert(info.leading_tag);
        self.group_tags.extend(children.iter().copied());
        let meta = GroupMeta {
            delimiter_tag: info.delimiter_tag,
            children,
            nested_leading,
        };
        if self.metas.insert(info.leading_tag, meta).is_some() {
            return Err(GroupError::DuplicateLeadingTag {
                tag: info.leading_tag,
                begin_string: self.begin_string.clone(),
                msg_type: self.msg_type.clone(),
            });
        }
        for nested in &info.nested {
            self.flatten(nested)?;
        }
        Ok(())
    }

    /// The BeginString this view was registered under.
    #[must_use]
    pub fn begin_string(&self) -> &str {
        &self.begin_string
    }

    /// The MsgType this view was registered under.
    #[must_use]
    pub fn msg_type(&self) -> &str {
        &self.msg_type
    }

    /// Returns true if `tag` is a declared leading tag at any nesting level.
    #[inline]
    #[must_use]
    pub fn is_leading_tag(&self, tag: u32) -> bool {
        self.metas.contains_key(&tag)
    }

    /// Leading tags declared at the top level of the message, in
    /// declaration order.
    #[must_use]
    pub fn outer_leading_tags(&self) -> &[u32] {
        &self.outer_leading
    }

    /// The declared delimiter tag of a group, if `leading_tag` is declared.
    #[inline]
    #[must_use]
    pub fn delimiter_of(&self, leading_tag: u32) -> Option<u32> {
        self.metas.get(&leading_tag).map(|m| m.delimiter_tag)
    }

    /// Returns true if `tag` may appear inside an entry of the group opened
    /// by `leading_tag`. Nested leading tags count as children.
    #[inline]
    #[must_use]
    pub fn is_child_of(&self, leading_tag: u32, tag: u32) -> bool {
        self.metas
            .get(&leading_tag)
            .is_some_and(|m| m.children.contains(&tag))
    }

    /// Leading tags of groups nested directly inside `leading_tag`.
    #[must_use]
    pub fn nested_of(&self, leading_tag: u32) -> &[u32] {
        self.metas
            .get(&leading_tag)
            .map_or(&[], |m| m.nested_leading.as_slice())
    }

    /// Returns true if `tag` participates in any declared group: a leading
    /// tag, a delimiter, or a child at any depth.
    #[inline]
    #[must_use]
    pub fn is_group_tag(&self, tag: u32) -> bool {
        self.group_tags.contains(&tag)
    }
}

/// Registry of [`MessageGroups`] views keyed by `(BeginString, MsgType)`.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    /// BeginString -> MsgType -> view. Nested maps keep lookups free of
    /// key allocation.
    entries: HashMap<String, HashMap<String, Arc<MessageGroups>>>,
}

impl GroupRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the group declarations for one message type, replacing any
    /// previous registration for the same key.
    ///
    /// # Errors
    /// Propagates the duplicate-declaration errors of
    /// [`MessageGroups::build`].
    pub fn register(
        &mut self,
        begin_string: &str,
        msg_type: &str,
        groups: &[GroupInfo],
    ) -> Result<(), GroupError> {
        let view = MessageGroups::build(begin_string, msg_type, groups)?;
        self.entries
            .entry(begin_string.to_string())
            .or_default()
            .insert(msg_type.to_string(), Arc::new(view));
        Ok(())
    }

    /// Looks up the view for a message type, if registered.
    #[must_use]
    pub fn lookup(&self, begin_string: &str, msg_type: &str) -> Option<Arc<MessageGroups>> {
        self.entries
            .get(begin_string)
            .and_then(|by_type| by_type.get(msg_type))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md_entries() -> GroupInfo {
        GroupInfo::new(268, 269)
            .with_child(270)
            .with_child(271)
            .with_nested(GroupInfo::new(453, 448).with_child(447).with_child(452))
    }

    #[test]
    fn test_flattened_lookups() {
        let view = MessageGroups::build("FIX.4.4", "W", &[md_entries()]).unwrap();
        assert!(view.is_leading_tag(268));
        assert!(view.is_leading_tag(453));
        assert_eq!(view.outer_leading_tags(), &[268]);
        assert_eq!(view.delimiter_of(268), Some(269));
        assert_eq!(view.delimiter_of(453), Some(448));
        assert_eq!(view.delimiter_of(999), None);
        assert_eq!(view.nested_of(268), &[453]);
        assert!(view.nested_of(453).is_empty());
    }

    #[test]
    fn test_child_membership() {
        let view = MessageGroups::build("FIX.4.4", "W", &[md_entries()]).unwrap();
        // Delimiter and nested leading tags count as children.
        assert!(view.is_child_of(268, 269));
        assert!(view.is_child_of(268, 270));
        assert!(view.is_child_of(268, 453));
        assert!(!view.is_child_of(268, 447));
        assert!(view.is_child_of(453, 447));
        assert!(!view.is_child_of(999, 269));
    }

    #[test]
    fn test_group_tag_union() {
        let view = MessageGroups::build("FIX.4.4", "W", &[md_entries()]).unwrap();
        for tag in [268, 269, 270, 271, 453, 448, 447, 452] {
            assert!(view.is_group_tag(tag), "tag {tag} should be a group tag");
        }
        assert!(!view.is_group_tag(55));
    }

    #[test]
    fn test_duplicate_leading_tag_rejected() {
        let groups = vec![GroupInfo::new(268, 269), GroupInfo::new(268, 270)];
        let err = MessageGroups::build("FIX.4.4", "W", &groups).unwrap_err();
        assert!(matches!(
            err,
            GroupError::DuplicateLeadingTag { tag: 268, .. }
        ));
    }

    #[test]
    fn test_duplicate_child_tag_rejected() {
        let groups = vec![GroupInfo::new(268, 269).with_child(270).with_child(270)];
        let err = MessageGroups::build("FIX.4.4", "W", &groups).unwrap_err();
        assert!(matches!(
            err,
            GroupError::DuplicateChildTag {
                tag: 270,
                leading_tag: 268,
                ..
            }
        ));
    }

    #[test]
    fn test_registry_round_trip() {
        let mut registry = GroupRegistry::new();
        registry
            .register("FIX.4.4", "W", &[md_entries()])
            .unwrap();
        let view = registry.lookup("FIX.4.4", "W").unwrap();
        assert_eq!(view.begin_string(), "FIX.4.4");
        assert_eq!(view.msg_type(), "W");
        assert!(registry.lookup("FIX.4.2", "W").is_none());
        assert!(registry.lookup("FIX.4.4", "D").is_none());
    }
}
