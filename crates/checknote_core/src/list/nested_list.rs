//! Nested ordered list of checklist items.
//!
//! # Responsibility
//! - Own every live checklist item and its parent/child grouping.
//! - Expose index-based mutation primitives and the two sort policies.
//!
//! # Invariants
//! - Index 0 is never a child.
//! - A parent's children form the contiguous run directly after it.
//! - Item ids are unique; every child belongs to exactly one parent.
//! - Every public call either fully applies or leaves the list unchanged.

use crate::model::list_item::{ListItem, ListItemId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by list operations.
pub type ListResult<T> = Result<T, ListError>;

/// Errors from nested list operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// The call would break list grouping invariants. Treated as a bug.
    StructuralInvariantViolation(String),
    /// Index is past the end of the list.
    IndexOutOfBounds { index: usize, len: usize },
    /// Item id is already present in the list.
    DuplicateId(ListItemId),
    /// Item id is not present in the list.
    ItemNotFound(ListItemId),
    /// Operation requires a child but got a parent, or the reverse.
    RoleMismatch { id: ListItemId, expected_child: bool },
    /// No id above `highest` is left to allocate.
    IdSpaceExhausted { highest: ListItemId },
}

impl Display for ListError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StructuralInvariantViolation(details) => {
                write!(f, "structural invariant violation: {details}")
            }
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for list of length {len}")
            }
            Self::DuplicateId(id) => write!(f, "list item id already present: {id}"),
            Self::ItemNotFound(id) => write!(f, "list item not found: {id}"),
            Self::RoleMismatch { id, expected_child } => {
                let expected = if *expected_child { "child" } else { "parent" };
                write!(f, "list item {id} is not a {expected}")
            }
            Self::IdSpaceExhausted { highest } => {
                write!(f, "no list item id left above {highest}")
            }
        }
    }
}

impl Error for ListError {}

/// Ordering policy applied to parent groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPolicy {
    /// Keep the user's manual order.
    #[default]
    Manual,
    /// Unchecked groups first, checked groups after; stable within each.
    CheckedFirst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ItemState {
    body: String,
    checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Group {
    parent: ListItemId,
    children: Vec<ListItemId>,
}

impl Group {
    fn len(&self) -> usize {
        1 + self.children.len()
    }
}

/// Location of one flat index inside the group sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Parent { group: usize },
    Child { group: usize, offset: usize },
}

impl Slot {
    fn group(self) -> usize {
        match self {
            Self::Parent { group } | Self::Child { group, .. } => group,
        }
    }
}

/// Flat ordered checklist with one level of parent/child grouping.
///
/// Items live in an arena keyed by id; display order is a sequence of groups,
/// each holding one parent id and its ordered child ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestedList {
    entries: HashMap<ListItemId, ItemState>,
    groups: Vec<Group>,
}

impl NestedList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from a flat sequence as produced by [`NestedList::items`].
    ///
    /// Grouping is derived from `is_child` flags. A parent that carries a
    /// populated `children` snapshot must match the run that follows it.
    ///
    /// # Errors
    /// - `StructuralInvariantViolation` when the first item is a child, a
    ///   child carries children, or a children snapshot disagrees with the run.
    /// - `DuplicateId` when an id appears twice.
    pub fn from_items(items: Vec<ListItem>) -> ListResult<Self> {
        let mut list = Self::new();
        let mut declared: Vec<(usize, Vec<ListItemId>)> = Vec::new();

        for item in items {
            if list.entries.contains_key(&item.id) {
                return Err(ListError::DuplicateId(item.id));
            }
            if item.is_child {
                if !item.children.is_empty() {
                    return Err(ListError::StructuralInvariantViolation(format!(
                        "child {} carries its own children",
                        item.id
                    )));
                }
                let Some(group) = list.groups.last_mut() else {
                    return Err(ListError::StructuralInvariantViolation(format!(
                        "first item {} is a child",
                        item.id
                    )));
                };
                group.children.push(item.id);
            } else {
                if !item.children.is_empty() {
                    declared.push((
                        list.groups.len(),
                        item.children.iter().map(|child| child.id).collect(),
                    ));
                }
                list.groups.push(Group {
                    parent: item.id,
                    children: Vec::new(),
                });
            }
            list.entries.insert(
                item.id,
                ItemState {
                    body: item.body,
                    checked: item.checked,
                },
            );
        }

        for (group, ids) in declared {
            if list.groups[group].children != ids {
                return Err(ListError::StructuralInvariantViolation(format!(
                    "children of {} disagree with the following run",
                    list.groups[group].parent
                )));
            }
        }

        Ok(list)
    }

    /// Number of items, children included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: ListItemId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Largest id currently in the list.
    pub fn max_id(&self) -> Option<ListItemId> {
        self.entries.keys().copied().max()
    }

    /// Returns the item at `index`; parents carry their children.
    pub fn get(&self, index: usize) -> Option<ListItem> {
        match self.locate(index)? {
            Slot::Parent { group } => Some(self.materialize_group(&self.groups[group])),
            Slot::Child { group, offset } => {
                Some(self.materialize(self.groups[group].children[offset], true))
            }
        }
    }

    /// Id of the item at `index`.
    pub fn id_at(&self, index: usize) -> Option<ListItemId> {
        match self.locate(index)? {
            Slot::Parent { group } => Some(self.groups[group].parent),
            Slot::Child { group, offset } => Some(self.groups[group].children[offset]),
        }
    }

    /// Returns the item with `id`; parents carry their children.
    pub fn get_by_id(&self, id: ListItemId) -> Option<ListItem> {
        let index = self.position_of(id)?;
        self.get(index)
    }

    /// Current flat index of `id`.
    pub fn position_of(&self, id: ListItemId) -> Option<usize> {
        let mut start = 0;
        for group in &self.groups {
            if group.parent == id {
                return Some(start);
            }
            if let Some(offset) = group.children.iter().position(|child| *child == id) {
                return Some(start + 1 + offset);
            }
            start += group.len();
        }
        None
    }

    /// Whether the item with `id` is currently a child.
    pub fn is_child(&self, id: ListItemId) -> Option<bool> {
        self.slot_of(id)
            .map(|slot| matches!(slot, Slot::Child { .. }))
    }

    /// Materializes the current list in display order.
    ///
    /// Parents carry a snapshot of their children; children also appear as
    /// their own entries right after the parent.
    pub fn items(&self) -> Vec<ListItem> {
        let mut items = Vec::with_capacity(self.len());
        for group in &self.groups {
            items.push(self.materialize_group(group));
            items.extend(
                group
                    .children
                    .iter()
                    .map(|child| self.materialize(*child, true)),
            );
        }
        items
    }

    /// Inserts `item` at flat `index` and returns its final index.
    ///
    /// A parent inserted inside a child run adopts the children at or after
    /// `index`. A child is attached to the group covering `index - 1`; any
    /// children it carries are flattened in directly after it.
    ///
    /// # Errors
    /// - `IndexOutOfBounds` when `index > len`.
    /// - `DuplicateId` when any id of the subtree is already present.
    /// - `StructuralInvariantViolation` for a child at index 0 or a subtree
    ///   nested deeper than one level.
    pub fn insert(&mut self, index: usize, item: ListItem) -> ListResult<usize> {
        let len = self.len();
        if index > len {
            return Err(ListError::IndexOutOfBounds { index, len });
        }
        self.ensure_insertable(&item)?;

        if item.is_child {
            if index == 0 {
                return Err(ListError::StructuralInvariantViolation(format!(
                    "child {} cannot be placed at index 0",
                    item.id
                )));
            }
            let (group, offset) = match self.locate(index - 1) {
                Some(Slot::Parent { group }) => (group, 0),
                Some(Slot::Child { group, offset }) => (group, offset + 1),
                None => return Err(self.scan_ran_off(index)),
            };
            let ids = self.register_subtree(item);
            self.groups[group].children.splice(offset..offset, ids);
        } else {
            let (position, adopted) = match self.locate(index) {
                None => (self.groups.len(), Vec::new()),
                Some(Slot::Parent { group }) => (group, Vec::new()),
                Some(Slot::Child { group, offset }) => {
                    (group + 1, self.groups[group].children.split_off(offset))
                }
            };
            let parent = item.id;
            let mut children = self.register_subtree(item);
            children.remove(0);
            children.extend(adopted);
            self.groups.insert(position, Group { parent, children });
        }

        Ok(index)
    }

    /// Appends `item` at the end, switching its role first when requested.
    ///
    /// Switching to parent drops any children the item carries; switching to
    /// child is rejected when the item has children of its own.
    pub fn add(&mut self, mut item: ListItem, is_child: Option<bool>) -> ListResult<usize> {
        if let Some(is_child) = is_child {
            if item.is_child != is_child {
                if is_child && !item.children.is_empty() {
                    return Err(ListError::StructuralInvariantViolation(format!(
                        "item {} still owns children and cannot become a child",
                        item.id
                    )));
                }
                if !is_child {
                    item.children.clear();
                }
                item.is_child = is_child;
            }
        }
        self.insert(self.len(), item)
    }

    /// Removes the item at `index` and returns its snapshot.
    ///
    /// Removing a parent keeps its children in place; they join the preceding
    /// group. The returned snapshot still lists the children it owned.
    ///
    /// # Errors
    /// - `IndexOutOfBounds` when `index >= len`.
    /// - `StructuralInvariantViolation` when removing the first parent would
    ///   leave a child at index 0.
    pub fn remove_at(&mut self, index: usize) -> ListResult<ListItem> {
        match self.locate(index) {
            None => Err(ListError::IndexOutOfBounds {
                index,
                len: self.len(),
            }),
            Some(Slot::Child { group, offset }) => {
                let id = self.groups[group].children.remove(offset);
                Ok(self.unregister(id, true))
            }
            Some(Slot::Parent { group }) => {
                if group == 0 && !self.groups[0].children.is_empty() {
                    return Err(ListError::StructuralInvariantViolation(format!(
                        "removing parent {} would orphan its children at index 0",
                        self.groups[0].parent
                    )));
                }
                let snapshot = self.materialize_group(&self.groups[group]);
                let removed = self.groups.remove(group);
                if group > 0 {
                    self.groups[group - 1].children.extend(removed.children);
                }
                self.entries.remove(&removed.parent);
                Ok(snapshot)
            }
        }
    }

    /// Removes the item with `id`, see [`NestedList::remove_at`].
    pub fn remove(&mut self, id: ListItemId) -> ListResult<ListItem> {
        let index = self.position_of(id).ok_or(ListError::ItemNotFound(id))?;
        self.remove_at(index)
    }

    /// Removes the item with `id` together with its children.
    pub fn remove_subtree(&mut self, id: ListItemId) -> ListResult<ListItem> {
        match self.slot_of(id).ok_or(ListError::ItemNotFound(id))? {
            Slot::Child { .. } => self.remove(id),
            Slot::Parent { group } => {
                let snapshot = self.materialize_group(&self.groups[group]);
                let removed = self.groups.remove(group);
                for child in &removed.children {
                    self.entries.remove(child);
                }
                self.entries.remove(&removed.parent);
                Ok(snapshot)
            }
        }
    }

    /// Turns every child of parent `id` into a stand-alone parent.
    ///
    /// Returns the ids of the released children in display order.
    pub fn dissolve(&mut self, id: ListItemId) -> ListResult<Vec<ListItemId>> {
        let group = self.parent_group_of(id)?;
        let released = std::mem::take(&mut self.groups[group].children);
        for (offset, child) in released.iter().enumerate() {
            self.groups.insert(
                group + 1 + offset,
                Group {
                    parent: *child,
                    children: Vec::new(),
                },
            );
        }
        Ok(released)
    }

    /// Promotes child `id` to a parent.
    ///
    /// The promoted item inherits every sibling after it, in order; the old
    /// parent keeps only the siblings before it. Returns the number of
    /// inherited children.
    pub fn reparent_child_to_parent(&mut self, id: ListItemId) -> ListResult<usize> {
        let (group, offset) = match self.slot_of(id).ok_or(ListError::ItemNotFound(id))? {
            Slot::Child { group, offset } => (group, offset),
            Slot::Parent { .. } => {
                return Err(ListError::RoleMismatch {
                    id,
                    expected_child: true,
                })
            }
        };
        let mut tail = self.groups[group].children.split_off(offset);
        let inherited = tail.split_off(1);
        let count = inherited.len();
        self.groups.insert(
            group + 1,
            Group {
                parent: id,
                children: inherited,
            },
        );
        Ok(count)
    }

    /// Demotes parent `id` to a child of the preceding group.
    ///
    /// Its former children follow it as siblings, which makes this the exact
    /// inverse of [`NestedList::reparent_child_to_parent`]. Returns the number
    /// of released children.
    pub fn demote_parent_to_child(&mut self, id: ListItemId) -> ListResult<usize> {
        let group = self.parent_group_of(id)?;
        if group == 0 {
            return Err(ListError::StructuralInvariantViolation(format!(
                "first item {id} cannot become a child"
            )));
        }
        let removed = self.groups.remove(group);
        let count = removed.children.len();
        let target = &mut self.groups[group - 1].children;
        target.push(removed.parent);
        target.extend(removed.children);
        Ok(count)
    }

    /// Index of the parent governing a child placed at `index`.
    ///
    /// # Errors
    /// - `StructuralInvariantViolation` when no parent precedes `index`.
    pub fn find_governing_parent(&self, index: usize) -> ListResult<usize> {
        let len = self.len();
        if index > len {
            return Err(ListError::IndexOutOfBounds { index, len });
        }
        if index == 0 {
            return Err(self.scan_ran_off(index));
        }
        let group = self
            .locate(index - 1)
            .map(Slot::group)
            .ok_or_else(|| self.scan_ran_off(index))?;
        Ok(self.group_start(group))
    }

    /// Moves the item at `from` so that it lands at `to`; returns the final
    /// index.
    ///
    /// A parent moves together with its children and `to` addresses the list
    /// without that group; a target inside a child run snaps past the run.
    /// A child moves alone and joins the group covering `to - 1`.
    pub fn move_item(&mut self, from: usize, to: usize) -> ListResult<usize> {
        let len = self.len();
        let slot = self
            .locate(from)
            .ok_or(ListError::IndexOutOfBounds { index: from, len })?;

        match slot {
            Slot::Parent { group } => {
                let size = self.groups[group].len();
                if to > len - size {
                    return Err(ListError::IndexOutOfBounds {
                        index: to,
                        len: len - size,
                    });
                }
                let moving = self.groups.remove(group);
                let target = match self.locate(to) {
                    None => self.groups.len(),
                    Some(Slot::Parent { group }) => group,
                    Some(Slot::Child { group, .. }) => group + 1,
                };
                self.groups.insert(target, moving);
                Ok(self.group_start(target))
            }
            Slot::Child { group, offset } => {
                if to == 0 {
                    return Err(ListError::StructuralInvariantViolation(format!(
                        "child {} cannot be moved to index 0",
                        self.groups[group].children[offset]
                    )));
                }
                if to > len - 1 {
                    return Err(ListError::IndexOutOfBounds {
                        index: to,
                        len: len - 1,
                    });
                }
                let id = self.groups[group].children.remove(offset);
                let (target, at) = match self.locate(to - 1) {
                    Some(Slot::Parent { group }) => (group, 0),
                    Some(Slot::Child { group, offset }) => (group, offset + 1),
                    None => {
                        self.groups[group].children.insert(offset, id);
                        return Err(self.scan_ran_off(to));
                    }
                };
                self.groups[target].children.insert(at, id);
                Ok(to)
            }
        }
    }

    /// Replaces the body of `id`; returns the previous body.
    pub fn set_body(&mut self, id: ListItemId, body: impl Into<String>) -> ListResult<String> {
        let state = self
            .entries
            .get_mut(&id)
            .ok_or(ListError::ItemNotFound(id))?;
        Ok(std::mem::replace(&mut state.body, body.into()))
    }

    /// Sets the checkbox of `id`; returns the previous state.
    pub fn set_checked(&mut self, id: ListItemId, checked: bool) -> ListResult<bool> {
        let state = self
            .entries
            .get_mut(&id)
            .ok_or(ListError::ItemNotFound(id))?;
        Ok(std::mem::replace(&mut state.checked, checked))
    }

    /// Reorders groups by `policy`; returns whether the order changed.
    ///
    /// Groups move as units keyed by the parent's checked state only.
    pub fn sort(&mut self, policy: SortPolicy) -> bool {
        match policy {
            SortPolicy::Manual => false,
            SortPolicy::CheckedFirst => {
                let before = self.group_order();
                let entries = &self.entries;
                self.groups
                    .sort_by_key(|group| entries.get(&group.parent).is_some_and(|s| s.checked));
                self.group_order() != before
            }
        }
    }

    /// Parent ids in display order.
    pub fn group_order(&self) -> Vec<ListItemId> {
        self.groups.iter().map(|group| group.parent).collect()
    }

    /// Restores a group order captured by [`NestedList::group_order`].
    ///
    /// # Errors
    /// - `StructuralInvariantViolation` when `order` is not a permutation of
    ///   the current parents.
    pub fn restore_group_order(&mut self, order: &[ListItemId]) -> ListResult<()> {
        if order.len() != self.groups.len() {
            return Err(ListError::StructuralInvariantViolation(format!(
                "group order has {} entries, list has {} groups",
                order.len(),
                self.groups.len()
            )));
        }
        let mut by_parent: HashMap<ListItemId, Group> = self
            .groups
            .iter()
            .map(|group| (group.parent, group.clone()))
            .collect();
        let mut restored = Vec::with_capacity(order.len());
        for parent in order {
            let group = by_parent.remove(parent).ok_or_else(|| {
                ListError::StructuralInvariantViolation(format!(
                    "group order references unknown parent {parent}"
                ))
            })?;
            restored.push(group);
        }
        self.groups = restored;
        Ok(())
    }

    /// Verifies grouping invariants against the arena.
    pub fn check_invariants(&self) -> ListResult<()> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for group in &self.groups {
            for id in std::iter::once(&group.parent).chain(group.children.iter()) {
                if !self.entries.contains_key(id) {
                    return Err(ListError::StructuralInvariantViolation(format!(
                        "grouped id {id} has no entry"
                    )));
                }
                if !seen.insert(*id) {
                    return Err(ListError::StructuralInvariantViolation(format!(
                        "id {id} is grouped twice"
                    )));
                }
            }
        }
        if seen.len() != self.entries.len() {
            return Err(ListError::StructuralInvariantViolation(format!(
                "{} entries are not grouped",
                self.entries.len() - seen.len()
            )));
        }
        Ok(())
    }

    fn locate(&self, index: usize) -> Option<Slot> {
        let mut start = 0;
        for (group, entry) in self.groups.iter().enumerate() {
            if index == start {
                return Some(Slot::Parent { group });
            }
            if index < start + entry.len() {
                return Some(Slot::Child {
                    group,
                    offset: index - start - 1,
                });
            }
            start += entry.len();
        }
        None
    }

    fn slot_of(&self, id: ListItemId) -> Option<Slot> {
        self.groups.iter().enumerate().find_map(|(group, entry)| {
            if entry.parent == id {
                Some(Slot::Parent { group })
            } else {
                entry
                    .children
                    .iter()
                    .position(|child| *child == id)
                    .map(|offset| Slot::Child { group, offset })
            }
        })
    }

    fn parent_group_of(&self, id: ListItemId) -> ListResult<usize> {
        match self.slot_of(id).ok_or(ListError::ItemNotFound(id))? {
            Slot::Parent { group } => Ok(group),
            Slot::Child { .. } => Err(ListError::RoleMismatch {
                id,
                expected_child: false,
            }),
        }
    }

    fn group_start(&self, group: usize) -> usize {
        self.groups[..group].iter().map(Group::len).sum()
    }

    fn scan_ran_off(&self, index: usize) -> ListError {
        ListError::StructuralInvariantViolation(format!(
            "no parent precedes index {index}"
        ))
    }

    fn ensure_insertable(&self, item: &ListItem) -> ListResult<()> {
        let mut incoming = HashSet::with_capacity(item.children.len() + 1);
        for id in item.subtree_ids() {
            if self.entries.contains_key(&id) || !incoming.insert(id) {
                return Err(ListError::DuplicateId(id));
            }
        }
        if let Some(nested) = item.children.iter().find(|child| !child.children.is_empty()) {
            return Err(ListError::StructuralInvariantViolation(format!(
                "item {} would nest deeper than one level",
                nested.id
            )));
        }
        Ok(())
    }

    /// Adds arena entries for `item` and its children; returns their ids with
    /// the item first.
    fn register_subtree(&mut self, item: ListItem) -> Vec<ListItemId> {
        let mut ids = Vec::with_capacity(item.children.len() + 1);
        ids.push(item.id);
        self.entries.insert(
            item.id,
            ItemState {
                body: item.body,
                checked: item.checked,
            },
        );
        for child in item.children {
            ids.push(child.id);
            self.entries.insert(
                child.id,
                ItemState {
                    body: child.body,
                    checked: child.checked,
                },
            );
        }
        ids
    }

    fn unregister(&mut self, id: ListItemId, is_child: bool) -> ListItem {
        let state = self.entries.remove(&id).unwrap_or(ItemState {
            body: String::new(),
            checked: false,
        });
        ListItem {
            id,
            body: state.body,
            checked: state.checked,
            is_child,
            children: Vec::new(),
        }
    }

    fn materialize(&self, id: ListItemId, is_child: bool) -> ListItem {
        let (body, checked) = self
            .entries
            .get(&id)
            .map(|state| (state.body.clone(), state.checked))
            .unwrap_or_default();
        ListItem {
            id,
            body,
            checked,
            is_child,
            children: Vec::new(),
        }
    }

    fn materialize_group(&self, group: &Group) -> ListItem {
        let mut parent = self.materialize(group.parent, false);
        parent.children = group
            .children
            .iter()
            .map(|child| self.materialize(*child, true))
            .collect();
        parent
    }
}
