//! Checklist mutation primitives shared by forward edits and history replay.
//!
//! # Responsibility
//! - Apply structural edits to the owned `NestedList`.
//! - Produce the inverse-capable `ListChange` for recorded edits.
//! - Notify the editing surface after each edit is fully applied.
//!
//! # Invariants
//! - `Recording::Replay` never produces a change.
//! - Listeners only observe invariant-consistent states.
//! - Items are addressed by id; indices only designate insertion points.

use crate::config::{ListManagerConfig, ParentDeleteMode};
use crate::list::nested_list::{ListError, ListResult, NestedList, SortPolicy};
use crate::model::list_item::{ListItem, ListItemId};
use crate::service::list_change::ListChange;
use log::{debug, info, warn};
use std::fmt::{Debug, Formatter};

/// Whether a mutation is recorded into history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recording {
    /// Forward user edit: return the change to push.
    Record,
    /// Undo/redo replay: never produce a change.
    Replay,
}

impl Recording {
    fn capture(self, change: impl FnOnce() -> ListChange) -> Option<ListChange> {
        match self {
            Self::Record => Some(change()),
            Self::Replay => None,
        }
    }
}

/// Index range notification for the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEvent {
    /// `count` items now start at `start`.
    Inserted { start: usize, count: usize },
    /// `count` items starting at `start` were removed.
    Removed { start: usize, count: usize },
    /// Content or role of `count` items starting at `start` changed.
    Changed { start: usize, count: usize },
    /// `count` items moved from `from` to `to`.
    Moved { from: usize, to: usize, count: usize },
    /// The whole list was replaced.
    Reset { len: usize },
}

/// Outcome of one editor mutation.
#[derive(Debug)]
pub(crate) struct Edit<T> {
    pub value: T,
    pub change: Option<ListChange>,
}

type EventListener = Box<dyn FnMut(&ListEvent)>;

/// Owner of the live checklist for one open document.
pub struct ListEditor {
    list: NestedList,
    config: ListManagerConfig,
    next_id: ListItemId,
    listener: Option<EventListener>,
}

impl Debug for ListEditor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListEditor")
            .field("list", &self.list)
            .field("config", &self.config)
            .field("next_id", &self.next_id)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl ListEditor {
    pub(crate) fn new(config: ListManagerConfig) -> Self {
        Self {
            list: NestedList::new(),
            config,
            next_id: 1,
            listener: None,
        }
    }

    /// Read access to the live list.
    pub fn list(&self) -> &NestedList {
        &self.list
    }

    pub fn config(&self) -> ListManagerConfig {
        self.config
    }

    pub(crate) fn set_listener(&mut self, listener: impl FnMut(&ListEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Hands out the next unused item id.
    ///
    /// `ListItemId::MAX` only marks an exhausted id space and is never handed
    /// out.
    pub(crate) fn allocate_id(&mut self) -> ListResult<ListItemId> {
        let id = self.next_id;
        self.next_id = following_id(id)?;
        Ok(id)
    }

    /// Replaces the list with a persisted snapshot.
    pub(crate) fn install(&mut self, items: Vec<ListItem>) -> ListResult<()> {
        let mut list = NestedList::from_items(items)?;
        let next_id = match list.max_id() {
            Some(highest) => following_id(highest)?,
            None => 1,
        };
        list.sort(self.config.sort_policy);
        self.next_id = next_id;
        self.list = list;
        info!(
            "event=list_install module=list_editor status=ok len={}",
            self.list.len()
        );
        self.emit(ListEvent::Reset {
            len: self.list.len(),
        });
        Ok(())
    }

    /// Switches the sort policy, re-sorting when it orders by checked state.
    pub(crate) fn set_sort_policy(&mut self, policy: SortPolicy) {
        self.config.sort_policy = policy;
        self.resort();
    }

    /// Inserts `item` at `position`, then re-sorts.
    ///
    /// Returns the item's index after sorting.
    pub(crate) fn add(
        &mut self,
        position: usize,
        item: ListItem,
        recording: Recording,
    ) -> ListResult<Edit<usize>> {
        let snapshot = (recording == Recording::Record).then(|| item.clone());
        let count = 1 + item.children.len();
        let highest = item.subtree_ids().into_iter().max().unwrap_or(item.id);
        let next_id = following_id(highest)?.max(self.next_id);
        let id = item.id;

        let at = self.list.insert(position, item)?;
        self.next_id = next_id;
        debug!(
            "event=list_add module=list_editor status=ok id={} position={} count={} recording={:?}",
            id, at, count, recording
        );
        self.emit(ListEvent::Inserted { start: at, count });
        let prior_order = self.resort();

        Ok(Edit {
            value: self.position(id)?,
            change: snapshot.map(|item| ListChange::Add {
                position: at,
                item,
                prior_order,
            }),
        })
    }

    /// Deletes item `id`; a parent's children follow `mode`.
    ///
    /// Returns the full snapshot of the deleted item including the children
    /// it owned before the call.
    pub(crate) fn delete(
        &mut self,
        id: ListItemId,
        mode: ParentDeleteMode,
        recording: Recording,
    ) -> ListResult<Edit<ListItem>> {
        let position = self.position(id)?;
        let item = self.list.get(position).ok_or(ListError::ItemNotFound(id))?;

        if item.is_child || item.children.is_empty() {
            self.list.remove_at(position)?;
            self.emit(ListEvent::Removed {
                start: position,
                count: 1,
            });
        } else {
            match mode {
                ParentDeleteMode::DeleteAll => {
                    self.list.remove_subtree(id)?;
                    self.emit(ListEvent::Removed {
                        start: position,
                        count: 1 + item.children.len(),
                    });
                }
                ParentDeleteMode::Dissolve => {
                    let released = self.list.dissolve(id)?;
                    self.emit(ListEvent::Changed {
                        start: position + 1,
                        count: released.len(),
                    });
                    self.list.remove_at(position)?;
                    self.emit(ListEvent::Removed {
                        start: position,
                        count: 1,
                    });
                }
            }
        }
        let prior_order = self.resort();

        debug!(
            "event=list_delete module=list_editor status=ok id={} position={} children={} mode={:?} recording={:?}",
            id,
            position,
            item.children.len(),
            mode,
            recording
        );
        let change = recording.capture(|| ListChange::Delete {
            position,
            item: item.clone(),
            mode,
            prior_order,
        });
        Ok(Edit {
            value: item,
            change,
        })
    }

    /// Re-inserts a subtree removed by [`ListEditor::delete`] at `position`.
    ///
    /// Released children that no longer exist are skipped.
    pub(crate) fn restore_deleted(
        &mut self,
        position: usize,
        item: ListItem,
        mode: ParentDeleteMode,
    ) -> ListResult<()> {
        if !item.is_child && mode == ParentDeleteMode::Dissolve && !item.children.is_empty() {
            let mut removed = 0;
            for child in &item.children {
                if self.list.contains(child.id) {
                    self.list.remove_subtree(child.id)?;
                    removed += 1;
                }
            }
            self.emit(ListEvent::Removed {
                start: position,
                count: removed,
            });
        }
        self.add(position, item, Recording::Replay)?;
        Ok(())
    }

    /// Removes `children_to_delete` and then `id`, all located by identity.
    ///
    /// Ids that no longer exist are skipped; a missing `id` is a no-op.
    pub(crate) fn delete_by_id(
        &mut self,
        id: ListItemId,
        children_to_delete: &[ListItemId],
    ) -> ListResult<Option<ListItem>> {
        for child in children_to_delete {
            if let Some(at) = self.list.position_of(*child) {
                self.list.remove_at(at)?;
                self.emit(ListEvent::Removed { start: at, count: 1 });
            }
        }

        let Some(at) = self.list.position_of(id) else {
            warn!(
                "event=list_delete_by_id module=list_editor status=noop reason=stale_id id={}",
                id
            );
            return Ok(None);
        };
        let removed = self.list.remove_at(at)?;
        self.emit(ListEvent::Removed { start: at, count: 1 });
        Ok(Some(removed))
    }

    pub(crate) fn set_body(
        &mut self,
        id: ListItemId,
        body: String,
        recording: Recording,
    ) -> ListResult<Edit<()>> {
        let position = self.position(id)?;
        let before = self.list.set_body(id, body.clone())?;
        if before == body {
            return Ok(Edit {
                value: (),
                change: None,
            });
        }
        self.emit(ListEvent::Changed {
            start: position,
            count: 1,
        });
        Ok(Edit {
            value: (),
            change: recording.capture(|| ListChange::EditBody {
                id,
                before,
                after: body,
            }),
        })
    }

    /// Sets the checkbox of `id`, then re-sorts.
    ///
    /// Returns the item's index after sorting.
    pub(crate) fn set_checked(
        &mut self,
        id: ListItemId,
        checked: bool,
        recording: Recording,
    ) -> ListResult<Edit<usize>> {
        let from = self.position(id)?;
        if self.list.set_checked(id, checked)? == checked {
            return Ok(Edit {
                value: from,
                change: None,
            });
        }
        self.emit(ListEvent::Changed {
            start: from,
            count: 1,
        });

        let prior_order = self.resort();
        let now = self.position(id)?;
        debug!(
            "event=list_check module=list_editor status=ok id={} checked={} from={} to={} recording={:?}",
            id, checked, from, now, recording
        );

        Ok(Edit {
            value: now,
            change: recording.capture(|| ListChange::ToggleChecked {
                id,
                from,
                checked,
                prior_order,
            }),
        })
    }

    /// Reverts [`ListEditor::set_checked`], restoring the group order if the
    /// forward edit re-sorted.
    pub(crate) fn restore_checked(
        &mut self,
        id: ListItemId,
        checked: bool,
        prior_order: Option<&[ListItemId]>,
    ) -> ListResult<()> {
        let position = self.position(id)?;
        self.list.set_checked(id, checked)?;
        self.emit(ListEvent::Changed {
            start: position,
            count: 1,
        });
        self.restore_order(prior_order)
    }

    /// Promotes (`is_child == false`) or demotes (`true`) item `id`, then
    /// re-sorts.
    pub(crate) fn set_is_child(
        &mut self,
        id: ListItemId,
        is_child: bool,
        recording: Recording,
    ) -> ListResult<Edit<()>> {
        let position = self.position(id)?;
        let current = self.list.is_child(id).ok_or(ListError::ItemNotFound(id))?;
        if current == is_child {
            return Ok(Edit {
                value: (),
                change: None,
            });
        }

        let affected = if is_child {
            self.list.demote_parent_to_child(id)?
        } else {
            self.list.reparent_child_to_parent(id)?
        };
        debug!(
            "event=list_reparent module=list_editor status=ok id={} is_child={} affected={} recording={:?}",
            id, is_child, affected, recording
        );
        self.emit(ListEvent::Changed {
            start: position,
            count: 1 + affected,
        });
        let prior_order = self.resort();

        Ok(Edit {
            value: (),
            change: recording.capture(|| ListChange::Reparent {
                id,
                is_child,
                prior_order,
            }),
        })
    }

    /// Moves item `id` (with its children when it is a parent) to `to`, then
    /// re-sorts.
    ///
    /// Returns the item's final index. A move that sorting undoes entirely is
    /// not recorded.
    pub(crate) fn move_item(
        &mut self,
        id: ListItemId,
        to: usize,
        recording: Recording,
    ) -> ListResult<Edit<usize>> {
        let from = self.position(id)?;
        let count = self
            .list
            .get(from)
            .map_or(1, |item| 1 + item.children.len());
        let before = (self.config.sort_policy == SortPolicy::CheckedFirst)
            .then(|| self.list.items());
        let at = self.list.move_item(from, to)?;
        if at == from {
            return Ok(Edit {
                value: at,
                change: None,
            });
        }
        debug!(
            "event=list_move module=list_editor status=ok id={} from={} to={} count={} recording={:?}",
            id, from, at, count, recording
        );
        self.emit(ListEvent::Moved {
            from,
            to: at,
            count,
        });

        let prior_order = self.resort();
        let now = self.position(id)?;
        if prior_order.is_some() && before.is_some_and(|before| before == self.list.items()) {
            debug!(
                "event=list_move module=list_editor status=noop reason=resorted id={}",
                id
            );
            return Ok(Edit {
                value: now,
                change: None,
            });
        }

        Ok(Edit {
            value: now,
            change: recording.capture(|| ListChange::Move {
                id,
                from,
                to: at,
                prior_order,
            }),
        })
    }

    /// Puts groups back into an order captured before a re-sort.
    pub(crate) fn restore_order(&mut self, prior_order: Option<&[ListItemId]>) -> ListResult<()> {
        if let Some(order) = prior_order {
            self.list.restore_group_order(order)?;
            self.emit(ListEvent::Changed {
                start: 0,
                count: self.list.len(),
            });
        }
        Ok(())
    }

    /// Applies the sort policy; returns the group order from before sorting
    /// when it changed anything.
    fn resort(&mut self) -> Option<Vec<ListItemId>> {
        let prior = self.list.group_order();
        if !self.list.sort(self.config.sort_policy) {
            return None;
        }
        self.emit(ListEvent::Changed {
            start: 0,
            count: self.list.len(),
        });
        Some(prior)
    }

    fn position(&self, id: ListItemId) -> ListResult<usize> {
        self.list
            .position_of(id)
            .ok_or(ListError::ItemNotFound(id))
    }

    fn emit(&mut self, event: ListEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }
    }
}

fn following_id(highest: ListItemId) -> ListResult<ListItemId> {
    highest
        .checked_add(1)
        .ok_or(ListError::IdSpaceExhausted { highest })
}
