//! Command-pattern undo/redo stack.
//!
//! # Responsibility
//! - Keep applied changes in order with a pointer to the last applied one.
//! - Drive `undo`/`redo` of changes against a caller-provided target.
//! - Publish derived can-undo/can-redo state to one listener.
//!
//! # Invariants
//! - `pointer` is `-1` when nothing is applied, else `< changes.len()`.
//! - Pushing after an undo discards the redo tail.
//! - A change that fails to apply leaves `pointer` untouched.

use log::{debug, error};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// A reversible edit.
///
/// `Display` renders the human-readable description used in logs.
pub trait Change: Display {
    /// State the change re-applies itself to.
    type Target;
    /// Failure raised while re-applying.
    type Error;

    /// Applies the change forward.
    fn redo(&self, target: &mut Self::Target) -> Result<(), Self::Error>;
    /// Reverts the change.
    fn undo(&self, target: &mut Self::Target) -> Result<(), Self::Error>;
}

/// Derived availability flags for undo/redo controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Errors from history navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError<E> {
    /// No applied change is left to undo.
    NothingToUndo,
    /// No undone change is left to redo.
    NothingToRedo,
    /// `look_up` offset reaches before the first applied change.
    OutOfRange { offset: usize, applied: usize },
    /// The change itself failed while applying.
    Change(E),
}

impl<E> HistoryError<E> {
    /// Whether this error only reports an exhausted history.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::NothingToUndo | Self::NothingToRedo)
    }
}

impl<E: Display> Display for HistoryError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NothingToUndo => write!(f, "there is no change to undo"),
            Self::NothingToRedo => write!(f, "there is no change to redo"),
            Self::OutOfRange { offset, applied } => write!(
                f,
                "history offset {offset} out of range, only {applied} change(s) applied"
            ),
            Self::Change(err) => write!(f, "{err}"),
        }
    }
}

impl<E: Error + 'static> Error for HistoryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Change(err) => Some(err),
            _ => None,
        }
    }
}

type StateListener = Box<dyn FnMut(HistoryState)>;

/// Undo/redo stack over changes of type `C`.
pub struct ChangeHistory<C> {
    changes: Vec<C>,
    pointer: isize,
    listener: Option<StateListener>,
}

impl<C> Default for ChangeHistory<C> {
    fn default() -> Self {
        Self {
            changes: Vec::new(),
            pointer: -1,
            listener: None,
        }
    }
}

impl<C: Debug> Debug for ChangeHistory<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeHistory")
            .field("changes", &self.changes)
            .field("pointer", &self.pointer)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl<C: Change> ChangeHistory<C> {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the listener notified whenever the pointer moves.
    ///
    /// The listener receives the current state immediately.
    pub fn set_listener(&mut self, listener: impl FnMut(HistoryState) + 'static) {
        self.listener = Some(Box::new(listener));
        self.publish();
    }

    /// Records an already applied change, discarding the redo tail.
    pub fn push(&mut self, change: C) {
        let dropped = self.changes.len() - self.applied();
        self.changes.truncate(self.applied());
        debug!(
            "event=history_push module=history status=ok change=\"{}\" dropped_redos={}",
            change, dropped
        );
        self.changes.push(change);
        self.pointer += 1;
        self.publish();
    }

    /// Reverts the last applied change.
    ///
    /// # Errors
    /// - `NothingToUndo` when no change is applied; state is unchanged.
    /// - `Change` when the change fails; the pointer is not moved.
    pub fn undo(&mut self, target: &mut C::Target) -> Result<(), HistoryError<C::Error>> {
        if self.pointer < 0 {
            return Err(HistoryError::NothingToUndo);
        }
        let change = &self.changes[self.pointer as usize];
        debug!(
            "event=history_undo module=history status=start change=\"{}\"",
            change
        );
        if let Err(err) = change.undo(target) {
            error!(
                "event=history_undo module=history status=error change=\"{}\"",
                change
            );
            return Err(HistoryError::Change(err));
        }
        self.pointer -= 1;
        self.publish();
        Ok(())
    }

    /// Re-applies the next undone change.
    ///
    /// # Errors
    /// - `NothingToRedo` when there is no redo tail; state is unchanged.
    /// - `Change` when the change fails; the pointer is not moved.
    pub fn redo(&mut self, target: &mut C::Target) -> Result<(), HistoryError<C::Error>> {
        let next = self.applied();
        if next >= self.changes.len() {
            return Err(HistoryError::NothingToRedo);
        }
        let change = &self.changes[next];
        debug!(
            "event=history_redo module=history status=start change=\"{}\"",
            change
        );
        if let Err(err) = change.redo(target) {
            error!(
                "event=history_redo module=history status=error change=\"{}\"",
                change
            );
            return Err(HistoryError::Change(err));
        }
        self.pointer += 1;
        self.publish();
        Ok(())
    }

    /// Clears all changes, e.g. when another document is opened.
    pub fn reset(&mut self) {
        self.changes.clear();
        self.pointer = -1;
        self.publish();
    }

    /// Inspects the change `offset` steps before the last applied one.
    pub fn look_up(&self, offset: usize) -> Result<&C, HistoryError<C::Error>> {
        let index = self.look_up_index(offset)?;
        Ok(&self.changes[index])
    }

    /// Mutable variant of [`ChangeHistory::look_up`], used to coalesce edits.
    pub fn look_up_mut(&mut self, offset: usize) -> Result<&mut C, HistoryError<C::Error>> {
        let index = self.look_up_index(offset)?;
        Ok(&mut self.changes[index])
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > -1
    }

    pub fn can_redo(&self) -> bool {
        self.pointer < self.changes.len() as isize - 1
    }

    pub fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    /// Index of the last applied change, `-1` when none.
    pub fn pointer(&self) -> isize {
        self.pointer
    }

    /// Total number of recorded changes, redo tail included.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn applied(&self) -> usize {
        (self.pointer + 1) as usize
    }

    fn look_up_index(&self, offset: usize) -> Result<usize, HistoryError<C::Error>> {
        let applied = self.applied();
        if offset >= applied {
            return Err(HistoryError::OutOfRange { offset, applied });
        }
        Ok(applied - 1 - offset)
    }

    fn publish(&mut self) {
        let state = self.state();
        if let Some(listener) = self.listener.as_mut() {
            listener(state);
        }
    }
}
