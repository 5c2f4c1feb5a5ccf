//! Undo history of a document.
//!
//! Every change made while the stack is listening is recorded into the open group; a
//! group spans the outermost `begin_update`/`end_update` pair, so a batch of edits is
//! undone in one step.

use std::collections::VecDeque;

use tracing::debug;

use crate::change::DocumentChange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UndoState {
    Listen,
    Undo,
    Redo,
}

/// Changes undone or redone together.
#[derive(Debug, Clone, Default)]
pub(crate) struct UndoGroup {
    pub(crate) changes: Vec<DocumentChange>,
}

/// Undo/redo history.
#[derive(Debug)]
pub struct UndoStack {
    undo: VecDeque<UndoGroup>,
    redo: Vec<UndoGroup>,
    open: Option<UndoGroup>,
    state: UndoState,
    size_limit: usize,
    /// Clean point tracking. Uses `undo.len()` as the saved position in the linear history.
    /// When `redo` is non-empty, `clean_index` may be greater than `undo.len()`.
    clean_index: Option<usize>,
}

impl UndoStack {
    pub(crate) fn new(size_limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            open: None,
            state: UndoState::Listen,
            size_limit,
            clean_index: Some(0),
        }
    }

    /// Whether there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undoable groups.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Number of redoable groups.
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Maximum number of undo groups kept.
    pub fn size_limit(&self) -> usize {
        self.size_limit
    }

    /// Change the maximum number of undo groups; the oldest groups are dropped.
    pub fn set_size_limit(&mut self, size_limit: usize) {
        self.size_limit = size_limit;
        self.enforce_size_limit();
    }

    /// Whether the document is at the state last marked with
    /// [`mark_as_original_file`](Self::mark_as_original_file).
    pub fn is_original_file(&self) -> bool {
        self.clean_index == Some(self.undo.len())
    }

    /// Mark the current state as the saved one.
    pub fn mark_as_original_file(&mut self) {
        self.clean_index = Some(self.undo.len());
    }

    /// Drop the whole history.
    pub fn clear(&mut self) {
        let clean = self.is_original_file();
        self.undo.clear();
        self.redo.clear();
        self.clean_index = clean.then_some(0);
    }

    pub(crate) fn set_state(&mut self, state: UndoState) {
        self.state = state;
    }

    pub(crate) fn is_group_open(&self) -> bool {
        self.open.is_some()
    }

    pub(crate) fn start_group(&mut self) {
        if self.state == UndoState::Listen {
            self.open = Some(UndoGroup::default());
        }
    }

    pub(crate) fn end_group(&mut self) {
        let Some(group) = self.open.take() else {
            return;
        };
        if group.changes.is_empty() {
            return;
        }
        self.clear_redo_and_adjust_clean();
        self.undo.push_back(group);
        self.enforce_size_limit();
    }

    pub(crate) fn push(&mut self, change: &DocumentChange) {
        if self.state != UndoState::Listen {
            return;
        }
        match &mut self.open {
            Some(group) => group.changes.push(change.clone()),
            None => {
                self.open = Some(UndoGroup {
                    changes: vec![change.clone()],
                });
                self.end_group();
            }
        }
    }

    pub(crate) fn pop_undo(&mut self) -> Option<UndoGroup> {
        self.undo.pop_back()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<UndoGroup> {
        self.redo.pop()
    }

    pub(crate) fn push_redo(&mut self, group: UndoGroup) {
        self.redo.push(group);
    }

    pub(crate) fn push_undo(&mut self, group: UndoGroup) {
        self.undo.push_back(group);
        self.enforce_size_limit();
    }

    fn clear_redo_and_adjust_clean(&mut self) {
        if self.redo.is_empty() {
            return;
        }
        // A clean point in the redo area becomes unreachable once redo is cleared.
        if let Some(clean_index) = self.clean_index
            && clean_index > self.undo.len()
        {
            self.clean_index = None;
        }
        self.redo.clear();
    }

    fn enforce_size_limit(&mut self) {
        while self.undo.len() > self.size_limit {
            self.undo.pop_front();
            self.clean_index = match self.clean_index {
                Some(0) | None => None,
                Some(clean_index) => Some(clean_index - 1),
            };
            debug!(size_limit = self.size_limit, "dropped oldest undo group");
        }
    }
}
