//! Document versions.
//!
//! Every edit appends a checkpoint to a singly linked chain. Holding an old checkpoint
//! keeps the changes made since then alive, so the changes between any two checkpoints
//! can be replayed, and offsets can be mapped from one version to another.

use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::anchor::AnchorMovementType;
use crate::change::DocumentChange;
use crate::error::{DocumentError, Result};

struct CheckpointNode {
    document_id: u64,
    id: u64,
    next: OnceLock<(DocumentChange, ChangeCheckpoint)>,
}

impl Drop for CheckpointNode {
    fn drop(&mut self) {
        // Unlink iteratively so long histories do not recurse on drop.
        let mut next = self.next.take();
        while let Some((_, checkpoint)) = next {
            match Arc::try_unwrap(checkpoint.0) {
                Ok(mut node) => next = node.next.take(),
                Err(_) => break,
            }
        }
    }
}

/// A point in a document's edit history.
#[derive(Clone)]
pub struct ChangeCheckpoint(Arc<CheckpointNode>);

impl ChangeCheckpoint {
    pub(crate) fn initial(document_id: u64) -> Self {
        Self(Arc::new(CheckpointNode {
            document_id,
            id: 0,
            next: OnceLock::new(),
        }))
    }

    /// Append `change` after this checkpoint and return the new head.
    pub(crate) fn append(&self, change: DocumentChange) -> Self {
        let next = Self(Arc::new(CheckpointNode {
            document_id: self.0.document_id,
            id: self.0.id + 1,
            next: OnceLock::new(),
        }));
        // The document only ever appends to its newest checkpoint.
        let _ = self.0.next.set((change, next.clone()));
        next
    }

    /// Sequence number of this checkpoint within its document.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Whether both checkpoints come from the same document.
    pub fn belongs_to_same_document(&self, other: &ChangeCheckpoint) -> bool {
        self.0.document_id == other.0.document_id
    }

    fn check_related(&self, other: &ChangeCheckpoint) -> Result<()> {
        if self.belongs_to_same_document(other) {
            Ok(())
        } else {
            Err(DocumentError::UnrelatedVersions)
        }
    }

    /// Compare the age of two checkpoints: `Less` when `self` is older than `other`.
    pub fn compare_age(&self, other: &ChangeCheckpoint) -> Result<Ordering> {
        self.check_related(other)?;
        Ok(self.0.id.cmp(&other.0.id))
    }

    fn forward_changes(&self, target: u64) -> Result<Vec<DocumentChange>> {
        let mut changes = Vec::with_capacity((target - self.0.id) as usize);
        let mut current = self.clone();
        while current.0.id < target {
            let Some((change, next)) = current.0.next.get() else {
                return Err(DocumentError::UnrelatedVersions);
            };
            changes.push(change.clone());
            current = next.clone();
        }
        Ok(changes)
    }

    /// Changes turning the text at `self` into the text at `other`.
    ///
    /// When `other` is older, the changes are inverted and returned in reverse order.
    pub fn changes_to(&self, other: &ChangeCheckpoint) -> Result<Vec<DocumentChange>> {
        match self.compare_age(other)? {
            Ordering::Equal => Ok(Vec::new()),
            Ordering::Less => self.forward_changes(other.0.id),
            Ordering::Greater => {
                let forward = other.forward_changes(self.0.id)?;
                Ok(forward.iter().rev().map(DocumentChange::invert).collect())
            }
        }
    }

    /// Map `offset` from the text at `self` to the text at `other`.
    pub fn move_offset_to(
        &self,
        other: &ChangeCheckpoint,
        offset: usize,
        movement: AnchorMovementType,
    ) -> Result<usize> {
        Ok(self
            .changes_to(other)?
            .iter()
            .fold(offset, |offset, change| change.get_new_offset(offset, movement)))
    }
}

impl PartialEq for ChangeCheckpoint {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ChangeCheckpoint {}

impl fmt::Debug for ChangeCheckpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeCheckpoint")
            .field("document_id", &self.0.document_id)
            .field("id", &self.0.id)
            .finish()
    }
}
