//! Description of a single replace applied to a document.

use crate::anchor::AnchorMovementType;
use crate::offset_map::{OffsetChangeMap, OffsetChangeMapEntry};
use crate::snapshot::TextSnapshot;
use crate::text_source::TextSource;

/// One physical edit: `removed_text` at `offset` was replaced by `inserted_text`.
///
/// Passed to `Changing`/`Changed` listeners, recorded in the undo stack and chained into
/// the document's version history.
#[derive(Debug, Clone)]
pub struct DocumentChange {
    offset: usize,
    removed_text: TextSnapshot,
    inserted_text: TextSnapshot,
    offset_change_map: Option<OffsetChangeMap>,
}

impl DocumentChange {
    /// Create a change description.
    pub fn new(
        offset: usize,
        removed_text: TextSnapshot,
        inserted_text: TextSnapshot,
        offset_change_map: Option<OffsetChangeMap>,
    ) -> Self {
        Self {
            offset,
            removed_text,
            inserted_text,
            offset_change_map,
        }
    }

    /// Offset of the change.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The removed text.
    pub fn removed_text(&self) -> &TextSnapshot {
        &self.removed_text
    }

    /// The inserted text.
    pub fn inserted_text(&self) -> &TextSnapshot {
        &self.inserted_text
    }

    /// Number of removed characters.
    pub fn removal_length(&self) -> usize {
        self.removed_text.text_len()
    }

    /// Number of inserted characters.
    pub fn insertion_length(&self) -> usize {
        self.inserted_text.text_len()
    }

    /// The explicit offset change map, if one was given.
    pub fn offset_change_map(&self) -> Option<&OffsetChangeMap> {
        self.offset_change_map.as_ref()
    }

    /// The single-step map equivalent to this change.
    pub fn single_change_map_entry(&self) -> OffsetChangeMapEntry {
        OffsetChangeMapEntry::new(self.offset, self.removal_length(), self.insertion_length())
    }

    /// The explicit map, or a map holding [`Self::single_change_map_entry`].
    pub fn offset_change_map_or_single(&self) -> OffsetChangeMap {
        match &self.offset_change_map {
            Some(map) => map.clone(),
            None => OffsetChangeMap::from_single(self.single_change_map_entry()),
        }
    }

    /// Where `offset` ends up after this change.
    pub fn get_new_offset(&self, offset: usize, movement: AnchorMovementType) -> usize {
        match &self.offset_change_map {
            Some(map) => map.get_new_offset(offset, movement),
            None => self.single_change_map_entry().get_new_offset(offset, movement),
        }
    }

    /// The change undoing this one.
    pub fn invert(&self) -> Self {
        Self {
            offset: self.offset,
            removed_text: self.inserted_text.clone(),
            inserted_text: self.removed_text.clone(),
            offset_change_map: self.offset_change_map.as_ref().map(OffsetChangeMap::invert),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invert_swaps_texts_and_map() {
        let change = DocumentChange::new(
            4,
            TextSnapshot::from_text("ab"),
            TextSnapshot::from_text("wxyz"),
            None,
        );
        assert_eq!(change.get_new_offset(10, AnchorMovementType::Default), 12);

        let inverted = change.invert();
        assert_eq!(inverted.removed_text().text(), "wxyz");
        assert_eq!(inverted.inserted_text().text(), "ab");
        assert_eq!(inverted.get_new_offset(12, AnchorMovementType::Default), 10);
        assert!(inverted.offset_change_map().is_none());
    }
}
