//! Offset change maps: how positions move through one replace.
//!
//! A replace can be described by a single `(offset, removed, inserted)` entry or by a
//! sequence of entries applied one after the other. Anchors and
//! [`DocumentChange::get_new_offset`](crate::DocumentChange::get_new_offset) use the map
//! to decide where old offsets end up.

use std::sync::Arc;

use crate::anchor::AnchorMovementType;

/// Describes one step of an offset change map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetChangeMapEntry {
    /// Offset at which the step takes place (in the coordinates of the previous step).
    pub offset: usize,
    /// Number of removed characters.
    pub removal_length: usize,
    /// Number of inserted characters.
    pub insertion_length: usize,
    /// When set, anchors inside the removed range are never deleted by this step.
    pub removal_never_causes_anchor_deletion: bool,
    /// When set, [`AnchorMovementType::Default`] anchors stay before the insertion.
    pub default_anchor_movement_is_before_insertion: bool,
}

impl OffsetChangeMapEntry {
    /// Entry with default flags.
    pub fn new(offset: usize, removal_length: usize, insertion_length: usize) -> Self {
        Self {
            offset,
            removal_length,
            insertion_length,
            removal_never_causes_anchor_deletion: false,
            default_anchor_movement_is_before_insertion: false,
        }
    }

    /// Entry with explicit anchor flags.
    pub fn with_flags(
        offset: usize,
        removal_length: usize,
        insertion_length: usize,
        removal_never_causes_anchor_deletion: bool,
        default_anchor_movement_is_before_insertion: bool,
    ) -> Self {
        Self {
            offset,
            removal_length,
            insertion_length,
            removal_never_causes_anchor_deletion,
            default_anchor_movement_is_before_insertion,
        }
    }

    /// End of the removed range.
    pub fn removal_end(&self) -> usize {
        self.offset + self.removal_length
    }

    /// Map `old_offset` through this step.
    pub fn get_new_offset(&self, old_offset: usize, movement: AnchorMovementType) -> usize {
        let insertion_at_offset = self.removal_length == 0 && old_offset == self.offset;
        if !insertion_at_offset {
            if old_offset <= self.offset {
                return old_offset;
            }
            if old_offset >= self.removal_end() {
                return old_offset + self.insertion_length - self.removal_length;
            }
        }
        // Inside the removed range, or exactly at a pure insertion.
        let before = match movement {
            AnchorMovementType::BeforeInsertion => true,
            AnchorMovementType::AfterInsertion => false,
            AnchorMovementType::Default => self.default_anchor_movement_is_before_insertion,
        };
        if before {
            self.offset
        } else {
            self.offset + self.insertion_length
        }
    }

    /// The entry undoing this one. Anchor flags are not carried over.
    pub fn invert(&self) -> Self {
        Self::new(self.offset, self.insertion_length, self.removal_length)
    }
}

/// Immutable sequence of [`OffsetChangeMapEntry`] steps.
///
/// An empty map means "no position moves", which is how a same-length character
/// replacement keeps every anchor in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OffsetChangeMap {
    entries: Arc<[OffsetChangeMapEntry]>,
}

impl OffsetChangeMap {
    /// The empty map.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Map consisting of a single step.
    pub fn from_single(entry: OffsetChangeMapEntry) -> Self {
        Self {
            entries: Arc::from([entry]),
        }
    }

    /// Map consisting of `entries`, applied in order.
    pub fn from_entries(entries: impl IntoIterator<Item = OffsetChangeMapEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// The steps of this map.
    pub fn entries(&self) -> &[OffsetChangeMapEntry] {
        &self.entries
    }

    /// Whether the map has no steps.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map `offset` through every step.
    pub fn get_new_offset(&self, offset: usize, movement: AnchorMovementType) -> usize {
        self.entries
            .iter()
            .fold(offset, |offset, entry| entry.get_new_offset(offset, movement))
    }

    /// Whether this map describes replacing `removal_length` characters at `offset` by
    /// `insertion_length` characters.
    pub fn is_valid_for_change(
        &self,
        offset: usize,
        removal_length: usize,
        insertion_length: usize,
    ) -> bool {
        let mut end = offset as isize + removal_length as isize;
        for entry in self.entries.iter() {
            if entry.offset < offset || (entry.removal_end() as isize) > end {
                return false;
            }
            end += entry.insertion_length as isize - entry.removal_length as isize;
        }
        end == (offset + insertion_length) as isize
    }

    /// The map undoing this one.
    pub fn invert(&self) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        Self::from_entries(self.entries.iter().rev().map(OffsetChangeMapEntry::invert))
    }
}

/// How a replace maps old offsets to new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetChangeMappingType {
    /// Text is replaced as one unit. Anchors inside the replaced range are deleted unless
    /// they survive deletion; the rest move by the length delta.
    #[default]
    Normal,
    /// The removal is applied first, then the insertion, so anchors at the start of the
    /// replaced range stay before the inserted text.
    RemoveAndInsert,
    /// Character-by-character replacement. Anchors keep their offsets when lengths match;
    /// when the new text is longer the growth happens at the last replaced character,
    /// when shorter the surplus characters at the end are removed without deleting
    /// anchors.
    CharacterReplace,
    /// Like `Normal`, but `Default` anchors at the insertion point stay before the
    /// inserted text.
    KeepAnchorBeforeInsertion,
}

impl OffsetChangeMappingType {
    /// Build the map this type produces for a replace. `None` means "single entry".
    pub(crate) fn to_map(
        self,
        offset: usize,
        removal_length: usize,
        insertion_length: usize,
    ) -> Option<OffsetChangeMap> {
        match self {
            Self::Normal => None,
            Self::KeepAnchorBeforeInsertion => Some(OffsetChangeMap::from_single(
                OffsetChangeMapEntry::with_flags(offset, removal_length, insertion_length, false, true),
            )),
            Self::RemoveAndInsert => {
                if removal_length == 0 || insertion_length == 0 {
                    None
                } else {
                    Some(OffsetChangeMap::from_entries([
                        OffsetChangeMapEntry::new(offset, removal_length, 0),
                        OffsetChangeMapEntry::new(offset, 0, insertion_length),
                    ]))
                }
            }
            Self::CharacterReplace => {
                if removal_length == 0 || insertion_length == 0 {
                    None
                } else if insertion_length > removal_length {
                    // The growth follows the anchor's own movement type.
                    Some(OffsetChangeMap::from_single(OffsetChangeMapEntry::with_flags(
                        offset + removal_length - 1,
                        1,
                        1 + insertion_length - removal_length,
                        false,
                        true,
                    )))
                } else if insertion_length < removal_length {
                    Some(OffsetChangeMap::from_single(OffsetChangeMapEntry::with_flags(
                        offset + insertion_length,
                        removal_length - insertion_length,
                        0,
                        true,
                        false,
                    )))
                } else {
                    Some(OffsetChangeMap::empty())
                }
            }
        }
    }
}
