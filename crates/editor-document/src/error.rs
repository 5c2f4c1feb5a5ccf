//! Error type shared by every document operation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced by buffer, line index, anchor and document operations.
pub enum DocumentError {
    #[error("offset {offset} is outside the valid range 0..={len}")]
    /// A single offset lies outside `0..=len`.
    OffsetOutOfRange {
        /// The requested offset.
        offset: usize,
        /// Current text length.
        len: usize,
    },

    #[error("range {offset}+{length} is outside the valid range 0..={len}")]
    /// An `(offset, length)` pair does not fit into the text.
    RangeOutOfBounds {
        /// Start of the requested range.
        offset: usize,
        /// Length of the requested range.
        length: usize,
        /// Current text length.
        len: usize,
    },

    #[error("line {line} does not exist (line count is {line_count})")]
    /// A 1-based line number outside `1..=line_count`.
    LineOutOfRange {
        /// The requested line number.
        line: usize,
        /// Current line count.
        line_count: usize,
    },

    #[error("the document cannot be modified while a change is being dispatched")]
    /// An edit or `begin_update` was attempted from a `Changing`/`Changed` handler.
    ChangeInProgress,

    #[error("end_update called without a matching begin_update")]
    /// `end_update` called at depth zero.
    NoUpdateActive,

    #[error("undo and redo are not allowed while an update group is open")]
    /// `undo`/`redo` called between `begin_update` and `end_update`.
    UndoGroupOpen,

    #[error("the document is owned by another thread")]
    /// A mutation was attempted from a thread that does not own the document.
    WrongThread,

    #[error("the anchor has been deleted")]
    /// The anchor was removed by an edit or released explicitly.
    AnchorDeleted,

    #[error("offset change map does not describe the change: {0}")]
    /// A caller-supplied offset change map is inconsistent with its change.
    InvalidOffsetChangeMap(&'static str),

    #[error("the checkpoints belong to different documents")]
    /// Two versions from different documents were compared.
    UnrelatedVersions,
}

/// Convenience alias for document results.
pub type Result<T, E = DocumentError> = std::result::Result<T, E>;

pub(crate) fn check_offset(offset: usize, len: usize) -> Result<()> {
    if offset > len {
        return Err(DocumentError::OffsetOutOfRange { offset, len });
    }
    Ok(())
}

pub(crate) fn check_range(offset: usize, length: usize, len: usize) -> Result<()> {
    match offset.checked_add(length) {
        Some(end) if end <= len => Ok(()),
        _ => Err(DocumentError::RangeOutOfBounds {
            offset,
            length,
            len,
        }),
    }
}
