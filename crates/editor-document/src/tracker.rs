//! Line trackers: synchronous observers of line-structure changes.

use crate::change::DocumentChange;
use crate::line_index::LineChange;

/// Observer told about line changes while an edit is still in progress.
///
/// Trackers run on the writer, in registration order, before anchors are updated and
/// before `Changed` listeners. They must not call back into the document.
pub trait LineTracker: Send {
    /// Lines `first_line..first_line + removed_lines` were replaced by `inserted_lines`
    /// new lines.
    fn lines_changed(&mut self, change: &LineChange);

    /// The whole line index was rebuilt; the document now has `line_count` lines.
    fn document_rebuilt(&mut self, line_count: usize);

    /// The edit described by `change` has been fully applied.
    fn change_complete(&mut self, _change: &DocumentChange) {}

    /// Whether the tracker still wants notifications. Dead trackers are dropped.
    fn is_alive(&self) -> bool {
        true
    }
}

/// Handle returned by [`TextDocument::add_line_tracker`](crate::TextDocument::add_line_tracker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackerId(pub(crate) u64);
