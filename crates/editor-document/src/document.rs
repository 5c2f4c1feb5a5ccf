//! The editable document.
//!
//! [`TextDocument`] ties the buffer, the line index, anchors, undo history and the
//! version chain together. Every edit goes through one replace primitive, which raises
//! events in a fixed order:
//!
//! 1. `UpdateStarted` (only when no update was active)
//! 2. `Changing`
//! 3. buffer and line index mutate; line trackers are notified
//! 4. anchors move; `AnchorDeleted` for each removed anchor
//! 5. `Changed`
//! 6. `TextChanged`, `TextLengthChanged`, `LineCountChanged`, `UpdateFinished`
//!    (once, when the outermost update ends)

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use ropey::Rope;
use tracing::{debug, trace};

use crate::anchor::{AnchorMovementType, AnchorSet, TextAnchor};
use crate::buffer::SequenceBuffer;
use crate::change::DocumentChange;
use crate::error::{DocumentError, Result, check_range};
use crate::line_index::{DocumentLine, LineIndex};
use crate::offset_map::{OffsetChangeMap, OffsetChangeMappingType};
use crate::snapshot::{SnapshotSource, TextSnapshot};
use crate::text_source::TextSource;
use crate::tracker::{LineTracker, TrackerId};
use crate::undo::{UndoStack, UndoState};
use crate::version::ChangeCheckpoint;

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Options applied when creating a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Maximum number of undo groups kept.
    pub undo_size_limit: usize,
    /// Reject mutations from threads other than the owner.
    pub check_thread_access: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            undo_size_limit: usize::MAX,
            check_thread_access: true,
        }
    }
}

impl DocumentOptions {
    /// Set the undo size limit.
    pub fn with_undo_size_limit(mut self, undo_size_limit: usize) -> Self {
        self.undo_size_limit = undo_size_limit;
        self
    }

    /// Enable or disable the owner-thread check.
    pub fn with_thread_check(mut self, check_thread_access: bool) -> Self {
        self.check_thread_access = check_thread_access;
        self
    }
}

/// A 1-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextLocation {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, in characters.
    pub column: usize,
}

impl TextLocation {
    /// Create a location.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for TextLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.line, self.column)
    }
}

/// Events raised by a [`TextDocument`].
#[derive(Debug, Clone, Copy)]
pub enum DocumentEvent<'a> {
    /// The outermost update started.
    UpdateStarted,
    /// A change is about to be applied. The document still has the old text.
    Changing(&'a DocumentChange),
    /// A change has been applied.
    Changed(&'a DocumentChange),
    /// An anchor was deleted by the change currently being applied.
    AnchorDeleted(TextAnchor),
    /// The text changed during the update that is ending.
    TextChanged,
    /// The text length changed during the update that is ending.
    TextLengthChanged {
        /// Length before the update.
        old: usize,
        /// Length after the update.
        new: usize,
    },
    /// The line count changed during the update that is ending.
    LineCountChanged {
        /// Line count before the update.
        old: usize,
        /// Line count after the update.
        new: usize,
    },
    /// The outermost update finished.
    UpdateFinished,
}

/// Handle returned by [`TextDocument::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&mut TextDocument, &DocumentEvent<'_>) + Send>;

/// Start and end anchors describing a segment that follows edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorSegment {
    start: TextAnchor,
    end: TextAnchor,
}

impl AnchorSegment {
    /// Anchor at the start of the segment.
    pub fn start(&self) -> TextAnchor {
        self.start
    }

    /// Anchor at the end of the segment.
    pub fn end(&self) -> TextAnchor {
        self.end
    }

    /// Current start offset.
    pub fn offset(&self, document: &TextDocument) -> Result<usize> {
        document.anchor_offset(self.start)
    }

    /// Current end offset.
    pub fn end_offset(&self, document: &TextDocument) -> Result<usize> {
        document.anchor_offset(self.end)
    }

    /// Current length. Never negative, even if edits swapped the anchors.
    pub fn length(&self, document: &TextDocument) -> Result<usize> {
        Ok(self
            .end_offset(document)?
            .saturating_sub(self.offset(document)?))
    }
}

/// An editable text document.
pub struct TextDocument {
    id: u64,
    buffer: SequenceBuffer,
    lines: LineIndex,
    anchors: AnchorSet,
    undo_stack: UndoStack,
    version: ChangeCheckpoint,
    published: SnapshotSource,
    listeners: Vec<(ListenerId, Arc<Mutex<Listener>>)>,
    next_listener_id: u64,
    trackers: Vec<(TrackerId, Box<dyn LineTracker>)>,
    next_tracker_id: u64,
    owner: Option<ThreadId>,
    update_depth: usize,
    in_document_changing: bool,
    fire_text_changed: bool,
    old_text_length: usize,
    old_line_count: usize,
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextDocument {
    /// Create a document holding `text`.
    pub fn new(text: &str) -> Self {
        Self::with_options(text, DocumentOptions::default())
    }

    /// Create a document with explicit options.
    pub fn with_options(text: &str, options: DocumentOptions) -> Self {
        let id = NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed);
        let buffer = SequenceBuffer::from_text(text);
        let lines = LineIndex::from_rope(buffer.rope());
        let version = ChangeCheckpoint::initial(id);
        let published = SnapshotSource::new(buffer.rope().clone(), version.clone());
        let old_text_length = buffer.len();
        let old_line_count = lines.line_count();
        Self {
            id,
            buffer,
            lines,
            anchors: AnchorSet::new(),
            undo_stack: UndoStack::new(options.undo_size_limit),
            version,
            published,
            listeners: Vec::new(),
            next_listener_id: 0,
            trackers: Vec::new(),
            next_tracker_id: 0,
            owner: options.check_thread_access.then(|| thread::current().id()),
            update_depth: 0,
            in_document_changing: false,
            fire_text_changed: false,
            old_text_length,
            old_line_count,
        }
    }

    /// Process-unique identifier of this document.
    pub fn id(&self) -> u64 {
        self.id
    }

    // ---- thread ownership ----

    /// Thread allowed to mutate the document, if the check is enabled.
    pub fn owner_thread(&self) -> Option<ThreadId> {
        self.owner
    }

    /// Transfer ownership to `owner`; `None` disables the check.
    ///
    /// Must be called from the current owner (or while the check is disabled).
    pub fn set_owner_thread(&mut self, owner: Option<ThreadId>) -> Result<()> {
        self.verify_access()?;
        self.owner = owner;
        Ok(())
    }

    /// Fail with [`DocumentError::WrongThread`] unless called from the owner thread.
    pub fn verify_access(&self) -> Result<()> {
        match self.owner {
            Some(owner) if owner != thread::current().id() => Err(DocumentError::WrongThread),
            _ => Ok(()),
        }
    }

    // ---- lines ----

    /// Number of lines; at least 1.
    pub fn line_count(&self) -> usize {
        self.lines.line_count()
    }

    /// Line with the given 1-based number.
    pub fn line_by_number(&self, line_number: usize) -> Result<DocumentLine> {
        self.lines.line_by_number(line_number)
    }

    /// Line containing `offset`.
    pub fn line_by_offset(&self, offset: usize) -> Result<DocumentLine> {
        self.lines.line_by_offset(offset)
    }

    /// Line after `line`.
    pub fn next_line(&self, line: &DocumentLine) -> Option<DocumentLine> {
        self.lines.next_line(line)
    }

    /// Line before `line`.
    pub fn previous_line(&self, line: &DocumentLine) -> Option<DocumentLine> {
        self.lines.previous_line(line)
    }

    /// Every line, in order.
    pub fn lines(&self) -> impl Iterator<Item = DocumentLine> + '_ {
        self.lines.lines_from(1)
    }

    /// Content of a line, without its terminator.
    pub fn line_text(&self, line: &DocumentLine) -> Result<String> {
        self.text_range(line.offset, line.length)
    }

    /// Line/column of `offset`.
    pub fn location(&self, offset: usize) -> Result<TextLocation> {
        let line = self.lines.line_by_offset(offset)?;
        Ok(TextLocation::new(line.line_number, offset - line.offset + 1))
    }

    /// Offset of a line/column position. The column is clamped to the line content.
    pub fn offset_of(&self, location: TextLocation) -> Result<usize> {
        let line = self.lines.line_by_number(location.line)?;
        Ok(match location.column {
            0 => line.offset,
            column if column > line.length => line.end_offset(),
            column => line.offset + column - 1,
        })
    }

    // ---- events ----

    /// Register an event listener.
    ///
    /// Listeners run synchronously on the writer and receive the document, so they can
    /// query it or, where allowed, edit it. A listener is never re-entered by events its
    /// own edits raise.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&mut TextDocument, &DocumentEvent<'_>) + Send + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners
            .push((id, Arc::new(Mutex::new(Box::new(listener)))));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    fn fire(&mut self, event: &DocumentEvent<'_>) {
        if self.listeners.is_empty() {
            return;
        }
        let listeners: Vec<_> = self.listeners.iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            if let Some(mut callback) = listener.try_lock() {
                (*callback)(self, event);
            }
        }
    }

    /// Register a line tracker.
    pub fn add_line_tracker(&mut self, tracker: Box<dyn LineTracker>) -> TrackerId {
        let id = TrackerId(self.next_tracker_id);
        self.next_tracker_id += 1;
        self.trackers.push((id, tracker));
        id
    }

    /// Remove a line tracker. Returns whether it was registered.
    pub fn remove_line_tracker(&mut self, id: TrackerId) -> bool {
        let before = self.trackers.len();
        self.trackers.retain(|(tracker, _)| *tracker != id);
        self.trackers.len() != before
    }

    /// Number of registered line trackers.
    pub fn line_tracker_count(&self) -> usize {
        self.trackers.len()
    }

    // ---- update groups ----

    /// Whether an update is active.
    pub fn is_in_update(&self) -> bool {
        self.update_depth > 0
    }

    /// Start an update. Updates nest; aggregated events fire when the outermost ends.
    pub fn begin_update(&mut self) -> Result<()> {
        self.verify_access()?;
        if self.in_document_changing {
            return Err(DocumentError::ChangeInProgress);
        }
        self.update_depth += 1;
        if self.update_depth == 1 {
            self.undo_stack.start_group();
            self.fire(&DocumentEvent::UpdateStarted);
        }
        Ok(())
    }

    /// End an update started with [`begin_update`](Self::begin_update).
    pub fn end_update(&mut self) -> Result<()> {
        self.verify_access()?;
        if self.in_document_changing {
            return Err(DocumentError::ChangeInProgress);
        }
        match self.update_depth {
            0 => Err(DocumentError::NoUpdateActive),
            1 => {
                // Handlers may edit again; their changes join the current group.
                self.fire_change_events();
                self.undo_stack.end_group();
                self.update_depth = 0;
                self.fire(&DocumentEvent::UpdateFinished);
                Ok(())
            }
            _ => {
                self.update_depth -= 1;
                Ok(())
            }
        }
    }

    /// Run `f` inside one update.
    pub fn run_update<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        self.begin_update()?;
        let result = f(self);
        let ended = self.end_update();
        let value = result?;
        ended?;
        Ok(value)
    }

    fn fire_change_events(&mut self) {
        while self.fire_text_changed {
            self.fire_text_changed = false;
            self.fire(&DocumentEvent::TextChanged);
            let text_length = self.buffer.len();
            if text_length != self.old_text_length {
                let old = std::mem::replace(&mut self.old_text_length, text_length);
                self.fire(&DocumentEvent::TextLengthChanged {
                    old,
                    new: text_length,
                });
            }
            let line_count = self.lines.line_count();
            if line_count != self.old_line_count {
                let old = std::mem::replace(&mut self.old_line_count, line_count);
                self.fire(&DocumentEvent::LineCountChanged {
                    old,
                    new: line_count,
                });
            }
        }
    }

    // ---- editing ----

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        self.replace_internal(offset, 0, text, None)
    }

    /// Insert `text` at `offset`; anchors with [`AnchorMovementType::Default`] at `offset`
    /// move as `movement` says.
    pub fn insert_with_movement(
        &mut self,
        offset: usize,
        text: &str,
        movement: AnchorMovementType,
    ) -> Result<()> {
        let mapping = match movement {
            AnchorMovementType::BeforeInsertion => OffsetChangeMappingType::KeepAnchorBeforeInsertion,
            _ => OffsetChangeMappingType::Normal,
        };
        self.replace_with_mapping(offset, 0, text, mapping)
    }

    /// Remove `length` characters at `offset`.
    pub fn remove(&mut self, offset: usize, length: usize) -> Result<()> {
        self.replace_internal(offset, length, "", None)
    }

    /// Replace `length` characters at `offset` with `text`.
    pub fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<()> {
        self.replace_internal(offset, length, text, None)
    }

    /// Replace with one of the predefined offset mapping policies.
    pub fn replace_with_mapping(
        &mut self,
        offset: usize,
        length: usize,
        text: &str,
        mapping: OffsetChangeMappingType,
    ) -> Result<()> {
        let map = mapping.to_map(offset, length, text.chars().count());
        self.replace_internal(offset, length, text, map)
    }

    /// Replace with an explicit offset change map.
    pub fn replace_with_map(
        &mut self,
        offset: usize,
        length: usize,
        text: &str,
        map: OffsetChangeMap,
    ) -> Result<()> {
        self.replace_internal(offset, length, text, Some(map))
    }

    /// Replace the whole text.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        let len = self.buffer.len();
        self.replace_internal(0, len, text, None)
    }

    fn replace_internal(
        &mut self,
        offset: usize,
        length: usize,
        text: &str,
        map: Option<OffsetChangeMap>,
    ) -> Result<()> {
        self.verify_access()?;
        if self.in_document_changing {
            return Err(DocumentError::ChangeInProgress);
        }
        // UpdateStarted handlers may still edit, so ranges are checked afterwards.
        self.begin_update()?;
        self.in_document_changing = true;
        let result = self.do_replace(offset, length, text, map);
        self.in_document_changing = false;
        let ended = self.end_update();
        result.and(ended)
    }

    fn do_replace(
        &mut self,
        offset: usize,
        length: usize,
        text: &str,
        map: Option<OffsetChangeMap>,
    ) -> Result<()> {
        let len = self.buffer.len();
        check_range(offset, length, len)?;
        let insertion_length = text.chars().count();
        if let Some(map) = &map
            && !map.is_valid_for_change(offset, length, insertion_length)
        {
            return Err(DocumentError::InvalidOffsetChangeMap(
                "entries do not add up to the replaced range",
            ));
        }
        if length == 0 && insertion_length == 0 {
            return Ok(());
        }
        // Replacing a single character keeps every anchor in place.
        let map = match map {
            None if length == 1 && insertion_length == 1 => Some(OffsetChangeMap::empty()),
            map => map,
        };

        let removed = self.buffer.create_snapshot_range(offset, length)?;
        let change = DocumentChange::new(offset, removed, TextSnapshot::from_text(text), map);
        self.fire(&DocumentEvent::Changing(&change));

        self.undo_stack.push(&change);
        self.fire_text_changed = true;

        let whole_document = offset == 0 && length == len;
        self.buffer.remove(offset, length)?;
        self.buffer.insert(offset, text)?;
        if whole_document {
            self.lines.rebuild(self.buffer.rope());
            let line_count = self.lines.line_count();
            debug!(line_count, "line index rebuilt");
            self.notify_trackers(|tracker| tracker.document_rebuilt(line_count));
        } else {
            let line_change = self
                .lines
                .update(self.buffer.rope(), offset, length, insertion_length);
            self.notify_trackers(|tracker| tracker.lines_changed(&line_change));
        }

        self.version = self.version.append(change.clone());
        self.published
            .publish(self.buffer.rope().clone(), self.version.clone());

        let mut deleted = Vec::new();
        match change.offset_change_map() {
            Some(map) => {
                for entry in map.entries() {
                    deleted.extend(self.anchors.handle_change(entry));
                }
            }
            None => deleted.extend(self.anchors.handle_change(&change.single_change_map_entry())),
        }

        self.notify_trackers(|tracker| tracker.change_complete(&change));
        trace!(
            offset,
            removed = length,
            inserted = insertion_length,
            version = self.version.id(),
            "document changed"
        );

        for anchor in deleted {
            self.fire(&DocumentEvent::AnchorDeleted(anchor));
        }
        self.fire(&DocumentEvent::Changed(&change));
        Ok(())
    }

    fn notify_trackers(&mut self, mut f: impl FnMut(&mut dyn LineTracker)) {
        self.trackers.retain(|(_, tracker)| tracker.is_alive());
        for (_, tracker) in self.trackers.iter_mut() {
            f(tracker.as_mut());
        }
    }

    // ---- undo ----

    /// The undo history.
    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo_stack
    }

    /// Mutable access to the undo history (size limit, clean point, clearing).
    pub fn undo_stack_mut(&mut self) -> &mut UndoStack {
        &mut self.undo_stack
    }

    fn check_can_undo_redo(&self) -> Result<()> {
        self.verify_access()?;
        if self.in_document_changing {
            return Err(DocumentError::ChangeInProgress);
        }
        if self.update_depth > 0 || self.undo_stack.is_group_open() {
            return Err(DocumentError::UndoGroupOpen);
        }
        Ok(())
    }

    fn apply_change(&mut self, change: &DocumentChange) -> Result<()> {
        self.replace_internal(
            change.offset(),
            change.removal_length(),
            &change.inserted_text().text(),
            change.offset_change_map().cloned(),
        )
    }

    /// Undo the most recent group. Returns `false` when there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        self.check_can_undo_redo()?;
        let Some(group) = self.undo_stack.pop_undo() else {
            return Ok(false);
        };
        debug!(changes = group.changes.len(), "undo");
        self.undo_stack.set_state(UndoState::Undo);
        let result = self.run_update(|doc| {
            for change in group.changes.iter().rev() {
                doc.apply_change(&change.invert())?;
            }
            Ok(())
        });
        self.undo_stack.set_state(UndoState::Listen);
        self.undo_stack.push_redo(group);
        result.map(|()| true)
    }

    /// Redo the most recently undone group. Returns `false` when there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        self.check_can_undo_redo()?;
        let Some(group) = self.undo_stack.pop_redo() else {
            return Ok(false);
        };
        debug!(changes = group.changes.len(), "redo");
        self.undo_stack.set_state(UndoState::Redo);
        let result = self.run_update(|doc| {
            for change in &group.changes {
                doc.apply_change(change)?;
            }
            Ok(())
        });
        self.undo_stack.set_state(UndoState::Listen);
        self.undo_stack.push_undo(group);
        result.map(|()| true)
    }

    // ---- versions and snapshots ----

    /// Checkpoint of the current text.
    pub fn document_version(&self) -> ChangeCheckpoint {
        self.version.clone()
    }

    /// Handle for taking snapshots from other threads.
    pub fn snapshot_source(&self) -> SnapshotSource {
        self.published.clone()
    }

    // ---- anchors ----

    /// Create an anchor at `offset`.
    pub fn create_anchor(&mut self, offset: usize) -> Result<TextAnchor> {
        self.verify_access()?;
        self.check_offset(offset)?;
        Ok(self.anchors.create(offset))
    }

    /// Create a segment whose ends follow edits and survive deletion.
    pub fn create_anchor_segment(&mut self, offset: usize, length: usize) -> Result<AnchorSegment> {
        check_range(offset, length, self.buffer.len())?;
        let start = self.create_anchor(offset)?;
        let end = self.create_anchor(offset + length)?;
        self.anchors.set_survive_deletion(start, true)?;
        self.anchors.set_survive_deletion(end, true)?;
        Ok(AnchorSegment { start, end })
    }

    /// Current offset of an anchor.
    pub fn anchor_offset(&self, anchor: TextAnchor) -> Result<usize> {
        self.anchors.offset(anchor)
    }

    /// Current line/column of an anchor.
    pub fn anchor_location(&self, anchor: TextAnchor) -> Result<TextLocation> {
        self.location(self.anchors.offset(anchor)?)
    }

    /// Whether the anchor has been deleted.
    pub fn is_anchor_deleted(&self, anchor: TextAnchor) -> bool {
        self.anchors.is_deleted(anchor)
    }

    /// Movement type of an anchor.
    pub fn anchor_movement(&self, anchor: TextAnchor) -> Result<AnchorMovementType> {
        self.anchors.movement(anchor)
    }

    /// Set the movement type of an anchor.
    pub fn set_anchor_movement(&mut self, anchor: TextAnchor, movement: AnchorMovementType) -> Result<()> {
        self.verify_access()?;
        self.anchors.set_movement(anchor, movement)
    }

    /// Whether an anchor survives deletion of the text around it.
    pub fn anchor_survives_deletion(&self, anchor: TextAnchor) -> Result<bool> {
        self.anchors.survive_deletion(anchor)
    }

    /// Set whether an anchor survives deletion of the text around it.
    pub fn set_anchor_survive_deletion(&mut self, anchor: TextAnchor, survive: bool) -> Result<()> {
        self.verify_access()?;
        self.anchors.set_survive_deletion(anchor, survive)
    }

    /// Release an anchor.
    pub fn remove_anchor(&mut self, anchor: TextAnchor) -> Result<()> {
        self.verify_access()?;
        self.anchors.remove(anchor)
    }

    /// Number of live anchors.
    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }
}

impl TextSource for TextDocument {
    fn rope(&self) -> &Rope {
        self.buffer.rope()
    }

    fn version(&self) -> Option<ChangeCheckpoint> {
        Some(self.version.clone())
    }
}

impl fmt::Debug for TextDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextDocument")
            .field("id", &self.id)
            .field("text_len", &self.buffer.len())
            .field("line_count", &self.lines.line_count())
            .field("anchors", &self.anchors.len())
            .field("version", &self.version.id())
            .field("update_depth", &self.update_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(doc: &mut TextDocument) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        doc.subscribe(move |_, event| {
            let name = match event {
                DocumentEvent::UpdateStarted => "UpdateStarted".to_string(),
                DocumentEvent::Changing(c) => format!("Changing@{}", c.offset()),
                DocumentEvent::Changed(c) => format!("Changed@{}", c.offset()),
                DocumentEvent::AnchorDeleted(_) => "AnchorDeleted".to_string(),
                DocumentEvent::TextChanged => "TextChanged".to_string(),
                DocumentEvent::TextLengthChanged { old, new } => format!("Length {old}->{new}"),
                DocumentEvent::LineCountChanged { old, new } => format!("Lines {old}->{new}"),
                DocumentEvent::UpdateFinished => "UpdateFinished".to_string(),
            };
            sink.lock().push(name);
        });
        log
    }

    #[test]
    fn test_event_order_for_single_edit() {
        let mut doc = TextDocument::new("hello world");
        let anchor = doc.create_anchor(8).unwrap();
        let log = record(&mut doc);
        doc.replace(6, 5, "there\nfriend").unwrap();
        assert!(doc.is_anchor_deleted(anchor));
        assert_eq!(
            *log.lock(),
            vec![
                "UpdateStarted",
                "Changing@6",
                "AnchorDeleted",
                "Changed@6",
                "TextChanged",
                "Length 11->18",
                "Lines 1->2",
                "UpdateFinished",
            ]
        );
    }

    #[test]
    fn test_location_round_trip() {
        let doc = TextDocument::new("ab\ncde\n");
        assert_eq!(doc.location(4).unwrap(), TextLocation::new(2, 2));
        assert_eq!(doc.offset_of(TextLocation::new(2, 2)).unwrap(), 4);
        assert_eq!(doc.offset_of(TextLocation::new(2, 99)).unwrap(), 6);
        assert_eq!(doc.offset_of(TextLocation::new(3, 1)).unwrap(), 7);
        assert!(doc.offset_of(TextLocation::new(4, 1)).is_err());
    }

    #[test]
    fn test_noop_replace_raises_no_text_changed() {
        let mut doc = TextDocument::new("abc");
        let log = record(&mut doc);
        doc.insert(1, "").unwrap();
        assert_eq!(*log.lock(), vec!["UpdateStarted", "UpdateFinished"]);
        assert_eq!(doc.document_version().id(), 0);
    }

    #[test]
    fn test_mutation_from_other_thread_is_rejected() {
        let doc = TextDocument::new("abc");
        let mut doc = std::thread::spawn(move || {
            let mut doc = doc;
            let result = doc.insert(0, "x");
            assert_eq!(result, Err(DocumentError::WrongThread));
            doc
        })
        .join()
        .unwrap();
        doc.insert(0, "x").unwrap();
        assert_eq!(doc.text(), "xabc");
    }
}
