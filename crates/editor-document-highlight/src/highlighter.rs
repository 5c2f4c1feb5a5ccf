//! Incremental highlighting of a whole document.
//!
//! The highlighter stores the span stack at every line boundary (entry 0 is the state
//! before line 1, entry `n` the state after line `n`). Edits mark the touched entries
//! invalid and lower the "first invalid line" watermark. Highlighting work always
//! starts at the watermark: a rescanned line whose resulting span stack equals the
//! cached one validates everything after it, so a typical edit rescans a single line.

use std::sync::{Arc, Weak};

use editor_document::sum_tree::{Item, Summary};
use editor_document::{
    DocumentError, LineChange, LineTracker, SumTree, TextDocument, TrackerId,
};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::color::HighlightingColor;
use crate::engine::{HighlightedLine, HighlightingEngine};
use crate::error::{HighlightError, Result};
use crate::rules::HighlightingDefinition;
use crate::span_stack::SpanStack;

/// Lines whose highlighting may have changed and should be redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightingStateChanged {
    /// First affected line (1-based).
    pub from_line: usize,
    /// Last affected line (inclusive).
    pub to_line: usize,
}

/// Handle returned by [`DocumentHighlighter::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateListenerId(u64);

type StateListener = Box<dyn FnMut(&mut DocumentHighlighter, &HighlightingStateChanged) + Send>;

#[derive(Debug, Clone)]
struct CacheEntry {
    stack: Option<SpanStack>,
    valid: bool,
}

impl CacheEntry {
    fn unknown() -> Self {
        Self {
            stack: None,
            valid: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct CacheSummary {
    invalid: usize,
}

impl Summary for CacheSummary {
    fn add(&self, other: &Self) -> Self {
        Self {
            invalid: self.invalid + other.invalid,
        }
    }
}

impl Item for CacheEntry {
    type Summary = CacheSummary;

    fn summary(&self) -> CacheSummary {
        CacheSummary {
            invalid: usize::from(!self.valid),
        }
    }
}

/// Span stacks per line boundary plus the watermark.
struct Cache {
    entries: SumTree<CacheEntry>,
    first_invalid: Option<usize>,
}

impl Cache {
    fn new(line_count: usize, initial: SpanStack) -> Self {
        let mut cache = Self {
            entries: SumTree::new(),
            first_invalid: None,
        };
        cache.reset(line_count, initial);
        cache
    }

    /// Forget every state but the initial one.
    fn reset(&mut self, line_count: usize, initial: SpanStack) {
        let mut entries = Vec::with_capacity(line_count + 1);
        entries.push(CacheEntry {
            stack: Some(initial),
            valid: true,
        });
        entries.extend((0..line_count).map(|_| CacheEntry::unknown()));
        self.entries = SumTree::from_vec(entries);
        self.first_invalid = (line_count > 0).then_some(1);
    }

    fn line_count(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    fn initial(&self) -> SpanStack {
        self.stack(0)
    }

    /// Cached state after line `line`; unknown states read as empty.
    fn stack(&self, line: usize) -> SpanStack {
        self.entries
            .get(line)
            .and_then(|entry| entry.stack.clone())
            .unwrap_or_default()
    }

    fn lines_changed(&mut self, change: &LineChange) {
        let LineChange {
            first_line,
            removed_lines,
            inserted_lines,
        } = *change;
        // The lines below the edit were computed from the state after the last replaced
        // line. The last new line inherits it, so rescanning stops there when the edit
        // did not change what flows downstream.
        let downstream = self
            .entries
            .get((first_line + removed_lines).saturating_sub(1))
            .and_then(|entry| entry.stack.clone());
        for _ in 0..removed_lines {
            self.entries.remove(first_line);
        }
        for index in 0..inserted_lines {
            let entry = if index + 1 == inserted_lines {
                CacheEntry {
                    stack: downstream.clone(),
                    valid: false,
                }
            } else {
                CacheEntry::unknown()
            };
            self.entries.insert(first_line + index, entry);
        }
        if inserted_lines == 0 {
            // The next line now follows a different line.
            self.entries.update(first_line, |entry| entry.valid = false);
        }
        if first_line < self.entries.len() {
            self.first_invalid = Some(self.first_invalid.map_or(first_line, |f| f.min(first_line)));
        }
        trace!(
            first_line,
            removed_lines,
            inserted_lines,
            first_invalid = ?self.first_invalid,
            "highlighting cache updated"
        );
    }

    /// First invalid entry at or after `from`.
    fn next_invalid(&self, from: usize) -> Option<usize> {
        let target = self.entries.prefix_summary(from).invalid;
        self.entries
            .seek(|before, own| {
                if before.invalid + own.invalid <= target {
                    std::cmp::Ordering::Greater
                } else if before.invalid == target {
                    std::cmp::Ordering::Equal
                } else {
                    std::cmp::Ordering::Less
                }
            })
            .map(|(index, _, _)| index)
    }

    /// Record the state after `line`. When it differs from the cached state the next
    /// line must be rescanned; returns whether that is news to listeners, i.e. the
    /// cached state was known. Lines with an unknown state were edited or reset, and
    /// those changes are reported elsewhere.
    fn commit(&mut self, line: usize, stack: SpanStack) -> bool {
        let cached = self.entries.get(line).and_then(|entry| entry.stack.clone());
        if cached.as_ref().is_some_and(|cached| *cached == stack) {
            if self.first_invalid == Some(line) {
                self.entries.update(line, |entry| entry.valid = true);
                self.first_invalid = self.next_invalid(line + 1);
            }
            return false;
        }
        self.entries.update(line, |entry| {
            entry.stack = Some(stack);
            entry.valid = true;
        });
        if line + 1 < self.entries.len() {
            self.entries.update(line + 1, |entry| entry.valid = false);
            self.first_invalid = Some(line + 1);
        } else {
            self.first_invalid = None;
        }
        cached.is_some()
    }
}

/// Line tracker feeding edits into the cache. It only holds a weak reference, so a
/// dropped highlighter is pruned by the document.
struct CacheTracker {
    cache: Weak<Mutex<Cache>>,
}

impl LineTracker for CacheTracker {
    fn lines_changed(&mut self, change: &LineChange) {
        if let Some(cache) = self.cache.upgrade() {
            cache.lock().lines_changed(change);
        }
    }

    fn document_rebuilt(&mut self, line_count: usize) {
        if let Some(cache) = self.cache.upgrade() {
            let mut cache = cache.lock();
            let initial = cache.initial();
            cache.reset(line_count, initial);
        }
    }

    fn is_alive(&self) -> bool {
        self.cache.strong_count() > 0
    }
}

/// Incremental highlighter bound to one document.
///
/// Highlighting is lazy: [`highlight_line`](Self::highlight_line) and
/// [`span_stack`](Self::span_stack) compute only what they need, and
/// [`highlight_pending`](Self::highlight_pending) lets a scheduler catch up in small
/// steps.
pub struct DocumentHighlighter {
    document_id: u64,
    tracker: TrackerId,
    cache: Arc<Mutex<Cache>>,
    engine: HighlightingEngine,
    listeners: Vec<(StateListenerId, Arc<Mutex<StateListener>>)>,
    next_listener_id: u64,
    highlighting: bool,
    disposed: bool,
}

impl DocumentHighlighter {
    /// Create a highlighter for `document` and start tracking its edits.
    pub fn new(document: &mut TextDocument, definition: Arc<HighlightingDefinition>) -> Self {
        let cache = Arc::new(Mutex::new(Cache::new(
            document.line_count(),
            SpanStack::empty(),
        )));
        let tracker = document.add_line_tracker(Box::new(CacheTracker {
            cache: Arc::downgrade(&cache),
        }));
        debug!(
            document = document.id(),
            definition = %definition.name(),
            "document highlighter attached"
        );
        Self {
            document_id: document.id(),
            tracker,
            cache,
            engine: HighlightingEngine::new(definition),
            listeners: Vec::new(),
            next_listener_id: 0,
            highlighting: false,
            disposed: false,
        }
    }

    /// The definition in use.
    pub fn definition(&self) -> &Arc<HighlightingDefinition> {
        self.engine.definition()
    }

    /// Id of the highlighted document.
    pub fn document_id(&self) -> u64 {
        self.document_id
    }

    /// Whether [`dispose`](Self::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Lowest line whose cached state needs recomputing, if any.
    pub fn first_invalid_line(&self) -> Option<usize> {
        self.cache.lock().first_invalid
    }

    /// Span stack in effect before line 1.
    pub fn initial_span_stack(&self) -> SpanStack {
        self.cache.lock().initial()
    }

    /// Replace the state before line 1, e.g. for a document embedded in another
    /// language. Invalidates everything.
    pub fn set_initial_span_stack(&mut self, stack: SpanStack) -> Result<()> {
        self.check_usable()?;
        let mut cache = self.cache.lock();
        let line_count = cache.line_count();
        cache.reset(line_count, stack);
        drop(cache);
        self.notify_all_invalid(line_count);
        Ok(())
    }

    /// Drop every cached state and ask listeners to redraw everything.
    pub fn invalidate_highlighting(&mut self) -> Result<()> {
        self.check_usable()?;
        let mut cache = self.cache.lock();
        let line_count = cache.line_count();
        let initial = cache.initial();
        cache.reset(line_count, initial);
        drop(cache);
        self.notify_all_invalid(line_count);
        Ok(())
    }

    /// Highlight line `line_number` (1-based), computing every state above it first.
    pub fn highlight_line(
        &mut self,
        document: &TextDocument,
        line_number: usize,
    ) -> Result<HighlightedLine> {
        self.check_document(document)?;
        let line = document.line_by_number(line_number)?;
        self.highlighting = true;
        let result = self.update_to(document, line_number - 1).and_then(|()| {
            let text = document.line_text(&line)?;
            let highlighted = self.engine.highlight_line(&line, &text)?;
            self.commit_line(line_number);
            Ok(highlighted)
        });
        self.highlighting = false;
        result
    }

    /// Make sure the state after line `line_number` is valid. `0` is the initial state.
    pub fn update_highlighting_state(
        &mut self,
        document: &TextDocument,
        line_number: usize,
    ) -> Result<()> {
        self.check_document(document)?;
        let line_count = document.line_count();
        if line_number > line_count {
            return Err(DocumentError::LineOutOfRange {
                line: line_number,
                line_count,
            }
            .into());
        }
        self.highlighting = true;
        let result = self.update_to(document, line_number);
        self.highlighting = false;
        result
    }

    /// Span stack after line `line_number`; `0` gives the initial state.
    pub fn span_stack(&mut self, document: &TextDocument, line_number: usize) -> Result<SpanStack> {
        self.update_highlighting_state(document, line_number)?;
        Ok(self.cache.lock().stack(line_number))
    }

    /// Colors of the spans open after line `line_number`, outermost first.
    pub fn color_stack(
        &mut self,
        document: &TextDocument,
        line_number: usize,
    ) -> Result<Vec<Arc<HighlightingColor>>> {
        let stack = self.span_stack(document, line_number)?;
        let mut colors: Vec<_> = stack
            .iter()
            .filter_map(|span| span.span_color.clone())
            .collect();
        colors.reverse();
        Ok(colors)
    }

    /// Rescan at most `max_lines` invalid lines, starting at the watermark. Returns
    /// whether work remains. Nothing happens when every state is valid, so a scheduled
    /// call that was overtaken by edits needs no cancellation.
    pub fn highlight_pending(&mut self, document: &TextDocument, max_lines: usize) -> Result<bool> {
        self.check_document(document)?;
        self.highlighting = true;
        let mut result = Ok(());
        for _ in 0..max_lines {
            if self.first_invalid_line().is_none() {
                break;
            }
            result = self.scan_first_invalid(document);
            if result.is_err() {
                break;
            }
        }
        self.highlighting = false;
        result.map(|()| self.first_invalid_line().is_some())
    }

    /// Register a listener for [`HighlightingStateChanged`] notifications.
    ///
    /// Listeners run while the highlighter is busy; calling back into it from a
    /// listener fails with [`HighlightError::Reentrancy`].
    pub fn subscribe<F>(&mut self, listener: F) -> StateListenerId
    where
        F: FnMut(&mut DocumentHighlighter, &HighlightingStateChanged) + Send + 'static,
    {
        let id = StateListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners
            .push((id, Arc::new(Mutex::new(Box::new(listener)))));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: StateListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Stop tracking `document`. Every later call fails with
    /// [`HighlightError::Disposed`]; disposing twice is allowed.
    pub fn dispose(&mut self, document: &mut TextDocument) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        if self.highlighting {
            return Err(HighlightError::Reentrancy);
        }
        if document.id() != self.document_id {
            return Err(HighlightError::DocumentMismatch {
                expected: self.document_id,
                actual: document.id(),
            });
        }
        document.remove_line_tracker(self.tracker);
        self.listeners.clear();
        self.disposed = true;
        debug!(document = self.document_id, "document highlighter disposed");
        Ok(())
    }

    fn check_usable(&self) -> Result<()> {
        if self.disposed {
            return Err(HighlightError::Disposed);
        }
        if self.highlighting {
            return Err(HighlightError::Reentrancy);
        }
        Ok(())
    }

    fn check_document(&self, document: &TextDocument) -> Result<()> {
        self.check_usable()?;
        if document.id() != self.document_id {
            return Err(HighlightError::DocumentMismatch {
                expected: self.document_id,
                actual: document.id(),
            });
        }
        Ok(())
    }

    /// Validate every state up to `target` and leave the engine positioned after it.
    fn update_to(&mut self, document: &TextDocument, target: usize) -> Result<()> {
        loop {
            match self.first_invalid_line() {
                Some(line) if line <= target => self.scan_first_invalid(document)?,
                _ => {
                    let stack = self.cache.lock().stack(target);
                    self.engine.set_span_stack(stack);
                    return Ok(());
                }
            }
        }
    }

    fn scan_first_invalid(&mut self, document: &TextDocument) -> Result<()> {
        let Some(line_number) = self.first_invalid_line() else {
            return Ok(());
        };
        let before = self.cache.lock().stack(line_number - 1);
        self.engine.set_span_stack(before);
        let line = document.line_by_number(line_number)?;
        self.engine.scan_line(&document.line_text(&line)?)?;
        self.commit_line(line_number);
        Ok(())
    }

    fn commit_line(&mut self, line_number: usize) {
        let stack = self.engine.span_stack().clone();
        let mut cache = self.cache.lock();
        let notify = cache.commit(line_number, stack);
        let line_count = cache.line_count();
        drop(cache);
        if notify && line_number < line_count {
            trace!(line = line_number + 1, "highlighting state changed");
            self.fire(HighlightingStateChanged {
                from_line: line_number + 1,
                to_line: line_number + 1,
            });
        }
    }

    fn notify_all_invalid(&mut self, line_count: usize) {
        if line_count == 0 {
            return;
        }
        self.fire(HighlightingStateChanged {
            from_line: 1,
            to_line: line_count,
        });
    }

    fn fire(&mut self, event: HighlightingStateChanged) {
        if self.listeners.is_empty() {
            return;
        }
        let was_highlighting = std::mem::replace(&mut self.highlighting, true);
        let listeners: Vec<_> = self.listeners.iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            if let Some(mut callback) = listener.try_lock() {
                (*callback)(self, &event);
            }
        }
        self.highlighting = was_highlighting;
    }
}

impl std::fmt::Debug for DocumentHighlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHighlighter")
            .field("document_id", &self.document_id)
            .field("definition", &self.engine.definition().name())
            .field("first_invalid_line", &self.first_invalid_line())
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::HighlightingSpan;
    use regex::Regex;

    fn line_change(first_line: usize, removed_lines: usize, inserted_lines: usize) -> LineChange {
        LineChange {
            first_line,
            removed_lines,
            inserted_lines,
        }
    }

    fn validate_all(cache: &mut Cache) {
        while let Some(line) = cache.first_invalid {
            cache.commit(line, SpanStack::empty());
        }
    }

    #[test]
    fn test_cache_tracks_line_changes() {
        let mut cache = Cache::new(5, SpanStack::empty());
        assert_eq!(cache.first_invalid, Some(1));
        validate_all(&mut cache);
        assert_eq!(cache.first_invalid, None);
        assert_eq!(cache.entries.summary().invalid, 0);

        // Line 3 split into three lines.
        cache.lines_changed(&line_change(3, 1, 3));
        assert_eq!(cache.line_count(), 7);
        assert_eq!(cache.first_invalid, Some(3));
        assert_eq!(cache.entries.summary().invalid, 3);
        assert_eq!(cache.next_invalid(4), Some(4));
        assert_eq!(cache.next_invalid(6), None);

        // Lines 2..=4 joined into one.
        cache.lines_changed(&line_change(2, 3, 1));
        assert_eq!(cache.line_count(), 5);
        assert_eq!(cache.first_invalid, Some(2));
        assert_eq!(cache.next_invalid(3), Some(3));
    }

    #[test]
    fn test_commit_early_exit() {
        let mut cache = Cache::new(3, SpanStack::empty());
        validate_all(&mut cache);

        cache.lines_changed(&line_change(2, 1, 1));
        assert_eq!(cache.first_invalid, Some(2));
        // Same state as before: the watermark jumps past the end.
        assert!(!cache.commit(2, SpanStack::empty()));
        assert_eq!(cache.first_invalid, None);
        assert_eq!(cache.entries.summary().invalid, 0);
    }

    fn comment() -> SpanStack {
        SpanStack::empty().push(Arc::new(HighlightingSpan {
            start: Regex::new(r"/\*").unwrap(),
            end: None,
            rule_set: None,
            span_color: None,
            start_color: None,
            end_color: None,
            span_color_includes_start: true,
            span_color_includes_end: true,
        }))
    }

    #[test]
    fn test_join_compares_with_the_state_below() {
        // "a" / "/*" / "b": the comment opened on line 2 reaches line 3.
        let open = comment();
        let mut cache = Cache::new(3, SpanStack::empty());
        cache.commit(1, SpanStack::empty());
        cache.commit(2, open.clone());
        cache.commit(3, open.clone());
        assert_eq!(cache.first_invalid, None);

        // Lines 1 and 2 joined: the new line 1 inherits the old state after line 2.
        cache.lines_changed(&line_change(1, 2, 1));
        assert_eq!(cache.line_count(), 2);
        assert_eq!(cache.stack(1), open);
        assert!(cache.commit(1, SpanStack::empty()));
        assert_eq!(cache.first_invalid, Some(2));
        assert!(cache.commit(2, SpanStack::empty()));
        assert_eq!(cache.first_invalid, None);
    }

    #[test]
    fn test_split_stops_after_the_last_new_line() {
        let mut cache = Cache::new(3, SpanStack::empty());
        validate_all(&mut cache);

        // Line 2 split in two: the first half is unknown, the second keeps the old state.
        cache.lines_changed(&line_change(2, 1, 2));
        assert_eq!(cache.line_count(), 4);
        assert!(!cache.commit(2, SpanStack::empty()));
        assert_eq!(cache.first_invalid, Some(3));
        assert!(!cache.commit(3, SpanStack::empty()));
        assert_eq!(cache.first_invalid, None);
    }

    #[test]
    fn test_removed_lines_invalidate_the_next_line() {
        let mut cache = Cache::new(3, SpanStack::empty());
        validate_all(&mut cache);
        cache.lines_changed(&line_change(2, 1, 0));
        assert_eq!(cache.line_count(), 2);
        assert_eq!(cache.first_invalid, Some(2));
    }

    #[test]
    fn test_rebuild_keeps_initial_state() {
        let mut cache = Cache::new(2, SpanStack::empty());
        validate_all(&mut cache);
        let tracker_cache = Arc::new(Mutex::new(cache));
        let mut tracker = CacheTracker {
            cache: Arc::downgrade(&tracker_cache),
        };
        tracker.document_rebuilt(4);
        assert_eq!(tracker_cache.lock().line_count(), 4);
        assert_eq!(tracker_cache.lock().first_invalid, Some(1));
        assert!(tracker.is_alive());
        drop(tracker_cache);
        assert!(!tracker.is_alive());
    }
}
