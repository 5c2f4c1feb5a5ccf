//! Incrementally maintained line index.
//!
//! One [`SumTree`] item per line: its content length and terminator. Offsets are never
//! stored; they are prefix sums of line lengths, so both "line by number" and "line by
//! offset" are `O(log n)` and an edit only retokenizes the lines it touches.

use std::cmp::Ordering;

use ropey::Rope;
use tracing::trace;

use crate::error::{DocumentError, Result};
use crate::line_ending::{NewLine, split_lines};
use crate::sum_tree::{Item, SumTree, Summary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineEntry {
    length: usize,
    delimiter: Option<NewLine>,
}

impl LineEntry {
    fn total_length(&self) -> usize {
        self.length + self.delimiter.map_or(0, NewLine::len)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LineSummary {
    length: usize,
}

impl Summary for LineSummary {
    fn add(&self, other: &Self) -> Self {
        Self {
            length: self.length + other.length,
        }
    }
}

impl Item for LineEntry {
    type Summary = LineSummary;

    fn summary(&self) -> LineSummary {
        LineSummary {
            length: self.total_length(),
        }
    }
}

/// A line of a document at a particular version.
///
/// This is a value: it describes the line as it was when it was obtained and does not
/// follow later edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentLine {
    /// 1-based line number.
    pub line_number: usize,
    /// Offset of the first character.
    pub offset: usize,
    /// Length without the terminator.
    pub length: usize,
    /// The line terminator; `None` only for the last line.
    pub delimiter: Option<NewLine>,
}

impl DocumentLine {
    /// Length including the terminator.
    pub fn total_length(&self) -> usize {
        self.length + self.delimiter_length()
    }

    /// Length of the terminator (0, 1 or 2).
    pub fn delimiter_length(&self) -> usize {
        self.delimiter.map_or(0, NewLine::len)
    }

    /// Offset just after the content, before the terminator.
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }

    /// Offset just after the terminator.
    pub fn end_offset_with_delimiter(&self) -> usize {
        self.offset + self.total_length()
    }

    /// Whether `offset` lies on this line (terminator excluded, end of content included).
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.offset && offset <= self.end_offset()
    }
}

/// Lines replaced by one edit, reported to line trackers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineChange {
    /// First affected line (1-based).
    pub first_line: usize,
    /// Number of old lines replaced, starting at `first_line`.
    pub removed_lines: usize,
    /// Number of new lines that took their place.
    pub inserted_lines: usize,
}

/// Line boundaries of a text.
pub struct LineIndex {
    lines: SumTree<LineEntry>,
}

impl LineIndex {
    /// Build the index of `rope`.
    pub fn from_rope(rope: &Rope) -> Self {
        let text = rope.to_string();
        let entries = split_lines(&text)
            .map(|(_, length, delimiter)| LineEntry { length, delimiter })
            .collect();
        Self {
            lines: SumTree::from_vec(entries),
        }
    }

    /// Build the index of `text`.
    pub fn from_text(text: &str) -> Self {
        Self::from_rope(&Rope::from_str(text))
    }

    /// Number of lines; at least 1.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all line lengths, equal to the text length.
    pub fn text_len(&self) -> usize {
        self.lines.summary().length
    }

    fn make_line(&self, index: usize, offset: usize, entry: &LineEntry) -> DocumentLine {
        DocumentLine {
            line_number: index + 1,
            offset,
            length: entry.length,
            delimiter: entry.delimiter,
        }
    }

    /// Line with the given 1-based number.
    pub fn line_by_number(&self, line_number: usize) -> Result<DocumentLine> {
        let out_of_range = DocumentError::LineOutOfRange {
            line: line_number,
            line_count: self.line_count(),
        };
        if line_number == 0 {
            return Err(out_of_range);
        }
        let index = line_number - 1;
        let entry = self.lines.get(index).ok_or(out_of_range)?;
        let offset = self.lines.prefix_summary(index).length;
        Ok(self.make_line(index, offset, entry))
    }

    /// Line containing `offset`. The end of the text belongs to the last line; an offset
    /// inside or right after a terminator belongs to the line the terminator ends.
    pub fn line_by_offset(&self, offset: usize) -> Result<DocumentLine> {
        let len = self.text_len();
        if offset > len {
            return Err(DocumentError::OffsetOutOfRange { offset, len });
        }
        let last = self.line_count() - 1;
        let found = self.lines.seek(|before, own| {
            if offset < before.length {
                Ordering::Less
            } else if offset < before.length + own.length {
                Ordering::Equal
            } else {
                Ordering::Greater
            }
        });
        match found {
            Some((index, before, entry)) => Ok(self.make_line(index, before.length, entry)),
            None => self.line_by_number(last + 1),
        }
    }

    /// Line after `line`, if any.
    pub fn next_line(&self, line: &DocumentLine) -> Option<DocumentLine> {
        self.line_by_number(line.line_number + 1).ok()
    }

    /// Line before `line`, if any.
    pub fn previous_line(&self, line: &DocumentLine) -> Option<DocumentLine> {
        line.line_number
            .checked_sub(1)
            .and_then(|n| self.line_by_number(n).ok())
    }

    /// Iterate lines starting at 1-based `first_line`.
    pub fn lines_from(&self, first_line: usize) -> impl Iterator<Item = DocumentLine> + '_ {
        let index = first_line.saturating_sub(1);
        let mut offset = self.lines.prefix_summary(index).length;
        self.lines
            .iter_from(index)
            .enumerate()
            .map(move |(i, entry)| {
                let line = self.make_line(index + i, offset, entry);
                offset += entry.total_length();
                line
            })
    }

    /// Update the index after `[offset, offset + removed)` was replaced by `inserted`
    /// characters. `rope` is the text after the edit.
    pub fn update(
        &mut self,
        rope: &Rope,
        offset: usize,
        removed: usize,
        inserted: usize,
    ) -> LineChange {
        let old_len = self.text_len();
        // Lines [first, last] of the old text cover the edit. A line ending in a lone CR
        // right before the edit must be retokenized too: it may now pair with an LF.
        let Ok(mut first) = self.line_by_offset(offset) else {
            return self.rebuild_change(rope);
        };
        if first.offset == offset
            && let Some(previous) = self.previous_line(&first)
            && previous.delimiter == Some(NewLine::Cr)
        {
            first = previous;
        }
        let Ok(mut last) = self.line_by_offset(offset + removed) else {
            return self.rebuild_change(rope);
        };
        let region_start = first.offset;
        let mut old_end = last.end_offset_with_delimiter();
        let mut new_end = old_end + inserted - removed;
        let mut last_index = last.line_number - 1;
        let first_index = first.line_number - 1;

        // The region ends right after a CR that now precedes an LF of the next line.
        while new_end < rope.len_chars()
            && new_end > 0
            && rope.char(new_end - 1) == '\r'
            && rope.char(new_end) == '\n'
        {
            match self.next_line(&last) {
                Some(next) => {
                    last = next;
                    last_index += 1;
                    old_end = last.end_offset_with_delimiter();
                    new_end = old_end + inserted - removed;
                }
                None => break,
            }
        }

        let region = rope.slice(region_start..new_end).to_string();
        let at_document_end = old_end == old_len;
        let mut entries: Vec<LineEntry> = split_lines(&region)
            .map(|(_, length, delimiter)| LineEntry { length, delimiter })
            .collect();
        if !at_document_end {
            // The region ends with a terminator; the empty trailing piece is not a line.
            entries.pop();
        }

        let removed_lines = last_index - first_index + 1;
        let inserted_lines = entries.len();
        for _ in 0..removed_lines {
            self.lines.remove(first_index);
        }
        for (i, entry) in entries.into_iter().enumerate() {
            self.lines.insert(first_index + i, entry);
        }

        trace!(
            first_line = first_index + 1,
            removed_lines, inserted_lines, "line index updated"
        );
        LineChange {
            first_line: first_index + 1,
            removed_lines,
            inserted_lines,
        }
    }

    fn rebuild_change(&mut self, rope: &Rope) -> LineChange {
        let removed_lines = self.line_count();
        *self = Self::from_rope(rope);
        LineChange {
            first_line: 1,
            removed_lines,
            inserted_lines: self.line_count(),
        }
    }

    /// Replace the whole index with the lines of `rope`.
    pub fn rebuild(&mut self, rope: &Rope) {
        *self = Self::from_rope(rope);
    }
}

impl std::fmt::Debug for LineIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineIndex")
            .field("line_count", &self.line_count())
            .field("text_len", &self.text_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shape(index: &LineIndex) -> Vec<(usize, usize, Option<NewLine>)> {
        index
            .lines_from(1)
            .map(|l| (l.offset, l.length, l.delimiter))
            .collect()
    }

    fn apply(text: &mut String, index: &mut LineIndex, offset: usize, removed: usize, inserted: &str) -> LineChange {
        let mut chars: Vec<char> = text.chars().collect();
        chars.splice(offset..offset + removed, inserted.chars());
        *text = chars.into_iter().collect();
        let rope = Rope::from_str(text);
        let change = index.update(&rope, offset, removed, inserted.chars().count());
        assert_eq!(shape(index), shape(&LineIndex::from_text(text)), "text {text:?}");
        change
    }

    #[test]
    fn test_empty_text_has_one_line() {
        let index = LineIndex::from_text("");
        assert_eq!(index.line_count(), 1);
        let line = index.line_by_number(1).unwrap();
        assert_eq!((line.offset, line.length, line.delimiter), (0, 0, None));
        assert!(index.line_by_number(0).is_err());
        assert!(index.line_by_number(2).is_err());
    }

    #[test]
    fn test_lookup_by_offset() {
        let index = LineIndex::from_text("ab\r\ncd\nef");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_by_offset(0).unwrap().line_number, 1);
        assert_eq!(index.line_by_offset(2).unwrap().line_number, 1);
        assert_eq!(index.line_by_offset(3).unwrap().line_number, 1);
        assert_eq!(index.line_by_offset(4).unwrap().line_number, 2);
        assert_eq!(index.line_by_offset(9).unwrap().line_number, 3);
        assert!(index.line_by_offset(10).is_err());

        let second = index.line_by_number(2).unwrap();
        assert_eq!(second.offset, 4);
        assert_eq!(second.total_length(), 3);
        assert_eq!(index.previous_line(&second).unwrap().line_number, 1);
        assert_eq!(index.next_line(&second).unwrap().line_number, 3);
        assert!(index.previous_line(&index.line_by_number(1).unwrap()).is_none());
    }

    #[test]
    fn test_incremental_updates() {
        let mut text = String::from("one\ntwo\nthree");
        let mut index = LineIndex::from_text(&text);

        let change = apply(&mut text, &mut index, 3, 0, "\nnew");
        assert_eq!(change, LineChange { first_line: 1, removed_lines: 1, inserted_lines: 2 });

        let change = apply(&mut text, &mut index, 2, 6, "");
        assert_eq!(change.first_line, 1);
        assert_eq!(index.line_count(), 2);

        let end = text.chars().count();
        apply(&mut text, &mut index, end, 0, "\n");
        apply(&mut text, &mut index, 0, 0, "\r\n\r\n");
    }

    #[test]
    fn test_cr_and_lf_join_and_split() {
        let mut text = String::from("a\rb\nc");
        let mut index = LineIndex::from_text(&text);
        // Removing "b" makes the lone CR pair with the LF.
        apply(&mut text, &mut index, 2, 1, "");
        assert_eq!(index.line_count(), 2);
        // Splitting a CRLF pair yields two terminators again.
        apply(&mut text, &mut index, 2, 0, "x");
        assert_eq!(index.line_count(), 3);
        // Inserting an LF right after a lone CR joins them.
        let mut text2 = String::from("a\rb");
        let mut index2 = LineIndex::from_text(&text2);
        apply(&mut text2, &mut index2, 2, 0, "\n");
        assert_eq!(index2.line_count(), 2);
        // Inserting a CR right before an LF joins them.
        let mut text3 = String::from("a\nb");
        let mut index3 = LineIndex::from_text(&text3);
        apply(&mut text3, &mut index3, 1, 0, "\r");
        assert_eq!(index3.line_count(), 2);
    }
}
