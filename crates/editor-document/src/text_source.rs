//! Read-only text access shared by buffers, snapshots and documents.

use ropey::Rope;

use crate::error::{Result, check_offset, check_range};
use crate::search::{self, Comparison};
use crate::snapshot::TextSnapshot;
use crate::version::ChangeCheckpoint;

/// Read-only view of a text.
///
/// Every method is implemented on top of [`TextSource::rope`]. Offsets are character
/// offsets; out-of-range arguments are reported as errors and never clamped.
pub trait TextSource {
    /// The underlying rope.
    fn rope(&self) -> &Rope;

    /// Version of the text, if it is tied to a document.
    fn version(&self) -> Option<ChangeCheckpoint> {
        None
    }

    /// Length in characters.
    fn text_len(&self) -> usize {
        self.rope().len_chars()
    }

    /// The whole text.
    fn text(&self) -> String {
        self.rope().to_string()
    }

    /// Character at `offset`.
    fn char_at(&self, offset: usize) -> Result<char> {
        let rope = self.rope();
        if offset >= rope.len_chars() {
            return Err(crate::DocumentError::OffsetOutOfRange {
                offset,
                len: rope.len_chars(),
            });
        }
        Ok(rope.char(offset))
    }

    /// `length` characters starting at `offset`.
    fn text_range(&self, offset: usize, length: usize) -> Result<String> {
        let rope = self.rope();
        check_range(offset, length, rope.len_chars())?;
        Ok(rope.slice(offset..offset + length).to_string())
    }

    /// First occurrence of `needle` within `[start, start + count)`.
    fn index_of(
        &self,
        needle: &str,
        start: usize,
        count: usize,
        comparison: Comparison,
    ) -> Result<Option<usize>> {
        let rope = self.rope();
        check_range(start, count, rope.len_chars())?;
        Ok(search::index_of(rope.slice(start..start + count), needle, comparison)
            .map(|found| start + found))
    }

    /// Last occurrence of `needle` within `[start, start + count)`.
    fn last_index_of(
        &self,
        needle: &str,
        start: usize,
        count: usize,
        comparison: Comparison,
    ) -> Result<Option<usize>> {
        let rope = self.rope();
        check_range(start, count, rope.len_chars())?;
        Ok(search::last_index_of(rope.slice(start..start + count), needle, comparison)
            .map(|found| start + found))
    }

    /// First occurrence of `ch` within `[start, start + count)`.
    fn index_of_char(&self, ch: char, start: usize, count: usize) -> Result<Option<usize>> {
        let rope = self.rope();
        check_range(start, count, rope.len_chars())?;
        Ok(search::index_of_char(rope.slice(start..start + count), ch).map(|found| start + found))
    }

    /// Last occurrence of `ch` within `[start, start + count)`.
    fn last_index_of_char(&self, ch: char, start: usize, count: usize) -> Result<Option<usize>> {
        let rope = self.rope();
        check_range(start, count, rope.len_chars())?;
        Ok(search::last_index_of_char(rope.slice(start..start + count), ch)
            .map(|found| start + found))
    }

    /// Immutable copy of the whole text. `O(1)`.
    fn create_snapshot(&self) -> TextSnapshot {
        TextSnapshot::new(self.rope().clone(), self.version())
    }

    /// Immutable copy of `[offset, offset + length)`.
    fn create_snapshot_range(&self, offset: usize, length: usize) -> Result<TextSnapshot> {
        let rope = self.rope();
        check_range(offset, length, rope.len_chars())?;
        if offset == 0 && length == rope.len_chars() {
            return Ok(self.create_snapshot());
        }
        Ok(TextSnapshot::new(
            Rope::from(rope.slice(offset..offset + length)),
            None,
        ))
    }

    /// Whether `offset` is a valid caret position (`0..=len`).
    fn check_offset(&self, offset: usize) -> Result<()> {
        check_offset(offset, self.text_len())
    }
}
