//! The mutable character sequence behind a document.

use ropey::Rope;

use crate::error::{Result, check_offset, check_range};
use crate::text_source::TextSource;

/// Mutable character sequence.
///
/// Backed by a [`Rope`], a balanced tree of text chunks whose nodes are shared between
/// clones. Insertion and removal are `O(log n + k)`, cloning is `O(1)` and only the
/// nodes touched by a later edit are copied.
#[derive(Debug, Clone, Default)]
pub struct SequenceBuffer {
    rope: Rope,
}

impl SequenceBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer holding `text`.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        check_offset(offset, self.len())?;
        self.rope.insert(offset, text);
        Ok(())
    }

    /// Remove `length` characters starting at `offset`.
    pub fn remove(&mut self, offset: usize, length: usize) -> Result<()> {
        check_range(offset, length, self.len())?;
        self.rope.remove(offset..offset + length);
        Ok(())
    }

    /// Replace the whole content.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }
}

impl TextSource for SequenceBuffer {
    fn rope(&self) -> &Rope {
        &self.rope
    }
}
