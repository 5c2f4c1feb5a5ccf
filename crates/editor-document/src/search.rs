//! Plain-text search over rope slices.
//!
//! These are the primitives behind `index_of` / `last_index_of` on every
//! [`TextSource`](crate::TextSource). Results are character offsets relative to the start
//! of the searched slice.

use ropey::RopeSlice;
use ropey::str_utils::byte_to_char_idx;

/// How characters are compared when searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparison {
    /// Exact character comparison.
    #[default]
    Ordinal,
    /// Characters are compared after simple lowercase folding.
    OrdinalIgnoreCase,
}

fn fold_eq(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// First occurrence of `needle` in `haystack`.
///
/// An empty needle matches at offset 0.
pub(crate) fn index_of(haystack: RopeSlice<'_>, needle: &str, comparison: Comparison) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    match comparison {
        Comparison::Ordinal => {
            let text = haystack.to_string();
            text.find(needle).map(|byte| byte_to_char_idx(&text, byte))
        }
        Comparison::OrdinalIgnoreCase => {
            let needle: Vec<char> = needle.chars().collect();
            let hay: Vec<char> = haystack.chars().collect();
            (0..=hay.len().checked_sub(needle.len())?).find(|&start| {
                hay[start..start + needle.len()]
                    .iter()
                    .zip(&needle)
                    .all(|(&a, &b)| fold_eq(a, b))
            })
        }
    }
}

/// Last occurrence of `needle` in `haystack`.
///
/// An empty needle matches at the end of the slice.
pub(crate) fn last_index_of(
    haystack: RopeSlice<'_>,
    needle: &str,
    comparison: Comparison,
) -> Option<usize> {
    if needle.is_empty() {
        return Some(haystack.len_chars());
    }
    match comparison {
        Comparison::Ordinal => {
            let text = haystack.to_string();
            text.rfind(needle).map(|byte| byte_to_char_idx(&text, byte))
        }
        Comparison::OrdinalIgnoreCase => {
            let needle: Vec<char> = needle.chars().collect();
            let hay: Vec<char> = haystack.chars().collect();
            (0..=hay.len().checked_sub(needle.len())?).rev().find(|&start| {
                hay[start..start + needle.len()]
                    .iter()
                    .zip(&needle)
                    .all(|(&a, &b)| fold_eq(a, b))
            })
        }
    }
}

/// First occurrence of `ch` in `haystack`.
pub(crate) fn index_of_char(haystack: RopeSlice<'_>, ch: char) -> Option<usize> {
    haystack.chars().position(|c| c == ch)
}

/// Last occurrence of `ch` in `haystack`.
pub(crate) fn last_index_of_char(haystack: RopeSlice<'_>, ch: char) -> Option<usize> {
    let mut chars = haystack.chars_at(haystack.len_chars());
    let mut offset = haystack.len_chars();
    while let Some(c) = chars.prev() {
        offset -= 1;
        if c == ch {
            return Some(offset);
        }
    }
    None
}
