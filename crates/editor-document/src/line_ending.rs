//! Line terminator helpers.
//!
//! Documents keep their text exactly as given; `"\n"`, `"\r"` and `"\r\n"` all end a line.
//! The helpers here classify terminators, split text into lines and re-encode a text
//! with a single terminator for saving.

/// A line terminator sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NewLine {
    /// Unix-style LF (`'\n'`).
    Lf,
    /// Classic Mac-style CR (`'\r'`).
    Cr,
    /// Windows-style CRLF (`"\r\n"`).
    CrLf,
}

impl NewLine {
    /// Length of the terminator in characters.
    pub fn len(self) -> usize {
        match self {
            Self::Lf | Self::Cr => 1,
            Self::CrLf => 2,
        }
    }

    /// The terminator text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Cr => "\r",
            Self::CrLf => "\r\n",
        }
    }

    /// Detect the dominant line ending from a source text.
    ///
    /// Policy: the most frequent terminator wins; ties and texts without terminators
    /// resolve to [`NewLine::Lf`], then [`NewLine::CrLf`].
    pub fn detect_in_text(text: &str) -> Self {
        let (mut lf, mut cr, mut crlf) = (0usize, 0usize, 0usize);
        for (_, _, newline) in split_lines(text) {
            match newline {
                Some(Self::Lf) => lf += 1,
                Some(Self::Cr) => cr += 1,
                Some(Self::CrLf) => crlf += 1,
                None => {}
            }
        }
        if crlf > lf && crlf >= cr {
            Self::CrLf
        } else if cr > lf && cr > crlf {
            Self::Cr
        } else {
            Self::Lf
        }
    }

    /// Re-encode every terminator of `text` as this line ending.
    pub fn apply_to_text(self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for (line, _, newline) in split_lines(text) {
            out.push_str(line);
            if newline.is_some() {
                out.push_str(self.as_str());
            }
        }
        out
    }
}

/// Split `text` into `(content, content_char_len, terminator)` triples.
///
/// The last triple always has no terminator (it may be empty), so a text with `k`
/// terminators yields `k + 1` lines.
pub(crate) fn split_lines(text: &str) -> impl Iterator<Item = (&str, usize, Option<NewLine>)> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let current = rest?;
        let mut chars = 0;
        for (i, ch) in current.char_indices() {
            let newline = match ch {
                '\n' => NewLine::Lf,
                '\r' if current[i + 1..].starts_with('\n') => NewLine::CrLf,
                '\r' => NewLine::Cr,
                _ => {
                    chars += 1;
                    continue;
                }
            };
            rest = Some(&current[i + newline.as_str().len()..]);
            return Some((&current[..i], chars, Some(newline)));
        }
        rest = None;
        Some((current, chars, None))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_mixed_terminators() {
        let lines: Vec<_> = split_lines("a\r\nbc\rd\n").collect();
        assert_eq!(
            lines,
            vec![
                ("a", 1, Some(NewLine::CrLf)),
                ("bc", 2, Some(NewLine::Cr)),
                ("d", 1, Some(NewLine::Lf)),
                ("", 0, None),
            ]
        );
        assert_eq!(split_lines("").count(), 1);
    }

    #[test]
    fn test_detect_and_apply() {
        assert_eq!(NewLine::detect_in_text("a\r\nb\r\nc\n"), NewLine::CrLf);
        assert_eq!(NewLine::detect_in_text("a\rb"), NewLine::Cr);
        assert_eq!(NewLine::detect_in_text("abc"), NewLine::Lf);
        assert_eq!(NewLine::CrLf.apply_to_text("a\nb\rc"), "a\r\nb\r\nc");
    }
}
