//! Line-by-line regex highlighting driven by a span stack.
//!
//! At every step the engine looks for the earliest of: a start match of any span in
//! the active rule set, or the end match of the innermost open span. The end wins ties.
//! Text before that match is coloured by the rule set's plain rules. Opening a span
//! pushes it and activates its rule set; closing pops it. Spans left open at the end of
//! a line stay on the stack for the next line.

use std::mem;
use std::sync::Arc;

use editor_document::DocumentLine;
use regex::Regex;
use tracing::trace;

use crate::color::HighlightingColor;
use crate::error::{HighlightError, Result};
use crate::rules::{HighlightingDefinition, HighlightingRuleSet, HighlightingSpan};
use crate::span_stack::SpanStack;

/// A coloured run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightedSection {
    /// Document offset of the run.
    pub offset: usize,
    /// Length of the run in characters.
    pub length: usize,
    /// Color of the run.
    pub color: Arc<HighlightingColor>,
}

impl HighlightedSection {
    /// Offset right after the run.
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }
}

/// Highlighting result for one line.
///
/// Sections are ordered, do not overlap, and cover only coloured text.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightedLine {
    /// Line number (1-based).
    pub line_number: usize,
    /// Document offset of the line start.
    pub offset: usize,
    /// Length of the line content, without its terminator.
    pub length: usize,
    /// Coloured runs.
    pub sections: Vec<HighlightedSection>,
}

impl HighlightedLine {
    /// Color at document offset `offset`, if that character is coloured.
    pub fn color_at(&self, offset: usize) -> Option<&Arc<HighlightingColor>> {
        let index = self
            .sections
            .partition_point(|section| section.end_offset() <= offset);
        self.sections
            .get(index)
            .filter(|section| section.offset <= offset)
            .map(|section| &section.color)
    }
}

/// Highlights single lines, carrying the span stack from one line to the next.
#[derive(Debug, Clone)]
pub struct HighlightingEngine {
    definition: Arc<HighlightingDefinition>,
    span_stack: SpanStack,
}

impl HighlightingEngine {
    /// An engine starting with no open span.
    pub fn new(definition: Arc<HighlightingDefinition>) -> Self {
        Self {
            definition,
            span_stack: SpanStack::empty(),
        }
    }

    /// The definition in use.
    pub fn definition(&self) -> &Arc<HighlightingDefinition> {
        &self.definition
    }

    /// Spans open before the next line.
    pub fn span_stack(&self) -> &SpanStack {
        &self.span_stack
    }

    /// Set the spans open before the next line.
    pub fn set_span_stack(&mut self, span_stack: SpanStack) {
        self.span_stack = span_stack;
    }

    /// Rule set active at the current span stack.
    pub fn current_rule_set(&self) -> &HighlightingRuleSet {
        active_rule_set(&self.definition, &self.span_stack)
    }

    /// Highlight `text`, the content of `line`, and advance the span stack past it.
    pub fn highlight_line(&mut self, line: &DocumentLine, text: &str) -> Result<HighlightedLine> {
        let mut sections = SectionBuilder::new(text, line.offset);
        self.run(text, Some(&mut sections))?;
        let sections = sections.finish();
        trace!(
            line = line.line_number,
            sections = sections.len(),
            depth = self.span_stack.len(),
            "highlighted line"
        );
        Ok(HighlightedLine {
            line_number: line.line_number,
            offset: line.offset,
            length: line.length,
            sections,
        })
    }

    /// Advance the span stack past `text` without producing sections. Plain rules cannot
    /// open or close spans, so they are skipped.
    pub fn scan_line(&mut self, text: &str) -> Result<()> {
        self.run(text, None)
    }

    fn run(&mut self, text: &str, mut sections: Option<&mut SectionBuilder<'_>>) -> Result<()> {
        let definition = Arc::clone(&self.definition);
        let mut stack = self.span_stack.clone();
        let mut rule_set = active_rule_set(&definition, &stack);
        let mut position = 0;
        let mut starts = vec![Slot::Unsearched; rule_set.spans.len()];
        let mut parents: Vec<Vec<Slot>> = Vec::new();
        let mut empty_start_at = None;

        if let Some(sections) = sections.as_deref_mut() {
            sections.reset(&stack);
        }

        loop {
            for (slot, span) in starts.iter_mut().zip(&rule_set.spans) {
                if slot.is_stale(position) {
                    *slot = Slot::find(&span.start, text, position);
                }
            }
            let end = stack
                .peek()
                .and_then(|span| span.end.as_ref())
                .and_then(|end| end.find_at(text, position))
                .map(|m| (m.start(), m.end()));
            let start = earliest(&starts);

            let step = match (end, start) {
                (Some(end), Some((_, start, _))) if end.0 <= start => Step::Close(end),
                (Some(end), None) => Step::Close(end),
                (_, Some(start)) => Step::Open(start),
                (None, None) => break,
            };

            match step {
                Step::Close((match_start, match_end)) => {
                    let Some(span) = stack.peek().cloned() else {
                        break;
                    };
                    if let Some(sections) = sections.as_deref_mut() {
                        highlight_rules(rule_set, text, position, match_start, sections)?;
                        sections.advance(match_start);
                        if !span.span_color_includes_end {
                            sections.pop();
                        }
                        sections.push(span.end_color.clone());
                        sections.advance(match_end);
                        sections.pop();
                        if span.span_color_includes_end {
                            sections.pop();
                        }
                    }
                    position = match_end;
                    stack = stack.pop();
                    rule_set = active_rule_set(&definition, &stack);
                    match parents.pop() {
                        Some(parent) => {
                            starts = parent;
                            let reopened = rule_set
                                .spans
                                .iter()
                                .position(|candidate| Arc::ptr_eq(candidate, &span))
                                .and_then(|index| starts.get(index));
                            if let Some(Slot::Found { start, .. }) = reopened
                                && *start == position
                            {
                                return Err(zero_length_span(&span));
                            }
                        }
                        None => starts = vec![Slot::Unsearched; rule_set.spans.len()],
                    }
                }
                Step::Open((index, match_start, match_end)) => {
                    let span = Arc::clone(&rule_set.spans[index]);
                    if match_start == match_end {
                        if empty_start_at == Some(match_start) {
                            return Err(zero_length_span(&span));
                        }
                        empty_start_at = Some(match_start);
                    }
                    if let Some(sections) = sections.as_deref_mut() {
                        highlight_rules(rule_set, text, position, match_start, sections)?;
                        sections.advance(match_start);
                        if span.span_color_includes_start {
                            sections.push(span.span_color.clone());
                        }
                        sections.push(span.start_color.clone());
                        sections.advance(match_end);
                        sections.pop();
                        if !span.span_color_includes_start {
                            sections.push(span.span_color.clone());
                        }
                    }
                    position = match_end;
                    stack = stack.push(span);
                    rule_set = active_rule_set(&definition, &stack);
                    let nested = vec![Slot::Unsearched; rule_set.spans.len()];
                    parents.push(mem::replace(&mut starts, nested));
                }
            }
        }

        if let Some(sections) = sections {
            highlight_rules(rule_set, text, position, text.len(), sections)?;
            sections.advance(text.len());
        }
        self.span_stack = stack;
        Ok(())
    }
}

fn active_rule_set<'d>(
    definition: &'d HighlightingDefinition,
    stack: &SpanStack,
) -> &'d HighlightingRuleSet {
    match stack.peek() {
        Some(span) => definition.rule_set_for_span(span),
        None => definition.main_rule_set(),
    }
}

fn zero_length_span(span: &HighlightingSpan) -> HighlightError {
    HighlightError::ZeroLengthSpan {
        start: span.start.as_str().to_string(),
        end: span.end_pattern().to_string(),
    }
}

enum Step {
    Close((usize, usize)),
    Open((usize, usize, usize)),
}

/// Last search result of one pattern, in byte offsets.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Unsearched,
    Missing,
    Found { start: usize, end: usize },
}

impl Slot {
    fn find(regex: &Regex, haystack: &str, from: usize) -> Self {
        match regex.find_at(haystack, from) {
            Some(m) => Slot::Found {
                start: m.start(),
                end: m.end(),
            },
            None => Slot::Missing,
        }
    }

    /// Search `text[from..until]` with the whole line as context, so `$` and `\b` see
    /// the real neighbours of the gap. A match running past `until` is retried on the
    /// gap alone.
    fn find_within(regex: &Regex, text: &str, from: usize, until: usize) -> Self {
        match regex.find_at(text, from) {
            Some(m) if m.end() <= until => Slot::Found {
                start: m.start(),
                end: m.end(),
            },
            Some(m) if m.start() < until => Slot::find(regex, &text[..until], from),
            _ => Slot::Missing,
        }
    }

    /// A match before `position` must be searched again; a failed search stays failed.
    fn is_stale(&self, position: usize) -> bool {
        match self {
            Slot::Unsearched => true,
            Slot::Missing => false,
            Slot::Found { start, .. } => *start < position,
        }
    }
}

/// Earliest found slot as `(index, start, end)`; the lowest index wins ties.
fn earliest(slots: &[Slot]) -> Option<(usize, usize, usize)> {
    let mut best: Option<(usize, usize, usize)> = None;
    for (index, slot) in slots.iter().enumerate() {
        if let Slot::Found { start, end } = *slot
            && best.is_none_or(|(_, best_start, _)| start < best_start)
        {
            best = Some((index, start, end));
        }
    }
    best
}

/// Colour `text[from..until]` with the plain rules of `rule_set`.
fn highlight_rules(
    rule_set: &HighlightingRuleSet,
    text: &str,
    from: usize,
    until: usize,
    sections: &mut SectionBuilder<'_>,
) -> Result<()> {
    if from >= until || rule_set.rules.is_empty() {
        return Ok(());
    }
    let mut position = from;
    let mut slots = vec![Slot::Unsearched; rule_set.rules.len()];
    loop {
        for (slot, rule) in slots.iter_mut().zip(&rule_set.rules) {
            if slot.is_stale(position) {
                *slot = Slot::find_within(&rule.regex, text, position, until);
            }
        }
        let Some((index, start, end)) = earliest(&slots) else {
            break;
        };
        let rule = &rule_set.rules[index];
        if start == end {
            return Err(HighlightError::ZeroLengthRule {
                pattern: rule.regex.as_str().to_string(),
            });
        }
        sections.advance(start);
        sections.push(rule.color.clone());
        sections.advance(end);
        sections.pop();
        position = end;
    }
    Ok(())
}

/// Flattens the colour stack into non-overlapping sections as the scan advances.
struct SectionBuilder<'t> {
    text: &'t str,
    line_offset: usize,
    colors: Vec<Option<Arc<HighlightingColor>>>,
    byte: usize,
    chars: usize,
    sections: Vec<HighlightedSection>,
}

impl<'t> SectionBuilder<'t> {
    fn new(text: &'t str, line_offset: usize) -> Self {
        Self {
            text,
            line_offset,
            colors: Vec::new(),
            byte: 0,
            chars: 0,
            sections: Vec::new(),
        }
    }

    /// Seed the colour stack with the spans still open from previous lines.
    fn reset(&mut self, stack: &SpanStack) {
        let mut spans: Vec<_> = stack.iter().collect();
        spans.reverse();
        self.colors = spans.into_iter().map(|span| span.span_color.clone()).collect();
    }

    fn push(&mut self, color: Option<Arc<HighlightingColor>>) {
        self.colors.push(color);
    }

    fn pop(&mut self) {
        self.colors.pop();
    }

    /// Colour everything up to byte `until` with the innermost colour.
    fn advance(&mut self, until: usize) {
        if until <= self.byte {
            return;
        }
        let length = self.text[self.byte..until].chars().count();
        let offset = self.line_offset + self.chars;
        self.byte = until;
        self.chars += length;

        let Some(color) = self.colors.iter().rev().flatten().next() else {
            return;
        };
        match self.sections.last_mut() {
            Some(last) if Arc::ptr_eq(&last.color, color) && last.end_offset() == offset => {
                last.length += length;
            }
            _ => self.sections.push(HighlightedSection {
                offset,
                length,
                color: Arc::clone(color),
            }),
        }
    }

    fn finish(self) -> Vec<HighlightedSection> {
        self.sections
    }
}
