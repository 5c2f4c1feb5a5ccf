//! Persistent stack of open spans.

use std::fmt;
use std::sync::Arc;

use crate::rules::HighlightingSpan;

struct Node {
    span: Arc<HighlightingSpan>,
    parent: SpanStack,
    depth: usize,
}

/// The spans open at a line boundary, innermost on top.
///
/// The stack is immutable and shares its tail, so storing one per line is cheap.
/// Equality compares spans by identity, element by element: spans come from the
/// definition's arena and are never recreated while highlighting.
#[derive(Clone, Default)]
pub struct SpanStack(Option<Arc<Node>>);

impl SpanStack {
    /// The empty stack.
    pub fn empty() -> Self {
        Self(None)
    }

    /// Whether no span is open.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Number of open spans.
    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |node| node.depth)
    }

    /// Innermost span.
    pub fn peek(&self) -> Option<&Arc<HighlightingSpan>> {
        self.0.as_ref().map(|node| &node.span)
    }

    /// A stack with `span` on top of this one.
    pub fn push(&self, span: Arc<HighlightingSpan>) -> Self {
        Self(Some(Arc::new(Node {
            span,
            parent: self.clone(),
            depth: self.len() + 1,
        })))
    }

    /// This stack without its innermost span. Popping the empty stack yields it again.
    pub fn pop(&self) -> Self {
        self.0
            .as_ref()
            .map_or_else(Self::empty, |node| node.parent.clone())
    }

    /// Spans from innermost to outermost.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<HighlightingSpan>> {
        let mut current = self.0.as_deref();
        std::iter::from_fn(move || {
            let node = current?;
            current = node.parent.0.as_deref();
            Some(&node.span)
        })
    }

    /// Whether both stacks are the very same object.
    pub fn ptr_eq(a: &SpanStack, b: &SpanStack) -> bool {
        match (&a.0, &b.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for SpanStack {
    fn eq(&self, other: &Self) -> bool {
        if SpanStack::ptr_eq(self, other) {
            return true;
        }
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

impl Eq for SpanStack {}

impl fmt::Debug for SpanStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|span| span.start.as_str()))
            .finish()
    }
}

impl fmt::Display for SpanStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for span in self.iter() {
            if !first {
                f.write_str(" < ")?;
            }
            first = false;
            write!(f, "{span}")?;
        }
        Ok(())
    }
}
