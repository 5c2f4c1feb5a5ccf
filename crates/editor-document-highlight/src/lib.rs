#![warn(missing_docs)]
//! `editor-document-highlight` - incremental regex highlighting for `editor-document`.
//!
//! A [`HighlightingDefinition`] is a graph of rule sets made of spans (text between a
//! start and an end pattern, e.g. strings and comments) and plain rules (keywords,
//! numbers). The [`HighlightingEngine`] highlights one line at a time and carries the
//! stack of open spans over to the next line. The [`DocumentHighlighter`] caches that
//! stack for every line of a [`TextDocument`](editor_document::TextDocument) and
//! rescans only what an edit actually changed.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  DocumentHighlighter (cache, watermark)      │  ← per document
//! ├──────────────────────────────────────────────┤
//! │  HighlightingEngine (span stack, sections)   │  ← per line
//! ├──────────────────────────────────────────────┤
//! │  HighlightingDefinition (compiled rule sets) │  ← shared, immutable
//! ├──────────────────────────────────────────────┤
//! │  SyntaxDefinition (serde data model)         │  ← loaded by the host
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use editor_document::TextDocument;
//! use editor_document_highlight::{DocumentHighlighter, HighlightingManager};
//!
//! let manager = HighlightingManager::with_builtins().unwrap();
//! let json = manager.definition_by_extension("json").unwrap();
//!
//! let mut doc = TextDocument::new("{\"answer\": 42}");
//! let mut highlighter = DocumentHighlighter::new(&mut doc, json);
//!
//! let line = highlighter.highlight_line(&doc, 1).unwrap();
//! let number = line.color_at(11).unwrap();
//! assert_eq!(number.name.as_deref(), Some("Number"));
//! ```
//!
//! All offsets are character offsets, like everywhere in `editor-document`.

pub mod builtin;
pub mod color;
mod compiler;
pub mod definition;
pub mod engine;
pub mod error;
pub mod highlighter;
pub mod manager;
pub mod rules;
pub mod span_stack;

pub use color::{FontStyle, FontWeight, HighlightingColor, Rgba};
pub use definition::{
    ColorDefinition, ColorRef, ImportDefinition, KeywordsDefinition, RuleDefinition,
    RuleSetDefinition, RuleSetElement, SpanDefinition, SpanRuleSet, SyntaxDefinition,
};
pub use engine::{HighlightedLine, HighlightedSection, HighlightingEngine};
pub use error::{HighlightError, Result};
pub use highlighter::{DocumentHighlighter, HighlightingStateChanged, StateListenerId};
pub use manager::HighlightingManager;
pub use rules::{
    HighlightingDefinition, HighlightingRule, HighlightingRuleSet, HighlightingSpan, RuleSetId,
};
pub use span_stack::SpanStack;
