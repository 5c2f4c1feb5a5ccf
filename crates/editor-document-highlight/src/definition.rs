//! Plain-data highlighting definitions.
//!
//! These types mirror what a grammar file describes and derive [`Deserialize`], so a
//! host can load them from whatever format it prefers. They are compiled into a
//! [`HighlightingDefinition`](crate::HighlightingDefinition) before use.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::color::{FontStyle, FontWeight};

/// A complete highlighting definition for one language.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyntaxDefinition {
    /// Language name, used for registry lookups and `Name/RuleSet` references.
    pub name: String,
    /// File extensions (with or without the leading dot).
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Named colors, referenced by name from rules and spans.
    #[serde(default)]
    pub colors: BTreeMap<String, ColorDefinition>,
    /// Rule sets; exactly one of them must be unnamed (the main rule set).
    #[serde(default)]
    pub rule_sets: Vec<RuleSetDefinition>,
    /// Free-form properties such as `line_comment`.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Visual attributes of a color, as written in a definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ColorDefinition {
    /// `#rrggbb` or `#rrggbbaa`.
    #[serde(default)]
    pub foreground: Option<String>,
    /// `#rrggbb` or `#rrggbbaa`.
    #[serde(default)]
    pub background: Option<String>,
    /// Font weight.
    #[serde(default)]
    pub font_weight: Option<FontWeight>,
    /// Font style.
    #[serde(default)]
    pub font_style: Option<FontStyle>,
    /// Underline.
    #[serde(default)]
    pub underline: Option<bool>,
}

/// A color given by name or inline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColorRef {
    /// Reference to a named color: `"Name"` for a local color, `"Lang/Name"` for a color of
    /// another registered definition.
    Named(String),
    /// Anonymous color.
    Inline(ColorDefinition),
}

/// A list of spans, rules, keyword lists and imports active at one nesting level.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSetDefinition {
    /// Name; `None` for the main rule set and for inline rule sets.
    #[serde(default)]
    pub name: Option<String>,
    /// Match patterns of this rule set case-insensitively.
    #[serde(default)]
    pub ignore_case: bool,
    /// Elements, in priority order.
    #[serde(default)]
    pub elements: Vec<RuleSetElement>,
}

/// One element of a rule set.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleSetElement {
    /// A delimited region with its own rule set.
    Span(SpanDefinition),
    /// A plain regex rule.
    Rule(RuleDefinition),
    /// A keyword list.
    Keywords(KeywordsDefinition),
    /// Pulls every element of another rule set into this one.
    Import(ImportDefinition),
}

/// A span: text between a start and an end pattern.
#[derive(Debug, Clone, Deserialize)]
pub struct SpanDefinition {
    /// Start pattern.
    pub begin: String,
    /// End pattern. A single-line span without one ends at the end of the line; a
    /// multi-line span without one never ends.
    #[serde(default)]
    pub end: Option<String>,
    /// Whether the span may continue on following lines.
    #[serde(default)]
    pub multiline: bool,
    /// Color of the span's content.
    #[serde(default)]
    pub color: Option<ColorRef>,
    /// Color of the text matched by the start pattern.
    #[serde(default)]
    pub begin_color: Option<ColorRef>,
    /// Color of the text matched by the end pattern.
    #[serde(default)]
    pub end_color: Option<ColorRef>,
    /// Rule set active inside the span.
    #[serde(default)]
    pub rule_set: Option<SpanRuleSet>,
    /// Whether [`color`](Self::color) also covers the start delimiter.
    #[serde(default = "default_true")]
    pub span_color_includes_start: bool,
    /// Whether [`color`](Self::color) also covers the end delimiter.
    #[serde(default = "default_true")]
    pub span_color_includes_end: bool,
}

/// Rule set used inside a span.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SpanRuleSet {
    /// `"Name"`, `"Lang/Name"` or `"Lang/"` (the main rule set of `Lang`).
    Named(String),
    /// A rule set defined in place.
    Inline(RuleSetDefinition),
}

/// A regex rule colouring every match.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDefinition {
    /// Pattern; must never match empty text.
    pub pattern: String,
    /// Color of matches.
    #[serde(default)]
    pub color: Option<ColorRef>,
}

/// A list of literal words sharing one color.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordsDefinition {
    /// The words.
    pub words: Vec<String>,
    /// Color of the words.
    #[serde(default)]
    pub color: Option<ColorRef>,
}

/// Import of another rule set.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportDefinition {
    /// `"Name"`, `"Lang/Name"` or `"Lang/"`.
    pub rule_set: String,
}

fn default_true() -> bool {
    true
}

impl SpanDefinition {
    /// A span with the given delimiters and defaults for everything else.
    pub fn new(begin: impl Into<String>, end: Option<&str>) -> Self {
        Self {
            begin: begin.into(),
            end: end.map(str::to_string),
            multiline: false,
            color: None,
            begin_color: None,
            end_color: None,
            rule_set: None,
            span_color_includes_start: true,
            span_color_includes_end: true,
        }
    }
}
