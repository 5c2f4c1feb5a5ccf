//! Compiled highlighting definitions.
//!
//! A definition owns all of its rule sets in one arena; spans refer to the rule set they
//! activate by [`RuleSetId`]. Rule sets borrowed from other definitions are copied into
//! the arena at build time, so a definition is self-contained.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::color::HighlightingColor;

/// Index of a rule set inside its [`HighlightingDefinition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleSetId(pub(crate) usize);

/// A compiled, immutable highlighting definition.
#[derive(Debug)]
pub struct HighlightingDefinition {
    pub(crate) name: String,
    pub(crate) extensions: Vec<String>,
    pub(crate) rule_sets: Vec<HighlightingRuleSet>,
    pub(crate) main: RuleSetId,
    pub(crate) named_rule_sets: HashMap<String, RuleSetId>,
    pub(crate) named_colors: BTreeMap<String, Arc<HighlightingColor>>,
    pub(crate) properties: BTreeMap<String, String>,
}

static EMPTY_RULE_SET: HighlightingRuleSet = HighlightingRuleSet {
    name: None,
    spans: Vec::new(),
    rules: Vec::new(),
};

impl HighlightingDefinition {
    /// Language name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File extensions handled by this definition, without leading dots.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// The main rule set, active outside of any span.
    pub fn main_rule_set(&self) -> &HighlightingRuleSet {
        self.rule_set(self.main)
    }

    /// Id of the main rule set.
    pub fn main_rule_set_id(&self) -> RuleSetId {
        self.main
    }

    /// Rule set by id. Ids always come from this definition.
    pub fn rule_set(&self, id: RuleSetId) -> &HighlightingRuleSet {
        self.rule_sets.get(id.0).unwrap_or(&EMPTY_RULE_SET)
    }

    /// Named rule set.
    pub fn named_rule_set(&self, name: &str) -> Option<&HighlightingRuleSet> {
        self.named_rule_sets.get(name).map(|id| self.rule_set(*id))
    }

    /// Id of a named rule set.
    pub fn named_rule_set_id(&self, name: &str) -> Option<RuleSetId> {
        self.named_rule_sets.get(name).copied()
    }

    /// Rule set active inside `span`; a span without one has no nested rules.
    pub fn rule_set_for_span(&self, span: &HighlightingSpan) -> &HighlightingRuleSet {
        span.rule_set.map_or(&EMPTY_RULE_SET, |id| self.rule_set(id))
    }

    /// Named color.
    pub fn named_color(&self, name: &str) -> Option<&Arc<HighlightingColor>> {
        self.named_colors.get(name)
    }

    /// All named colors.
    pub fn named_colors(&self) -> impl Iterator<Item = &Arc<HighlightingColor>> {
        self.named_colors.values()
    }

    /// Definition property such as `line_comment`.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Number of rule sets in the arena, including copies of foreign rule sets.
    pub fn rule_set_count(&self) -> usize {
        self.rule_sets.len()
    }
}

impl fmt::Display for HighlightingDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[HighlightingDefinition {}]", self.name)
    }
}

/// Spans and rules active at one nesting level.
#[derive(Debug, Clone, Default)]
pub struct HighlightingRuleSet {
    /// Name, if the rule set was named.
    pub name: Option<String>,
    /// Spans, in priority order.
    pub spans: Vec<Arc<HighlightingSpan>>,
    /// Plain rules, in priority order.
    pub rules: Vec<HighlightingRule>,
}

/// A compiled span.
///
/// Spans are shared through `Arc`; the span stack compares them by identity.
#[derive(Debug, Clone)]
pub struct HighlightingSpan {
    /// Start pattern.
    pub start: Regex,
    /// End pattern; `None` for a multi-line span that never ends.
    pub end: Option<Regex>,
    /// Rule set active inside the span.
    pub rule_set: Option<RuleSetId>,
    /// Color of the span content.
    pub span_color: Option<Arc<HighlightingColor>>,
    /// Color of the start delimiter.
    pub start_color: Option<Arc<HighlightingColor>>,
    /// Color of the end delimiter.
    pub end_color: Option<Arc<HighlightingColor>>,
    /// Whether the span color also covers the start delimiter.
    pub span_color_includes_start: bool,
    /// Whether the span color also covers the end delimiter.
    pub span_color_includes_end: bool,
}

impl HighlightingSpan {
    pub(crate) fn end_pattern(&self) -> &str {
        self.end.as_ref().map_or("", Regex::as_str)
    }
}

impl fmt::Display for HighlightingSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[HighlightingSpan start={} end={}]",
            self.start.as_str(),
            self.end_pattern()
        )
    }
}

/// A compiled plain rule.
#[derive(Debug, Clone)]
pub struct HighlightingRule {
    /// Pattern.
    pub regex: Regex,
    /// Color of matches.
    pub color: Option<Arc<HighlightingColor>>,
}

impl fmt::Display for HighlightingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[HighlightingRule {}]", self.regex.as_str())
    }
}
