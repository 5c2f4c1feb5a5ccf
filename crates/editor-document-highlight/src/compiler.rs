//! Turns a [`SyntaxDefinition`] into a [`HighlightingDefinition`].
//!
//! The build runs in two phases. The first registers every rule set (named, main and
//! inline) and every named color, so later references can point anywhere. The second
//! compiles regexes, resolves references and flattens imports; imports are resolved
//! depth-first and a rule set reached again while it is still being flattened is an
//! import cycle.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tracing::{debug, trace};

use crate::color::{HighlightingColor, Rgba};
use crate::definition::{
    ColorDefinition, ColorRef, RuleSetDefinition, RuleSetElement, SpanDefinition, SpanRuleSet,
    SyntaxDefinition,
};
use crate::error::{HighlightError, Result};
use crate::manager::HighlightingManager;
use crate::rules::{
    HighlightingDefinition, HighlightingRule, HighlightingRuleSet, HighlightingSpan, RuleSetId,
};

impl HighlightingDefinition {
    /// Compile `definition`. `Lang/...` references are looked up in `manager`.
    pub fn build(
        definition: &SyntaxDefinition,
        manager: &HighlightingManager,
    ) -> Result<HighlightingDefinition> {
        let mut compiler = Compiler::new(definition, manager);
        compiler.register()?;
        compiler.compile_all()?;
        compiler.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    Pending,
    InProgress,
    Done,
}

struct Compiler<'a> {
    definition: &'a SyntaxDefinition,
    manager: &'a HighlightingManager,
    /// Local rule sets, indexed by their arena id.
    local: Vec<&'a RuleSetDefinition>,
    inline_ids: HashMap<*const RuleSetDefinition, usize>,
    named: HashMap<String, RuleSetId>,
    main: Option<RuleSetId>,
    colors: BTreeMap<String, Arc<HighlightingColor>>,
    state: Vec<BuildState>,
    compiled: Vec<Option<HighlightingRuleSet>>,
    /// Arena offset of every foreign definition copied in so far.
    foreign: HashMap<String, usize>,
}

impl<'a> Compiler<'a> {
    fn new(definition: &'a SyntaxDefinition, manager: &'a HighlightingManager) -> Self {
        Self {
            definition,
            manager,
            local: Vec::new(),
            inline_ids: HashMap::new(),
            named: HashMap::new(),
            main: None,
            colors: BTreeMap::new(),
            state: Vec::new(),
            compiled: Vec::new(),
            foreign: HashMap::new(),
        }
    }

    // ---- phase 1 ----

    fn register(&mut self) -> Result<()> {
        for (name, color) in &self.definition.colors {
            let color = parse_color(Some(name), color)?;
            self.colors.insert(name.clone(), Arc::new(color));
        }
        let definition = self.definition;
        for rule_set in &definition.rule_sets {
            let id = self.register_rule_set(rule_set)?;
            if rule_set.name.is_none() {
                if self.main.is_some() {
                    return Err(HighlightError::DuplicateRuleSet(format!(
                        "{}/ (main)",
                        definition.name
                    )));
                }
                self.main = Some(id);
            }
        }
        self.state = vec![BuildState::Pending; self.local.len()];
        self.compiled = (0..self.local.len()).map(|_| None).collect();
        Ok(())
    }

    fn register_rule_set(&mut self, rule_set: &'a RuleSetDefinition) -> Result<RuleSetId> {
        let id = RuleSetId(self.local.len());
        self.local.push(rule_set);
        self.inline_ids.insert(rule_set as *const _, id.0);
        if let Some(name) = &rule_set.name
            && self.named.insert(name.clone(), id).is_some()
        {
            return Err(HighlightError::DuplicateRuleSet(name.clone()));
        }
        for element in &rule_set.elements {
            if let RuleSetElement::Span(span) = element
                && let Some(SpanRuleSet::Inline(inner)) = &span.rule_set
            {
                self.register_rule_set(inner)?;
            }
        }
        Ok(id)
    }

    // ---- phase 2 ----

    fn compile_all(&mut self) -> Result<()> {
        for id in 0..self.local.len() {
            self.compile(id)?;
        }
        Ok(())
    }

    fn compile(&mut self, id: usize) -> Result<()> {
        let Some(state) = self.state.get(id).copied() else {
            // Foreign rule sets are copied in already compiled.
            return Ok(());
        };
        let source = self.local[id];
        match state {
            BuildState::Done => return Ok(()),
            BuildState::InProgress => {
                return Err(HighlightError::ImportCycle(
                    source.name.clone().unwrap_or_else(|| "(unnamed)".to_string()),
                ));
            }
            BuildState::Pending => {}
        }
        self.state[id] = BuildState::InProgress;

        let mut rule_set = HighlightingRuleSet {
            name: source.name.clone(),
            ..HighlightingRuleSet::default()
        };
        for element in &source.elements {
            match element {
                RuleSetElement::Span(span) => {
                    let span = self.compile_span(span, source.ignore_case)?;
                    rule_set.spans.push(Arc::new(span));
                }
                RuleSetElement::Rule(rule) => {
                    rule_set.rules.push(HighlightingRule {
                        regex: build_regex(&rule.pattern, source.ignore_case)?,
                        color: self.resolve_color(rule.color.as_ref())?,
                    });
                }
                RuleSetElement::Keywords(keywords) => {
                    let Some(pattern) = keyword_pattern(&keywords.words) else {
                        continue;
                    };
                    rule_set.rules.push(HighlightingRule {
                        regex: build_regex(&pattern, source.ignore_case)?,
                        color: self.resolve_color(keywords.color.as_ref())?,
                    });
                }
                RuleSetElement::Import(import) => {
                    let target = self.resolve_rule_set(&import.rule_set)?;
                    self.compile(target)?;
                    let imported = self
                        .compiled
                        .get(target)
                        .and_then(Option::as_ref)
                        .ok_or_else(|| HighlightError::UnknownRuleSet(import.rule_set.clone()))?;
                    rule_set.spans.extend(imported.spans.iter().cloned());
                    rule_set.rules.extend(imported.rules.iter().cloned());
                }
            }
        }
        trace!(
            rule_set = rule_set.name.as_deref().unwrap_or("(unnamed)"),
            spans = rule_set.spans.len(),
            rules = rule_set.rules.len(),
            "compiled rule set"
        );
        self.compiled[id] = Some(rule_set);
        self.state[id] = BuildState::Done;
        Ok(())
    }

    fn compile_span(&mut self, span: &SpanDefinition, ignore_case: bool) -> Result<HighlightingSpan> {
        let start = build_regex(&span.begin, ignore_case)?;
        let end = match (&span.end, span.multiline) {
            (Some(end), true) => Some(build_regex(end, ignore_case)?),
            (Some(end), false) => {
                build_regex(end, ignore_case)?;
                Some(build_regex(&format!("(?:{end})|$"), ignore_case)?)
            }
            (None, false) => Some(build_regex("$", ignore_case)?),
            (None, true) => None,
        };
        let rule_set = match &span.rule_set {
            None => None,
            Some(SpanRuleSet::Named(reference)) => Some(RuleSetId(self.resolve_rule_set(reference)?)),
            Some(SpanRuleSet::Inline(inner)) => self
                .inline_ids
                .get(&(inner as *const RuleSetDefinition))
                .map(|id| RuleSetId(*id)),
        };
        Ok(HighlightingSpan {
            start,
            end,
            rule_set,
            span_color: self.resolve_color(span.color.as_ref())?,
            start_color: self.resolve_color(span.begin_color.as_ref())?,
            end_color: self.resolve_color(span.end_color.as_ref())?,
            span_color_includes_start: span.span_color_includes_start,
            span_color_includes_end: span.span_color_includes_end,
        })
    }

    /// Arena index of the rule set named by `reference`.
    fn resolve_rule_set(&mut self, reference: &str) -> Result<usize> {
        let unknown = || HighlightError::UnknownRuleSet(reference.to_string());
        let Some((language, name)) = reference.split_once('/') else {
            return self.named.get(reference).map(|id| id.0).ok_or_else(unknown);
        };
        if language == self.definition.name {
            return match name {
                "" => self.main.map(|id| id.0),
                name => self.named.get(name).map(|id| id.0),
            }
            .ok_or_else(unknown);
        }
        let foreign = self
            .manager
            .definition(language)
            .ok_or_else(|| HighlightError::UnknownDefinition(language.to_string()))?;
        let id = match name {
            "" => foreign.main_rule_set_id(),
            name => foreign.named_rule_set_id(name).ok_or_else(unknown)?,
        };
        Ok(self.copy_foreign(&foreign) + id.0)
    }

    /// Append every rule set of `foreign` to the arena, once, and return the offset of
    /// its first rule set.
    fn copy_foreign(&mut self, foreign: &HighlightingDefinition) -> usize {
        if let Some(offset) = self.foreign.get(foreign.name()) {
            return *offset;
        }
        let offset = self.compiled.len();
        let mut copies: HashMap<*const HighlightingSpan, Arc<HighlightingSpan>> = HashMap::new();
        for rule_set in &foreign.rule_sets {
            let spans = rule_set
                .spans
                .iter()
                .map(|span| {
                    copies
                        .entry(Arc::as_ptr(span))
                        .or_insert_with(|| {
                            Arc::new(HighlightingSpan {
                                rule_set: span.rule_set.map(|id| RuleSetId(id.0 + offset)),
                                ..HighlightingSpan::clone(span)
                            })
                        })
                        .clone()
                })
                .collect();
            self.compiled.push(Some(HighlightingRuleSet {
                name: rule_set.name.clone(),
                spans,
                rules: rule_set.rules.clone(),
            }));
        }
        debug!(
            definition = %self.definition.name,
            foreign = %foreign.name(),
            rule_sets = foreign.rule_sets.len(),
            "copied foreign rule sets"
        );
        self.foreign.insert(foreign.name().to_string(), offset);
        offset
    }

    fn resolve_color(&self, color: Option<&ColorRef>) -> Result<Option<Arc<HighlightingColor>>> {
        let Some(color) = color else {
            return Ok(None);
        };
        let reference = match color {
            ColorRef::Inline(definition) => return Ok(Some(Arc::new(parse_color(None, definition)?))),
            ColorRef::Named(reference) => reference,
        };
        let unknown = || HighlightError::UnknownColor(reference.clone());
        match reference.split_once('/') {
            Some((language, name)) if language != self.definition.name => {
                let foreign = self
                    .manager
                    .definition(language)
                    .ok_or_else(|| HighlightError::UnknownDefinition(language.to_string()))?;
                foreign.named_color(name).cloned().map(Some).ok_or_else(unknown)
            }
            Some((_, name)) => self.colors.get(name).cloned().map(Some).ok_or_else(unknown),
            None => self.colors.get(reference).cloned().map(Some).ok_or_else(unknown),
        }
    }

    fn finish(self) -> Result<HighlightingDefinition> {
        let main = self
            .main
            .ok_or_else(|| HighlightError::MissingMainRuleSet(self.definition.name.clone()))?;
        let rule_sets: Vec<_> = self
            .compiled
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();
        debug!(
            definition = %self.definition.name,
            rule_sets = rule_sets.len(),
            colors = self.colors.len(),
            "highlighting definition built"
        );
        Ok(HighlightingDefinition {
            name: self.definition.name.clone(),
            extensions: self
                .definition
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            rule_sets,
            main,
            named_rule_sets: self.named,
            named_colors: self.colors,
            properties: self.definition.properties.clone(),
        })
    }
}

fn build_regex(pattern: &str, ignore_case: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|err| HighlightError::InvalidRegex {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })
}

fn parse_color(name: Option<&String>, definition: &ColorDefinition) -> Result<HighlightingColor> {
    Ok(HighlightingColor {
        name: name.cloned(),
        foreground: definition.foreground.as_deref().map(Rgba::parse).transpose()?,
        background: definition.background.as_deref().map(Rgba::parse).transpose()?,
        font_weight: definition.font_weight,
        font_style: definition.font_style,
        underline: definition.underline,
    })
}

/// One alternation matching any of `words`, longest first. Word boundaries are added on
/// the sides where every word starts or ends with a word character.
fn keyword_pattern(words: &[String]) -> Option<String> {
    let mut words: Vec<&str> = words
        .iter()
        .map(String::as_str)
        .filter(|word| !word.is_empty())
        .collect();
    if words.is_empty() {
        return None;
    }
    words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    words.dedup();

    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let word_start = words
        .iter()
        .all(|word| word.chars().next().is_some_and(is_word));
    let word_end = words
        .iter()
        .all(|word| word.chars().next_back().is_some_and(is_word));
    let alternation = words
        .iter()
        .map(|word| regex::escape(word))
        .collect::<Vec<_>>()
        .join("|");
    Some(format!(
        "{}(?:{alternation}){}",
        if word_start { r"\b" } else { "" },
        if word_end { r"\b" } else { "" }
    ))
}
