//! Built-in definitions registered by [`HighlightingManager::with_builtins`].
//!
//! [`HighlightingManager::with_builtins`]: crate::HighlightingManager::with_builtins

use std::collections::BTreeMap;

use crate::color::FontWeight;
use crate::definition::{
    ColorDefinition, ColorRef, KeywordsDefinition, RuleDefinition, RuleSetDefinition,
    RuleSetElement, SpanDefinition, SpanRuleSet, SyntaxDefinition,
};

/// Every built-in definition.
pub fn definitions() -> Vec<SyntaxDefinition> {
    vec![json(), ini()]
}

fn color(foreground: &str) -> ColorDefinition {
    ColorDefinition {
        foreground: Some(foreground.to_string()),
        ..ColorDefinition::default()
    }
}

fn named(name: &str) -> Option<ColorRef> {
    Some(ColorRef::Named(name.to_string()))
}

fn rule(pattern: &str, color: &str) -> RuleSetElement {
    RuleSetElement::Rule(RuleDefinition {
        pattern: pattern.to_string(),
        color: named(color),
    })
}

fn keywords(words: &[&str], color: &str) -> RuleSetElement {
    RuleSetElement::Keywords(KeywordsDefinition {
        words: words.iter().map(|w| w.to_string()).collect(),
        color: named(color),
    })
}

/// JSON: strings with escapes, numbers, booleans and `null`.
pub fn json() -> SyntaxDefinition {
    // Escapes are spans so that an escaped quote is consumed before the end pattern
    // can see it.
    let mut escape = SpanDefinition::new(r"\\", Some(r#"["\\/bfnrt]|u[0-9a-fA-F]{4}|."#));
    escape.color = named("Escape");

    let mut string = SpanDefinition::new("\"", Some("\""));
    string.color = named("String");
    string.rule_set = Some(SpanRuleSet::Inline(RuleSetDefinition {
        elements: vec![RuleSetElement::Span(escape)],
        ..RuleSetDefinition::default()
    }));

    let colors = BTreeMap::from([
        ("String".to_string(), color("#a31515")),
        ("Escape".to_string(), color("#ee0000")),
        ("Number".to_string(), color("#098658")),
        ("Boolean".to_string(), color("#0000ff")),
        (
            "Null".to_string(),
            ColorDefinition {
                font_weight: Some(FontWeight::Bold),
                ..color("#0000ff")
            },
        ),
        ("Punctuation".to_string(), color("#000000")),
    ]);

    SyntaxDefinition {
        name: "JSON".to_string(),
        extensions: vec![".json".to_string()],
        colors,
        rule_sets: vec![RuleSetDefinition {
            elements: vec![
                RuleSetElement::Span(string),
                rule(r"-?(?:0|[1-9]\d*)(?:\.\d+)?(?:[eE][+-]?\d+)?", "Number"),
                keywords(&["true", "false"], "Boolean"),
                keywords(&["null"], "Null"),
                rule(r"[{}\[\],:]", "Punctuation"),
            ],
            ..RuleSetDefinition::default()
        }],
        properties: BTreeMap::new(),
    }
}

/// INI: sections, keys and `;`/`#` comments.
pub fn ini() -> SyntaxDefinition {
    let mut comment = SpanDefinition::new(r"^\s*[;#]", None);
    comment.color = named("Comment");

    let colors = BTreeMap::from([
        (
            "Section".to_string(),
            ColorDefinition {
                font_weight: Some(FontWeight::Bold),
                ..color("#800080")
            },
        ),
        ("Key".to_string(), color("#0451a5")),
        ("Comment".to_string(), color("#008000")),
    ]);

    SyntaxDefinition {
        name: "INI".to_string(),
        extensions: [".ini", ".cfg", ".conf", ".properties"]
            .map(String::from)
            .to_vec(),
        colors,
        rule_sets: vec![RuleSetDefinition {
            elements: vec![
                RuleSetElement::Span(comment),
                rule(r"^\s*\[[^\]]+\]", "Section"),
                rule(r"^\s*[^=;#\[\s][^=]*=", "Key"),
            ],
            ..RuleSetDefinition::default()
        }],
        properties: BTreeMap::from([("line_comment".to_string(), ";".to_string())]),
    }
}
