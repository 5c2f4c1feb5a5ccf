use std::sync::Arc;

use editor_document::TextDocument;
use editor_document_highlight::{
    DocumentHighlighter, FontStyle, FontWeight, HighlightError, HighlightedLine,
    HighlightingDefinition, HighlightingManager, Rgba, SyntaxDefinition,
};
use pretty_assertions::assert_eq;

fn load(manager: &mut HighlightingManager, yaml: &str) -> Arc<HighlightingDefinition> {
    let syntax: SyntaxDefinition = serde_yaml::from_str(yaml).expect("parse definition");
    manager.register_syntax(&syntax).expect("compile definition")
}

fn compile(yaml: &str) -> Result<Arc<HighlightingDefinition>, HighlightError> {
    let syntax: SyntaxDefinition = serde_yaml::from_str(yaml).expect("parse definition");
    HighlightingManager::new().register_syntax(&syntax)
}

fn runs(line: &HighlightedLine) -> Vec<(usize, usize, &str)> {
    line.sections
        .iter()
        .map(|s| (s.offset, s.end_offset(), s.color.name.as_deref().unwrap_or("")))
        .collect()
}

fn name_at(line: &HighlightedLine, offset: usize) -> Option<&str> {
    line.color_at(offset).and_then(|color| color.name.as_deref())
}

#[test]
fn test_yaml_definition_is_loaded() {
    let mut manager = HighlightingManager::new();
    let c_lite = load(&mut manager, include_str!("fixtures/c-lite.yaml"));

    assert_eq!(c_lite.name(), "C-Lite");
    assert_eq!(c_lite.extensions(), ["cl", "clh"]);
    assert_eq!(c_lite.property("line_comment"), Some("//"));
    assert!(c_lite.named_rule_set("Literals").is_some());
    assert!(c_lite.named_rule_set("StringContent").is_some());
    assert!(c_lite.named_rule_set("Missing").is_none());
    assert_eq!(c_lite.main_rule_set().spans.len(), 3);

    let keyword = c_lite.named_color("Keyword").unwrap();
    assert_eq!(keyword.foreground, Some(Rgba::rgb(0, 0, 0xff)));
    assert_eq!(keyword.font_weight, Some(FontWeight::Bold));
    let comment = c_lite.named_color("Comment").unwrap();
    assert_eq!(comment.font_style, Some(FontStyle::Italic));
    assert_eq!(c_lite.named_colors().count(), 5);

    assert_eq!(manager.definition_by_extension(".CLH").unwrap().name(), "C-Lite");
}

#[test]
fn test_escape_uses_inline_color() {
    let mut manager = HighlightingManager::new();
    let c_lite = load(&mut manager, include_str!("fixtures/c-lite.yaml"));
    let mut doc = TextDocument::new(r#"return "a\"b";"#);
    let mut highlighter = DocumentHighlighter::new(&mut doc, c_lite);

    let line = highlighter.highlight_line(&doc, 1).unwrap();
    assert_eq!(name_at(&line, 0), Some("Keyword"));
    assert_eq!(name_at(&line, 7), Some("Delimiter"));
    assert_eq!(name_at(&line, 8), Some("String"));
    // The escaped quote does not close the string.
    let escape = line.color_at(9).unwrap();
    assert_eq!(escape.name, None);
    assert_eq!(escape.foreground, Some(Rgba::rgb(0xee, 0, 0)));
    assert_eq!(name_at(&line, 11), Some("String"));
    assert_eq!(name_at(&line, 12), Some("Delimiter"));
    assert_eq!(name_at(&line, 13), None);
}

#[test]
fn test_embedded_language_between_tags() {
    let mut manager = HighlightingManager::new();
    let c_lite = load(&mut manager, include_str!("fixtures/c-lite.yaml"));
    let page = load(&mut manager, include_str!("fixtures/page.yaml"));
    assert!(page.rule_set_count() > c_lite.rule_set_count());

    let mut doc = TextDocument::new("<SCRIPT>\nint x = 1; // hi\n</Script><p>");
    let mut highlighter = DocumentHighlighter::new(&mut doc, page);

    let open = highlighter.highlight_line(&doc, 1).unwrap();
    assert_eq!(runs(&open), vec![(0, 8, "Tag")]);
    assert_eq!(highlighter.span_stack(&doc, 1).unwrap().len(), 1);

    let code = highlighter.highlight_line(&doc, 2).unwrap();
    assert_eq!(
        runs(&code),
        vec![(9, 12, "Keyword"), (17, 18, "Number"), (20, 25, "Comment")]
    );
    // The line comment ends with its line; the script block does not.
    assert_eq!(highlighter.span_stack(&doc, 2).unwrap().len(), 1);

    let close = highlighter.highlight_line(&doc, 3).unwrap();
    assert_eq!(runs(&close), vec![(26, 38, "Tag")]);
    assert!(highlighter.span_stack(&doc, 3).unwrap().is_empty());
}

#[test]
fn test_builtin_json() {
    let manager = HighlightingManager::with_builtins().unwrap();
    let json = manager.definition_by_extension("JSON").unwrap();
    let mut doc = TextDocument::new("{\"a\": \"x\\n\", \"n\": -1.5e3}\n[true, null]");
    let mut highlighter = DocumentHighlighter::new(&mut doc, json);

    let line = highlighter.highlight_line(&doc, 1).unwrap();
    assert_eq!(name_at(&line, 0), Some("Punctuation"));
    assert_eq!(name_at(&line, 1), Some("String"));
    assert_eq!(name_at(&line, 4), Some("Punctuation"));
    assert_eq!(name_at(&line, 5), None);
    assert_eq!(name_at(&line, 8), Some("Escape"));
    assert_eq!(name_at(&line, 9), Some("Escape"));
    assert_eq!(name_at(&line, 10), Some("String"));
    assert_eq!(name_at(&line, 18), Some("Number"));
    assert_eq!(name_at(&line, 23), Some("Number"));
    assert_eq!(name_at(&line, 24), Some("Punctuation"));

    let line = highlighter.highlight_line(&doc, 2).unwrap();
    assert_eq!(
        runs(&line),
        vec![
            (26, 27, "Punctuation"),
            (27, 31, "Boolean"),
            (31, 32, "Punctuation"),
            (33, 37, "Null"),
            (37, 38, "Punctuation"),
        ]
    );
    let null = line.color_at(33).unwrap();
    assert_eq!(null.font_weight, Some(FontWeight::Bold));
}

#[test]
fn test_builtin_ini() {
    let manager = HighlightingManager::with_builtins().unwrap();
    let ini = manager.definition_by_extension("properties").unwrap();
    assert_eq!(ini.property("line_comment"), Some(";"));
    let mut doc = TextDocument::new("[core]\nname = value\n; comment\n# other");
    let mut highlighter = DocumentHighlighter::new(&mut doc, ini);

    let lines: Vec<_> = (1..=4)
        .map(|n| highlighter.highlight_line(&doc, n).unwrap())
        .collect();
    assert_eq!(runs(&lines[0]), vec![(0, 6, "Section")]);
    assert_eq!(runs(&lines[1]), vec![(7, 13, "Key")]);
    assert_eq!(runs(&lines[2]), vec![(20, 29, "Comment")]);
    assert_eq!(runs(&lines[3]), vec![(30, 37, "Comment")]);
    // Line comments never leak into the next line.
    assert!(highlighter.span_stack(&doc, 3).unwrap().is_empty());
}

#[test]
fn test_invalid_definitions() {
    let err = compile(
        "name: Bad\nrule_sets:\n  - elements:\n      - type: rule\n        pattern: 'x'\n        color: Nowhere\n",
    )
    .unwrap_err();
    assert_eq!(err, HighlightError::UnknownColor("Nowhere".to_string()));

    let err = compile(
        "name: Bad\nrule_sets:\n  - elements:\n      - type: rule\n        pattern: '[a-'\n",
    )
    .unwrap_err();
    assert!(matches!(err, HighlightError::InvalidRegex { .. }), "{err}");

    let err = compile(
        "name: Bad\nrule_sets:\n  - elements:\n      - type: span\n        begin: '<'\n        rule_set: 'Elsewhere/'\n",
    )
    .unwrap_err();
    assert_eq!(err, HighlightError::UnknownDefinition("Elsewhere".to_string()));

    let err = compile(
        "name: Bad\ncolors:\n  Odd:\n    foreground: '#12345'\nrule_sets:\n  - elements: []\n",
    )
    .unwrap_err();
    assert_eq!(err, HighlightError::InvalidColorValue("#12345".to_string()));

    let err = compile("name: Bad\nrule_sets:\n  - name: Only\n    elements: []\n").unwrap_err();
    assert_eq!(err, HighlightError::MissingMainRuleSet("Bad".to_string()));

    // Unknown element kinds are rejected while parsing.
    let parsed: Result<SyntaxDefinition, _> = serde_yaml::from_str(
        "name: Bad\nrule_sets:\n  - elements:\n      - type: regex\n        pattern: x\n",
    );
    assert!(parsed.is_err());
}
