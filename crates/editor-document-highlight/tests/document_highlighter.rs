use std::sync::Arc;

use editor_document::{DocumentError, TextDocument, TextSource};
use editor_document_highlight::{
    DocumentHighlighter, HighlightError, HighlightedLine, HighlightingDefinition,
    HighlightingManager, HighlightingStateChanged, SpanStack, SyntaxDefinition,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

fn c_lite() -> Arc<HighlightingDefinition> {
    let syntax: SyntaxDefinition =
        serde_yaml::from_str(include_str!("fixtures/c-lite.yaml")).expect("parse C-Lite");
    HighlightingManager::new()
        .register_syntax(&syntax)
        .expect("compile C-Lite")
}

fn record_events(highlighter: &mut DocumentHighlighter) -> Arc<Mutex<Vec<(usize, usize)>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    highlighter.subscribe(move |_, event: &HighlightingStateChanged| {
        sink.lock().push((event.from_line, event.to_line));
    });
    events
}

fn runs(line: &HighlightedLine) -> Vec<(usize, usize, String)> {
    line.sections
        .iter()
        .map(|s| {
            (
                s.offset,
                s.end_offset(),
                s.color.name.clone().unwrap_or_default(),
            )
        })
        .collect()
}

/// Every state and every line must match what a new highlighter computes from scratch.
fn assert_matches_fresh(doc: &mut TextDocument, highlighter: &mut DocumentHighlighter) {
    let mut fresh = DocumentHighlighter::new(doc, highlighter.definition().clone());
    for line in 1..=doc.line_count() {
        assert_eq!(
            highlighter.span_stack(doc, line).unwrap(),
            fresh.span_stack(doc, line).unwrap(),
            "state after line {line}"
        );
        assert_eq!(
            highlighter.highlight_line(doc, line).unwrap(),
            fresh.highlight_line(doc, line).unwrap(),
            "line {line}"
        );
    }
    fresh.dispose(doc).unwrap();
}

#[test]
fn test_quoted_string_sections() {
    let mut doc = TextDocument::new("int x;\nfoo \"bar 42 baz\"");
    let mut highlighter = DocumentHighlighter::new(&mut doc, c_lite());

    let line = highlighter.highlight_line(&doc, 2).unwrap();
    assert_eq!(line.line_number, 2);
    assert_eq!(line.offset, 7);
    assert_eq!(line.length, 16);
    assert_eq!(
        runs(&line),
        vec![
            (11, 12, "Delimiter".to_string()),
            (12, 16, "String".to_string()),
            (16, 18, "Number".to_string()),
            (18, 22, "String".to_string()),
            (22, 23, "Delimiter".to_string()),
        ]
    );

    let first = highlighter.highlight_line(&doc, 1).unwrap();
    assert_eq!(runs(&first), vec![(0, 3, "Keyword".to_string())]);
}

#[test]
fn test_editing_inside_a_line_rescans_only_that_line() {
    let mut doc = TextDocument::new("/* line1\nline2\nline3 */");
    let mut highlighter = DocumentHighlighter::new(&mut doc, c_lite());
    highlighter.update_highlighting_state(&doc, 3).unwrap();
    assert_eq!(highlighter.first_invalid_line(), None);
    let before = highlighter.span_stack(&doc, 2).unwrap();
    assert_eq!(before.len(), 1);
    let events = record_events(&mut highlighter);

    doc.replace(13, 1, "X").unwrap();
    assert_eq!(doc.text_range(9, 5).unwrap(), "lineX");
    assert_eq!(highlighter.first_invalid_line(), Some(2));

    // One rescanned line is enough: its state did not change.
    assert!(!highlighter.highlight_pending(&doc, 1).unwrap());
    assert_eq!(highlighter.first_invalid_line(), None);
    assert!(events.lock().is_empty());

    let after = highlighter.span_stack(&doc, 2).unwrap();
    assert!(SpanStack::ptr_eq(&before, &after));
}

#[test]
fn test_opening_and_closing_a_comment_propagates() {
    let mut doc = TextDocument::new("a\nb\nc\nd");
    let mut highlighter = DocumentHighlighter::new(&mut doc, c_lite());
    highlighter.update_highlighting_state(&doc, 4).unwrap();
    let events = record_events(&mut highlighter);

    doc.insert(2, "/*").unwrap();
    assert!(!highlighter.highlight_pending(&doc, 10).unwrap());
    assert_eq!(*events.lock(), vec![(3, 3), (4, 4)]);

    let last = highlighter.highlight_line(&doc, 4).unwrap();
    assert_eq!(runs(&last), vec![(8, 9, "Comment".to_string())]);
    let colors = highlighter.color_stack(&doc, 3).unwrap();
    assert_eq!(colors.len(), 1);
    assert_eq!(colors[0].name.as_deref(), Some("Comment"));

    events.lock().clear();
    doc.insert(7, "*/").unwrap();
    assert_eq!(doc.line_text(&doc.line_by_number(3).unwrap()).unwrap(), "c*/");
    assert!(highlighter.span_stack(&doc, 4).unwrap().is_empty());
    assert_eq!(*events.lock(), vec![(4, 4)]);
    let last = highlighter.highlight_line(&doc, 4).unwrap();
    assert!(last.sections.is_empty());
}

#[test]
fn test_line_insertion_and_removal_keep_cache_aligned() {
    let mut doc = TextDocument::new("/*\none\ntwo\n*/\nint x = 1;");
    let mut highlighter = DocumentHighlighter::new(&mut doc, c_lite());
    highlighter.update_highlighting_state(&doc, 5).unwrap();
    assert_eq!(highlighter.span_stack(&doc, 2).unwrap().len(), 1);
    assert!(highlighter.span_stack(&doc, 4).unwrap().is_empty());

    // Split "one" into three lines inside the comment.
    doc.insert(4, "\nnew\n").unwrap();
    assert_eq!(doc.line_count(), 7);
    assert_eq!(highlighter.first_invalid_line(), Some(2));
    for line in 2..=5 {
        assert_eq!(highlighter.span_stack(&doc, line).unwrap().len(), 1, "line {line}");
    }
    let code = highlighter.highlight_line(&doc, 7).unwrap();
    assert_eq!(
        runs(&code)
            .into_iter()
            .map(|(_, _, name)| name)
            .collect::<Vec<_>>(),
        ["Keyword", "Number"]
    );

    // Remove the comment opener together with the lines that followed it.
    let end = doc.line_by_number(4).unwrap().end_offset_with_delimiter();
    doc.remove(0, end).unwrap();
    assert_eq!(doc.line_count(), 3);
    assert!(highlighter.span_stack(&doc, 1).unwrap().is_empty());
    let text = doc.line_text(&doc.line_by_number(2).unwrap()).unwrap();
    assert_eq!(text, "*/");
}

#[test]
fn test_joining_away_an_unterminated_comment() {
    let mut doc = TextDocument::new("a\n/*\nb\nc");
    let mut highlighter = DocumentHighlighter::new(&mut doc, c_lite());
    highlighter.update_highlighting_state(&doc, 4).unwrap();
    assert_eq!(highlighter.span_stack(&doc, 3).unwrap().len(), 1);

    // Join "a" with the "/*" line and drop the opener.
    doc.remove(1, 3).unwrap();
    assert_eq!(doc.text(), "a\nb\nc");
    assert!(highlighter.span_stack(&doc, 2).unwrap().is_empty());
    assert!(highlighter.span_stack(&doc, 3).unwrap().is_empty());
    assert_matches_fresh(&mut doc, &mut highlighter);
}

#[test]
fn test_deleting_a_comment_end_line() {
    let mut doc = TextDocument::new("/*\na\n*/\nb\nc");
    let mut highlighter = DocumentHighlighter::new(&mut doc, c_lite());
    highlighter.update_highlighting_state(&doc, 5).unwrap();
    assert!(highlighter.span_stack(&doc, 5).unwrap().is_empty());
    let events = record_events(&mut highlighter);

    let closer = doc.line_by_number(3).unwrap();
    doc.remove(closer.offset, closer.end_offset_with_delimiter() - closer.offset)
        .unwrap();
    assert_eq!(doc.text(), "/*\na\nb\nc");
    assert_eq!(highlighter.span_stack(&doc, 4).unwrap().len(), 1);
    assert_eq!(*events.lock(), vec![(4, 4)]);
    assert_matches_fresh(&mut doc, &mut highlighter);

    // And back: closing the comment again ends it right there.
    doc.insert(closer.offset, "*/\n").unwrap();
    assert!(highlighter.span_stack(&doc, 5).unwrap().is_empty());
    assert_matches_fresh(&mut doc, &mut highlighter);
}

#[test]
fn test_splitting_and_joining_plain_text_stays_local() {
    let mut doc = TextDocument::new("int a;\nint b;\nint c;");
    let mut highlighter = DocumentHighlighter::new(&mut doc, c_lite());
    highlighter.update_highlighting_state(&doc, 3).unwrap();
    let events = record_events(&mut highlighter);

    doc.insert(3, "\n").unwrap();
    assert_eq!(doc.line_count(), 4);
    // Both halves of the split line, and nothing after them.
    assert!(!highlighter.highlight_pending(&doc, 2).unwrap());
    assert!(events.lock().is_empty());

    doc.remove(3, 1).unwrap();
    assert!(!highlighter.highlight_pending(&doc, 1).unwrap());
    assert!(events.lock().is_empty());
    assert_matches_fresh(&mut doc, &mut highlighter);
}

#[test]
fn test_highlight_pending_works_in_steps() {
    let mut text = String::from("/*\n");
    for i in 0..50 {
        text.push_str(&format!("line {i}\n"));
    }
    text.push_str("*/");
    let mut doc = TextDocument::new(&text);
    let mut highlighter = DocumentHighlighter::new(&mut doc, c_lite());

    let mut steps = 0;
    while highlighter.highlight_pending(&doc, 10).unwrap() {
        steps += 1;
    }
    assert_eq!(steps, 5);
    assert_eq!(highlighter.first_invalid_line(), None);
    assert!(!highlighter.highlight_pending(&doc, 10).unwrap());
    assert!(highlighter.span_stack(&doc, 52).unwrap().is_empty());
}

#[test]
fn test_set_text_and_undo_invalidate() {
    let mut doc = TextDocument::new("int a;");
    let mut highlighter = DocumentHighlighter::new(&mut doc, c_lite());
    highlighter.update_highlighting_state(&doc, 1).unwrap();

    doc.set_text("x /* y\nz").unwrap();
    assert_eq!(highlighter.first_invalid_line(), Some(1));
    assert_eq!(highlighter.span_stack(&doc, 2).unwrap().len(), 1);

    doc.undo().unwrap();
    assert_eq!(doc.line_count(), 1);
    assert!(highlighter.span_stack(&doc, 1).unwrap().is_empty());
}

#[test]
fn test_invalidate_and_initial_span_stack() {
    let definition = c_lite();
    let mut doc = TextDocument::new("a */ b\nc");
    let mut highlighter = DocumentHighlighter::new(&mut doc, definition.clone());
    highlighter.update_highlighting_state(&doc, 2).unwrap();
    let events = record_events(&mut highlighter);

    // Start the document inside a block comment, as if it were embedded.
    let comment = definition.main_rule_set().spans[0].clone();
    highlighter
        .set_initial_span_stack(SpanStack::empty().push(comment))
        .unwrap();
    assert_eq!(*events.lock(), vec![(1, 2)]);
    assert_eq!(highlighter.first_invalid_line(), Some(1));
    let line = highlighter.highlight_line(&doc, 1).unwrap();
    assert_eq!(runs(&line), vec![(0, 4, "Comment".to_string())]);

    highlighter.invalidate_highlighting().unwrap();
    assert_eq!(highlighter.first_invalid_line(), Some(1));
    assert_eq!(highlighter.initial_span_stack().len(), 1);
}

#[test]
fn test_errors() {
    let definition = c_lite();
    let mut doc = TextDocument::new("one\ntwo");
    let mut other = TextDocument::new("other");
    let mut highlighter = DocumentHighlighter::new(&mut doc, definition);

    assert_eq!(
        highlighter.highlight_line(&doc, 3).unwrap_err(),
        HighlightError::Document(DocumentError::LineOutOfRange {
            line: 3,
            line_count: 2
        })
    );
    assert!(matches!(
        highlighter.highlight_line(&doc, 0),
        Err(HighlightError::Document(DocumentError::LineOutOfRange { .. }))
    ));
    assert!(matches!(
        highlighter.span_stack(&doc, 3),
        Err(HighlightError::Document(DocumentError::LineOutOfRange { .. }))
    ));
    assert_eq!(
        highlighter.highlight_line(&other, 1).unwrap_err(),
        HighlightError::DocumentMismatch {
            expected: doc.id(),
            actual: other.id()
        }
    );
    assert!(highlighter.dispose(&mut other).is_err());

    // Calling back into the highlighter from a listener is refused.
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    highlighter.subscribe(move |highlighter, _| {
        sink.lock().push(highlighter.invalidate_highlighting());
    });
    highlighter.invalidate_highlighting().unwrap();
    assert_eq!(*seen.lock(), vec![Err(HighlightError::Reentrancy)]);

    assert_eq!(doc.line_tracker_count(), 1);
    highlighter.dispose(&mut doc).unwrap();
    assert_eq!(doc.line_tracker_count(), 0);
    assert!(highlighter.is_disposed());
    assert_eq!(
        highlighter.highlight_line(&doc, 1).unwrap_err(),
        HighlightError::Disposed
    );
    assert_eq!(
        highlighter.invalidate_highlighting().unwrap_err(),
        HighlightError::Disposed
    );
    highlighter.dispose(&mut doc).unwrap();
}

#[test]
fn test_dropped_highlighter_is_pruned() {
    let mut doc = TextDocument::new("text");
    let highlighter = DocumentHighlighter::new(&mut doc, c_lite());
    assert_eq!(doc.line_tracker_count(), 1);
    drop(highlighter);
    doc.insert(0, "more ").unwrap();
    assert_eq!(doc.line_tracker_count(), 0);
}
