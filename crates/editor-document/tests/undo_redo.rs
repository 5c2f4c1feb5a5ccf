use editor_document::{DocumentError, DocumentOptions, TextDocument, TextSource};

#[test]
fn test_undo_redo_single_insert() {
    let mut doc = TextDocument::new("");

    doc.insert(0, "a").unwrap();
    assert_eq!(doc.text(), "a");
    assert!(doc.undo_stack().can_undo());
    assert!(!doc.undo_stack().can_redo());

    assert!(doc.undo().unwrap());
    assert_eq!(doc.text(), "");
    assert!(!doc.undo_stack().can_undo());
    assert!(doc.undo_stack().can_redo());

    assert!(doc.redo().unwrap());
    assert_eq!(doc.text(), "a");
    assert!(doc.undo_stack().can_undo());
    assert!(!doc.undo_stack().can_redo());
}

#[test]
fn test_update_group_is_one_undo_step() {
    let mut doc = TextDocument::new("hello");

    doc.run_update(|doc| {
        doc.insert(5, " world")?;
        doc.replace(0, 1, "J")?;
        doc.remove(1, 4)
    })
    .unwrap();
    assert_eq!(doc.text(), "J world");
    assert_eq!(doc.undo_stack().undo_depth(), 1);

    doc.undo().unwrap();
    assert_eq!(doc.text(), "hello");
    assert_eq!(doc.undo_stack().redo_depth(), 1);

    doc.redo().unwrap();
    assert_eq!(doc.text(), "J world");
}

#[test]
fn test_separate_edits_are_separate_steps() {
    let mut doc = TextDocument::new("");
    for (i, ch) in ["a", "b", "c"].iter().enumerate() {
        doc.insert(i, ch).unwrap();
    }
    assert_eq!(doc.undo_stack().undo_depth(), 3);

    doc.undo().unwrap();
    assert_eq!(doc.text(), "ab");
    doc.undo().unwrap();
    doc.undo().unwrap();
    assert_eq!(doc.text(), "");
    assert!(!doc.undo().unwrap());
}

#[test]
fn test_new_edit_clears_redo() {
    let mut doc = TextDocument::new("x");
    doc.insert(1, "y").unwrap();
    doc.undo().unwrap();
    assert!(doc.undo_stack().can_redo());

    doc.insert(0, "z").unwrap();
    assert!(!doc.undo_stack().can_redo());
    assert!(!doc.redo().unwrap());
    assert_eq!(doc.text(), "zx");
}

#[test]
fn test_undo_inside_update_is_rejected() {
    let mut doc = TextDocument::new("abc");
    doc.insert(0, "x").unwrap();

    doc.begin_update().unwrap();
    assert_eq!(doc.undo(), Err(DocumentError::UndoGroupOpen));
    assert_eq!(doc.redo(), Err(DocumentError::UndoGroupOpen));
    doc.end_update().unwrap();

    assert!(doc.undo().unwrap());
    assert_eq!(doc.text(), "abc");
}

#[test]
fn test_clean_point_follows_undo_and_redo() {
    let mut doc = TextDocument::new("");
    doc.insert(0, "saved").unwrap();
    doc.undo_stack_mut().mark_as_original_file();
    assert!(doc.undo_stack().is_original_file());

    doc.insert(5, "!").unwrap();
    assert!(!doc.undo_stack().is_original_file());

    doc.undo().unwrap();
    assert!(doc.undo_stack().is_original_file());

    doc.undo().unwrap();
    assert!(!doc.undo_stack().is_original_file());

    doc.redo().unwrap();
    assert!(doc.undo_stack().is_original_file());
}

#[test]
fn test_size_limit_drops_oldest_groups() {
    let mut doc = TextDocument::with_options("", DocumentOptions::default().with_undo_size_limit(2));
    for i in 0..5 {
        doc.insert(i, "x").unwrap();
    }
    assert_eq!(doc.undo_stack().undo_depth(), 2);

    doc.undo().unwrap();
    doc.undo().unwrap();
    assert!(!doc.undo().unwrap());
    assert_eq!(doc.text(), "xxx");
}

#[test]
fn test_undo_restores_line_structure() {
    let mut doc = TextDocument::new("a\r\nb");
    doc.replace(1, 2, "\n\n\r").unwrap();
    assert_eq!(doc.line_count(), 4);

    doc.undo().unwrap();
    assert_eq!(doc.text(), "a\r\nb");
    assert_eq!(doc.line_count(), 2);
    assert_eq!(doc.line_by_number(1).unwrap().total_length(), 3);
}
