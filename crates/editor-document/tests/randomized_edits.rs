use editor_document::{
    AnchorMovementType, LineIndex, TextAnchor, TextDocument, TextSource,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ALPHABET: &[&str] = &["a", "b", "é", "\n", "\r", "\r\n", " ", "xyz", "🦀"];

fn random_text(rng: &mut StdRng, max_pieces: usize) -> String {
    let pieces = rng.gen_range(0..=max_pieces);
    (0..pieces)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
        .collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn replace_model(model: &mut String, offset: usize, length: usize, text: &str) {
    let mut chars: Vec<char> = model.chars().collect();
    chars.splice(offset..offset + length, text.chars());
    *model = chars.into_iter().collect();
}

fn assert_lines_match(doc: &TextDocument, model: &str) {
    let fresh = LineIndex::from_text(model);
    assert_eq!(doc.line_count(), fresh.line_count(), "text {model:?}");
    let actual: Vec<_> = doc.lines().collect();
    let expected: Vec<_> = fresh.lines_from(1).collect();
    assert_eq!(actual, expected, "text {model:?}");

    let total: usize = actual.iter().map(|l| l.total_length()).sum();
    assert_eq!(total, char_len(model));
    let last = actual.last().unwrap();
    assert!(last.delimiter.is_none());
    assert!(actual[..actual.len() - 1].iter().all(|l| l.delimiter.is_some()));
}

#[test]
fn test_random_edits_match_string_model() {
    let mut rng = StdRng::seed_from_u64(0x5eed_cafe);
    let mut model = random_text(&mut rng, 40);
    let mut doc = TextDocument::new(&model);

    for step in 0..2_000 {
        let len = char_len(&model);
        let offset = rng.gen_range(0..=len);
        let length = rng.gen_range(0..=(len - offset).min(8));
        let text = random_text(&mut rng, 3);

        doc.replace(offset, length, &text).unwrap();
        replace_model(&mut model, offset, length, &text);

        assert_eq!(doc.text_len(), char_len(&model), "step {step}");
        if step % 25 == 0 {
            assert_eq!(doc.text(), model, "step {step}");
        }
        assert_lines_match(&doc, &model);

        // Spot-check line lookup by offset.
        let probe = rng.gen_range(0..=char_len(&model));
        let line = doc.line_by_offset(probe).unwrap();
        assert!(probe >= line.offset && probe <= line.end_offset_with_delimiter());
    }
    assert_eq!(doc.text(), model);
}

#[test]
fn test_random_edits_move_anchors_like_offset_mapping() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut doc = TextDocument::new(&"0123456789\n".repeat(20));
    let mut anchors: Vec<(TextAnchor, usize, AnchorMovementType)> = Vec::new();
    for _ in 0..100 {
        let offset = rng.gen_range(0..=doc.text_len());
        let movement = match rng.gen_range(0..3) {
            0 => AnchorMovementType::Default,
            1 => AnchorMovementType::BeforeInsertion,
            _ => AnchorMovementType::AfterInsertion,
        };
        let anchor = doc.create_anchor(offset).unwrap();
        doc.set_anchor_movement(anchor, movement).unwrap();
        doc.set_anchor_survive_deletion(anchor, true).unwrap();
        anchors.push((anchor, offset, movement));
    }

    for _ in 0..500 {
        let len = doc.text_len();
        let offset = rng.gen_range(0..=len);
        let length = rng.gen_range(0..=(len - offset).min(6));
        let text = random_text(&mut rng, 2);

        let before = doc.document_version();
        doc.replace(offset, length, &text).unwrap();
        let after = doc.document_version();

        for (anchor, expected, movement) in anchors.iter_mut() {
            *expected = before.move_offset_to(&after, *expected, *movement).unwrap();
            assert_eq!(doc.anchor_offset(*anchor).unwrap(), *expected);
        }
    }
    assert_eq!(doc.anchor_count(), 100);
}
