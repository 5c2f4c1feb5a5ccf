use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use editor_document::{TextDocument, TextSource};

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 64);
    for i in 0..line_count {
        out.push_str(&format!(
            "{i:06} the quick brown fox jumps over the lazy dog (editor-document benchmark line)\n"
        ));
    }
    // Remove the final '\n' to avoid creating an extra trailing empty line.
    out.pop();
    out
}

fn bench_large_file_open(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("large_file_open/50k_lines", |b| {
        b.iter(|| {
            let doc = TextDocument::new(black_box(&text));
            black_box(doc.line_count());
        })
    });
}

fn bench_typing_in_middle(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("typing_middle/100_inserts", |b| {
        b.iter_batched(
            || TextDocument::new(&text),
            |mut doc| {
                let mut offset = doc.text_len() / 2;
                for _ in 0..100 {
                    doc.insert(offset, "x").unwrap();
                    offset += 1;
                }
                black_box(doc.text_len());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_line_lookup(c: &mut Criterion) {
    let text = large_text(50_000);
    let doc = TextDocument::new(&text);
    let len = doc.text_len();

    c.bench_function("line_lookup/1000_offsets", |b| {
        b.iter(|| {
            for i in 0..1000 {
                let line = doc.line_by_offset((i * 7919) % len).unwrap();
                black_box(line.line_number);
            }
        })
    });
}

fn bench_anchor_updates(c: &mut Criterion) {
    let text = large_text(10_000);
    c.bench_function("anchors/10k_anchors_100_edits", |b| {
        b.iter_batched(
            || {
                let mut doc = TextDocument::new(&text);
                for i in 0..10_000 {
                    doc.create_anchor(i * 50).unwrap();
                }
                doc
            },
            |mut doc| {
                for i in 0..100 {
                    doc.insert(i * 3_000, "edit").unwrap();
                }
                black_box(doc.anchor_count());
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_large_file_open,
    bench_typing_in_middle,
    bench_line_lookup,
    bench_anchor_updates
);
criterion_main!(benches);
