use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quire_document::{normalize_document, Document, Element, Mark, Point, Range};
use quire_editor::{BlockFormat, Editor};

fn sample_document(blocks: usize) -> Document {
    Document::new(
        (0..blocks)
            .map(|i| Element::paragraph(format!("paragraph number {} with some text", i)))
            .collect(),
    )
}

fn whole_range(blocks: usize) -> Range {
    Range::new(Point::new([0, 0], 0), Point::new([blocks - 1, 0], 4))
}

fn toggle_mark_across_blocks(c: &mut Criterion) {
    let doc = sample_document(100);

    c.bench_function("toggle_mark_across_blocks", |b| {
        b.iter(|| {
            let mut editor = Editor::in_memory(doc.clone());
            editor.select(whole_range(100)).unwrap();
            editor.toggle_mark(black_box(Mark::Bold)).unwrap()
        })
    });
}

fn toggle_list_across_blocks(c: &mut Criterion) {
    let doc = sample_document(100);

    c.bench_function("toggle_list_across_blocks", |b| {
        b.iter(|| {
            let mut editor = Editor::in_memory(doc.clone());
            editor.select(whole_range(100)).unwrap();
            editor.toggle_block(black_box(BlockFormat::NumberedList)).unwrap()
        })
    });
}

fn type_characters(c: &mut Criterion) {
    let doc = sample_document(10);

    c.bench_function("type_characters", |b| {
        b.iter(|| {
            let mut editor = Editor::in_memory(doc.clone());
            editor.select(Range::collapsed(Point::new([5, 0], 3))).unwrap();
            for ch in ["a", "b", "c", "d", "e", "f", "g", "h"] {
                editor.insert_text(black_box(ch)).unwrap();
            }
        })
    });
}

fn normalize_large_document(c: &mut Criterion) {
    let json = sample_document(500).to_json().unwrap();

    c.bench_function("normalize_large_document", |b| {
        b.iter(|| {
            let doc = Document::from_json(black_box(&json)).unwrap();
            normalize_document(doc).unwrap()
        })
    });
}

criterion_group!(
    benches,
    toggle_mark_across_blocks,
    toggle_list_across_blocks,
    type_characters,
    normalize_large_document
);
criterion_main!(benches);
