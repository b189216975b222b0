//! Persistence: loading, saving, and background writes

use quire_document::{Document, Element, ElementKind, Point, Range};
use quire_editor::{BackgroundStore, DocumentStore, Editor, EditorConfig, FileStore, MemoryStore};
use std::sync::Arc;
use tempfile::TempDir;

fn cursor_at_end(editor: &Editor) -> Range {
    let point = editor
        .document()
        .end_point(&quire_document::Path::from([0]))
        .unwrap();
    Range::collapsed(point)
}

#[test]
fn test_load_missing_file_uses_default_document() {
    let temp = TempDir::new().unwrap();
    let config = EditorConfig {
        sample_image: Some("https://x/sample.png".into()),
        ..EditorConfig::default()
    };
    let store = FileStore::new(config.get_storage_path(temp.path()));

    let editor = Editor::load(store, &config);
    assert_eq!(
        editor.document(),
        &Document::default_document(Some("https://x/sample.png"))
    );
}

#[test]
fn test_edits_are_written_to_file() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("nested").join("content.json");

    let mut editor = Editor::new(
        Document::new(vec![Element::paragraph("hello")]),
        FileStore::new(&path),
    );
    editor.select(Range::collapsed(Point::new([0, 0], 5)))?;
    editor.insert_text(" world")?;

    let saved = Document::from_json(&std::fs::read_to_string(&path)?)?;
    assert_eq!(saved.text_content(), "hello world");

    // Reopen from the same file
    let reopened = Editor::load(FileStore::new(&path), &EditorConfig::default());
    assert_eq!(reopened.document(), editor.document());
    Ok(())
}

#[test]
fn test_stored_document_is_repaired_on_load() {
    let store = MemoryStore::with_contents(
        r#"[{"type":"list-item","children":[{"text":"a"},{"text":"b"}]}]"#,
    );
    let editor = Editor::load(store, &EditorConfig::default());

    let list = editor.document().children()[0].as_element().unwrap();
    assert_eq!(list.kind, ElementKind::BulletedList);
    assert_eq!(list.text_content(), "ab");
}

#[test]
fn test_unreadable_store_falls_back_to_default() {
    let store = MemoryStore::with_contents("not json");
    let editor = Editor::load(store, &EditorConfig::default());
    assert_eq!(editor.document(), &Document::default());
}

#[test]
fn test_shared_memory_store_sees_saves() {
    let store = Arc::new(MemoryStore::new());
    let mut editor = Editor::new(Document::default(), Arc::clone(&store));

    let range = cursor_at_end(&editor);
    editor.select(range).unwrap();
    editor.insert_text("hi").unwrap();
    editor.insert_break().unwrap();

    assert_eq!(store.save_count(), 2);
    let saved = Document::from_json(&store.contents().unwrap()).unwrap();
    assert_eq!(&saved, editor.document());
}

#[tokio::test]
async fn test_background_store_writes_after_flush() {
    let inner = Arc::new(MemoryStore::new());
    let background = Arc::new(BackgroundStore::spawn(Arc::clone(&inner)));
    let mut editor = Editor::new(Document::default(), Arc::clone(&background));

    let range = cursor_at_end(&editor);
    editor.select(range).unwrap();
    editor.insert_text("queued").unwrap();
    editor.insert_text("!").unwrap();

    background.flush().await;
    assert_eq!(inner.save_count(), 2);
    let saved = Document::from_json(&inner.contents().unwrap()).unwrap();
    assert_eq!(saved.text_content(), "queued!");
    assert_eq!(background.load().unwrap(), Some(saved));
}
