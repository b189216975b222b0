//! Integration tests for editor commands

use quire_document::{
    validate, Align, Document, Element, ElementKind, Mark, Node, Path, Point, Range,
};
use quire_editor::{BlockFormat, Editor, EditorError, MemoryStore};
use std::sync::Arc;

fn cursor(path: impl Into<Path>, offset: usize) -> Range {
    Range::collapsed(Point::new(path, offset))
}

fn list_item(text: &str) -> Node {
    Element::with_children(ElementKind::ListItem, vec![Node::text(text)]).into()
}

/// Every list-item must sit directly inside a list container
fn assert_list_items_wrapped(doc: &Document) {
    for (path, node) in doc.descendants() {
        let Some(element) = node.as_element() else { continue };
        if element.kind != ElementKind::ListItem {
            continue;
        }
        let parent = path.parent().unwrap();
        assert!(!parent.is_root(), "list-item at document root: {}", path);
        let parent = doc.element(&parent).unwrap();
        assert!(parent.kind.is_list(), "list-item {} inside {}", path, parent.kind);
    }
}

fn kinds(doc: &Document) -> Vec<ElementKind> {
    doc.descendants()
        .into_iter()
        .filter_map(|(_, n)| n.as_element().map(|e| e.kind))
        .collect()
}

fn aligns(doc: &Document) -> Vec<Option<Align>> {
    doc.descendants()
        .into_iter()
        .filter_map(|(_, n)| n.as_element().map(|e| e.align))
        .collect()
}

#[test]
fn test_toggle_mark_twice_restores_marks() {
    let mut editor = Editor::in_memory(Document::new(vec![Element::paragraph("hello")]));
    editor.select(cursor([0, 0], 2)).unwrap();
    let before = editor.active_marks();

    editor.toggle_mark(Mark::Bold).unwrap();
    assert!(editor.is_mark_active(Mark::Bold));
    editor.toggle_mark(Mark::Bold).unwrap();

    assert_eq!(editor.active_marks(), before);
    assert_eq!(editor.document().text_content(), "hello");
}

#[test]
fn test_pending_marks_apply_to_typed_text() {
    let mut editor = Editor::in_memory(Document::new(vec![Element::paragraph("ab")]));
    editor.select(cursor([0, 0], 1)).unwrap();
    editor.toggle_mark(Mark::Italic).unwrap();
    editor.insert_text("X").unwrap();

    let block = editor.document().element(&Path::from([0])).unwrap();
    let leaves: Vec<(String, bool)> = block
        .children
        .iter()
        .filter_map(Node::as_text)
        .map(|t| (t.text.clone(), t.italic))
        .collect();
    assert_eq!(
        leaves,
        vec![("a".into(), false), ("X".into(), true), ("b".into(), false)]
    );
    assert_eq!(editor.selection(), Some(&cursor([0, 1], 1)));
    assert!(editor.pending_marks().is_none());
}

#[test]
fn test_toggle_mark_on_range_then_back() {
    let mut editor = Editor::in_memory(Document::new(vec![
        Element::paragraph("first line"),
        Element::paragraph("second"),
    ]));
    let range = Range::new(Point::new([0, 0], 6), Point::new([1, 0], 3));
    editor.select(range).unwrap();

    editor.toggle_mark(Mark::Underline).unwrap();
    let underlined: Vec<String> = editor
        .document()
        .texts()
        .into_iter()
        .filter(|(_, t)| t.underline)
        .map(|(_, t)| t.text.clone())
        .collect();
    assert_eq!(underlined, vec!["line".to_string(), "sec".to_string()]);

    editor.toggle_mark(Mark::Underline).unwrap();
    assert!(editor.document().texts().iter().all(|(_, t)| !t.underline));
    assert_eq!(
        editor.document(),
        &Document::new(vec![Element::paragraph("first line"), Element::paragraph("second")])
    );
}

#[test]
fn test_heading_toggle_is_reported_active() {
    let mut editor = Editor::in_memory(Document::new(vec![Element::paragraph("title")]));
    editor.select(cursor([0, 0], 0)).unwrap();

    editor.toggle_block(BlockFormat::HeadingOne).unwrap();
    assert!(editor.is_block_active(BlockFormat::HeadingOne));
    assert_eq!(editor.document().element(&Path::from([0])).unwrap().kind, ElementKind::HeadingOne);

    editor.toggle_block(BlockFormat::HeadingOne).unwrap();
    assert!(!editor.is_block_active(BlockFormat::HeadingOne));
    assert_eq!(editor.document().element(&Path::from([0])).unwrap().kind, ElementKind::Paragraph);
}

#[test]
fn test_list_toggle_wraps_and_unwraps() {
    let mut editor = Editor::in_memory(Document::new(vec![
        Element::paragraph("a"),
        Element::paragraph("b"),
    ]));
    editor
        .select(Range::new(Point::new([0, 0], 0), Point::new([1, 0], 1)))
        .unwrap();

    editor.toggle_block(BlockFormat::BulletedList).unwrap();
    assert_eq!(
        kinds(editor.document()),
        vec![ElementKind::BulletedList, ElementKind::ListItem, ElementKind::ListItem]
    );
    assert_list_items_wrapped(editor.document());
    assert!(editor.is_block_active(BlockFormat::BulletedList));

    editor.toggle_block(BlockFormat::NumberedList).unwrap();
    assert_eq!(
        kinds(editor.document()),
        vec![ElementKind::NumberedList, ElementKind::ListItem, ElementKind::ListItem]
    );
    assert_list_items_wrapped(editor.document());

    editor.toggle_block(BlockFormat::NumberedList).unwrap();
    assert_eq!(kinds(editor.document()), vec![ElementKind::Paragraph, ElementKind::Paragraph]);
}

#[test]
fn test_block_toggles_never_orphan_list_items() {
    let mut editor = Editor::in_memory(Document::new(vec![
        Element::paragraph("intro"),
        Element::with_children(
            ElementKind::NumberedList,
            vec![list_item("one"), list_item("two"), list_item("three")],
        ),
        Element::paragraph("outro"),
    ]));

    let selections = [
        cursor([1, 1, 0], 1),
        Range::new(Point::new([0, 0], 2), Point::new([1, 0, 0], 1)),
        Range::new(Point::new([1, 2, 0], 0), Point::new([2, 0], 3)),
    ];
    for selection in selections {
        for format in BlockFormat::ALL {
            let mut editor_copy = Editor::in_memory(editor.document().clone());
            if editor_copy.select(selection.clone()).is_err() {
                continue;
            }
            editor_copy.toggle_block(format).unwrap();
            assert_list_items_wrapped(editor_copy.document());
            validate(editor_copy.document()).unwrap();
        }
    }

    editor.select(cursor([1, 1, 0], 0)).unwrap();
    editor.toggle_block(BlockFormat::HeadingTwo).unwrap();
    assert_list_items_wrapped(editor.document());
    assert_eq!(
        kinds(editor.document()),
        vec![
            ElementKind::Paragraph,
            ElementKind::NumberedList,
            ElementKind::ListItem,
            ElementKind::HeadingTwo,
            ElementKind::NumberedList,
            ElementKind::ListItem,
            ElementKind::Paragraph,
        ]
    );
}

#[test]
fn test_alignment_and_kind_are_independent() {
    let mut editor = Editor::in_memory(Document::new(vec![
        Element::paragraph("a"),
        Element::paragraph("b"),
    ]));
    editor
        .select(Range::new(Point::new([0, 0], 0), Point::new([1, 0], 1)))
        .unwrap();

    let before = kinds(editor.document());
    editor.toggle_block(BlockFormat::Center).unwrap();
    assert_eq!(kinds(editor.document()), before);
    assert!(aligns(editor.document()).iter().all(|a| *a == Some(Align::Center)));

    let before = aligns(editor.document());
    editor.toggle_block(BlockFormat::BlockQuote).unwrap();
    assert_eq!(aligns(editor.document()), before);
    assert!(editor.is_block_active(BlockFormat::BlockQuote));

    editor.toggle_block(BlockFormat::Center).unwrap();
    assert!(aligns(editor.document()).iter().all(Option::is_none));
    assert_eq!(
        kinds(editor.document()),
        vec![ElementKind::BlockQuote, ElementKind::BlockQuote]
    );
}

#[test]
fn test_insert_image_into_empty_paragraph() {
    let mut editor = Editor::in_memory(Document::default());
    editor.select(cursor([0, 0], 0)).unwrap();
    editor.insert_image("https://x/y.png").unwrap();

    let expected = Document::new(vec![
        Element::new(ElementKind::Paragraph),
        Element::image("https://x/y.png"),
    ]);
    assert_eq!(editor.document(), &expected);

    let selection = editor.selection().unwrap();
    editor.document().resolve_range(selection).unwrap();
}

#[test]
fn test_insert_image_at_block_start_goes_before() {
    let mut editor = Editor::in_memory(Document::new(vec![Element::paragraph("text")]));
    editor.select(cursor([0, 0], 0)).unwrap();
    editor.insert_image("https://x/y.gif").unwrap();

    assert_eq!(kinds(editor.document()), vec![ElementKind::Image, ElementKind::Paragraph]);
    assert_eq!(editor.selection(), Some(&cursor([1, 0], 0)));
}

#[test]
fn test_insert_image_replaces_expanded_selection() {
    let mut editor = Editor::in_memory(Document::new(vec![Element::paragraph("abcdef")]));
    editor
        .select(Range::new(Point::new([0, 0], 2), Point::new([0, 0], 4)))
        .unwrap();
    editor.insert_image("https://x/y.png").unwrap();

    assert_eq!(editor.document().text_content(), "ab\n\nef");
    assert_eq!(kinds(editor.document())[1], ElementKind::Image);
}

#[test]
fn test_insert_image_rejects_bad_url_without_change() {
    let store = Arc::new(MemoryStore::new());
    let mut editor = Editor::new(Document::default(), Arc::clone(&store));
    editor.select(cursor([0, 0], 0)).unwrap();

    let err = editor.insert_image("https://example.com/page").unwrap_err();
    assert!(matches!(err, EditorError::InvalidUrl(_)));
    assert_eq!(editor.document(), &Document::default());
    assert_eq!(store.save_count(), 0);
}

#[test]
fn test_typing_into_void_is_ignored_and_break_adds_paragraph() {
    let mut editor = Editor::in_memory(Document::new(vec![
        Element::paragraph("a"),
        Element::image("https://x/y.png"),
    ]));
    editor.select(cursor([1, 0], 0)).unwrap();

    let change = editor.insert_text("nope").unwrap();
    assert!(!change.tree_changed);

    editor.insert_break().unwrap();
    assert_eq!(
        kinds(editor.document()),
        vec![ElementKind::Paragraph, ElementKind::Image, ElementKind::Paragraph]
    );
    assert_eq!(editor.selection(), Some(&cursor([2, 0], 0)));
}

#[test]
fn test_break_inside_list_item_creates_sibling_item() {
    let mut editor = Editor::in_memory(Document::new(vec![Element::with_children(
        ElementKind::BulletedList,
        vec![list_item("ab")],
    )]));
    editor.select(cursor([0, 0, 0], 1)).unwrap();
    editor.insert_break().unwrap();

    let list = editor.document().element(&Path::from([0])).unwrap();
    assert_eq!(list.children.len(), 2);
    assert_eq!(editor.document().leaf(&Path::from([0, 1, 0])).unwrap().text, "b");
    assert_list_items_wrapped(editor.document());
}

#[test]
fn test_delete_fragment_across_list_and_paragraph() {
    let mut editor = Editor::in_memory(Document::new(vec![
        Element::with_children(ElementKind::BulletedList, vec![list_item("one"), list_item("two")]),
        Element::paragraph("three"),
    ]));
    editor
        .select(Range::new(Point::new([0, 1, 0], 1), Point::new([1, 0], 2)))
        .unwrap();
    editor.delete_fragment().unwrap();

    let leaves: Vec<String> = editor
        .document()
        .texts()
        .into_iter()
        .map(|(_, t)| t.text.clone())
        .collect();
    assert_eq!(leaves, vec!["one".to_string(), "tree".to_string()]);
    assert_eq!(editor.document().children().len(), 1);
    assert_eq!(editor.selection(), Some(&cursor([0, 1, 0], 1)));
    validate(editor.document()).unwrap();
}

#[test]
fn test_delete_fragment_removes_edge_void() {
    let mut editor = Editor::in_memory(Document::new(vec![
        Element::paragraph("keep"),
        Element::image("https://x/y.png"),
        Element::paragraph("tail"),
    ]));
    editor
        .select(Range::new(Point::new([0, 0], 4), Point::new([1, 0], 0)))
        .unwrap();
    editor.delete_fragment().unwrap();

    assert_eq!(kinds(editor.document()), vec![ElementKind::Paragraph, ElementKind::Paragraph]);
    assert_eq!(editor.selection(), Some(&cursor([0, 0], 4)));
}

#[test]
fn test_serialization_reproduces_tree() {
    let mut editor = Editor::in_memory(Document::new(vec![
        Element::paragraph("one"),
        Element::paragraph("two"),
    ]));
    editor
        .select(Range::new(Point::new([0, 0], 1), Point::new([1, 0], 2)))
        .unwrap();
    editor.toggle_mark(Mark::Code).unwrap();
    editor.toggle_block(BlockFormat::NumberedList).unwrap();
    editor.toggle_block(BlockFormat::Right).unwrap();

    let json = editor.document().to_json().unwrap();
    let back = Document::from_json(&json).unwrap();
    assert_eq!(&back, editor.document());
    assert_eq!(back.to_json().unwrap(), json);
}

#[test]
fn test_change_operations_undo_a_command() {
    let mut editor = Editor::in_memory(Document::new(vec![
        Element::paragraph("a"),
        Element::paragraph("b"),
    ]));
    editor
        .select(Range::new(Point::new([0, 0], 0), Point::new([1, 0], 1)))
        .unwrap();
    let before = editor.document().clone();

    let change = editor.toggle_block(BlockFormat::BulletedList).unwrap();
    assert!(change.tree_changed);

    editor.apply_operations(change.inverse()).unwrap();
    assert_eq!(editor.document(), &before);
}
