//! # Normalization
//!
//! Repairs a document until it satisfies the content model, then checks it.
//!
//! ```text
//!   root      : elements only, never empty, no bare list-item
//!   image     : exactly one empty unmarked text, url required
//!   list      : list-item children only
//!   text block: text children only, adjacent equal-mark leaves merged
//! ```
//!
//! Each pass walks the tree once and collects a repair for every broken
//! element whose subtree holds no other repair in that pass. A repair only
//! touches its own subtree, so the batch is applied last-to-first and every
//! collected path stays valid. Passes repeat until nothing is left to repair,
//! and the operations compose with the selection like any other edit.

use crate::document::Document;
use crate::error::{DocumentError, DocumentResult};
use crate::node::{Element, ElementKind, ElementProps, Marks, Node, Text};
use crate::operation::{apply_all, NodeProps, Operation};
use crate::path::Path;
use crate::range::Range;
use tracing::debug;

/// Repair `doc` in place, keeping `selection` attached
///
/// Returns the operations applied, in order.
pub fn normalize(doc: &mut Document, selection: &mut Option<Range>) -> DocumentResult<Vec<Operation>> {
    let budget = 16 * (doc.descendants().len() + 16);
    let mut applied = Vec::new();
    let mut passes = 0;

    while let Some(ops) = next_repair(doc) {
        passes += 1;
        if passes > budget {
            return Err(DocumentError::invariant(&Path::root(), "normalization did not converge"));
        }
        apply_all(doc, selection, &ops)?;
        applied.extend(ops);
    }

    if !applied.is_empty() {
        debug!(passes, operations = applied.len(), "normalized document");
    }
    Ok(applied)
}

/// Repair a freshly loaded document that has no selection yet
pub fn normalize_document(mut doc: Document) -> DocumentResult<Document> {
    normalize(&mut doc, &mut None)?;
    Ok(doc)
}

/// Check every content-model rule, reporting the first violation
pub fn validate(doc: &Document) -> DocumentResult<()> {
    if doc.is_empty() {
        return Err(DocumentError::invariant(&Path::root(), "document has no blocks"));
    }
    for (i, child) in doc.children().iter().enumerate() {
        match child {
            Node::Text(_) => {
                return Err(DocumentError::invariant(&Path::from([i]), "text at document root"));
            }
            Node::Element(e) if e.kind == ElementKind::ListItem => {
                return Err(DocumentError::invariant(&Path::from([i]), "list-item outside a list"));
            }
            _ => {}
        }
    }

    for (path, node) in doc.descendants() {
        let Node::Element(element) = node else { continue };
        validate_element(&path, element)?;
    }
    Ok(())
}

fn validate_element(path: &Path, element: &Element) -> DocumentResult<()> {
    match (element.kind, &element.url) {
        (ElementKind::Image, None) => return Err(DocumentError::invariant(path, "image without url")),
        (kind, Some(_)) if kind != ElementKind::Image => {
            return Err(DocumentError::invariant(path, "url on a non-image element"));
        }
        _ => {}
    }

    if element.is_void() {
        if !is_void_content(element) {
            return Err(DocumentError::invariant(path, "void must hold one empty text"));
        }
        return Ok(());
    }

    if element.children.is_empty() {
        return Err(DocumentError::invariant(path, "element has no children"));
    }

    for (i, child) in element.children.iter().enumerate() {
        let ok = match child {
            Node::Element(e) => element.kind.is_list() && e.kind == ElementKind::ListItem,
            Node::Text(_) => element.kind.is_text_block(),
        };
        if !ok {
            let message = if element.kind.is_list() {
                "list container holds a non list-item"
            } else {
                "text block holds an element"
            };
            return Err(DocumentError::invariant(&path.child(i), message));
        }
    }
    Ok(())
}

fn is_void_content(element: &Element) -> bool {
    matches!(
        element.children.as_slice(),
        [Node::Text(t)] if t.is_empty() && t.marks() == Marks::default()
    )
}

fn props(kind: ElementKind) -> ElementProps {
    ElementProps {
        kind,
        align: None,
        url: None,
    }
}

fn wrap(path: Path, count: usize, kind: ElementKind) -> Operation {
    Operation::WrapNodes {
        path,
        count,
        element: props(kind),
    }
}

fn set_element(path: Path, old: ElementProps, new: ElementProps) -> Operation {
    Operation::SetNode {
        path,
        properties: NodeProps::Element(old),
        new_properties: NodeProps::Element(new),
    }
}

fn unwrap(path: Path, element: &Element) -> Operation {
    Operation::UnwrapNode {
        path,
        element: element.props(),
        count: element.children.len(),
    }
}

fn empty_leaf(path: Path) -> Operation {
    Operation::InsertNode {
        path,
        node: Node::Text(Text::empty()),
    }
}

fn is_list_item(node: &Node) -> bool {
    matches!(node, Node::Element(e) if e.kind == ElementKind::ListItem)
}

fn next_repair(doc: &Document) -> Option<Vec<Operation>> {
    if doc.is_empty() {
        return Some(vec![Operation::InsertNode {
            path: Path::from([0]),
            node: Element::new(ElementKind::Paragraph).into(),
        }]);
    }

    let root = doc.children();
    for (i, child) in root.iter().enumerate() {
        if child.is_text() {
            return Some(vec![wrap(Path::from([i]), 1, ElementKind::Paragraph)]);
        }
        if is_list_item(child) {
            let run = root[i..].iter().take_while(|n| is_list_item(n)).count();
            return Some(vec![wrap(Path::from([i]), run, ElementKind::BulletedList)]);
        }
    }

    let mut ops = Vec::new();
    let mut last_repaired: Option<Path> = None;
    for (path, node) in doc.descendants().into_iter().rev() {
        let Node::Element(element) = node else { continue };
        // Reverse pre-order visits a subtree right before its root
        if last_repaired.as_ref().is_some_and(|p| path.is_ancestor_of(p)) {
            continue;
        }
        if let Some(repair) = repair_element(&path, element) {
            ops.extend(repair);
            last_repaired = Some(path);
        }
    }
    (!ops.is_empty()).then_some(ops)
}

fn repair_element(path: &Path, element: &Element) -> Option<Vec<Operation>> {
    if element.kind != ElementKind::Image && element.url.is_some() {
        let new = ElementProps {
            url: None,
            ..element.props()
        };
        return Some(vec![set_element(path.clone(), element.props(), new)]);
    }
    if element.kind == ElementKind::Image && element.url.is_none() {
        let new = ElementProps {
            kind: ElementKind::Paragraph,
            ..element.props()
        };
        return Some(vec![set_element(path.clone(), element.props(), new)]);
    }

    if element.is_void() {
        if is_void_content(element) {
            return None;
        }
        let mut ops: Vec<Operation> = element
            .children
            .iter()
            .enumerate()
            .rev()
            .map(|(i, child)| Operation::RemoveNode {
                path: path.child(i),
                node: child.clone(),
            })
            .collect();
        ops.push(empty_leaf(path.child(0)));
        return Some(ops);
    }

    if element.children.is_empty() {
        return Some(vec![empty_leaf(path.child(0))]);
    }

    if element.kind.is_list() {
        return repair_list(path, element);
    }

    // text block
    for (i, child) in element.children.iter().enumerate() {
        if let Node::Element(inner) = child {
            return Some(vec![unwrap(path.child(i), inner)]);
        }
    }

    let leaves: Vec<&Text> = element.children.iter().filter_map(Node::as_text).collect();
    for i in 1..leaves.len() {
        if leaves[i - 1].marks() == leaves[i].marks() {
            return Some(vec![Operation::MergeNode {
                path: path.child(i),
                position: leaves[i - 1].len(),
                properties: NodeProps::Text(leaves[i].marks()),
            }]);
        }
    }
    if leaves.len() > 1 {
        if let Some(i) = leaves.iter().position(|t| t.is_empty()) {
            return Some(vec![Operation::RemoveNode {
                path: path.child(i),
                node: Node::Text(leaves[i].clone()),
            }]);
        }
    }
    None
}

fn repair_list(path: &Path, list: &Element) -> Option<Vec<Operation>> {
    for (i, child) in list.children.iter().enumerate() {
        let child_path = path.child(i);
        match child {
            Node::Text(_) => return Some(vec![wrap(child_path, 1, ElementKind::ListItem)]),
            Node::Element(inner) if inner.kind.is_list() => {
                return Some(vec![unwrap(child_path, inner)]);
            }
            Node::Element(inner) if inner.kind != ElementKind::ListItem => {
                let new = ElementProps {
                    kind: ElementKind::ListItem,
                    align: inner.align,
                    url: None,
                };
                return Some(vec![set_element(child_path, inner.props(), new)]);
            }
            Node::Element(_) => {}
        }
    }
    None
}
