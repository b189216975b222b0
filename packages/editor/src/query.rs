//! # Queries
//!
//! Read-only questions about a document and a selection: which marks are
//! active, whether a block format is present, which blocks a range touches.

use crate::format::BlockFormat;
use quire_document::{Document, Element, Marks, Node, Path, Point, Range};

/// Marks the next typed text would carry
///
/// Pending marks win. Otherwise a collapsed cursor reports its leaf (or, at
/// offset 0, the previous leaf in the same block) and an expanded range
/// reports its first leaf.
pub fn active_marks(doc: &Document, selection: Option<&Range>, pending: Option<Marks>) -> Marks {
    if let Some(marks) = pending {
        return marks;
    }
    let Some(range) = selection else {
        return Marks::default();
    };

    if range.is_expanded() {
        return doc
            .nodes_in(range, false)
            .into_iter()
            .find_map(|(_, node)| node.as_text().map(|t| t.marks()))
            .unwrap_or_default();
    }

    let point = &range.anchor;
    if point.offset == 0 {
        if let Some(prev) = doc.previous_leaf(&point.path) {
            if prev.parent() == point.path.parent() {
                if let Ok(leaf) = doc.leaf(&prev) {
                    return leaf.marks();
                }
            }
        }
    }
    doc.leaf(&point.path).map(|t| t.marks()).unwrap_or_default()
}

/// Pull a range ending at the very start of a block back into real content
///
/// Applies only to expanded ranges whose edges both sit at offset 0 with the
/// end on the first leaf of its parent; everything else is returned as is.
pub fn unhang(doc: &Document, range: &Range) -> Range {
    let (start, end) = range.edges();
    if range.is_collapsed()
        || start.offset != 0
        || end.offset != 0
        || end.path.last().map(|i| i > 0).unwrap_or(true)
    {
        return range.clone();
    }

    let block = end.path.parent().unwrap_or_default();
    let span = Range::new(start.clone(), end.clone());
    let leaves: Vec<(Path, usize, bool)> = doc
        .nodes_in(&span, false)
        .into_iter()
        .filter_map(|(path, node)| node.as_text().map(|t| (path, t.len(), t.is_empty())))
        .collect();

    for (path, len, empty) in leaves.into_iter().rev().skip(1) {
        if !empty || path.is_before(&block) {
            return Range::new(start.clone(), Point::new(path, len));
        }
    }
    Range::new(start.clone(), end.clone())
}

/// Every node touching `range`, ancestors included, void interiors skipped
pub fn nodes<'a>(doc: &'a Document, range: &Range) -> Vec<(Path, &'a Node)> {
    doc.nodes_in(range, false)
}

/// Text blocks and voids touching `range`, in document order
pub fn lowest_blocks<'a>(doc: &'a Document, range: &Range) -> Vec<(Path, &'a Element)> {
    doc.nodes_in(range, false)
        .into_iter()
        .filter_map(|(path, node)| node.as_element().map(|e| (path, e)))
        .filter(|(_, element)| !element.kind.is_list())
        .collect()
}

/// Whether any node touching the (unhung) selection carries `format`
pub fn is_block_active(doc: &Document, selection: Option<&Range>, format: BlockFormat) -> bool {
    let Some(range) = selection else {
        return false;
    };
    let range = unhang(doc, range);
    doc.nodes_in(&range, false)
        .into_iter()
        .filter_map(|(_, node)| node.as_element())
        .any(|element| format.matches(element))
}

/// Whether `point` is the first position inside the top-level block `top`
pub fn is_block_start(doc: &Document, point: &Point, top: &Path) -> bool {
    doc.start_point(top).as_ref() == Some(point)
}

/// Whether `point` is the last position inside the top-level block `top`
pub fn is_block_end(doc: &Document, point: &Point, top: &Path) -> bool {
    doc.end_point(top).as_ref() == Some(point)
}
