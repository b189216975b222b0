//! # Operations
//!
//! Low-level, invertible tree mutations.
//!
//! Every structural change the editor makes is expressed as a sequence of
//! operations. Each one:
//!
//! - applies to a [`Document`] (failing with a [`DocumentError`] when its
//!   path does not resolve),
//! - transforms [`Point`]s so a selection follows the content it addressed,
//! - has an exact inverse, so an external history can undo a change.
//!
//! A point whose leaf is removed has no transformed position; callers
//! re-anchor it with [`Document::nearest_point`].

use crate::document::Document;
use crate::error::{DocumentError, DocumentResult};
use crate::node::{Element, ElementProps, Marks, Node, Text};
use crate::path::Path;
use crate::range::{Point, Range};
use serde::{Deserialize, Serialize};

/// Properties of a node besides its content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeProps {
    Element(ElementProps),
    Text(Marks),
}

impl NodeProps {
    pub fn of(node: &Node) -> Self {
        match node {
            Node::Element(e) => NodeProps::Element(e.props()),
            Node::Text(t) => NodeProps::Text(t.marks()),
        }
    }
}

/// A single invertible mutation of the document or the selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Insert `node` so that it ends up at `path`
    InsertNode { path: Path, node: Node },

    /// Remove the node at `path` (which must equal `node`)
    RemoveNode { path: Path, node: Node },

    /// Split the node at `path` at `position` (a character offset for
    /// leaves, a child index for elements); the tail becomes a new sibling
    /// carrying `properties`
    SplitNode {
        path: Path,
        position: usize,
        properties: NodeProps,
    },

    /// Merge the node at `path` into its previous sibling, whose length is
    /// `position`; `properties` are those of the merged node
    MergeNode {
        path: Path,
        position: usize,
        properties: NodeProps,
    },

    /// Move `count` siblings starting at `path` into a new element
    WrapNodes {
        path: Path,
        count: usize,
        element: ElementProps,
    },

    /// Replace the element at `path` with its `count` children
    UnwrapNode {
        path: Path,
        element: ElementProps,
        count: usize,
    },

    /// Replace the properties of the node at `path`
    SetNode {
        path: Path,
        properties: NodeProps,
        new_properties: NodeProps,
    },

    InsertText {
        path: Path,
        offset: usize,
        text: String,
    },

    RemoveText {
        path: Path,
        offset: usize,
        text: String,
    },

    SetSelection {
        properties: Option<Range>,
        new_properties: Option<Range>,
    },
}

impl Operation {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Operation::InsertNode { .. } => "insert_node",
            Operation::RemoveNode { .. } => "remove_node",
            Operation::SplitNode { .. } => "split_node",
            Operation::MergeNode { .. } => "merge_node",
            Operation::WrapNodes { .. } => "wrap_nodes",
            Operation::UnwrapNode { .. } => "unwrap_node",
            Operation::SetNode { .. } => "set_node",
            Operation::InsertText { .. } => "insert_text",
            Operation::RemoveText { .. } => "remove_text",
            Operation::SetSelection { .. } => "set_selection",
        }
    }

    /// Whether this operation changes the tree (as opposed to the selection)
    pub fn is_structural(&self) -> bool {
        !matches!(self, Operation::SetSelection { .. })
    }

    /// Apply to the document; selection operations are a no-op here
    pub fn apply(&self, doc: &mut Document) -> DocumentResult<()> {
        match self {
            Operation::InsertNode { path, node } => {
                let (parent, index) = split_path(path)?;
                let children = doc.children_at_mut(&parent)?;
                if index > children.len() {
                    return Err(DocumentError::PathNotFound(path.clone()));
                }
                children.insert(index, node.clone());
                Ok(())
            }

            Operation::RemoveNode { path, .. } => {
                let (parent, index) = split_path(path)?;
                let children = doc.children_at_mut(&parent)?;
                if index >= children.len() {
                    return Err(DocumentError::PathNotFound(path.clone()));
                }
                children.remove(index);
                Ok(())
            }

            Operation::SplitNode {
                path,
                position,
                properties,
            } => {
                let tail = match doc.node_mut(path)? {
                    Node::Text(text) => {
                        if *position > text.len() {
                            return Err(DocumentError::OffsetOutOfBounds {
                                path: path.clone(),
                                offset: *position,
                                len: text.len(),
                            });
                        }
                        let at = text.byte_index(*position);
                        let rest = text.text.split_off(at);
                        let marks = match properties {
                            NodeProps::Text(marks) => *marks,
                            NodeProps::Element(_) => text.marks(),
                        };
                        Node::Text(Text::with_marks(rest, marks))
                    }
                    Node::Element(element) => {
                        if *position > element.children.len() {
                            return Err(DocumentError::PathNotFound(path.child(*position)));
                        }
                        let rest = element.children.split_off(*position);
                        let props = match properties {
                            NodeProps::Element(props) => props.clone(),
                            NodeProps::Text(_) => element.props(),
                        };
                        Node::Element(props.into_element(rest))
                    }
                };
                let (parent, index) = split_path(path)?;
                doc.children_at_mut(&parent)?.insert(index + 1, tail);
                Ok(())
            }

            Operation::MergeNode { path, .. } => {
                let (parent, index) = split_path(path)?;
                if index == 0 {
                    return Err(DocumentError::invariant(path, "merge target has no previous sibling"));
                }
                let children = doc.children_at_mut(&parent)?;
                if index >= children.len() {
                    return Err(DocumentError::PathNotFound(path.clone()));
                }
                let compatible = matches!(
                    (&children[index - 1], &children[index]),
                    (Node::Text(_), Node::Text(_)) | (Node::Element(_), Node::Element(_))
                );
                if !compatible {
                    return Err(DocumentError::invariant(path, "cannot merge a text with an element"));
                }
                let node = children.remove(index);
                match (&mut children[index - 1], node) {
                    (Node::Text(prev), Node::Text(text)) => prev.text.push_str(&text.text),
                    (Node::Element(prev), Node::Element(element)) => {
                        prev.children.extend(element.children)
                    }
                    _ => {}
                }
                Ok(())
            }

            Operation::WrapNodes {
                path,
                count,
                element,
            } => {
                let (parent, index) = split_path(path)?;
                let children = doc.children_at_mut(&parent)?;
                if index + count > children.len() || *count == 0 {
                    return Err(DocumentError::PathNotFound(path.clone()));
                }
                let wrapped: Vec<Node> = children.drain(index..index + count).collect();
                children.insert(index, Node::Element(element.clone().into_element(wrapped)));
                Ok(())
            }

            Operation::UnwrapNode { path, count, .. } => {
                let (parent, index) = split_path(path)?;
                let children = doc.children_at_mut(&parent)?;
                match children.get(index) {
                    Some(Node::Element(element)) if element.children.len() != *count => {
                        return Err(DocumentError::invariant(
                            path,
                            "unwrap count does not match the element's children",
                        ))
                    }
                    Some(Node::Element(_)) => {}
                    Some(Node::Text(_)) => return Err(DocumentError::NotAnElement(path.clone())),
                    None => return Err(DocumentError::PathNotFound(path.clone())),
                }
                if let Node::Element(element) = children.remove(index) {
                    children.splice(index..index, element.children);
                }
                Ok(())
            }

            Operation::SetNode {
                path,
                new_properties,
                ..
            } => {
                match (doc.node_mut(path)?, new_properties) {
                    (Node::Element(element), NodeProps::Element(props)) => {
                        element.kind = props.kind;
                        element.align = props.align;
                        element.url = props.url.clone();
                    }
                    (Node::Text(text), NodeProps::Text(marks)) => text.set_marks(*marks),
                    _ => return Err(DocumentError::invariant(path, "property kind does not match node")),
                }
                Ok(())
            }

            Operation::InsertText { path, offset, text } => {
                let leaf = doc.leaf_mut(path)?;
                if *offset > leaf.len() {
                    return Err(DocumentError::OffsetOutOfBounds {
                        path: path.clone(),
                        offset: *offset,
                        len: leaf.len(),
                    });
                }
                let at = leaf.byte_index(*offset);
                leaf.text.insert_str(at, text);
                Ok(())
            }

            Operation::RemoveText { path, offset, text } => {
                let leaf = doc.leaf_mut(path)?;
                let count = text.chars().count();
                if offset + count > leaf.len() {
                    return Err(DocumentError::OffsetOutOfBounds {
                        path: path.clone(),
                        offset: offset + count,
                        len: leaf.len(),
                    });
                }
                let start = leaf.byte_index(*offset);
                let end = leaf.byte_index(offset + count);
                leaf.text.replace_range(start..end, "");
                Ok(())
            }

            Operation::SetSelection { .. } => Ok(()),
        }
    }

    /// The operation that undoes this one
    pub fn inverse(&self) -> Operation {
        match self.clone() {
            Operation::InsertNode { path, node } => Operation::RemoveNode { path, node },
            Operation::RemoveNode { path, node } => Operation::InsertNode { path, node },
            Operation::SplitNode {
                path,
                position,
                properties,
            } => Operation::MergeNode {
                path: path.next(),
                position,
                properties,
            },
            Operation::MergeNode {
                path,
                position,
                properties,
            } => Operation::SplitNode {
                path: path.previous().unwrap_or_else(|| path.clone()),
                position,
                properties,
            },
            Operation::WrapNodes {
                path,
                count,
                element,
            } => Operation::UnwrapNode {
                path,
                element,
                count,
            },
            Operation::UnwrapNode {
                path,
                element,
                count,
            } => Operation::WrapNodes {
                path,
                count,
                element,
            },
            Operation::SetNode {
                path,
                properties,
                new_properties,
            } => Operation::SetNode {
                path,
                properties: new_properties,
                new_properties: properties,
            },
            Operation::InsertText { path, offset, text } => {
                Operation::RemoveText { path, offset, text }
            }
            Operation::RemoveText { path, offset, text } => {
                Operation::InsertText { path, offset, text }
            }
            Operation::SetSelection {
                properties,
                new_properties,
            } => Operation::SetSelection {
                properties: new_properties,
                new_properties: properties,
            },
        }
    }

    /// Where the node at `path` lives after this operation; `None` if removed
    pub fn transform_path(&self, path: &Path) -> Option<Path> {
        let mut p = path.clone();
        match self {
            Operation::InsertNode { path: op, .. } => {
                if shifts_at(op, &p) {
                    p.indices_mut()[op.len() - 1] += 1;
                }
            }

            Operation::RemoveNode { path: op, .. } => {
                if op.is_ancestor_or_equal(&p) {
                    return None;
                }
                if ends_before(op, &p) {
                    p.indices_mut()[op.len() - 1] -= 1;
                }
            }

            Operation::SplitNode {
                path: op, position, ..
            } => {
                let d = op.len();
                if ends_before(op, &p) {
                    p.indices_mut()[d - 1] += 1;
                } else if op.is_ancestor_of(&p) && p.as_slice()[d] >= *position {
                    let indices = p.indices_mut();
                    indices[d - 1] += 1;
                    indices[d] -= position;
                }
            }

            Operation::MergeNode {
                path: op, position, ..
            } => {
                let d = op.len();
                if *op == p || ends_before(op, &p) {
                    p.indices_mut()[d - 1] -= 1;
                } else if op.is_ancestor_of(&p) {
                    let indices = p.indices_mut();
                    indices[d - 1] -= 1;
                    indices[d] += position;
                }
            }

            Operation::WrapNodes {
                path: op, count, ..
            } => {
                let d = op.len();
                let start = op.last()?;
                if same_parent_prefix(op, &p) {
                    let index = p.as_slice()[d - 1];
                    if index >= start && index < start + count {
                        let indices = p.indices_mut();
                        indices[d - 1] = start;
                        indices.insert(d, index - start);
                    } else if index >= start + count {
                        p.indices_mut()[d - 1] = index - count + 1;
                    }
                }
            }

            Operation::UnwrapNode {
                path: op, count, ..
            } => {
                let d = op.len();
                let start = op.last()?;
                if *op == p {
                    return None;
                }
                if op.is_ancestor_of(&p) {
                    let indices = p.indices_mut();
                    let inner = indices.remove(d);
                    indices[d - 1] = start + inner;
                } else if same_parent_prefix(op, &p) && p.as_slice()[d - 1] > start {
                    let indices = p.indices_mut();
                    indices[d - 1] = indices[d - 1] + count - 1;
                }
            }

            Operation::SetNode { .. }
            | Operation::InsertText { .. }
            | Operation::RemoveText { .. }
            | Operation::SetSelection { .. } => {}
        }
        Some(p)
    }

    /// Where `point` lands after this operation; `None` if its leaf is gone
    pub fn transform_point(&self, point: &Point) -> Option<Point> {
        match self {
            Operation::InsertText { path, offset, text } if *path == point.path => {
                let mut out = point.clone();
                if point.offset >= *offset {
                    out.offset += text.chars().count();
                }
                Some(out)
            }

            Operation::RemoveText { path, offset, text } if *path == point.path => {
                let mut out = point.clone();
                if point.offset > *offset {
                    let count = text.chars().count();
                    out.offset -= count.min(point.offset - offset);
                }
                Some(out)
            }

            Operation::SplitNode { path, position, .. } if *path == point.path => {
                if point.offset >= *position {
                    Some(Point::new(path.next(), point.offset - position))
                } else {
                    Some(point.clone())
                }
            }

            Operation::MergeNode { path, position, .. } if *path == point.path => {
                let previous = path.previous()?;
                Some(Point::new(previous, point.offset + position))
            }

            _ => self
                .transform_path(&point.path)
                .map(|path| Point::new(path, point.offset)),
        }
    }

    /// Transform both edges of a range, re-anchoring dangling points in
    /// `doc`, which must already reflect this operation
    pub fn transform_range(&self, range: &Range, doc: &Document) -> Option<Range> {
        let anchor = self
            .transform_point(&range.anchor)
            .and_then(|p| doc.nearest_point(&p))
            .or_else(|| doc.nearest_point(&range.anchor))?;
        let focus = self
            .transform_point(&range.focus)
            .and_then(|p| doc.nearest_point(&p))
            .or_else(|| doc.nearest_point(&range.focus))?;
        Some(Range::new(anchor, focus))
    }
}

fn split_path(path: &Path) -> DocumentResult<(Path, usize)> {
    match (path.parent(), path.last()) {
        (Some(parent), Some(index)) => Ok((parent, index)),
        _ => Err(DocumentError::PathNotFound(path.clone())),
    }
}

/// `p` is at or below a sibling position of `op` (same parent prefix)
fn same_parent_prefix(op: &Path, p: &Path) -> bool {
    let d = op.len();
    d > 0 && p.len() >= d && p.as_slice()[..d - 1] == op.as_slice()[..d - 1]
}

/// `p` sits at or after `op` among the same siblings, or below such a node
fn shifts_at(op: &Path, p: &Path) -> bool {
    same_parent_prefix(op, p) && p.as_slice()[op.len() - 1] >= op.as_slice()[op.len() - 1]
}

/// `p` sits strictly after `op` among the same siblings, or below such a node
fn ends_before(op: &Path, p: &Path) -> bool {
    same_parent_prefix(op, p) && p.as_slice()[op.len() - 1] > op.as_slice()[op.len() - 1]
}

/// Apply every operation in order, keeping `selection` attached
pub fn apply_all(
    doc: &mut Document,
    selection: &mut Option<Range>,
    operations: &[Operation],
) -> DocumentResult<()> {
    for op in operations {
        op.apply(doc)?;
        *selection = match op {
            Operation::SetSelection { new_properties, .. } => new_properties.clone(),
            _ => selection.as_ref().and_then(|r| op.transform_range(r, doc)),
        };
    }
    Ok(())
}

impl Element {
    /// Empty-children copy of this element's properties as [`NodeProps`]
    pub fn node_props(&self) -> NodeProps {
        NodeProps::Element(self.props())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ElementKind;

    fn doc() -> Document {
        Document::new(vec![Element::paragraph("hello"), Element::paragraph("world")])
    }

    #[test]
    fn test_split_text_moves_cursor_forward() {
        let mut d = doc();
        let op = Operation::SplitNode {
            path: Path::from([0, 0]),
            position: 2,
            properties: NodeProps::Text(Marks::default()),
        };
        op.apply(&mut d).unwrap();
        assert_eq!(d.leaf(&Path::from([0, 0])).unwrap().text, "he");
        assert_eq!(d.leaf(&Path::from([0, 1])).unwrap().text, "llo");
        assert_eq!(
            op.transform_point(&Point::new([0, 0], 3)),
            Some(Point::new([0, 1], 1))
        );
        assert_eq!(
            op.transform_point(&Point::new([0, 0], 1)),
            Some(Point::new([0, 0], 1))
        );
    }

    #[test]
    fn test_split_element_shifts_following_blocks() {
        let mut d = Document::new(vec![Element::with_children(
            ElementKind::Paragraph,
            vec![Node::text("a"), Node::text("b"), Node::text("c")],
        ), Element::paragraph("z")]);
        let op = Operation::SplitNode {
            path: Path::from([0]),
            position: 1,
            properties: d.element(&Path::from([0])).unwrap().node_props(),
        };
        op.apply(&mut d).unwrap();
        assert_eq!(d.children().len(), 3);
        assert_eq!(op.transform_path(&Path::from([0, 2])), Some(Path::from([1, 1])));
        assert_eq!(op.transform_path(&Path::from([1, 0])), Some(Path::from([2, 0])));
        assert_eq!(op.transform_path(&Path::from([0, 0])), Some(Path::from([0, 0])));
    }

    #[test]
    fn test_wrap_and_unwrap_are_inverse() {
        let mut d = doc();
        let original = d.clone();
        let wrap = Operation::WrapNodes {
            path: Path::from([0]),
            count: 2,
            element: Element::new(ElementKind::BulletedList).props(),
        };
        wrap.apply(&mut d).unwrap();
        assert_eq!(d.children().len(), 1);
        assert_eq!(wrap.transform_path(&Path::from([1, 0])), Some(Path::from([0, 1, 0])));

        let unwrap = wrap.inverse();
        unwrap.apply(&mut d).unwrap();
        assert_eq!(d, original);
        assert_eq!(unwrap.transform_path(&Path::from([0, 1, 0])), Some(Path::from([1, 0])));
    }

    #[test]
    fn test_unwrap_rejects_wrong_count() {
        let mut d = Document::new(vec![Element::with_children(
            ElementKind::BulletedList,
            vec![Element::with_children(ElementKind::ListItem, vec![Node::text("a")]).into()],
        )]);
        let before = d.clone();
        let op = Operation::UnwrapNode {
            path: Path::from([0]),
            element: Element::new(ElementKind::BulletedList).props(),
            count: 3,
        };
        assert!(matches!(op.apply(&mut d), Err(DocumentError::InvariantViolation { .. })));
        assert_eq!(d, before);
    }

    #[test]
    fn test_merge_text_moves_point_into_previous() {
        let mut d = Document::new(vec![Element::with_children(
            ElementKind::Paragraph,
            vec![Node::text("ab"), Node::text("cd")],
        )]);
        let op = Operation::MergeNode {
            path: Path::from([0, 1]),
            position: 2,
            properties: NodeProps::Text(Marks::default()),
        };
        op.apply(&mut d).unwrap();
        assert_eq!(d.leaf(&Path::from([0, 0])).unwrap().text, "abcd");
        assert_eq!(
            op.transform_point(&Point::new([0, 1], 1)),
            Some(Point::new([0, 0], 3))
        );
    }

    #[test]
    fn test_remove_node_drops_points_inside() {
        let op = Operation::RemoveNode {
            path: Path::from([0]),
            node: Element::paragraph("hello").into(),
        };
        assert_eq!(op.transform_point(&Point::new([0, 0], 1)), None);
        assert_eq!(
            op.transform_point(&Point::new([1, 0], 1)),
            Some(Point::new([0, 0], 1))
        );
    }

    #[test]
    fn test_text_ops_roundtrip_via_inverse() {
        let mut d = doc();
        let original = d.clone();
        let ops = vec![
            Operation::InsertText {
                path: Path::from([0, 0]),
                offset: 5,
                text: " there".into(),
            },
            Operation::RemoveText {
                path: Path::from([1, 0]),
                offset: 0,
                text: "wor".into(),
            },
        ];
        let mut selection = None;
        apply_all(&mut d, &mut selection, &ops).unwrap();
        assert_eq!(d.text_content(), "hello there\nld");

        let inverse: Vec<Operation> = ops.iter().rev().map(Operation::inverse).collect();
        apply_all(&mut d, &mut selection, &inverse).unwrap();
        assert_eq!(d, original);
    }

    #[test]
    fn test_insert_text_pushes_cursor() {
        let op = Operation::InsertText {
            path: Path::from([0, 0]),
            offset: 2,
            text: "xy".into(),
        };
        assert_eq!(
            op.transform_point(&Point::new([0, 0], 2)),
            Some(Point::new([0, 0], 4))
        );
        assert_eq!(
            op.transform_point(&Point::new([0, 0], 1)),
            Some(Point::new([0, 0], 1))
        );
    }
}
