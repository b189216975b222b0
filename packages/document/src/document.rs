//! # Document
//!
//! The root container: an ordered sequence of top-level elements addressed by
//! [`Path`]s. The root itself is never a node; the empty path denotes it.
//!
//! Path resolution, leaf traversal and range enumeration live here. Mutation
//! goes through [`Operation`](crate::Operation) so points can be transformed
//! alongside the tree.

use crate::error::{DocumentError, DocumentResult};
use crate::node::{Element, ElementKind, Node, Text};
use crate::path::Path;
use crate::range::{Point, Range};
use serde::{Deserialize, Serialize};

/// Rich-text document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    children: Vec<Node>,
}

impl Document {
    pub fn new(children: Vec<Element>) -> Self {
        Self {
            children: children.into_iter().map(Node::Element).collect(),
        }
    }

    /// Raw constructor; the result may need normalizing
    pub fn from_nodes(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// One empty paragraph, optionally followed by a sample image
    pub fn default_document(sample_image: Option<&str>) -> Self {
        let mut children = vec![Element::new(ElementKind::Paragraph)];
        if let Some(url) = sample_image {
            children.push(Element::image(url));
        }
        Self::new(children)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Parse the persisted JSON form
    pub fn from_json(source: &str) -> DocumentResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn to_json(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // ---- resolution ----

    pub fn node(&self, path: &Path) -> DocumentResult<&Node> {
        let (first, rest) = path
            .as_slice()
            .split_first()
            .ok_or_else(|| DocumentError::PathNotFound(path.clone()))?;
        let mut node = self
            .children
            .get(*first)
            .ok_or_else(|| DocumentError::PathNotFound(path.clone()))?;
        for index in rest {
            node = node
                .children()
                .and_then(|c| c.get(*index))
                .ok_or_else(|| DocumentError::PathNotFound(path.clone()))?;
        }
        Ok(node)
    }

    pub fn node_mut(&mut self, path: &Path) -> DocumentResult<&mut Node> {
        let (first, rest) = path
            .as_slice()
            .split_first()
            .ok_or_else(|| DocumentError::PathNotFound(path.clone()))?;
        let mut node = self
            .children
            .get_mut(*first)
            .ok_or_else(|| DocumentError::PathNotFound(path.clone()))?;
        for index in rest {
            node = match node {
                Node::Element(e) => e.children.get_mut(*index),
                Node::Text(_) => None,
            }
            .ok_or_else(|| DocumentError::PathNotFound(path.clone()))?;
        }
        Ok(node)
    }

    pub fn has_path(&self, path: &Path) -> bool {
        self.node(path).is_ok()
    }

    pub fn element(&self, path: &Path) -> DocumentResult<&Element> {
        self.node(path)?
            .as_element()
            .ok_or_else(|| DocumentError::NotAnElement(path.clone()))
    }

    pub fn element_mut(&mut self, path: &Path) -> DocumentResult<&mut Element> {
        self.node_mut(path)?
            .as_element_mut()
            .ok_or_else(|| DocumentError::NotAnElement(path.clone()))
    }

    pub fn leaf(&self, path: &Path) -> DocumentResult<&Text> {
        self.node(path)?
            .as_text()
            .ok_or_else(|| DocumentError::NotALeaf(path.clone()))
    }

    pub fn leaf_mut(&mut self, path: &Path) -> DocumentResult<&mut Text> {
        self.node_mut(path)?
            .as_text_mut()
            .ok_or_else(|| DocumentError::NotALeaf(path.clone()))
    }

    /// Children of the node at `path`, or of the document for the root path
    pub fn children_at(&self, path: &Path) -> DocumentResult<&[Node]> {
        if path.is_root() {
            return Ok(&self.children);
        }
        self.node(path)?
            .children()
            .ok_or_else(|| DocumentError::NotAnElement(path.clone()))
    }

    pub fn children_at_mut(&mut self, path: &Path) -> DocumentResult<&mut Vec<Node>> {
        if path.is_root() {
            return Ok(&mut self.children);
        }
        self.node_mut(path)?
            .children_mut()
            .ok_or_else(|| DocumentError::NotAnElement(path.clone()))
    }

    /// Checks that `point` addresses a leaf and lies within its text
    pub fn resolve_point(&self, point: &Point) -> DocumentResult<&Text> {
        let leaf = self.leaf(&point.path)?;
        if point.offset > leaf.len() {
            return Err(DocumentError::OffsetOutOfBounds {
                path: point.path.clone(),
                offset: point.offset,
                len: leaf.len(),
            });
        }
        Ok(leaf)
    }

    pub fn resolve_range(&self, range: &Range) -> DocumentResult<()> {
        self.resolve_point(&range.anchor)?;
        self.resolve_point(&range.focus)?;
        Ok(())
    }

    /// Nearest element ancestor that is a block (every element is)
    pub fn block_above(&self, path: &Path) -> Option<(Path, &Element)> {
        let parent = path.parent()?;
        if parent.is_root() {
            return None;
        }
        self.element(&parent).ok().map(|e| (parent, e))
    }

    /// Void element containing `path` (or at `path`), if any
    pub fn void_above(&self, path: &Path) -> Option<Path> {
        (1..=path.len())
            .map(|depth| path.ancestor_at(depth))
            .find(|p| self.element(p).map(Element::is_void).unwrap_or(false))
    }

    // ---- traversal ----

    /// Every node in pre-order
    pub fn descendants(&self) -> Vec<(Path, &Node)> {
        let mut out = Vec::new();
        for (i, child) in self.children.iter().enumerate() {
            collect_descendants(child, Path::from([i]), &mut out);
        }
        out
    }

    /// Every leaf in document order
    pub fn texts(&self) -> Vec<(Path, &Text)> {
        self.descendants()
            .into_iter()
            .filter_map(|(path, node)| node.as_text().map(|t| (path, t)))
            .collect()
    }

    /// Nodes touching `range` in document order, ancestors included
    ///
    /// With `voids == false` the interior of void elements is skipped (the
    /// void element itself is still yielded).
    pub fn nodes_in(&self, range: &Range, voids: bool) -> Vec<(Path, &Node)> {
        let (start, end) = range.edges();
        let mut out = Vec::new();
        for (i, child) in self.children.iter().enumerate() {
            collect_in_span(child, Path::from([i]), &start.path, &end.path, voids, &mut out);
        }
        out
    }

    /// First leaf at or below `path` (of the whole document for the root)
    pub fn first_leaf(&self, path: &Path) -> Option<Path> {
        self.edge_leaf(path, false)
    }

    pub fn last_leaf(&self, path: &Path) -> Option<Path> {
        self.edge_leaf(path, true)
    }

    /// Descends only until the first (or last) leaf is found; empty
    /// elements are stepped over
    fn edge_leaf(&self, path: &Path, last: bool) -> Option<Path> {
        if !path.is_root() && self.leaf(path).is_ok() {
            return Some(path.clone());
        }
        let count = self.children_at(path).ok()?.len();
        if last {
            (0..count).rev().find_map(|i| self.edge_leaf(&path.child(i), true))
        } else {
            (0..count).find_map(|i| self.edge_leaf(&path.child(i), false))
        }
    }

    /// Start of the first leaf under `path`
    pub fn start_point(&self, path: &Path) -> Option<Point> {
        self.first_leaf(path).map(|p| Point::new(p, 0))
    }

    /// End of the last leaf under `path`
    pub fn end_point(&self, path: &Path) -> Option<Point> {
        let last = self.last_leaf(path)?;
        let len = self.leaf(&last).map(Text::len).unwrap_or(0);
        Some(Point::new(last, len))
    }

    /// Last leaf strictly before `path` that is not inside it
    ///
    /// Walks preceding siblings level by level, so `path` need not resolve.
    pub fn previous_leaf(&self, path: &Path) -> Option<Path> {
        let mut current = path.clone();
        while let Some(parent) = current.parent() {
            let index = current.last().unwrap_or(0);
            match self.children_at(&parent) {
                Ok(siblings) => {
                    let found = (0..index.min(siblings.len()))
                        .rev()
                        .find_map(|i| self.edge_leaf(&parent.child(i), true));
                    if found.is_some() {
                        return found;
                    }
                }
                // `path` points below a leaf
                Err(_) if self.leaf(&parent).is_ok() => return Some(parent),
                Err(_) => {}
            }
            current = parent;
        }
        None
    }

    /// First leaf after `path` that is not inside it
    pub fn next_leaf(&self, path: &Path) -> Option<Path> {
        let mut current = path.clone();
        while let Some(parent) = current.parent() {
            let index = current.last().unwrap_or(0);
            if let Ok(siblings) = self.children_at(&parent) {
                let found = (index + 1..siblings.len())
                    .find_map(|i| self.edge_leaf(&parent.child(i), false));
                if found.is_some() {
                    return found;
                }
            }
            current = parent;
        }
        None
    }

    /// Re-anchors a point that may no longer resolve
    ///
    /// A valid point is returned unchanged, an offset past the end is clamped,
    /// and a dangling path moves to the end of the preceding leaf or else the
    /// start of the following one.
    pub fn nearest_point(&self, point: &Point) -> Option<Point> {
        if let Ok(leaf) = self.leaf(&point.path) {
            return Some(Point::new(point.path.clone(), point.offset.min(leaf.len())));
        }
        if let Some(first) = self.first_leaf(&point.path).filter(|_| !point.path.is_root()) {
            return Some(Point::new(first, 0));
        }
        if let Some(prev) = self.previous_leaf(&point.path) {
            let len = self.leaf(&prev).map(Text::len).unwrap_or(0);
            return Some(Point::new(prev, len));
        }
        self.next_leaf(&point.path)
            .or_else(|| self.first_leaf(&Path::root()))
            .map(|p| Point::new(p, 0))
    }

    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(Node::as_element)
            .map(Element::text_content)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::default_document(None)
    }
}

fn collect_descendants<'a>(node: &'a Node, path: Path, out: &mut Vec<(Path, &'a Node)>) {
    out.push((path.clone(), node));
    if let Some(children) = node.children() {
        for (i, child) in children.iter().enumerate() {
            collect_descendants(child, path.child(i), out);
        }
    }
}

fn collect_in_span<'a>(
    node: &'a Node,
    path: Path,
    start: &Path,
    end: &Path,
    voids: bool,
    out: &mut Vec<(Path, &'a Node)>,
) {
    let touches = path.is_ancestor_or_equal(start)
        || path.is_ancestor_or_equal(end)
        || (&path >= start && &path <= end);
    if !touches {
        return;
    }
    out.push((path.clone(), node));
    if let Node::Element(element) = node {
        if element.is_void() && !voids {
            return;
        }
        for (i, child) in element.children.iter().enumerate() {
            collect_in_span(child, path.child(i), start, end, voids, out);
        }
    }
}
