//! # Transforms
//!
//! Structural edits, expressed as [`Operation`]s against a scratch copy of
//! the editor state.
//!
//! A [`Transaction`] records every operation it applies. The editor commits
//! the scratch state only after the transaction normalizes and validates;
//! dropping a transaction discards everything it did.

use crate::editor::EditorState;
use crate::errors::{EditorError, EditorResult};
use crate::query;
use quire_document::{
    apply_all, normalize, validate, Align, Document, DocumentResult, Element, ElementKind,
    ElementProps, Mark, Marks, Node, NodeProps, Operation, Path, Point, Range, Text,
};

/// Property change applied to lowest blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockUpdate {
    Kind(ElementKind),
    Align(Option<Align>),
}

/// Scratch editor state plus the operations applied to it
#[derive(Debug, Clone)]
pub struct Transaction {
    state: EditorState,
    operations: Vec<Operation>,
}

impl Transaction {
    pub(crate) fn new(state: &EditorState) -> Self {
        Self {
            state: state.clone(),
            operations: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.state.document
    }

    pub fn selection(&self) -> Option<&Range> {
        self.state.selection.as_ref()
    }

    pub fn marks(&self) -> Option<Marks> {
        self.state.marks
    }

    pub fn set_marks(&mut self, marks: Option<Marks>) {
        self.state.marks = marks;
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Apply one operation, carrying the selection along
    pub fn apply(&mut self, op: Operation) -> EditorResult<()> {
        apply_all(
            &mut self.state.document,
            &mut self.state.selection,
            std::slice::from_ref(&op),
        )?;
        self.operations.push(op);
        Ok(())
    }

    /// Apply one operation and move `points` with it
    ///
    /// A point whose leaf is removed keeps its old value; re-anchor it before
    /// use.
    fn apply_tracked(&mut self, op: Operation, points: &mut [&mut Point]) -> EditorResult<()> {
        for point in points.iter_mut() {
            if let Some(moved) = op.transform_point(point) {
                **point = moved;
            }
        }
        self.apply(op)
    }

    /// Replace the selection; any change clears pending marks
    pub fn select(&mut self, range: Option<Range>) -> EditorResult<()> {
        if self.state.selection == range {
            return Ok(());
        }
        self.state.marks = None;
        let op = Operation::SetSelection {
            properties: self.state.selection.clone(),
            new_properties: range,
        };
        self.apply(op)
    }

    /// Normalize, validate, and hand back the new state with its operations
    pub(crate) fn finish(mut self) -> DocumentResult<(EditorState, Vec<Operation>)> {
        let repairs = normalize(&mut self.state.document, &mut self.state.selection)?;
        self.operations.extend(repairs);
        validate(&self.state.document)?;
        if let Some(range) = &self.state.selection {
            self.state.document.resolve_range(range)?;
        }
        Ok((self.state, self.operations))
    }

    fn cursor(&self) -> EditorResult<Point> {
        self.selection()
            .map(|range| range.focus.clone())
            .ok_or(EditorError::NoSelection)
    }

    /// Delete an expanded selection so it collapses to its start
    fn delete_expanded(&mut self) -> EditorResult<()> {
        match self.selection().cloned() {
            Some(range) if range.is_expanded() => self.delete_range(&range),
            Some(_) => Ok(()),
            None => Err(EditorError::NoSelection),
        }
    }

    // ---- marks ----

    /// Set or clear `mark` on every leaf inside `range`
    ///
    /// Leaves cut by the range edges are split first. The selection ends up
    /// covering exactly the affected text, in its original direction.
    pub fn set_mark(&mut self, range: &Range, mark: Mark, value: bool) -> EditorResult<()> {
        let (start, end) = range.edges();
        let (mut start, mut end) = (start.clone(), end.clone());

        let leaf = self.document().leaf(&end.path)?;
        if end.offset > 0 && end.offset < leaf.len() {
            let properties = NodeProps::Text(leaf.marks());
            self.apply(Operation::SplitNode {
                path: end.path.clone(),
                position: end.offset,
                properties,
            })?;
        }

        let leaf = self.document().leaf(&start.path)?;
        if start.offset > 0 && start.offset < leaf.len() {
            let split = Operation::SplitNode {
                path: start.path.clone(),
                position: start.offset,
                properties: NodeProps::Text(leaf.marks()),
            };
            if end.path == start.path {
                end = Point::new(start.path.next(), end.offset - start.offset);
            } else if let Some(moved) = split.transform_path(&end.path) {
                end.path = moved;
            }
            self.apply(split)?;
            start = Point::new(start.path.next(), 0);
        }

        let skip_start = start.offset > 0;
        let skip_end = end.offset == 0 && end.path != start.path;
        let targets: Vec<(Path, Marks)> = self
            .document()
            .texts()
            .into_iter()
            .filter(|(path, _)| path >= &start.path && path <= &end.path)
            .filter(|(path, _)| !(skip_start && *path == start.path))
            .filter(|(path, _)| !(skip_end && *path == end.path))
            .filter(|(path, _)| self.document().void_above(path).is_none())
            .map(|(path, text)| (path, text.marks()))
            .collect();

        for (path, marks) in targets {
            let updated = marks.with(mark, value);
            if updated != marks {
                self.apply(Operation::SetNode {
                    path,
                    properties: NodeProps::Text(marks),
                    new_properties: NodeProps::Text(updated),
                })?;
            }
        }

        self.select(Some(range.with_edges(start, end)))
    }

    // ---- blocks ----

    /// Apply a kind or alignment change to every lowest block in `range`
    ///
    /// Kind changes leave void elements alone.
    pub fn set_nodes(&mut self, range: &Range, update: BlockUpdate) -> EditorResult<()> {
        let range = query::unhang(self.document(), range);
        let changes: Vec<Operation> = query::lowest_blocks(self.document(), &range)
            .into_iter()
            .filter_map(|(path, element)| {
                let old = element.props();
                let new = match update {
                    BlockUpdate::Kind(_) if element.is_void() => return None,
                    BlockUpdate::Kind(kind) => ElementProps {
                        kind,
                        ..old.clone()
                    },
                    BlockUpdate::Align(align) => ElementProps {
                        align,
                        ..old.clone()
                    },
                };
                (new != old).then(|| Operation::SetNode {
                    path,
                    properties: NodeProps::Element(old),
                    new_properties: NodeProps::Element(new),
                })
            })
            .collect();

        for op in changes {
            self.apply(op)?;
        }
        Ok(())
    }

    /// Lift the list items touched by `range` out of their list containers
    ///
    /// Each list is split around the touched items first, so items outside
    /// the range stay wrapped.
    pub fn unwrap_lists(&mut self, range: &Range) -> EditorResult<()> {
        let range = query::unhang(self.document(), range);
        let (start, end) = range.edges();
        let (start, end) = (start.path.clone(), end.path.clone());

        let lists: Vec<(Path, ElementProps, usize)> = self
            .document()
            .nodes_in(&range, false)
            .into_iter()
            .filter_map(|(path, node)| {
                node.as_element()
                    .filter(|e| e.kind.is_list())
                    .map(|e| (path, e.props(), e.children.len()))
            })
            .collect();

        for (path, props, len) in lists.into_iter().rev() {
            if len == 0 {
                continue;
            }
            let depth = path.len();
            let first = if path.is_ancestor_of(&start) {
                start.as_slice()[depth]
            } else {
                0
            };
            let last = if path.is_ancestor_of(&end) {
                end.as_slice()[depth]
            } else {
                len - 1
            };

            if last + 1 < len {
                self.apply(Operation::SplitNode {
                    path: path.clone(),
                    position: last + 1,
                    properties: NodeProps::Element(props.clone()),
                })?;
            }
            let middle = if first > 0 {
                self.apply(Operation::SplitNode {
                    path: path.clone(),
                    position: first,
                    properties: NodeProps::Element(props.clone()),
                })?;
                path.next()
            } else {
                path
            };
            self.apply(Operation::UnwrapNode {
                path: middle,
                element: props,
                count: last - first + 1,
            })?;
        }
        Ok(())
    }

    /// Wrap each run of top-level list items touched by `range` in a new list
    pub fn wrap_list_items(&mut self, range: &Range, kind: ElementKind) -> EditorResult<()> {
        let range = query::unhang(self.document(), range);
        let (start, end) = range.edges();
        let (first, last) = (top_index(&start.path), top_index(&end.path));

        let mut runs: Vec<(usize, usize)> = Vec::new();
        for (index, node) in self.document().children().iter().enumerate() {
            if index < first || index > last || !is_list_item(node) {
                continue;
            }
            match runs.last_mut() {
                Some((from, count)) if *from + *count == index => *count += 1,
                _ => runs.push((index, 1)),
            }
        }

        for (from, count) in runs.into_iter().rev() {
            self.apply(Operation::WrapNodes {
                path: Path::from([from]),
                count,
                element: ElementProps {
                    kind,
                    align: None,
                    url: None,
                },
            })?;
        }
        Ok(())
    }

    /// Insert a top-level block at the cursor
    ///
    /// Goes after the cursor's top-level block when the cursor is at its end,
    /// before it when at its start, and otherwise between the two halves of
    /// that block split at the cursor. The cursor moves to the start of the
    /// following block, or onto the inserted block when nothing follows.
    pub fn insert_block(&mut self, element: Element) -> EditorResult<Path> {
        self.delete_expanded()?;
        let point = self.cursor()?;
        let top = Path::from([top_index(&point.path)]);

        let index = if query::is_block_end(self.document(), &point, &top) {
            top_index(&top) + 1
        } else if query::is_block_start(self.document(), &point, &top) {
            top_index(&top)
        } else {
            self.split_to_top(&point)?
        };

        let path = Path::from([index]);
        self.apply(Operation::InsertNode {
            path: path.clone(),
            node: element.into(),
        })?;

        let next = path.next();
        let target = if self.document().has_path(&next) {
            self.document().start_point(&next)
        } else {
            self.document().start_point(&path)
        };
        self.select(target.map(Range::collapsed))?;
        Ok(path)
    }

    /// Split every ancestor of `point` up to the top level; returns the
    /// top-level index of the boundary
    fn split_to_top(&mut self, point: &Point) -> EditorResult<usize> {
        let mut path = point.path.clone();
        let mut position = point.offset;
        let mut len = self.document().leaf(&path)?.len();

        loop {
            let index = path.last().unwrap_or(0);
            let boundary = if position == 0 {
                index
            } else if position >= len {
                index + 1
            } else {
                let properties = NodeProps::of(self.document().node(&path)?);
                self.apply(Operation::SplitNode {
                    path: path.clone(),
                    position,
                    properties,
                })?;
                index + 1
            };

            match path.parent() {
                Some(parent) if !parent.is_root() => {
                    len = self.document().children_at(&parent)?.len();
                    position = boundary;
                    path = parent;
                }
                _ => return Ok(boundary),
            }
        }
    }

    // ---- text ----

    /// Insert `text` at the cursor, in a new leaf when pending marks differ
    /// from the cursor leaf's marks
    pub fn insert_text(&mut self, text: &str) -> EditorResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.delete_expanded()?;
        let point = self.cursor()?;
        if self.document().void_above(&point.path).is_some() {
            return Ok(());
        }

        let leaf = self.document().leaf(&point.path)?;
        let (len, leaf_marks) = (leaf.len(), leaf.marks());

        match self.state.marks.take() {
            Some(marks) if marks != leaf_marks => {
                let path = if point.offset == 0 {
                    point.path.clone()
                } else {
                    if point.offset < len {
                        self.apply(Operation::SplitNode {
                            path: point.path.clone(),
                            position: point.offset,
                            properties: NodeProps::Text(leaf_marks),
                        })?;
                    }
                    point.path.next()
                };
                self.apply(Operation::InsertNode {
                    path: path.clone(),
                    node: Text::with_marks(text, marks).into(),
                })?;
                let end = Point::new(path, text.chars().count());
                self.select(Some(Range::collapsed(end)))
            }
            _ => self.apply(Operation::InsertText {
                path: point.path,
                offset: point.offset,
                text: text.to_string(),
            }),
        }
    }

    /// Split the cursor's block in two, or add a paragraph after a void
    pub fn insert_break(&mut self) -> EditorResult<()> {
        self.delete_expanded()?;
        let point = self.cursor()?;

        if let Some(void) = self.document().void_above(&point.path) {
            let path = void.next();
            self.apply(Operation::InsertNode {
                path: path.clone(),
                node: Element::new(ElementKind::Paragraph).into(),
            })?;
            return self.select(Some(Range::collapsed(Point::new(path.child(0), 0))));
        }

        let block = point.path.parent().ok_or(EditorError::NoSelection)?;
        let leaf_index = point.path.last().unwrap_or(0);
        let leaf = self.document().leaf(&point.path)?;
        let (len, marks) = (leaf.len(), leaf.marks());

        let position = if point.offset == 0 {
            leaf_index
        } else if point.offset >= len {
            leaf_index + 1
        } else {
            self.apply(Operation::SplitNode {
                path: point.path.clone(),
                position: point.offset,
                properties: NodeProps::Text(marks),
            })?;
            leaf_index + 1
        };

        let properties = NodeProps::of(self.document().node(&block)?);
        self.apply(Operation::SplitNode {
            path: block.clone(),
            position,
            properties,
        })?;

        let next = block.next();
        for half in [&block, &next] {
            if self.document().children_at(half)?.is_empty() {
                self.apply(Operation::InsertNode {
                    path: half.child(0),
                    node: Text::with_marks("", marks).into(),
                })?;
            }
        }

        let target = self.document().start_point(&next);
        self.select(target.map(Range::collapsed))
    }

    /// Remove the content of `range` and collapse to its start
    ///
    /// Blocks on both edges are joined. A void on either edge is removed
    /// entirely.
    pub fn delete_range(&mut self, range: &Range) -> EditorResult<()> {
        let (start, end) = range.edges();
        let (mut start, mut end) = (start.clone(), end.clone());
        if start == end {
            return Ok(());
        }

        if start.path == end.path {
            let leaf = self.document().leaf(&start.path)?;
            let text = char_slice(&leaf.text, start.offset, end.offset);
            if !text.is_empty() {
                self.apply(Operation::RemoveText {
                    path: start.path.clone(),
                    offset: start.offset,
                    text,
                })?;
            }
            return self.select(Some(Range::collapsed(start)));
        }

        let leaf = self.document().leaf(&end.path)?;
        if end.offset > 0 {
            let text = char_slice(&leaf.text, 0, end.offset);
            let op = Operation::RemoveText {
                path: end.path.clone(),
                offset: 0,
                text,
            };
            self.apply_tracked(op, &mut [&mut end])?;
        }

        let leaf = self.document().leaf(&start.path)?;
        if start.offset < leaf.len() {
            let text = char_slice(&leaf.text, start.offset, leaf.len());
            self.apply(Operation::RemoveText {
                path: start.path.clone(),
                offset: start.offset,
                text,
            })?;
        }

        let between = nodes_between(self.document(), &start.path, &end.path);
        for (path, node) in between.into_iter().rev() {
            self.apply_tracked(Operation::RemoveNode { path, node }, &mut [&mut start, &mut end])?;
        }

        let start_block = start.path.parent().unwrap_or_default();
        let end_block = end.path.parent().unwrap_or_default();
        if start_block == end_block {
            return self.select(Some(Range::collapsed(start)));
        }

        let start_void = self.document().element(&start_block)?.is_void();
        let end_void = self.document().element(&end_block)?.is_void();
        if !start_void && !end_void {
            self.join_blocks(&start_block, &end_block)?;
            return self.select(Some(Range::collapsed(start)));
        }

        let mut collapse = if start_void { end.clone() } else { start.clone() };
        if end_void {
            self.remove_with_empty_ancestors(&end_block, &mut [&mut collapse])?;
        }
        if start_void {
            self.remove_with_empty_ancestors(&start_block, &mut [&mut collapse])?;
        }
        if self.document().is_empty() {
            self.apply(Operation::InsertNode {
                path: Path::from([0]),
                node: Element::new(ElementKind::Paragraph).into(),
            })?;
        }
        let target = self.document().nearest_point(&collapse);
        self.select(target.map(Range::collapsed))
    }

    /// Move the leaves of block `b` to the end of block `a` (which precedes
    /// it) and drop `b`
    fn join_blocks(&mut self, a: &Path, b: &Path) -> EditorResult<()> {
        let a_len = self.document().children_at(a)?.len();

        if *b == a.next() {
            let properties = NodeProps::of(self.document().node(b)?);
            return self.apply(Operation::MergeNode {
                path: b.clone(),
                position: a_len,
                properties,
            });
        }

        let leaves: Vec<Node> = self.document().children_at(b)?.to_vec();
        for (i, leaf) in leaves.into_iter().enumerate() {
            self.apply(Operation::RemoveNode {
                path: b.child(0),
                node: leaf.clone(),
            })?;
            self.apply(Operation::InsertNode {
                path: a.child(a_len + i),
                node: leaf,
            })?;
        }
        self.remove_with_empty_ancestors(b, &mut [])
    }

    fn remove_with_empty_ancestors(
        &mut self,
        path: &Path,
        tracked: &mut [&mut Point],
    ) -> EditorResult<()> {
        let mut path = path.clone();
        loop {
            let node = self.document().node(&path)?.clone();
            self.apply_tracked(
                Operation::RemoveNode {
                    path: path.clone(),
                    node,
                },
                tracked,
            )?;
            let Some(parent) = path.parent().filter(|p| !p.is_root()) else {
                return Ok(());
            };
            if !self.document().children_at(&parent)?.is_empty() {
                return Ok(());
            }
            path = parent;
        }
    }
}

fn top_index(path: &Path) -> usize {
    path.as_slice().first().copied().unwrap_or(0)
}

fn is_list_item(node: &Node) -> bool {
    matches!(node, Node::Element(e) if e.kind == ElementKind::ListItem)
}

fn char_slice(text: &str, from: usize, to: usize) -> String {
    text.chars().skip(from).take(to.saturating_sub(from)).collect()
}

/// Outermost nodes lying strictly between two leaves, in document order
fn nodes_between(doc: &Document, start: &Path, end: &Path) -> Vec<(Path, Node)> {
    let mut out: Vec<(Path, Node)> = Vec::new();
    for (path, node) in doc.descendants() {
        if &path <= start || &path >= end || path.is_ancestor_of(end) {
            continue;
        }
        if out.last().map(|(p, _)| p.is_ancestor_of(&path)).unwrap_or(false) {
            continue;
        }
        out.push((path, node.clone()));
    }
    out
}
