//! # Editor
//!
//! Owns the live document, selection and pending marks, and exposes the
//! command surface.
//!
//! ## Lifecycle
//!
//! ```text
//! command → Transaction (scratch copy) → normalize → validate → commit
//!                                                                  ↓
//!                                          Change + save (tree changes only)
//! ```
//!
//! Image decodes started by a paste run as tokio tasks tracked in a
//! [`JoinSet`]; [`Editor::settle_decodes`] or [`Editor::drain_decodes`] apply
//! each completion as its own command. A decode task that panics or is
//! cancelled is logged and counted as finished.

use crate::classify::{classify, validate_image_url, Classification, ExternalContent, FilePayload};
use crate::config::EditorConfig;
use crate::decode::{self, DecodedImage};
use crate::errors::{EditorError, EditorResult};
use crate::format::{BlockFormat, BlockTarget};
use crate::query;
use crate::storage::{load_or_default, DocumentStore, MemoryStore};
use crate::transforms::{BlockUpdate, Transaction};
use quire_document::{
    normalize_document, Document, Element, ElementKind, Mark, Marks, Operation, Point, Range,
};
use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, instrument, warn};

/// Everything a command reads and writes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    pub document: Document,
    pub selection: Option<Range>,
    /// Marks the next typed text will carry, set by a collapsed mark toggle
    pub marks: Option<Marks>,
}

/// What one committed command did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub operations: Vec<Operation>,
    /// Whether any operation touched the tree (not just the selection)
    pub tree_changed: bool,
}

impl Change {
    pub fn new(operations: Vec<Operation>) -> Self {
        let tree_changed = operations.iter().any(Operation::is_structural);
        Self {
            operations,
            tree_changed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operations that undo this change, in application order
    pub fn inverse(&self) -> Vec<Operation> {
        self.operations.iter().rev().map(Operation::inverse).collect()
    }

    pub fn extend(&mut self, other: Change) {
        self.tree_changed |= other.tree_changed;
        self.operations.extend(other.operations);
    }
}

/// Rich-text editor session
pub struct Editor {
    state: EditorState,
    store: Box<dyn DocumentStore>,
    decodes: JoinSet<DecodedImage>,
}

impl Editor {
    /// Editor over `document`, saving to `store`
    pub fn new(document: Document, store: impl DocumentStore + 'static) -> Self {
        let document = normalize_document(document).unwrap_or_else(|e| {
            warn!(error = %e, "document could not be normalized, using default");
            Document::default()
        });
        Self {
            state: EditorState {
                document,
                selection: None,
                marks: None,
            },
            store: Box::new(store),
            decodes: JoinSet::new(),
        }
    }

    /// Editor over whatever `store` holds, or the configured default
    pub fn load(store: impl DocumentStore + 'static, config: &EditorConfig) -> Self {
        let document = load_or_default(&store, config);
        Self::new(document, store)
    }

    /// Editor backed by a fresh [`MemoryStore`]
    pub fn in_memory(document: Document) -> Self {
        Self::new(document, MemoryStore::new())
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn document(&self) -> &Document {
        &self.state.document
    }

    pub fn selection(&self) -> Option<&Range> {
        self.state.selection.as_ref()
    }

    /// Pending insertion marks, if a collapsed toggle set any
    pub fn pending_marks(&self) -> Option<Marks> {
        self.state.marks
    }

    /// Number of image decodes still in flight
    pub fn pending_decodes(&self) -> usize {
        self.decodes.len()
    }

    // ---- queries ----

    pub fn active_marks(&self) -> Marks {
        query::active_marks(&self.state.document, self.selection(), self.state.marks)
    }

    pub fn is_mark_active(&self, mark: Mark) -> bool {
        self.active_marks().get(mark)
    }

    pub fn is_block_active(&self, format: BlockFormat) -> bool {
        query::is_block_active(&self.state.document, self.selection(), format)
    }

    // ---- commands ----

    #[instrument(skip_all, fields(range = %range))]
    pub fn select(&mut self, range: Range) -> EditorResult<Change> {
        self.state.document.resolve_range(&range)?;
        self.transact("select", |tx| tx.select(Some(range)))
    }

    #[instrument(skip(self))]
    pub fn deselect(&mut self) -> EditorResult<Change> {
        self.transact("deselect", |tx| tx.select(None))
    }

    /// Flip `mark` at the selection
    ///
    /// A collapsed cursor only changes the pending marks; an expanded range
    /// sets or clears the flag on every leaf inside it.
    #[instrument(skip_all, fields(mark = %mark))]
    pub fn toggle_mark(&mut self, mark: Mark) -> EditorResult<Change> {
        let selection = self.state.selection.clone().ok_or(EditorError::NoSelection)?;
        let active = self.is_mark_active(mark);

        self.transact("toggle_mark", |tx| {
            if selection.is_collapsed() {
                let current = query::active_marks(tx.document(), Some(&selection), tx.marks());
                tx.set_marks(Some(current.with(mark, !active)));
                Ok(())
            } else {
                tx.set_mark(&selection, mark, !active)
            }
        })
    }

    /// Flip a structural kind or an alignment on the blocks at the selection
    #[instrument(skip_all, fields(format = %format))]
    pub fn toggle_block(&mut self, format: BlockFormat) -> EditorResult<Change> {
        let selection = self.state.selection.clone().ok_or(EditorError::NoSelection)?;
        let active = self.is_block_active(format);

        self.transact("toggle_block", |tx| {
            if !format.is_align() {
                tx.unwrap_lists(&selection)?;
            }
            let range = tx.selection().cloned().ok_or(EditorError::NoSelection)?;

            let kind = match format.target() {
                BlockTarget::Align(align) => {
                    let align = if active { None } else { Some(align) };
                    return tx.set_nodes(&range, BlockUpdate::Align(align));
                }
                BlockTarget::Kind(kind) => kind,
            };
            let target = if active {
                ElementKind::Paragraph
            } else if kind.is_list() {
                ElementKind::ListItem
            } else {
                kind
            };
            tx.set_nodes(&range, BlockUpdate::Kind(target))?;

            if !active && kind.is_list() {
                let range = tx.selection().cloned().ok_or(EditorError::NoSelection)?;
                tx.wrap_list_items(&range, kind)?;
            }
            Ok(())
        })
    }

    /// Insert an image block at the cursor; rejects anything but an image URL
    #[instrument(skip(self))]
    pub fn insert_image(&mut self, url: &str) -> EditorResult<Change> {
        let url = validate_image_url(url)?;
        self.insert_image_at(url.into(), None)
    }

    /// Route pasted or dropped content into image or text insertion
    #[instrument(skip_all, fields(files = content.files.len(), has_text = content.text.is_some()))]
    pub fn insert_from_external_content(&mut self, content: ExternalContent) -> EditorResult<Change> {
        match classify(&content) {
            Classification::Images(files) => self.begin_decodes(files),
            Classification::ImageUrl(url) => self.insert_image_at(url, None),
            Classification::Text(text) => self.transact("insert_data", |tx| {
                for (i, line) in text.split('\n').enumerate() {
                    if i > 0 {
                        tx.insert_break()?;
                    }
                    tx.insert_text(line.trim_end_matches('\r'))?;
                }
                Ok(())
            }),
            Classification::Empty => Ok(Change::default()),
        }
    }

    #[instrument(skip(self))]
    pub fn insert_text(&mut self, text: &str) -> EditorResult<Change> {
        self.transact("insert_text", |tx| tx.insert_text(text))
    }

    #[instrument(skip(self))]
    pub fn insert_break(&mut self) -> EditorResult<Change> {
        self.transact("insert_break", |tx| tx.insert_break())
    }

    #[instrument(skip(self))]
    pub fn delete_fragment(&mut self) -> EditorResult<Change> {
        self.transact("delete_fragment", |tx| {
            let range = tx.selection().cloned().ok_or(EditorError::NoSelection)?;
            tx.delete_range(&range)
        })
    }

    /// Apply raw operations (for example a [`Change::inverse`]) as one command
    #[instrument(skip_all, fields(operations = operations.len()))]
    pub fn apply_operations(&mut self, operations: Vec<Operation>) -> EditorResult<Change> {
        self.transact("apply_operations", |tx| {
            for op in operations {
                tx.apply(op)?;
            }
            Ok(())
        })
    }

    // ---- image decodes ----

    fn begin_decodes(&mut self, files: Vec<FilePayload>) -> EditorResult<Change> {
        let point = self
            .selection()
            .map(|range| range.start().clone())
            .ok_or(EditorError::NoSelection)?;

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            let mut change = Change::default();
            for file in files {
                let result = decode::encode_data_url(&file);
                change.extend(self.apply_decoded(DecodedImage {
                    name: file.name,
                    point: point.clone(),
                    result,
                })?);
            }
            return Ok(change);
        };

        for file in files {
            let point = point.clone();
            self.decodes.spawn_on(
                async move {
                    let name = file.name.clone();
                    let result = decode::data_url(file).await;
                    DecodedImage { name, point, result }
                },
                &handle,
            );
        }
        debug!(pending = self.decodes.len(), "image decodes started");
        Ok(Change::default())
    }

    /// Insert one decoded image
    ///
    /// Dropped with a warning when decoding failed or the point captured at
    /// paste time no longer resolves. Otherwise the image goes in at the live
    /// selection, or at the captured point when nothing is selected.
    pub fn apply_decoded(&mut self, decoded: DecodedImage) -> EditorResult<Change> {
        let url = match decoded.result {
            Ok(url) => url,
            Err(e) => {
                warn!(file = %decoded.name, error = %e, "image decode failed, dropping");
                return Ok(Change::default());
            }
        };
        if let Err(e) = self.state.document.resolve_point(&decoded.point) {
            warn!(
                file = %decoded.name,
                point = %decoded.point,
                error = %e,
                "insertion point no longer resolves, dropping decoded image"
            );
            return Ok(Change::default());
        }

        let at = match self.state.selection {
            Some(_) => None,
            None => Some(decoded.point),
        };
        self.insert_image_at(url, at)
    }

    /// Wait for every in-flight decode and apply each as it completes
    pub async fn settle_decodes(&mut self) -> EditorResult<Vec<Change>> {
        let mut changes = Vec::new();
        while let Some(joined) = self.decodes.join_next().await {
            if let Some(change) = self.apply_joined(joined)? {
                changes.push(change);
            }
        }
        Ok(changes)
    }

    /// Apply the decodes that have already completed, without waiting
    pub fn drain_decodes(&mut self) -> EditorResult<Vec<Change>> {
        let mut changes = Vec::new();
        while let Some(joined) = self.decodes.try_join_next() {
            if let Some(change) = self.apply_joined(joined)? {
                changes.push(change);
            }
        }
        Ok(changes)
    }

    fn apply_joined(
        &mut self,
        joined: Result<DecodedImage, JoinError>,
    ) -> EditorResult<Option<Change>> {
        match joined {
            Ok(decoded) => self.apply_decoded(decoded).map(Some),
            Err(e) => {
                warn!(error = %e, "image decode task did not finish, dropping");
                Ok(None)
            }
        }
    }

    fn insert_image_at(&mut self, url: String, at: Option<Point>) -> EditorResult<Change> {
        self.transact("insert_image", |tx| {
            if let Some(point) = at {
                tx.select(Some(Range::collapsed(point)))?;
            }
            tx.insert_block(Element::image(url)).map(|_| ())
        })
    }

    // ---- commit ----

    /// Run `f` against a scratch copy and commit it if the result is valid
    ///
    /// Document errors roll the transaction back and are logged rather than
    /// returned; the live state is untouched either way.
    fn transact<F>(&mut self, command: &'static str, f: F) -> EditorResult<Change>
    where
        F: FnOnce(&mut Transaction) -> EditorResult<()>,
    {
        let mut tx = Transaction::new(&self.state);
        match f(&mut tx) {
            Ok(()) => {}
            Err(EditorError::Document(e)) => {
                error!(command, error = %e, "transaction rolled back");
                return Ok(Change::default());
            }
            Err(e) => return Err(e),
        }

        let (state, operations) = match tx.finish() {
            Ok(done) => done,
            Err(e) => {
                error!(command, error = %e, "transaction rolled back");
                return Ok(Change::default());
            }
        };

        self.state = state;
        let change = Change::new(operations);
        debug!(
            command,
            operations = change.operations.len(),
            tree_changed = change.tree_changed,
            "command committed"
        );

        if change.tree_changed {
            self.persist();
        }
        Ok(change)
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.state.document) {
            warn!(error = %e, "failed to save document");
        }
    }
}
