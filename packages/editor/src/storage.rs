//! # Document Storage
//!
//! Where the document is persisted between sessions.
//!
//! A store can be:
//! - **Memory-backed**: for tests and ephemeral sessions
//! - **File-backed**: JSON on disk
//! - **Background**: any store driven from a tokio task, so saving never
//!   blocks an edit
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Normalize → Edit → Save (after every tree change)
//!   ↓                         ↓
//! store                     store
//! ```

use crate::config::EditorConfig;
use crate::errors::EditorResult;
use quire_document::{normalize_document, Document};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Persistence collaborator
pub trait DocumentStore: Send + Sync {
    /// The saved document, or `None` when nothing has been saved yet
    fn load(&self) -> EditorResult<Option<Document>>;

    fn save(&self, document: &Document) -> EditorResult<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn load(&self) -> EditorResult<Option<Document>> {
        (**self).load()
    }

    fn save(&self, document: &Document) -> EditorResult<()> {
        (**self).save(document)
    }
}

/// In-memory store holding the serialized form
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with serialized content (which may be invalid)
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(contents.into())),
            saves: Mutex::new(0),
        }
    }

    /// Last saved serialized document
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().map(|slot| slot.clone()).unwrap_or_default()
    }

    /// Number of saves so far
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or_default()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> EditorResult<Option<Document>> {
        match self.contents() {
            Some(json) => Ok(Some(Document::from_json(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, document: &Document) -> EditorResult<()> {
        let json = document.to_json()?;
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(json);
        }
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}

/// JSON file on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl DocumentStore for FileStore {
    fn load(&self) -> EditorResult<Option<Document>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let source = std::fs::read_to_string(&self.path)?;
        Ok(Some(Document::from_json(&source)?))
    }

    fn save(&self, document: &Document) -> EditorResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, document.to_json_pretty()?)?;
        debug!(path = %self.path.display(), "document saved");
        Ok(())
    }
}

enum StoreMessage {
    Save(Document),
    Flush(oneshot::Sender<()>),
}

/// Forwards saves to a tokio task owning the inner store
///
/// `save` only enqueues a snapshot. The task writes snapshots in order on the
/// blocking pool; failures inside the task are logged.
pub struct BackgroundStore<S> {
    inner: Arc<S>,
    sender: mpsc::UnboundedSender<StoreMessage>,
}

impl<S: DocumentStore + 'static> BackgroundStore<S> {
    /// Start the writer task; must be called inside a tokio runtime
    pub fn spawn(inner: S) -> Self {
        let inner = Arc::new(inner);
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let writer = Arc::clone(&inner);

        tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                match message {
                    StoreMessage::Save(document) => {
                        let store = Arc::clone(&writer);
                        match tokio::task::spawn_blocking(move || store.save(&document)).await {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => warn!(error = %e, "background save failed"),
                            Err(e) => warn!(error = %e, "background save task did not finish"),
                        }
                    }
                    StoreMessage::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });

        Self { inner, sender }
    }

    /// Wait until every save enqueued so far has been written
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(StoreMessage::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: DocumentStore + 'static> DocumentStore for BackgroundStore<S> {
    fn load(&self) -> EditorResult<Option<Document>> {
        self.inner.load()
    }

    fn save(&self, document: &Document) -> EditorResult<()> {
        if self.sender.send(StoreMessage::Save(document.clone())).is_err() {
            warn!("background store writer has stopped; save dropped");
        }
        Ok(())
    }
}

/// Load from `store`, falling back to the configured default document
pub fn load_or_default(store: &dyn DocumentStore, config: &EditorConfig) -> Document {
    let fallback = || Document::default_document(config.sample_image.as_deref());

    match store.load() {
        Ok(Some(document)) => match normalize_document(document) {
            Ok(document) => {
                info!(blocks = document.children().len(), "document loaded");
                document
            }
            Err(e) => {
                warn!(error = %e, "stored document could not be repaired, using default");
                fallback()
            }
        },
        Ok(None) => {
            info!("no stored document, using default");
            fallback()
        }
        Err(e) => {
            warn!(error = %e, "failed to load stored document, using default");
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_document::Element;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        let doc = Document::new(vec![Element::paragraph("saved")]);
        store.save(&doc).unwrap();
        assert_eq!(store.load().unwrap(), Some(doc));
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("content.json"));
        assert!(store.load().unwrap().is_none());

        let doc = Document::new(vec![Element::paragraph("on disk"), Element::image("https://x/y.png")]);
        store.save(&doc).unwrap();
        assert_eq!(store.load().unwrap(), Some(doc));
    }

    #[test]
    fn test_load_or_default_falls_back_on_garbage() {
        let config = EditorConfig {
            sample_image: Some("https://example.com/sample.png".into()),
            ..EditorConfig::default()
        };
        let store = MemoryStore::with_contents("{ not json");
        let doc = load_or_default(&store, &config);
        assert_eq!(doc, Document::default_document(Some("https://example.com/sample.png")));

        let empty = MemoryStore::new();
        assert_eq!(load_or_default(&empty, &EditorConfig::default()), Document::default());
    }

    #[test]
    fn test_load_or_default_normalizes() {
        let store = MemoryStore::with_contents(r#"[{"type":"list-item","children":[{"text":"a"}]}]"#);
        let doc = load_or_default(&store, &EditorConfig::default());
        assert_eq!(doc.element(&quire_document::Path::from([0])).unwrap().kind.as_str(), "bulleted-list");
    }

    /// Save blocks until released from the test, recording whether it was
    struct GatedStore {
        gate: Mutex<std::sync::mpsc::Receiver<()>>,
        released: Mutex<bool>,
    }

    impl DocumentStore for GatedStore {
        fn load(&self) -> EditorResult<Option<Document>> {
            Ok(None)
        }

        fn save(&self, _document: &Document) -> EditorResult<()> {
            let gate = self.gate.lock().unwrap();
            let released = gate.recv_timeout(std::time::Duration::from_secs(2)).is_ok();
            *self.released.lock().unwrap() = released;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_background_save_does_not_block_the_runtime() {
        let (release, gate) = std::sync::mpsc::channel();
        let store = BackgroundStore::spawn(GatedStore {
            gate: Mutex::new(gate),
            released: Mutex::new(false),
        });

        store.save(&Document::default()).unwrap();
        // On a single-threaded runtime this only wakes if the save is off-thread
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        release.send(()).unwrap();
        store.flush().await;

        assert!(*store.inner().released.lock().unwrap());
    }

    #[tokio::test]
    async fn test_background_store_writes_after_flush() {
        let store = BackgroundStore::spawn(MemoryStore::new());
        let doc = Document::new(vec![Element::paragraph("later")]);
        store.save(&doc).unwrap();
        store.flush().await;
        assert_eq!(store.inner().load().unwrap(), Some(doc));
        assert_eq!(store.inner().save_count(), 1);
    }
}
