//! # Quire Editor
//!
//! Editing engine for Quire rich-text documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ classify: pasted content → text or image    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: commands over the live state        │
//! │  - toggle marks / block formats             │
//! │  - insert images, text, breaks              │
//! │  - transactional commit + persistence       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ transforms / query: structural edits and    │
//! │ read-only questions over quire-document     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Atomic commands**: a command commits completely or not at all
//! 2. **Normalized always**: every commit leaves a valid document
//! 3. **Observable changes**: every command reports its operations
//!
//! ## Usage
//!
//! ```rust
//! use quire_editor::{BlockFormat, Editor};
//! use quire_document::{Document, Element, Mark, Point, Range};
//!
//! let mut editor = Editor::in_memory(Document::new(vec![Element::paragraph("hello")]));
//! editor.select(Range::new(Point::new([0, 0], 0), Point::new([0, 0], 5))).unwrap();
//! editor.toggle_mark(Mark::Bold).unwrap();
//! editor.toggle_block(BlockFormat::HeadingOne).unwrap();
//! assert!(editor.is_block_active(BlockFormat::HeadingOne));
//! ```

mod classify;
mod config;
mod decode;
mod editor;
mod errors;
mod format;
pub mod query;
mod storage;
mod transforms;

pub use classify::{
    classify, is_image_url, validate_image_url, Classification, ExternalContent, FilePayload,
    IMAGE_EXTENSIONS,
};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use decode::{data_url, encode_data_url, DecodedImage};
pub use editor::{Change, Editor, EditorState};
pub use errors::{EditorError, EditorResult, InvalidUrl};
pub use format::{BlockFormat, BlockTarget};
pub use storage::{load_or_default, BackgroundStore, DocumentStore, FileStore, MemoryStore};

// Re-export the document model for convenience
pub use quire_document as document;
