//! # Quire Document
//!
//! Document model for the Quire rich-text editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ node: Element / Text shapes, marks, kinds   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: path resolution + traversal       │
//! │  - Path / Point / Range addressing          │
//! │  - Persisted JSON form                      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ operation: invertible low-level mutations   │
//! │ normalize: repair pass + validation         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Paths, not pointers**: nodes are addressed by child-index paths
//! 2. **Operations carry the selection**: every mutation transforms points
//! 3. **Fail closed**: invalid content is coerced to a minimal valid form
//!
//! ## Usage
//!
//! ```rust
//! use quire_document::{normalize_document, validate, Document, Element};
//!
//! let doc = Document::new(vec![Element::paragraph("hello")]);
//! let doc = normalize_document(doc).unwrap();
//! validate(&doc).unwrap();
//! assert_eq!(doc.text_content(), "hello");
//! ```

mod document;
mod error;
mod node;
mod normalize;
mod operation;
mod path;
mod range;

pub use document::Document;
pub use error::{DocumentError, DocumentResult};
pub use node::{Align, Element, ElementKind, ElementProps, Mark, Marks, Node, Text, UnknownFormat};
pub use normalize::{normalize, normalize_document, validate};
pub use operation::{apply_all, NodeProps, Operation};
pub use path::Path;
pub use range::{InvalidPoint, Point, Range};
