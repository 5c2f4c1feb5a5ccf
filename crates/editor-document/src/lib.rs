#![warn(missing_docs)]
//! Editor Document - mutable text model for headless code editors
//!
//! # Overview
//!
//! `editor-document` is the text model underneath an editor: a large, frequently edited
//! character buffer together with an incrementally maintained line index, position
//! markers that survive edits, change events, immutable snapshots, undo and versions.
//! It does not render anything and has no notion of carets or views.
//!
//! # Core Features
//!
//! - **Rope Storage**: balanced chunk tree, `O(log n)` insert/remove, `O(1)` snapshots
//! - **Line Index**: `O(log n)` line lookup by number and by offset, `\n`, `\r` and `\r\n`
//! - **Anchors**: positions that follow edits, with movement and survival policies
//! - **Change Events**: `Changing`/`Changed` per edit, aggregated events per update
//! - **Line Trackers**: synchronous hooks used by incremental consumers (highlighting)
//! - **Undo/Redo**: grouped by update, with size limit and clean-point tracking
//! - **Versions**: checkpoint chain able to replay changes and map offsets
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  TextDocument (replace, events, undo)       │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Anchors & Offset Change Maps               │  ← Position tracking
//! ├─────────────────────────────────────────────┤
//! │  Line Index (sum tree of line lengths)      │  ← Line Access
//! ├─────────────────────────────────────────────┤
//! │  Sequence Buffer & Snapshots (rope)         │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editor_document::{AnchorMovementType, TextDocument, TextSource};
//!
//! let mut doc = TextDocument::new("fn main() {}\n");
//! let anchor = doc.create_anchor(11).unwrap();
//! doc.set_anchor_movement(anchor, AnchorMovementType::AfterInsertion).unwrap();
//!
//! doc.insert(11, "\n    println!(\"hi\");\n").unwrap();
//! assert_eq!(doc.line_count(), 4);
//! assert_eq!(doc.anchor_offset(anchor).unwrap(), 32);
//!
//! doc.undo().unwrap();
//! assert_eq!(doc.text(), "fn main() {}\n");
//! ```
//!
//! ## Batching edits
//!
//! ```rust
//! use editor_document::{DocumentEvent, TextDocument};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! let mut doc = TextDocument::new("");
//! let text_changed = Arc::new(AtomicUsize::new(0));
//! let counter = text_changed.clone();
//! doc.subscribe(move |_, event| {
//!     if let DocumentEvent::TextChanged = event {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!     }
//! });
//!
//! doc.run_update(|doc| {
//!     doc.insert(0, "a")?;
//!     doc.insert(1, "b")?;
//!     doc.insert(2, "c")
//! })
//! .unwrap();
//! assert_eq!(text_changed.load(Ordering::Relaxed), 1);
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - rope-backed sequence buffer
//! - [`snapshot`] - immutable snapshots and the cross-thread snapshot source
//! - [`line_index`] - incremental line index
//! - [`anchor`] - anchors and movement policies
//! - [`offset_map`] - offset change maps and mapping types
//! - [`document`] - the document, its events and update groups
//! - [`undo`] - undo history
//! - [`version`] - change checkpoints
//!
//! # Text Unit
//!
//! All offsets and lengths count Unicode scalar values (`char`s).

pub mod anchor;
pub mod buffer;
pub mod change;
pub mod document;
pub mod error;
pub mod line_ending;
pub mod line_index;
pub mod offset_map;
pub mod search;
pub mod snapshot;
pub mod sum_tree;
pub mod text_source;
pub mod tracker;
pub mod undo;
pub mod version;

pub use anchor::{AnchorMovementType, TextAnchor};
pub use buffer::SequenceBuffer;
pub use change::DocumentChange;
pub use document::{
    AnchorSegment, DocumentEvent, DocumentOptions, ListenerId, TextDocument, TextLocation,
};
pub use error::{DocumentError, Result};
pub use line_ending::NewLine;
pub use line_index::{DocumentLine, LineChange, LineIndex};
pub use offset_map::{OffsetChangeMap, OffsetChangeMapEntry, OffsetChangeMappingType};
pub use search::Comparison;
pub use snapshot::{SnapshotSource, TextSnapshot};
pub use sum_tree::SumTree;
pub use text_source::TextSource;
pub use tracker::{LineTracker, TrackerId};
pub use undo::UndoStack;
pub use version::ChangeCheckpoint;
