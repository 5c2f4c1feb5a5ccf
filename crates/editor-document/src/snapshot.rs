//! Immutable text snapshots and the cross-thread snapshot source.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use ropey::Rope;

use crate::text_source::TextSource;
use crate::version::ChangeCheckpoint;

/// Immutable, cheaply clonable copy of a text.
///
/// Snapshots share rope nodes with the document they were taken from; later edits of
/// the document copy the nodes they touch, so a snapshot never observes them.
#[derive(Clone)]
pub struct TextSnapshot {
    rope: Rope,
    version: Option<ChangeCheckpoint>,
}

impl TextSnapshot {
    pub(crate) fn new(rope: Rope, version: Option<ChangeCheckpoint>) -> Self {
        Self { rope, version }
    }

    /// Snapshot of a plain string, not tied to any document.
    pub fn from_text(text: &str) -> Self {
        Self::new(Rope::from_str(text), None)
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }
}

impl TextSource for TextSnapshot {
    fn rope(&self) -> &Rope {
        &self.rope
    }

    fn version(&self) -> Option<ChangeCheckpoint> {
        self.version.clone()
    }
}

impl fmt::Debug for TextSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextSnapshot")
            .field("len", &self.rope.len_chars())
            .field("version", &self.version.as_ref().map(ChangeCheckpoint::id))
            .finish()
    }
}

impl fmt::Display for TextSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.rope, f)
    }
}

struct Published {
    rope: Rope,
    version: ChangeCheckpoint,
}

/// Handle for taking snapshots of a document from any thread.
///
/// The document publishes its rope root after every edit; taking a snapshot only holds
/// the lock long enough to clone that root.
#[derive(Clone)]
pub struct SnapshotSource {
    published: Arc<Mutex<Published>>,
}

impl SnapshotSource {
    pub(crate) fn new(rope: Rope, version: ChangeCheckpoint) -> Self {
        Self {
            published: Arc::new(Mutex::new(Published { rope, version })),
        }
    }

    pub(crate) fn publish(&self, rope: Rope, version: ChangeCheckpoint) {
        let mut published = self.published.lock();
        published.rope = rope;
        published.version = version;
    }

    /// Snapshot of the most recently published text.
    pub fn create_snapshot(&self) -> TextSnapshot {
        let published = self.published.lock();
        TextSnapshot::new(published.rope.clone(), Some(published.version.clone()))
    }

    /// Version of the most recently published text.
    pub fn version(&self) -> ChangeCheckpoint {
        self.published.lock().version.clone()
    }
}

impl fmt::Debug for SnapshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotSource")
            .field("version", &self.version().id())
            .finish()
    }
}
