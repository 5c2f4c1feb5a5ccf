//! Anchors: positions that follow the text through edits.
//!
//! Anchors live in a treap stored in an arena. Each node keeps its distance to the
//! previous anchor (`length`) and the sum of distances in its subtree (`total`), so no
//! node stores an absolute offset. A change splits the treap into three parts
//! (`before`, `affected`, `after`), repositions only the affected anchors and re-bases the
//! `after` part by adjusting the length of its leftmost node.

use tracing::trace;

use crate::error::{DocumentError, Result};
use crate::offset_map::OffsetChangeMapEntry;

/// How an anchor moves when text is inserted exactly at its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum AnchorMovementType {
    /// Follow the change: after the inserted text, unless the change asks to keep
    /// anchors before the insertion.
    #[default]
    Default,
    /// Stay in front of inserted text.
    BeforeInsertion,
    /// Move behind inserted text.
    AfterInsertion,
}

/// Handle to an anchor of a [`TextDocument`](crate::TextDocument).
///
/// Handles are cheap to copy. Once the anchor is deleted (by an edit removing the text
/// around it, or explicitly) the handle stays deleted even if its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextAnchor {
    index: u32,
    generation: u32,
}

const NIL: usize = usize::MAX;

#[derive(Debug, Clone)]
struct AnchorNode {
    left: usize,
    right: usize,
    parent: usize,
    priority: u64,
    length: usize,
    total: usize,
    movement: AnchorMovementType,
    survive_deletion: bool,
    generation: u32,
    live: bool,
}

/// Arena-backed treap of anchors.
#[derive(Debug)]
pub(crate) struct AnchorSet {
    nodes: Vec<AnchorNode>,
    free: Vec<usize>,
    root: usize,
    count: usize,
    seed: u64,
}

impl Default for AnchorSet {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NIL,
            count: 0,
            seed: 0x9E37_79B9_7F4A_7C15,
        }
    }
}

impl AnchorSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of live anchors.
    pub(crate) fn len(&self) -> usize {
        self.count
    }

    fn next_priority(&mut self) -> u64 {
        // xorshift64
        let mut x = self.seed;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.seed = x;
        x
    }

    fn total(&self, t: usize) -> usize {
        if t == NIL { 0 } else { self.nodes[t].total }
    }

    fn left(&self, t: usize) -> usize {
        self.nodes[t].left
    }

    fn right(&self, t: usize) -> usize {
        self.nodes[t].right
    }

    fn set_left(&mut self, t: usize, child: usize) {
        self.nodes[t].left = child;
        if child != NIL {
            self.nodes[child].parent = t;
        }
    }

    fn set_right(&mut self, t: usize, child: usize) {
        self.nodes[t].right = child;
        if child != NIL {
            self.nodes[child].parent = t;
        }
    }

    fn detach(&mut self, t: usize) {
        if t != NIL {
            self.nodes[t].parent = NIL;
        }
    }

    fn update(&mut self, t: usize) {
        let total = self.total(self.left(t)) + self.nodes[t].length + self.total(self.right(t));
        self.nodes[t].total = total;
    }

    /// Split `t` into anchors positioned before `key` and the rest. With `inclusive`,
    /// anchors exactly at `key` go left. `key` is relative to the start of `t`.
    fn split(&mut self, t: usize, key: usize, inclusive: bool) -> (usize, usize) {
        if t == NIL {
            return (NIL, NIL);
        }
        let pos = self.total(self.left(t)) + self.nodes[t].length;
        let goes_left = if inclusive { pos <= key } else { pos < key };
        let (l, r) = if goes_left {
            let (l, r) = self.split(self.right(t), key - pos, inclusive);
            self.set_right(t, l);
            self.update(t);
            (t, r)
        } else {
            let (l, r) = self.split(self.left(t), key, inclusive);
            self.set_left(t, r);
            self.update(t);
            (l, t)
        };
        self.detach(l);
        self.detach(r);
        (l, r)
    }

    /// Concatenate two treaps; every anchor of `a` precedes every anchor of `b`.
    fn merge(&mut self, a: usize, b: usize) -> usize {
        if a == NIL {
            return b;
        }
        if b == NIL {
            return a;
        }
        if self.nodes[a].priority > self.nodes[b].priority {
            let merged = self.merge(self.right(a), b);
            self.set_right(a, merged);
            self.update(a);
            a
        } else {
            let merged = self.merge(a, self.left(b));
            self.set_left(b, merged);
            self.update(b);
            b
        }
    }

    fn leftmost_length(&self, t: usize) -> usize {
        let mut t = t;
        while self.left(t) != NIL {
            t = self.left(t);
        }
        self.nodes[t].length
    }

    /// Adjust the length of the leftmost node of `t` by `delta`.
    fn add_to_leftmost(&mut self, t: usize, delta: isize) {
        let mut t = t;
        loop {
            let node = &mut self.nodes[t];
            node.total = node.total.saturating_add_signed(delta);
            if node.left == NIL {
                node.length = node.length.saturating_add_signed(delta);
                return;
            }
            t = node.left;
        }
    }

    /// In-order node indices of `t` with their absolute positions, starting at `base`.
    fn collect(&self, t: usize, base: usize, out: &mut Vec<(usize, usize)>) {
        if t == NIL {
            return;
        }
        self.collect(self.left(t), base, out);
        let pos = base + self.total(self.left(t)) + self.nodes[t].length;
        out.push((t, pos));
        self.collect(self.right(t), pos, out);
    }

    fn resolve(&self, anchor: TextAnchor) -> Result<usize> {
        let index = anchor.index as usize;
        match self.nodes.get(index) {
            Some(node) if node.live && node.generation == anchor.generation => Ok(index),
            _ => Err(DocumentError::AnchorDeleted),
        }
    }

    fn position(&self, t: usize) -> usize {
        let mut pos = self.total(self.left(t)) + self.nodes[t].length;
        let mut child = t;
        let mut parent = self.nodes[t].parent;
        while parent != NIL {
            if self.right(parent) == child {
                pos += self.total(self.left(parent)) + self.nodes[parent].length;
            }
            child = parent;
            parent = self.nodes[parent].parent;
        }
        pos
    }

    fn release(&mut self, t: usize) -> TextAnchor {
        let node = &mut self.nodes[t];
        let handle = TextAnchor {
            index: t as u32,
            generation: node.generation,
        };
        node.live = false;
        node.generation = node.generation.wrapping_add(1);
        node.left = NIL;
        node.right = NIL;
        node.parent = NIL;
        self.free.push(t);
        self.count -= 1;
        handle
    }

    /// Rebuild the tree from `before`, the affected anchors at their new absolute
    /// positions (sorted) and `after`, whose first anchor ends up at `after_first`.
    fn reassemble(&mut self, before: usize, group: &[(usize, usize)], after: usize, after_first: usize) {
        let mut tree = before;
        let mut last = self.total(before);
        for &(t, pos) in group {
            let node = &mut self.nodes[t];
            node.left = NIL;
            node.right = NIL;
            node.parent = NIL;
            node.length = pos - last;
            node.total = node.length;
            tree = self.merge(tree, t);
            last = pos;
        }
        if after != NIL {
            let current = self.leftmost_length(after);
            let wanted = after_first - last;
            self.add_to_leftmost(after, wanted as isize - current as isize);
            tree = self.merge(tree, after);
        }
        self.detach(tree);
        self.root = tree;
    }

    /// Create an anchor at `offset`. The caller validates the offset.
    pub(crate) fn create(&mut self, offset: usize) -> TextAnchor {
        let priority = self.next_priority();
        let node = AnchorNode {
            left: NIL,
            right: NIL,
            parent: NIL,
            priority,
            length: 0,
            total: 0,
            movement: AnchorMovementType::Default,
            survive_deletion: false,
            generation: 0,
            live: true,
        };
        let t = match self.free.pop() {
            Some(t) => {
                let generation = self.nodes[t].generation;
                self.nodes[t] = AnchorNode { generation, ..node };
                t
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.count += 1;

        let (l, r) = self.split(self.root, offset, true);
        let length = offset - self.total(l);
        self.nodes[t].length = length;
        self.nodes[t].total = length;
        if r != NIL {
            self.add_to_leftmost(r, -(length as isize));
        }
        let merged = self.merge(l, t);
        self.root = self.merge(merged, r);
        self.detach(self.root);
        TextAnchor {
            index: t as u32,
            generation: self.nodes[t].generation,
        }
    }

    pub(crate) fn offset(&self, anchor: TextAnchor) -> Result<usize> {
        self.resolve(anchor).map(|t| self.position(t))
    }

    pub(crate) fn is_deleted(&self, anchor: TextAnchor) -> bool {
        self.resolve(anchor).is_err()
    }

    pub(crate) fn movement(&self, anchor: TextAnchor) -> Result<AnchorMovementType> {
        self.resolve(anchor).map(|t| self.nodes[t].movement)
    }

    pub(crate) fn set_movement(&mut self, anchor: TextAnchor, movement: AnchorMovementType) -> Result<()> {
        let t = self.resolve(anchor)?;
        self.nodes[t].movement = movement;
        Ok(())
    }

    pub(crate) fn survive_deletion(&self, anchor: TextAnchor) -> Result<bool> {
        self.resolve(anchor).map(|t| self.nodes[t].survive_deletion)
    }

    pub(crate) fn set_survive_deletion(&mut self, anchor: TextAnchor, survive: bool) -> Result<()> {
        let t = self.resolve(anchor)?;
        self.nodes[t].survive_deletion = survive;
        Ok(())
    }

    /// Release an anchor. Other anchors keep their offsets.
    pub(crate) fn remove(&mut self, anchor: TextAnchor) -> Result<()> {
        let t = self.resolve(anchor)?;
        let pos = self.position(t);
        let (before, rest) = self.split(self.root, pos, false);
        let (same, after) = self.split(rest, pos - self.total(before), true);

        let mut group = Vec::new();
        self.collect(same, self.total(before), &mut group);
        let after_first = if after == NIL {
            0
        } else {
            pos + self.leftmost_length(after)
        };
        group.retain(|&(node, _)| node != t);
        self.release(t);
        self.reassemble(before, &group, after, after_first);
        Ok(())
    }

    /// Reposition anchors for one step of a change. Returns the anchors deleted by it.
    pub(crate) fn handle_change(&mut self, entry: &OffsetChangeMapEntry) -> Vec<TextAnchor> {
        if self.root == NIL {
            return Vec::new();
        }
        let offset = entry.offset;
        let removal = entry.removal_length;
        let shift = entry.insertion_length as isize - removal as isize;

        // before: untouched, group: anchors the change decides about, after: shifted.
        let (before, rest) = if removal == 0 {
            self.split(self.root, offset, false)
        } else {
            self.split(self.root, offset, true)
        };
        let base = self.total(before);
        let (group_tree, after) = if removal == 0 {
            self.split(rest, offset - base, true)
        } else {
            self.split(rest, entry.removal_end() - base, false)
        };

        let mut group = Vec::new();
        self.collect(group_tree, base, &mut group);
        let group_end = base + self.total(group_tree);
        let after_first = if after == NIL {
            0
        } else {
            (group_end + self.leftmost_length(after)).saturating_add_signed(shift)
        };

        let mut deleted = Vec::new();
        let mut moved = Vec::with_capacity(group.len());
        for (t, pos) in group {
            let node = &self.nodes[t];
            let survives = removal == 0
                || node.survive_deletion
                || entry.removal_never_causes_anchor_deletion;
            if survives {
                moved.push((t, entry.get_new_offset(pos, node.movement)));
            } else {
                deleted.push(self.release(t));
            }
        }
        moved.sort_by_key(|&(_, pos)| pos);

        trace!(
            offset,
            removal,
            insertion = entry.insertion_length,
            moved = moved.len(),
            deleted = deleted.len(),
            "anchors repositioned"
        );
        self.reassemble(before, &moved, after, after_first);
        deleted
    }
}
