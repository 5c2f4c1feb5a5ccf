//! Height-balanced implicit sequence with cached subtree summaries.
//!
//! Items are addressed by position; every node caches the [`Summary`] of its subtree so
//! prefix sums (for example "character offset of line n") and seeks by summary are
//! `O(log n)`. The line index stores one item per line, the highlighter one item per
//! line boundary.

use std::cmp::Ordering;

/// Monoid aggregated over a subtree.
pub trait Summary: Copy + Default {
    /// Combine two summaries, `self` coming first.
    fn add(&self, other: &Self) -> Self;
}

/// An item stored in a [`SumTree`].
pub trait Item {
    /// Summary type aggregated by the tree.
    type Summary: Summary;
    /// Summary of this item alone.
    fn summary(&self) -> Self::Summary;
}

struct Node<T: Item> {
    item: T,
    left: Option<Box<Node<T>>>,
    right: Option<Box<Node<T>>>,
    height: u8,
    len: usize,
    summary: T::Summary,
}

type Link<T> = Option<Box<Node<T>>>;

fn height<T: Item>(link: &Link<T>) -> u8 {
    link.as_ref().map_or(0, |n| n.height)
}

fn len<T: Item>(link: &Link<T>) -> usize {
    link.as_ref().map_or(0, |n| n.len)
}

fn summary<T: Item>(link: &Link<T>) -> T::Summary {
    link.as_ref().map_or_else(T::Summary::default, |n| n.summary)
}

impl<T: Item> Node<T> {
    fn leaf(item: T) -> Box<Self> {
        let summary = item.summary();
        Box::new(Self {
            item,
            left: None,
            right: None,
            height: 1,
            len: 1,
            summary,
        })
    }

    fn update(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
        self.len = 1 + len(&self.left) + len(&self.right);
        self.summary = summary(&self.left)
            .add(&self.item.summary())
            .add(&summary(&self.right));
    }

    fn balance_factor(&self) -> i16 {
        height(&self.left) as i16 - height(&self.right) as i16
    }
}

fn rotate_right<T: Item>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    match node.left.take() {
        Some(mut pivot) => {
            node.left = pivot.right.take();
            node.update();
            pivot.right = Some(node);
            pivot.update();
            pivot
        }
        None => node,
    }
}

fn rotate_left<T: Item>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    match node.right.take() {
        Some(mut pivot) => {
            node.right = pivot.left.take();
            node.update();
            pivot.left = Some(node);
            pivot.update();
            pivot
        }
        None => node,
    }
}

fn rebalance<T: Item>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    node.update();
    let factor = node.balance_factor();
    if factor > 1 {
        if node.left.as_ref().is_some_and(|l| l.balance_factor() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        rotate_right(node)
    } else if factor < -1 {
        if node.right.as_ref().is_some_and(|r| r.balance_factor() > 0) {
            node.right = node.right.take().map(rotate_right);
        }
        rotate_left(node)
    } else {
        node
    }
}

fn insert_at<T: Item>(link: Link<T>, index: usize, item: T) -> Box<Node<T>> {
    match link {
        None => Node::leaf(item),
        Some(mut node) => {
            let left_len = len(&node.left);
            if index <= left_len {
                node.left = Some(insert_at(node.left.take(), index, item));
            } else {
                node.right = Some(insert_at(node.right.take(), index - left_len - 1, item));
            }
            rebalance(node)
        }
    }
}

fn remove_min<T: Item>(mut node: Box<Node<T>>) -> (Link<T>, Box<Node<T>>) {
    match node.left.take() {
        None => {
            let rest = node.right.take();
            (rest, node)
        }
        Some(left) => {
            let (rest, min) = remove_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

fn remove_at<T: Item>(link: Link<T>, index: usize) -> (Link<T>, Option<T>) {
    let Some(mut node) = link else {
        return (None, None);
    };
    let left_len = len(&node.left);
    match index.cmp(&left_len) {
        Ordering::Less => {
            let (rest, removed) = remove_at(node.left.take(), index);
            node.left = rest;
            (Some(rebalance(node)), removed)
        }
        Ordering::Greater => {
            let (rest, removed) = remove_at(node.right.take(), index - left_len - 1);
            node.right = rest;
            (Some(rebalance(node)), removed)
        }
        Ordering::Equal => {
            let Node {
                item, left, right, ..
            } = *node;
            let replacement = match (left, right) {
                (None, None) => None,
                (Some(l), None) => Some(l),
                (None, Some(r)) => Some(r),
                (Some(l), Some(r)) => {
                    let (rest, mut min) = remove_min(r);
                    min.left = Some(l);
                    min.right = rest;
                    Some(rebalance(min))
                }
            };
            (replacement, Some(item))
        }
    }
}

fn build<T: Item>(items: &mut std::vec::IntoIter<T>, count: usize) -> Link<T> {
    if count == 0 {
        return None;
    }
    let left_count = count / 2;
    let left = build(items, left_count);
    let item = items.next()?;
    let right = build(items, count - left_count - 1);
    let mut node = Node::leaf(item);
    node.left = left;
    node.right = right;
    node.update();
    Some(node)
}

/// Balanced sequence of items with `O(log n)` positional access and prefix summaries.
pub struct SumTree<T: Item> {
    root: Link<T>,
}

impl<T: Item> Default for SumTree<T> {
    fn default() -> Self {
        Self { root: None }
    }
}

impl<T: Item> SumTree<T> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a perfectly balanced tree from `items` in `O(n)`.
    pub fn from_vec(items: Vec<T>) -> Self {
        let count = items.len();
        let mut iter = items.into_iter();
        Self {
            root: build(&mut iter, count),
        }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        len(&self.root)
    }

    /// Whether the tree holds no items.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Summary of every item.
    pub fn summary(&self) -> T::Summary {
        summary(&self.root)
    }

    /// Insert `item` so it ends up at position `index` (clamped to `len`).
    pub fn insert(&mut self, index: usize, item: T) {
        let index = index.min(self.len());
        self.root = Some(insert_at(self.root.take(), index, item));
    }

    /// Append `item` at the end.
    pub fn push(&mut self, item: T) {
        self.insert(self.len(), item);
    }

    /// Remove and return the item at `index`.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len() {
            return None;
        }
        let (root, removed) = remove_at(self.root.take(), index);
        self.root = root;
        removed
    }

    /// Item at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        let mut link = &self.root;
        let mut index = index;
        while let Some(node) = link {
            let left_len = len(&node.left);
            match index.cmp(&left_len) {
                Ordering::Less => link = &node.left,
                Ordering::Equal => return Some(&node.item),
                Ordering::Greater => {
                    index -= left_len + 1;
                    link = &node.right;
                }
            }
        }
        None
    }

    /// Replace the item at `index` through `f`, refreshing cached summaries on the path.
    ///
    /// Returns `None` when `index` is out of range.
    pub fn update<R>(&mut self, index: usize, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        fn go<T: Item, R>(
            link: &mut Link<T>,
            index: usize,
            f: impl FnOnce(&mut T) -> R,
        ) -> Option<R> {
            let node = link.as_mut()?;
            let left_len = len(&node.left);
            let result = match index.cmp(&left_len) {
                Ordering::Less => go(&mut node.left, index, f),
                Ordering::Equal => Some(f(&mut node.item)),
                Ordering::Greater => go(&mut node.right, index - left_len - 1, f),
            };
            node.update();
            result
        }
        go(&mut self.root, index, f)
    }

    /// Summary of the first `count` items.
    pub fn prefix_summary(&self, count: usize) -> T::Summary {
        let mut acc = T::Summary::default();
        let mut link = &self.root;
        let mut count = count;
        while let Some(node) = link {
            let left_len = len(&node.left);
            if count <= left_len {
                link = &node.left;
            } else {
                acc = acc.add(&summary(&node.left)).add(&node.item.summary());
                count -= left_len + 1;
                link = &node.right;
            }
        }
        acc
    }

    /// Find the item selected by `cmp`.
    ///
    /// `cmp` receives the summary of every item before the candidate and the candidate's
    /// own summary, and returns [`Ordering::Less`] when the target lies before the
    /// candidate, [`Ordering::Greater`] when it lies after it and [`Ordering::Equal`] on a
    /// hit. The predicate must be monotonic over the sequence. Returns the index, the
    /// summary before the item and the item.
    pub fn seek(
        &self,
        mut cmp: impl FnMut(&T::Summary, &T::Summary) -> Ordering,
    ) -> Option<(usize, T::Summary, &T)> {
        let mut acc = T::Summary::default();
        let mut base = 0;
        let mut link = &self.root;
        while let Some(node) = link {
            let before = acc.add(&summary(&node.left));
            match cmp(&before, &node.item.summary()) {
                Ordering::Less => link = &node.left,
                Ordering::Equal => return Some((base + len(&node.left), before, &node.item)),
                Ordering::Greater => {
                    acc = before.add(&node.item.summary());
                    base += len(&node.left) + 1;
                    link = &node.right;
                }
            }
        }
        None
    }

    /// In-order iterator starting at `index`.
    pub fn iter_from(&self, index: usize) -> Iter<'_, T> {
        let mut stack = Vec::new();
        let mut link = &self.root;
        let mut index = index;
        while let Some(node) = link {
            let left_len = len(&node.left);
            if index <= left_len {
                stack.push(node.as_ref());
                link = &node.left;
            } else {
                index -= left_len + 1;
                link = &node.right;
            }
        }
        Iter { stack }
    }

    /// In-order iterator over every item.
    pub fn iter(&self) -> Iter<'_, T> {
        self.iter_from(0)
    }
}

/// In-order iterator over a [`SumTree`].
pub struct Iter<'a, T: Item> {
    stack: Vec<&'a Node<T>>,
}

impl<'a, T: Item> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.stack.pop()?;
        let mut link = &node.right;
        while let Some(child) = link {
            self.stack.push(child.as_ref());
            link = &child.left;
        }
        Some(&node.item)
    }
}
