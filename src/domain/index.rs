//! Ordered record index: an AVL tree keyed by (symbol, date).
//!
//! Every node exclusively owns its two subtrees. Mutations move subtrees and
//! payloads between links instead of copying nodes, and each mutating call
//! returns with the tree fully rebalanced:
//!
//! - for every node, `|height(left) - height(right)| <= 1`
//! - in-order keys are strictly increasing (no duplicates)
//!
//! Range and symbol queries are linear filters over the in-order scan.

use std::cmp::Ordering;
use std::mem;

use crate::domain::error::IndexError;
use crate::domain::record::{RecordKey, StockRecord};

type Link = Option<Box<Node>>;

#[derive(Debug)]
struct Node {
    record: StockRecord,
    left: Link,
    right: Link,
    height: usize,
}

impl Node {
    fn leaf(record: StockRecord) -> Box<Node> {
        Box::new(Node {
            record,
            left: None,
            right: None,
            height: 1,
        })
    }

    fn key(&self) -> RecordKey<'_> {
        self.record.key()
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    /// height(left) - height(right)
    fn balance_factor(&self) -> isize {
        height(&self.left) as isize - height(&self.right) as isize
    }
}

fn height(link: &Link) -> usize {
    link.as_ref().map_or(0, |node| node.height)
}

fn rotate_right(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    node.update_height();
    pivot.right = Some(node);
    pivot.update_height();
    pivot
}

fn rotate_left(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    node.update_height();
    pivot.left = Some(node);
    pivot.update_height();
    pivot
}

/// Whether `insert` placed a new record or found the key already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The key existed; the stored record was left untouched.
    Duplicate,
}

#[derive(Debug, Default)]
pub struct RecordIndex {
    root: Link,
    len: usize,
}

impl RecordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the tree; 0 when empty.
    pub fn height(&self) -> usize {
        height(&self.root)
    }

    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    pub fn insert(&mut self, record: StockRecord) -> InsertOutcome {
        // The record moves into the tree; the rebalance step still needs its key.
        let (symbol, date) = (record.symbol.clone(), record.date.clone());
        let key = RecordKey::new(&symbol, &date);
        let outcome = insert_into(&mut self.root, record, key);
        match outcome {
            InsertOutcome::Inserted => self.len += 1,
            InsertOutcome::Duplicate => {
                tracing::debug!(symbol = %symbol, date = %date, "duplicate key ignored");
            }
        }
        outcome
    }

    pub fn search(&self, symbol: &str, date: &str) -> Option<&StockRecord> {
        let key = RecordKey::new(symbol, date);
        let mut cursor = self.root.as_deref();
        while let Some(node) = cursor {
            cursor = match key.cmp(&node.key()) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.record),
            };
        }
        None
    }

    /// Replaces the payload stored at `record`'s key. The tree shape does not
    /// change.
    pub fn update(&mut self, record: StockRecord) -> Result<(), IndexError> {
        match self.find_mut(record.key()) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(IndexError::NotFound {
                symbol: record.symbol,
                date: record.date,
            }),
        }
    }

    /// Removes and returns the record at (symbol, date). A missing key leaves
    /// the tree untouched.
    pub fn remove(&mut self, symbol: &str, date: &str) -> Result<StockRecord, IndexError> {
        let removed = remove_from(&mut self.root, RecordKey::new(symbol, date)).ok_or_else(|| {
            IndexError::NotFound {
                symbol: symbol.to_string(),
                date: date.to_string(),
            }
        })?;
        self.len -= 1;
        Ok(removed)
    }

    /// In-order iterator over borrowed records.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.root.as_deref())
    }

    /// Every record in ascending key order.
    pub fn all_records(&self) -> Vec<StockRecord> {
        self.iter().cloned().collect()
    }

    /// Records for one symbol, ascending by date.
    pub fn by_symbol(&self, symbol: &str) -> Vec<StockRecord> {
        self.iter()
            .filter(|r| r.symbol == symbol)
            .cloned()
            .collect()
    }

    /// Records for one symbol with `start <= date <= end`.
    pub fn by_date_range(&self, symbol: &str, start: &str, end: &str) -> Vec<StockRecord> {
        self.iter()
            .filter(|r| r.symbol == symbol && in_range(&r.date, start, end))
            .cloned()
            .collect()
    }

    /// Records of every symbol with `start <= date <= end`, in key order.
    pub fn by_dates(&self, start: &str, end: &str) -> Vec<StockRecord> {
        self.iter()
            .filter(|r| in_range(&r.date, start, end))
            .cloned()
            .collect()
    }

    /// Per-symbol results concatenated in the order the symbols were given.
    /// A symbol listed twice contributes its records twice.
    pub fn by_symbols<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<StockRecord> {
        symbols
            .iter()
            .flat_map(|s| self.by_symbol(s.as_ref()))
            .collect()
    }

    fn find_mut(&mut self, key: RecordKey<'_>) -> Option<&mut StockRecord> {
        let mut cursor = self.root.as_deref_mut();
        while let Some(node) = cursor {
            match key.cmp(&node.key()) {
                Ordering::Less => cursor = node.left.as_deref_mut(),
                Ordering::Greater => cursor = node.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.record),
            }
        }
        None
    }
}

fn in_range(date: &str, start: &str, end: &str) -> bool {
    start <= date && date <= end
}

fn insert_into(slot: &mut Link, record: StockRecord, key: RecordKey<'_>) -> InsertOutcome {
    let node = match slot {
        Some(node) => node,
        None => {
            *slot = Some(Node::leaf(record));
            return InsertOutcome::Inserted;
        }
    };

    let outcome = match key.cmp(&node.key()) {
        Ordering::Less => insert_into(&mut node.left, record, key),
        Ordering::Greater => insert_into(&mut node.right, record, key),
        Ordering::Equal => InsertOutcome::Duplicate,
    };

    if outcome == InsertOutcome::Inserted {
        rebalance_after_insert(slot, key);
    }
    outcome
}

/// Chooses the rotation by comparing the inserted key with the heavy child's
/// key.
fn rebalance_after_insert(slot: &mut Link, key: RecordKey<'_>) {
    let Some(mut node) = slot.take() else {
        return;
    };
    node.update_height();
    let balance = node.balance_factor();

    if balance > 1 {
        let left_right = node.left.as_ref().is_some_and(|left| key > left.key());
        if left_right {
            tracing::trace!(symbol = key.symbol, date = key.date, "left-right rotation");
            node.left = node.left.take().map(rotate_left);
        }
        node = rotate_right(node);
    } else if balance < -1 {
        let right_left = node.right.as_ref().is_some_and(|right| key < right.key());
        if right_left {
            tracing::trace!(symbol = key.symbol, date = key.date, "right-left rotation");
            node.right = node.right.take().map(rotate_right);
        }
        node = rotate_left(node);
    }

    *slot = Some(node);
}

/// Chooses the rotation from the balance sign of the heavy child, since the
/// removed key no longer exists to compare against.
fn rebalance(slot: &mut Link) {
    let Some(mut node) = slot.take() else {
        return;
    };
    node.update_height();
    let balance = node.balance_factor();

    if balance > 1 {
        if node.left.as_deref().map_or(0, Node::balance_factor) < 0 {
            node.left = node.left.take().map(rotate_left);
        }
        node = rotate_right(node);
    } else if balance < -1 {
        if node.right.as_deref().map_or(0, Node::balance_factor) > 0 {
            node.right = node.right.take().map(rotate_right);
        }
        node = rotate_left(node);
    }

    *slot = Some(node);
}

fn remove_from(slot: &mut Link, key: RecordKey<'_>) -> Option<StockRecord> {
    let node = slot.as_mut()?;
    let removed = match key.cmp(&node.key()) {
        Ordering::Less => remove_from(&mut node.left, key)?,
        Ordering::Greater => remove_from(&mut node.right, key)?,
        Ordering::Equal => splice_out(slot)?,
    };
    rebalance(slot);
    Some(removed)
}

/// Removes the node in `slot` and returns its record, leaving a valid subtree
/// in its place.
fn splice_out(slot: &mut Link) -> Option<StockRecord> {
    let mut node = slot.take()?;
    match (node.left.take(), node.right.take()) {
        (None, None) => Some(node.record),
        (Some(child), None) | (None, Some(child)) => {
            *slot = Some(child);
            Some(node.record)
        }
        (Some(left), Some(right)) => {
            let mut right = Some(right);
            let Some(successor) = take_min(&mut right) else {
                // A non-empty subtree always has a minimum.
                node.left = Some(left);
                *slot = Some(node);
                return None;
            };
            node.left = Some(left);
            node.right = right;
            let removed = mem::replace(&mut node.record, successor);
            *slot = Some(node);
            Some(removed)
        }
    }
}

/// Detaches the leftmost node of the subtree in `slot`, rebalancing the path
/// back up, and returns its record.
fn take_min(slot: &mut Link) -> Option<StockRecord> {
    let node = slot.as_mut()?;
    if node.left.is_some() {
        let min = take_min(&mut node.left);
        rebalance(slot);
        return min;
    }
    let mut node = slot.take()?;
    *slot = node.right.take();
    Some(node.record)
}

/// In-order traversal using an explicit stack of left spines.
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn new(root: Option<&'a Node>) -> Self {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut cursor: Option<&'a Node>) {
        while let Some(node) = cursor {
            self.stack.push(node);
            cursor = node.left.as_deref();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a StockRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(&node.record)
    }
}

impl<'a> IntoIterator for &'a RecordIndex {
    type Item = &'a StockRecord;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Extend<StockRecord> for RecordIndex {
    fn extend<T: IntoIterator<Item = StockRecord>>(&mut self, iter: T) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<StockRecord> for RecordIndex {
    fn from_iter<T: IntoIterator<Item = StockRecord>>(iter: T) -> Self {
        let mut index = RecordIndex::new();
        index.extend(iter);
        index
    }
}
