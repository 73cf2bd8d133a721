//! Caller-supplied key comparator and merge function, captured by value into the
//! transactional handle at open time (see `controller::TxnKvsHandle::open`).

use std::cmp::Ordering;
use std::sync::Arc;

/// Tag of a write-set entry / KVS message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTag {
    Insert,
    Update,
    Delete,
}

/// A `(tag, payload)` pair produced by `Merge::merge`. `payload` is empty for `Delete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    pub tag: MessageTag,
    pub payload: Vec<u8>,
}

impl MergeResult {
    pub fn insert(payload: Vec<u8>) -> Self {
        Self { tag: MessageTag::Insert, payload }
    }

    pub fn update(payload: Vec<u8>) -> Self {
        Self { tag: MessageTag::Update, payload }
    }

    pub fn delete() -> Self {
        Self { tag: MessageTag::Delete, payload: Vec::new() }
    }
}

/// Three-way key comparator, supplied by the caller at open time.
pub trait Comparator: Send + Sync {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// Reduces an `(old, delta)` pair into a new value, classifying the result.
///
/// `old` is `None` when there is no prior value to merge against -- either the
/// key was never written, or the prior write-set entry was a `Delete` (the
/// empty-prior case named in the write-set merge rule).
pub trait Merge: Send + Sync {
    fn merge(&self, key: &[u8], old: Option<&[u8]>, delta: &[u8]) -> MergeResult;
}

/// The default comparator: plain lexicographic byte ordering.
pub struct ByteComparator;

impl Comparator for ByteComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }
}

/// Configuration captured by the transactional handle: comparator, merge function,
/// and the size bounds the KVS enforces on keys and values.
#[derive(Clone)]
pub struct DataConfig {
    pub compare: Arc<dyn Comparator>,
    pub merge: Arc<dyn Merge>,
    pub key_size_max: usize,
    pub value_size_max: usize,
}

impl DataConfig {
    pub fn new(compare: Arc<dyn Comparator>, merge: Arc<dyn Merge>) -> Self {
        Self { compare, merge, key_size_max: 1 << 20, value_size_max: 1 << 20 }
    }

    pub fn with_size_limits(mut self, key_size_max: usize, value_size_max: usize) -> Self {
        self.key_size_max = key_size_max;
        self.value_size_max = value_size_max;
        self
    }
}
