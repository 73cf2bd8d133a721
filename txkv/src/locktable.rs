//! Range-lock table: an unused stub.
//!
//! No file in the source this was distilled from implements it, and no caller
//! invokes it; its shape is kept here only so that a future pessimistic-locking
//! variant can slot in without reshaping the API. Not part of the canonical
//! optimistic-concurrency-control path.

/// A `[start, last]` key range.
pub struct KeyRange {
    pub start: Vec<u8>,
    pub last: Vec<u8>,
}

/// Placeholder for a pessimistic range-locking collaborator. None of its methods
/// are called anywhere in the concurrency controller.
pub trait RangeLockTable {
    fn lock(&self, range: &KeyRange) -> bool;
    fn unlock(&self, range: &KeyRange);
    fn is_locked(&self, range: &KeyRange) -> bool;
}
