//! Concurrent set of transaction records, guarded by a single mutex.

use std::sync::{Arc, Mutex};

use crate::record::TxnRecord;

/// Holds every currently-registered record (active + committed-but-not-GC'd).
/// Identity is by record id, not by any timestamp.
pub struct Registry {
    records: Mutex<Vec<Arc<TxnRecord>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self { records: Mutex::new(Vec::new()) }
    }

    pub fn insert(&self, record: Arc<TxnRecord>) {
        self.records.lock().expect("registry mutex poisoned").push(record);
    }

    /// Removes the record with the given id. No-op if it is not present (already
    /// removed by a concurrent GC pass).
    pub fn delete(&self, id: u64) {
        self.records.lock().expect("registry mutex poisoned").retain(|r| r.id != id);
    }

    /// Visits every currently-registered record exactly once, holding the
    /// registry mutex for the duration of the call. `visitor` must not call
    /// `insert` or `delete` on this registry -- doing so would deadlock.
    pub fn iter(&self, mut visitor: impl FnMut(&Arc<TxnRecord>)) {
        let records = self.records.lock().expect("registry mutex poisoned");
        for record in records.iter() {
            visitor(record);
        }
    }

    /// Clones the current set of record handles under the mutex, then releases
    /// it. Validation scans this snapshot rather than holding the registry
    /// mutex across the (unbounded) per-record snapshotting it also performs.
    pub fn snapshot(&self) -> Vec<Arc<TxnRecord>> {
        self.records.lock().expect("registry mutex poisoned").clone()
    }

    /// Removes every record whose id is in `ids`. Used by garbage collection,
    /// which computes the set to remove while already holding the mutex via `iter`
    /// and then applies the removal in a second, equally mutex-guarded pass.
    pub fn delete_many(&self, ids: &[u64]) {
        if ids.is_empty() {
            return;
        }
        let mut records = self.records.lock().expect("registry mutex poisoned");
        records.retain(|r| !ids.contains(&r.id));
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("registry mutex poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_iter_delete() {
        let registry = Registry::new();
        registry.insert(Arc::new(TxnRecord::new(1, 1)));
        registry.insert(Arc::new(TxnRecord::new(2, 2)));

        let mut seen = Vec::new();
        registry.iter(|r| seen.push(r.id));
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2]);

        registry.delete(1);
        assert_eq!(registry.len(), 1);

        let mut seen = Vec::new();
        registry.iter(|r| seen.push(r.id));
        assert_eq!(seen, vec![2]);
    }

    #[test]
    fn destroyed_record_never_reappears() {
        let registry = Registry::new();
        registry.insert(Arc::new(TxnRecord::new(1, 1)));
        registry.delete(1);
        registry.delete(1);
        assert_eq!(registry.len(), 0);
    }
}
