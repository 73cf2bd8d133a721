//! The concurrency controller: the commit path. Validation against the registry,
//! apply-to-KVS on success, cleanup on failure. This is the semantic core
//! of the crate.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use crate::data_cfg::{DataConfig, MessageTag};
use crate::error::{CResult, Error};
use crate::kvs::{Kvs, LookupResult};
use crate::oracle::Oracle;
use crate::record::{RecordState, TxnRecord};
use crate::registry::Registry;
use crate::storage::engine::Engine;

/// Accepted but ignored: only the strongest (serializable) level is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    Serializable,
}

/// The transactional handle wrapping a KVS. Owns the oracle, the registry, and
/// the commit-serialization lock, so a fresh handle starts its oracle at zero
/// and never leaks state across handle instances.
pub struct TxnKvsHandle<E: Engine> {
    kvs: Kvs<E>,
    oracle: Oracle,
    registry: Registry,
    commit_lock: Mutex<()>,
    next_id: AtomicU64,
}

impl<E: Engine> TxnKvsHandle<E> {
    /// `open_txn(cfg, &txn_kvsb)`, given an already-open KVS engine.
    pub fn open(engine: E, data_cfg: DataConfig) -> Self {
        Self {
            kvs: Kvs::open(engine, data_cfg),
            oracle: Oracle::new(),
            registry: Registry::new(),
            commit_lock: Mutex::new(()),
            next_id: AtomicU64::new(1),
        }
    }

    /// `open_txn(cfg, &txn_kvsb)`, constructing the KVS itself; a construction
    /// failure surfaces as `KvsOpenFailed`.
    pub fn open_with<F>(make_engine: F, data_cfg: DataConfig) -> CResult<Self>
    where
        F: FnOnce() -> CResult<E>,
    {
        let engine = make_engine().map_err(|e| Error::KvsOpenFailed(e.to_string()))?;
        Ok(Self::open(engine, data_cfg))
    }

    /// `close_txn(&txn_kvsb)`.
    pub fn close(&self) -> CResult<()> {
        self.kvs.close()
    }

    pub fn register_thread(&self) {
        self.kvs.register_thread();
    }

    pub fn deregister_thread(&self) {
        self.kvs.deregister_thread();
    }

    /// Accepted but ignored.
    pub fn set_isolation_level(&self, _level: IsolationLevel) {}

    pub fn registry_len(&self) -> usize {
        self.registry.len()
    }

    /// Engine status, for reporting (CLI `INFO`).
    pub fn status(&self) -> CResult<crate::storage::Status> {
        self.kvs.status()
    }

    /// `begin(txn_kvsb, &txn)`.
    pub fn begin(&self) -> Txn<'_, E> {
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        let start_ts = self.oracle.next();
        let record = Arc::new(TxnRecord::new(id, start_ts));
        self.registry.insert(record.clone());
        Txn { handle: self, record, finished: false }
    }

    /// Scans every other record currently in the registry. Active records
    /// (`finish_ts == 0`) carry no serialization order relative to us yet, so
    /// they're skipped for conflict purposes and only feed the
    /// garbage-collection bound; only committed records can conflict.
    ///
    /// Returns `true` on conflict. Must be called while holding `commit_lock`.
    fn validate(&self, record: &TxnRecord) -> bool {
        let my = record.snapshot();
        let cfg = self.kvs.data_cfg();
        let others = self.registry.snapshot();

        let mut conflict = false;
        let mut earliest_active_start = u64::MAX;
        let mut gc_candidates = Vec::new();

        for other in &others {
            if other.id == record.id {
                continue;
            }
            let other_snap = other.snapshot();

            if other_snap.finish_ts == 0 {
                // Active: not yet serialized relative to us, nothing to check.
                earliest_active_start = earliest_active_start.min(other_snap.start_ts);
                continue;
            }

            gc_candidates.push((other.id, other_snap.finish_ts));

            if conflict {
                continue;
            }

            if my.start_ts > other_snap.finish_ts {
                // R' serialized strictly before us.
                continue;
            }

            let rw_conflict = my.read_set.iter().any(|k| {
                other_snap
                    .write_set
                    .iter()
                    .any(|e| cfg.compare.compare(k, &e.key) == Ordering::Equal)
            });

            let ww_conflict = !rw_conflict
                && my.write_set.iter().any(|w| {
                    other_snap
                        .write_set
                        .iter()
                        .any(|e| cfg.compare.compare(&w.key, &e.key) == Ordering::Equal)
                });

            if rw_conflict || ww_conflict {
                conflict = true;
            }
        }

        if !conflict {
            let to_gc: Vec<u64> = gc_candidates
                .into_iter()
                .filter(|(_, finish_ts)| *finish_ts < earliest_active_start)
                .map(|(id, _)| id)
                .collect();
            self.registry.delete_many(&to_gc);
        }

        conflict
    }

    /// Dispatches each write-set entry to the KVS in insertion order. A KVS
    /// error here is a fatal invariant violation -- validation has already
    /// pronounced the transaction committable.
    fn apply(&self, record: &TxnRecord) -> CResult<()> {
        let snap = record.snapshot();
        for entry in &snap.write_set {
            let result = match entry.tag {
                MessageTag::Insert => self.kvs.insert(&entry.key, &entry.payload),
                MessageTag::Update => self.kvs.update(&entry.key, &entry.payload),
                MessageTag::Delete => self.kvs.delete(&entry.key),
            };
            if let Err(e) = result {
                return Err(Error::InvariantViolation(format!(
                    "kvs apply failed after successful validation for key {:?}: {e}",
                    entry.key
                )));
            }
        }
        Ok(())
    }
}

/// A bound, per-thread transaction handle. Not `Send`-shared between threads in
/// spirit -- a thread drives at most one active transaction at a time.
pub struct Txn<'h, E: Engine> {
    handle: &'h TxnKvsHandle<E>,
    record: Arc<TxnRecord>,
    finished: bool,
}

impl<'h, E: Engine> Txn<'h, E> {
    pub fn id(&self) -> u64 {
        self.record.id
    }

    pub fn start_ts(&self) -> u64 {
        self.record.start_ts()
    }

    /// `insert(txn, key, value)`: delegates to `push_write`. Does not read the KVS.
    pub fn insert(&self, key: &[u8], value: &[u8]) -> CResult<()> {
        self.record.push_write(self.handle.kvs.data_cfg(), key, MessageTag::Insert, value)
    }

    /// `update(txn, key, delta)`: delegates to `push_write`. Does not read the KVS.
    pub fn update(&self, key: &[u8], delta: &[u8]) -> CResult<()> {
        self.record.push_write(self.handle.kvs.data_cfg(), key, MessageTag::Update, delta)
    }

    /// `delete(txn, key)`: delegates to `push_write`. Does not read the KVS.
    pub fn delete(&self, key: &[u8]) -> CResult<()> {
        self.record.push_write(self.handle.kvs.data_cfg(), key, MessageTag::Delete, &[])
    }

    /// `lookup(txn, key) -> result`. Consults the write set first, then
    /// the KVS; either way the key is recorded into the read set unless the
    /// write set itself resolves a `Delete`.
    pub fn lookup(&self, key: &[u8]) -> CResult<LookupResult> {
        let cfg = self.handle.kvs.data_cfg();
        if let Some((tag, payload)) = self.record.find_write(cfg, key) {
            self.record.push_read(key)?;
            return Ok(match tag {
                MessageTag::Insert | MessageTag::Update => LookupResult::Found(payload),
                MessageTag::Delete => LookupResult::NotFound,
            });
        }

        let result = self.handle.kvs.lookup(key)?;
        if result.is_found() {
            self.record.push_read(key)?;
        }
        Ok(result)
    }

    /// `commit(txn_kvsb, &txn) -> 0 on success, non-zero on conflict`.
    pub fn commit(mut self) -> CResult<()> {
        self.finished = true;
        self.record.set_validate_ts(self.handle.oracle.next());

        let _guard = self.handle.commit_lock.lock().expect("commit lock poisoned");

        if self.handle.validate(&self.record) {
            self.handle.registry.delete(self.record.id);
            self.record.set_state(RecordState::Aborted);
            return Err(Error::Conflict);
        }

        self.handle.apply(&self.record)?;
        self.record.set_finish_ts(self.handle.oracle.next());
        self.record.set_state(RecordState::Committed);

        Ok(())
    }

    /// `abort(txn_kvsb, &txn) -> 0`.
    pub fn abort(mut self) {
        self.finished = true;
        self.handle.registry.delete(self.record.id);
        self.record.set_state(RecordState::Aborted);
    }
}

impl<'h, E: Engine> Drop for Txn<'h, E> {
    /// A transaction dropped without `commit`/`abort` is treated as an abort, so
    /// a forgotten handle can never leave a stale record in the registry.
    fn drop(&mut self) {
        if !self.finished {
            self.handle.registry.delete(self.record.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_cfg::{ByteComparator, Merge, MergeResult};
    use crate::storage::memory::Memory;
    use std::sync::Arc as StdArc;
    use std::thread;

    struct ConcatMerge;
    impl Merge for ConcatMerge {
        fn merge(&self, _key: &[u8], old: Option<&[u8]>, delta: &[u8]) -> MergeResult {
            let mut out = old.unwrap_or(&[]).to_vec();
            out.extend_from_slice(delta);
            MergeResult::update(out)
        }
    }

    fn handle() -> TxnKvsHandle<Memory> {
        let cfg = DataConfig::new(StdArc::new(ByteComparator), StdArc::new(ConcatMerge));
        TxnKvsHandle::open(Memory::new(), cfg)
    }

    #[test]
    fn begin_commit_noop_leaves_kvs_unchanged() {
        let h = handle();
        let txn = h.begin();
        txn.commit().unwrap();
        let txn2 = h.begin();
        assert_eq!(txn2.lookup(b"x").unwrap(), LookupResult::NotFound);
    }

    #[test]
    fn insert_abort_leaves_kvs_unchanged() {
        let h = handle();
        let txn = h.begin();
        txn.insert(b"k", b"v").unwrap();
        txn.abort();

        let txn2 = h.begin();
        assert_eq!(txn2.lookup(b"k").unwrap(), LookupResult::NotFound);
    }

    #[test]
    fn insert_commit_then_read_in_new_txn() {
        let h = handle();
        let txn = h.begin();
        txn.insert(b"k", b"v").unwrap();
        txn.commit().unwrap();

        let txn2 = h.begin();
        assert_eq!(txn2.lookup(b"k").unwrap(), LookupResult::Found(b"v".to_vec()));
    }

    #[test]
    fn read_your_writes_through_update_and_delete() {
        let h = handle();
        let txn = h.begin();
        txn.insert(b"k", b"v1").unwrap();
        assert_eq!(txn.lookup(b"k").unwrap(), LookupResult::Found(b"v1".to_vec()));

        txn.update(b"k", b"-delta").unwrap();
        assert_eq!(txn.lookup(b"k").unwrap(), LookupResult::Found(b"v1-delta".to_vec()));

        txn.delete(b"k").unwrap();
        assert_eq!(txn.lookup(b"k").unwrap(), LookupResult::NotFound);

        txn.commit().unwrap();
    }

    #[test]
    fn concurrent_inserts_on_same_key_second_committer_conflicts() {
        let h = handle();
        let t1 = h.begin();
        let t2 = h.begin();

        assert_eq!(t1.lookup(b"x").unwrap(), LookupResult::NotFound);
        assert_eq!(t2.lookup(b"x").unwrap(), LookupResult::NotFound);

        t1.insert(b"x", b"a").unwrap();
        t2.insert(b"x", b"b").unwrap();

        assert!(t1.commit().is_ok());
        assert!(matches!(t2.commit(), Err(Error::Conflict)));

        let check = h.begin();
        assert_eq!(check.lookup(b"x").unwrap(), LookupResult::Found(b"a".to_vec()));
    }

    #[test]
    fn crossing_reads_and_writes_second_committer_conflicts() {
        let h = handle();
        let setup = h.begin();
        setup.insert(b"x", b"100").unwrap();
        setup.insert(b"y", b"100").unwrap();
        setup.commit().unwrap();

        let t1 = h.begin();
        let t2 = h.begin();

        let x = t1.lookup(b"x").unwrap();
        let y = t2.lookup(b"y").unwrap();

        if let LookupResult::Found(v) = x {
            t1.insert(b"y", &v).unwrap();
        }
        if let LookupResult::Found(v) = y {
            t2.insert(b"x", &v).unwrap();
        }

        assert!(t1.commit().is_ok());
        assert!(matches!(t2.commit(), Err(Error::Conflict)));

        let check = h.begin();
        assert_eq!(check.lookup(b"x").unwrap(), LookupResult::Found(b"100".to_vec()));
        assert_eq!(check.lookup(b"y").unwrap(), LookupResult::Found(b"100".to_vec()));
    }

    #[test]
    fn disjoint_key_commits_both_succeed() {
        let h = handle();
        let t1 = h.begin();
        let t2 = h.begin();

        t1.insert(b"a", b"1").unwrap();
        t2.insert(b"b", b"2").unwrap();

        assert!(t1.commit().is_ok());
        assert!(t2.commit().is_ok());

        let check = h.begin();
        assert_eq!(check.lookup(b"a").unwrap(), LookupResult::Found(b"1".to_vec()));
        assert_eq!(check.lookup(b"b").unwrap(), LookupResult::Found(b"2".to_vec()));
    }

    #[test]
    fn sequential_commits_reclaim_all_but_the_latest_record() {
        let h = handle();
        for i in 0..1000u32 {
            let txn = h.begin();
            txn.insert(&i.to_be_bytes(), b"v").unwrap();
            txn.commit().unwrap();
        }
        assert!(h.registry_len() <= 1);
    }

    #[test]
    fn concurrent_threads_retry_through_conflicts_to_completion() {
        let h = StdArc::new(handle());
        let threads = 4;
        let per_thread = 50;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let h = h.clone();
                thread::spawn(move || {
                    let mut ok = 0;
                    for i in 0..per_thread {
                        let key = format!("k{}", (t * 7 + i) % 8).into_bytes();
                        loop {
                            let txn = h.begin();
                            let existing = match txn.lookup(&key).unwrap() {
                                LookupResult::Found(v) => v,
                                LookupResult::NotFound => Vec::new(),
                            };
                            txn.update(&key, &existing).unwrap();
                            match txn.commit() {
                                Ok(()) => {
                                    ok += 1;
                                    break;
                                }
                                Err(Error::Conflict) => continue,
                                Err(e) => panic!("unexpected error: {e}"),
                            }
                        }
                    }
                    ok
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, threads * per_thread);
    }
}
