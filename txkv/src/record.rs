//! Per-transaction state: timestamps, bounded read set, bounded write set.
//!
//! A `TxnRecord` is shared (`Arc`) between the transaction's owning thread and the
//! registry, so that committing transactions can scan it during validation. The
//! spec models the registry as holding non-owning pointers into owner-mutated
//! state; in Rust that is naturally an `Arc` plus a `Mutex` guarding the mutable
//! fields, rather than an unsynchronized raw pointer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::data_cfg::{DataConfig, MessageTag};
use crate::error::{CResult, Error};

/// Implementation-defined upper bound on read-set and write-set size (>= 16).
pub const RW_MAX: usize = 64;

/// A `(key, message)` pair recorded in a transaction's write set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteEntry {
    pub key: Vec<u8>,
    pub tag: MessageTag,
    pub payload: Vec<u8>,
}

/// Which of the three lifecycle states a record currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    Active,
    Committed,
    Aborted,
}

#[derive(Default)]
struct Sets {
    read_set: Vec<Vec<u8>>,
    write_set: Vec<WriteEntry>,
}

/// A consistent, owned view of a record's timestamps and sets, taken under its
/// mutex. Validation compares snapshots of other records rather than holding
/// more than one record's lock at a time, which would risk deadlock.
#[derive(Debug, Clone)]
pub struct RecordSnapshot {
    pub start_ts: u64,
    pub validate_ts: u64,
    pub finish_ts: u64,
    pub read_set: Vec<Vec<u8>>,
    pub write_set: Vec<WriteEntry>,
}

/// Per-transaction record. `id` gives the registry a stable identity distinct
/// from any timestamp, since the registry holds shared handles rather than
/// raw pointers.
pub struct TxnRecord {
    pub id: u64,
    start_ts: u64,
    validate_ts: AtomicU64,
    finish_ts: AtomicU64,
    state: Mutex<RecordState>,
    sets: Mutex<Sets>,
}

impl TxnRecord {
    /// `begin`: allocate a fresh record with both timestamps zeroed and sets empty.
    pub fn new(id: u64, start_ts: u64) -> Self {
        Self {
            id,
            start_ts,
            validate_ts: AtomicU64::new(0),
            finish_ts: AtomicU64::new(0),
            state: Mutex::new(RecordState::Active),
            sets: Mutex::new(Sets::default()),
        }
    }

    pub fn start_ts(&self) -> u64 {
        self.start_ts
    }

    pub fn validate_ts(&self) -> u64 {
        self.validate_ts.load(Ordering::SeqCst)
    }

    pub fn finish_ts(&self) -> u64 {
        self.finish_ts.load(Ordering::SeqCst)
    }

    pub fn set_validate_ts(&self, ts: u64) {
        self.validate_ts.store(ts, Ordering::SeqCst);
    }

    pub fn set_finish_ts(&self, ts: u64) {
        self.finish_ts.store(ts, Ordering::SeqCst);
    }

    pub fn state(&self) -> RecordState {
        *self.state.lock().expect("record state mutex poisoned")
    }

    pub fn set_state(&self, state: RecordState) {
        *self.state.lock().expect("record state mutex poisoned") = state;
    }

    pub fn snapshot(&self) -> RecordSnapshot {
        let sets = self.sets.lock().expect("record sets mutex poisoned");
        RecordSnapshot {
            start_ts: self.start_ts,
            validate_ts: self.validate_ts(),
            finish_ts: self.finish_ts(),
            read_set: sets.read_set.clone(),
            write_set: sets.write_set.clone(),
        }
    }

    /// `push_read`: appends the key; duplicates are permitted.
    pub fn push_read(&self, key: &[u8]) -> CResult<()> {
        let mut sets = self.sets.lock().expect("record sets mutex poisoned");
        if sets.read_set.len() >= RW_MAX {
            return Err(Error::CapacityExceeded);
        }
        sets.read_set.push(key.to_vec());
        Ok(())
    }

    /// Finds the write-set entry for `key`, if any, returning its tag and payload.
    /// Used by `lookup` to implement read-your-writes.
    pub fn find_write(&self, cfg: &DataConfig, key: &[u8]) -> Option<(MessageTag, Vec<u8>)> {
        let sets = self.sets.lock().expect("record sets mutex poisoned");
        sets.write_set
            .iter()
            .find(|e| cfg.compare.compare(&e.key, key) == std::cmp::Ordering::Equal)
            .map(|e| (e.tag, e.payload.clone()))
    }

    /// `push_write`: applies the write-set merge rule for `key`.
    pub fn push_write(
        &self,
        cfg: &DataConfig,
        key: &[u8],
        op: MessageTag,
        payload: &[u8],
    ) -> CResult<()> {
        let mut sets = self.sets.lock().expect("record sets mutex poisoned");
        let existing = sets
            .write_set
            .iter()
            .position(|e| cfg.compare.compare(&e.key, key) == std::cmp::Ordering::Equal);

        let (tag, out_payload) = match existing {
            None => match op {
                MessageTag::Insert => (MessageTag::Insert, payload.to_vec()),
                MessageTag::Delete => (MessageTag::Delete, Vec::new()),
                MessageTag::Update => (MessageTag::Update, payload.to_vec()),
            },
            Some(idx) => {
                let prior = sets.write_set[idx].clone();
                match op {
                    MessageTag::Insert => (MessageTag::Insert, payload.to_vec()),
                    MessageTag::Delete => (MessageTag::Delete, Vec::new()),
                    MessageTag::Update => match prior.tag {
                        MessageTag::Insert => {
                            let merged = cfg.merge.merge(key, Some(&prior.payload), payload);
                            (MessageTag::Insert, merged.payload)
                        }
                        MessageTag::Update => {
                            let merged = cfg.merge.merge(key, Some(&prior.payload), payload);
                            (merged.tag, merged.payload)
                        }
                        MessageTag::Delete => {
                            let merged = cfg.merge.merge(key, None, payload);
                            (merged.tag, merged.payload)
                        }
                    },
                }
            }
        };

        match existing {
            Some(idx) => {
                sets.write_set[idx] = WriteEntry { key: key.to_vec(), tag, payload: out_payload };
            }
            None => {
                if sets.write_set.len() >= RW_MAX {
                    return Err(Error::CapacityExceeded);
                }
                sets.write_set.push(WriteEntry { key: key.to_vec(), tag, payload: out_payload });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_cfg::{ByteComparator, Merge, MergeResult};
    use std::sync::Arc;

    struct ConcatMerge;
    impl Merge for ConcatMerge {
        fn merge(&self, _key: &[u8], old: Option<&[u8]>, delta: &[u8]) -> MergeResult {
            let mut out = old.unwrap_or(&[]).to_vec();
            out.extend_from_slice(delta);
            MergeResult::update(out)
        }
    }

    fn cfg() -> DataConfig {
        DataConfig::new(Arc::new(ByteComparator), Arc::new(ConcatMerge))
    }

    #[test]
    fn insert_then_update_stays_insert() {
        let cfg = cfg();
        let rec = TxnRecord::new(1, 1);
        rec.push_write(&cfg, b"k", MessageTag::Insert, b"v1").unwrap();
        rec.push_write(&cfg, b"k", MessageTag::Update, b"-delta").unwrap();
        let (tag, payload) = rec.find_write(&cfg, b"k").unwrap();
        assert_eq!(tag, MessageTag::Insert);
        assert_eq!(payload, b"v1-delta");
    }

    #[test]
    fn update_then_update_reclassifies() {
        let cfg = cfg();
        let rec = TxnRecord::new(1, 1);
        rec.push_write(&cfg, b"k", MessageTag::Update, b"a").unwrap();
        rec.push_write(&cfg, b"k", MessageTag::Update, b"b").unwrap();
        let (tag, payload) = rec.find_write(&cfg, b"k").unwrap();
        assert_eq!(tag, MessageTag::Update);
        assert_eq!(payload, b"ab");
    }

    #[test]
    fn delete_then_update_merges_against_empty() {
        let cfg = cfg();
        let rec = TxnRecord::new(1, 1);
        rec.push_write(&cfg, b"k", MessageTag::Delete, b"").unwrap();
        rec.push_write(&cfg, b"k", MessageTag::Update, b"delta").unwrap();
        let (tag, payload) = rec.find_write(&cfg, b"k").unwrap();
        assert_eq!(tag, MessageTag::Update);
        assert_eq!(payload, b"delta");
    }

    #[test]
    fn insert_overwrites_any_prior() {
        let cfg = cfg();
        let rec = TxnRecord::new(1, 1);
        rec.push_write(&cfg, b"k", MessageTag::Delete, b"").unwrap();
        rec.push_write(&cfg, b"k", MessageTag::Insert, b"fresh").unwrap();
        let (tag, payload) = rec.find_write(&cfg, b"k").unwrap();
        assert_eq!(tag, MessageTag::Insert);
        assert_eq!(payload, b"fresh");
    }

    #[test]
    fn write_set_has_one_entry_per_key() {
        let cfg = cfg();
        let rec = TxnRecord::new(1, 1);
        rec.push_write(&cfg, b"k", MessageTag::Insert, b"a").unwrap();
        rec.push_write(&cfg, b"k", MessageTag::Insert, b"b").unwrap();
        assert_eq!(rec.snapshot().write_set.len(), 1);
    }

    #[test]
    fn capacity_exceeded_on_distinct_keys() {
        let cfg = cfg();
        let rec = TxnRecord::new(1, 1);
        for i in 0..RW_MAX {
            rec.push_write(&cfg, &(i as u32).to_be_bytes(), MessageTag::Insert, b"v").unwrap();
        }
        let err = rec.push_write(&cfg, b"overflow", MessageTag::Insert, b"v");
        assert!(matches!(err, Err(Error::CapacityExceeded)));
    }
}
