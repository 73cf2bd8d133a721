//! The external KVS collaborator, adapted from a `storage::engine::Engine`.
//!
//! The KVS is out of scope for this crate's core -- it only needs durable,
//! single-operation reads and writes, a comparator, and a merge function for
//! updates. `Kvs<E>` is the thin seam between the optimistic concurrency
//! controller and any `Engine` implementation (`storage::memory::Memory`,
//! `storage::log_cask::LogCask`, ...).

use std::sync::Mutex;

use crate::data_cfg::{DataConfig, MessageTag};
use crate::error::CResult;
use crate::storage::engine::Engine;
use crate::storage::Status;

/// Result of a KVS `lookup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    Found(Vec<u8>),
    NotFound,
}

impl LookupResult {
    /// `result_found(result)` in the external-interface naming.
    pub fn is_found(&self) -> bool {
        matches!(self, LookupResult::Found(_))
    }
}

/// Durable single-key KVS, thread-safe per the concurrency model: the
/// controller never holds a transaction-scoped lock across a KVS call, so a
/// plain mutex around the engine is enough to serialize access to it.
pub struct Kvs<E: Engine> {
    engine: Mutex<E>,
    data_cfg: DataConfig,
}

impl<E: Engine> Kvs<E> {
    /// `open(cfg, &handle)`.
    pub fn open(engine: E, data_cfg: DataConfig) -> Self {
        Self { engine: Mutex::new(engine), data_cfg }
    }

    /// `close(&handle)`.
    pub fn close(&self) -> CResult<()> {
        self.engine.lock().expect("kvs mutex poisoned").flush()
    }

    /// `register_thread(handle)` / `deregister_thread(handle)`: passthrough,
    /// nothing to register for a mutex-guarded engine.
    pub fn register_thread(&self) {}
    pub fn deregister_thread(&self) {}

    pub fn data_cfg(&self) -> &DataConfig {
        &self.data_cfg
    }

    pub fn insert(&self, key: &[u8], value: &[u8]) -> CResult<()> {
        self.engine.lock().expect("kvs mutex poisoned").set(key, value.to_vec())
    }

    pub fn update(&self, key: &[u8], delta: &[u8]) -> CResult<()> {
        let mut engine = self.engine.lock().expect("kvs mutex poisoned");
        let old = engine.get(key)?;
        let merged = self.data_cfg.merge.merge(key, old.as_deref(), delta);
        match merged.tag {
            MessageTag::Delete => engine.delete(key),
            MessageTag::Insert | MessageTag::Update => engine.set(key, merged.payload),
        }
    }

    pub fn delete(&self, key: &[u8]) -> CResult<()> {
        self.engine.lock().expect("kvs mutex poisoned").delete(key)
    }

    pub fn lookup(&self, key: &[u8]) -> CResult<LookupResult> {
        let value = self.engine.lock().expect("kvs mutex poisoned").get(key)?;
        Ok(match value {
            Some(v) => LookupResult::Found(v),
            None => LookupResult::NotFound,
        })
    }

    /// Engine status, for reporting (CLI `INFO`).
    pub fn status(&self) -> CResult<Status> {
        self.engine.lock().expect("kvs mutex poisoned").status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_cfg::{ByteComparator, Merge, MergeResult};
    use crate::storage::memory::Memory;
    use std::sync::Arc;

    struct ConcatMerge;
    impl Merge for ConcatMerge {
        fn merge(&self, _key: &[u8], old: Option<&[u8]>, delta: &[u8]) -> MergeResult {
            let mut out = old.unwrap_or(&[]).to_vec();
            out.extend_from_slice(delta);
            MergeResult::update(out)
        }
    }

    fn kvs() -> Kvs<Memory> {
        let cfg = DataConfig::new(Arc::new(ByteComparator), Arc::new(ConcatMerge));
        Kvs::open(Memory::new(), cfg)
    }

    #[test]
    fn insert_then_lookup() {
        let kvs = kvs();
        kvs.insert(b"k", b"v").unwrap();
        assert_eq!(kvs.lookup(b"k").unwrap(), LookupResult::Found(b"v".to_vec()));
    }

    #[test]
    fn update_merges_with_existing() {
        let kvs = kvs();
        kvs.insert(b"k", b"a").unwrap();
        kvs.update(b"k", b"b").unwrap();
        assert_eq!(kvs.lookup(b"k").unwrap(), LookupResult::Found(b"ab".to_vec()));
    }

    #[test]
    fn delete_then_lookup_not_found() {
        let kvs = kvs();
        kvs.insert(b"k", b"v").unwrap();
        kvs.delete(b"k").unwrap();
        assert_eq!(kvs.lookup(b"k").unwrap(), LookupResult::NotFound);
    }
}
