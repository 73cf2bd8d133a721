//! `txkv` adds multi-statement, serializable transactions on top of an
//! ordered key-value store (the KVS). Clients delimit work with `begin` /
//! `commit` / `abort` and issue `insert`, `update`, `delete` and `lookup`
//! through a transactional handle; the handle decides, at commit, whether the
//! transaction may be applied to the underlying KVS or must be aborted.
//! [Author fengyang]
//!
//! The core is an optimistic concurrency control engine: per-transaction
//! read/write sets (`record`), a global timestamp oracle (`oracle`), an
//! active-transaction registry (`registry`), and a commit-time
//! conflict-detection protocol (`controller`). The KVS itself -- durable,
//! single-operation reads and writes behind a user-supplied comparator and
//! merge function -- is an external collaborator, implemented here by
//! `storage::engine::Engine` and adapted through `kvs::Kvs`.
//!
//! ## Getting started
//!
//! ```rust
//! use std::sync::Arc;
//! use txkv::controller::TxnKvsHandle;
//! use txkv::data_cfg::{ByteComparator, DataConfig, Merge, MergeResult};
//! use txkv::kvs::LookupResult;
//! use txkv::storage::memory::Memory;
//!
//! struct ConcatMerge;
//! impl Merge for ConcatMerge {
//!     fn merge(&self, _key: &[u8], old: Option<&[u8]>, delta: &[u8]) -> MergeResult {
//!         let mut out = old.unwrap_or(&[]).to_vec();
//!         out.extend_from_slice(delta);
//!         MergeResult::update(out)
//!     }
//! }
//!
//! fn main() {
//!     let cfg = DataConfig::new(Arc::new(ByteComparator), Arc::new(ConcatMerge));
//!     let handle = TxnKvsHandle::open(Memory::new(), cfg);
//!
//!     let txn = handle.begin();
//!     txn.insert(b"k", b"v1").unwrap();
//!     assert_eq!(txn.lookup(b"k").unwrap(), LookupResult::Found(b"v1".to_vec()));
//!     txn.commit().unwrap();
//! }
//! ```

pub mod codec;
pub mod controller;
pub mod data_cfg;
pub mod error;
pub mod info;
pub mod kvs;
pub mod locktable;
pub mod oracle;
pub mod record;
pub mod registry;
pub mod storage;
