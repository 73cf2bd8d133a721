//! `txkv` CLI. [Author fengyang]
//!
//! A small interactive command language over the `txkv` optimistic
//! concurrency control engine, adapted from the storage-engine CLI this
//! workspace was built from.
//!
//! ## Getting started
//!
//! ```doc
//! ❯ ./txkv-cli
//!
//! ██  ██  █        █
//! ██ ██   ██      ██
//! ███      ██    ██
//! ██ ██     ██  ██
//! ██  ██     ████  txkv CLI
//!
//! Welcome to txkv-cli.
//!
//! txkv> BEGIN
//! started txn 1
//! txkv*> INSERT order_key xxx
//! txkv*> LOOKUP order_key
//! xxx
//! txkv*> COMMIT
//! commit ok
//! ```

pub mod ast;
pub mod config;
pub mod rusty;
pub mod session;
pub mod show;
pub mod trace;
