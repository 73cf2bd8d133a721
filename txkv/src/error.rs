//! Error types shared by the storage engine and the OCC core.

use std::fmt::{self, Display, Formatter};

pub type CResult<T> = Result<T, Error>;

/// Errors surfaced to callers of `txkv`.
///
/// `Conflict`, `CapacityExceeded`, `KvsOpenFailed` and `InvariantViolation` are the
/// taxonomy named by the concurrency controller; the remaining variants come from
/// the underlying storage engine and its codecs.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Internal(String),
    Value(String),
    Parse(String),
    KeyNotFound,
    Eof,

    /// Validation found an overlapping read/write at commit time.
    Conflict,
    /// A read-set or write-set would exceed `RW_MAX`.
    CapacityExceeded,
    /// The underlying KVS could not be opened.
    KvsOpenFailed(String),
    /// Apply failed after validation already pronounced the transaction committable.
    InvariantViolation(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Internal(msg) => write!(f, "internal error: {msg}"),
            Error::Value(msg) => write!(f, "value error: {msg}"),
            Error::Parse(msg) => write!(f, "parse error: {msg}"),
            Error::KeyNotFound => write!(f, "key not found"),
            Error::Eof => write!(f, "unexpected end of file"),
            Error::Conflict => write!(f, "transaction conflict"),
            Error::CapacityExceeded => write!(f, "read/write set capacity exceeded"),
            Error::KvsOpenFailed(msg) => write!(f, "kvs open failed: {msg}"),
            Error::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Eof
        } else {
            Error::Io(err)
        }
    }
}
