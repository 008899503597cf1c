//! Error taxonomy shared by every crate in the workspace.
//!
//! Mirrors the status-code registry of the storage kernel this crate backs:
//! argument errors (bad RID, bad frame number, pin discipline violations),
//! capacity errors (no evictable frame), and disk errors chained in from the
//! underlying I/O layer without translation. `DONE`/`OK`/page-local `FAIL`
//! are not represented here — they are normal control signals handled by the
//! callers that produce them, not failures.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// A recoverable error, optionally chaining the error that caused it.
#[derive(Debug, Serialize, Deserialize)]
pub enum Error {
    /// Malformed input rejected before any state was touched (bad RID, page
    /// data that doesn't fit in a page, ...).
    InvalidInput(String),
    /// An offset computation over/underflowed (e.g. page-id * page-size).
    ArithmeticOverflow,
    /// `unpinPage`/`flushPage` looked for a page-id with no resident frame.
    HashNotFound,
    /// The replacer has no evictable frame left to hand out.
    BufferExceeded,
    /// `flushAllPages` encountered at least one frame it could not pin-check
    /// past, or `freePage`/`deleteRecord` was asked to act on a pinned page.
    PagePinned,
    /// `unpinPage` was called on a frame with no outstanding pin.
    PageNotPinned,
    /// A single-page `flushPage` did not find the requested page resident.
    PageNotFound,
    /// The replacer itself failed to produce a victim; wraps the underlying
    /// cause (usually `BufferExceeded`).
    ReplacerError(Box<Error>),
    /// A frame index outside `0..num_buffers` was passed to the replacer.
    BadBufFrameNo(i64),
    /// Propagated, unmodified, from the disk manager.
    Io(String),
    /// An error chained from an earlier failure, for causes that don't fit
    /// one of the named variants above (e.g. rollback-after-rollback).
    Chained(String, Box<Error>),
}

impl Error {
    /// Wraps `self` as the cause of a new error carrying `context`, mirroring
    /// `MINIBASE_CHAIN_ERROR`: the original error is preserved, not replaced.
    pub fn chain(self, context: impl Into<String>) -> Error {
        Error::Chained(context.into(), Box::new(self))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::ArithmeticOverflow => write!(f, "arithmetic overflow"),
            Error::HashNotFound => write!(f, "hash entry not found"),
            Error::BufferExceeded => write!(f, "buffer pool full"),
            Error::PagePinned => write!(f, "page still pinned"),
            Error::PageNotPinned => write!(f, "page not pinned"),
            Error::PageNotFound => write!(f, "page not found in the buffer pool"),
            Error::ReplacerError(cause) => write!(f, "replacer error: {cause}"),
            Error::BadBufFrameNo(frame) => {
                write!(f, "illegal buffer frame number received by replacer: {frame}")
            }
            Error::Io(msg) => write!(f, "i/o error: {msg}"),
            Error::Chained(context, cause) => write!(f, "{context}: {cause}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ReplacerError(cause) | Error::Chained(_, cause) => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// Builds an `Err(Error::InvalidInput(..))` from a format string, the way
/// `disk_manager.rs` already calls it for page-size validation.
#[macro_export]
macro_rules! errdata {
    ($($arg:tt)*) => {
        Err($crate::Error::InvalidInput(format!($($arg)*)))
    };
}

/// Builds an `Err(Error::ReplacerError(..))`, chaining an existing error as
/// the cause — the replacer-layer equivalent of `MINIBASE_FIRST_ERROR`.
#[macro_export]
macro_rules! errreplacer {
    ($cause:expr) => {
        Err($crate::Error::ReplacerError(Box::new($cause)))
    };
}
