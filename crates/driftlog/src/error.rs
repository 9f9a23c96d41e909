//! Error Types for DriftLog
//!
//! Every fallible operation in this crate returns [`Result<T>`], aliased to
//! `Result<T, Error>`, so call sites propagate with `?`.
//!
//! ## Error Categories
//!
//! ### Index Errors
//! - `EndOfData`: an index probe addressed an entry past the last one, or
//!   the index is empty. Segment construction relies on this to detect a
//!   fresh index.
//! - `OutOfSpace`: the index has reached its configured capacity and cannot
//!   accept another entry. The log reacts by rolling a new segment.
//!
//! ### Read Errors
//! - `OffsetOutOfRange`: a read addressed an offset outside the log's
//!   current `[lowest, highest]` range.
//!
//! ### I/O Errors
//! - `Io`: any underlying file or memory-map failure, converted via `#[from]`.
//!
//! ### Caller Errors
//! - `Decode`: reserved for layers that deserialize record payloads. The
//!   engine treats payloads as opaque bytes and never produces this variant
//!   itself.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no index entry at the requested position")]
    EndOfData,

    #[error("index is out of space")]
    OutOfSpace,

    #[error("offset out of range: {0}")]
    OffsetOutOfRange(u64),

    #[error("decode error: {0}")]
    Decode(String),
}
