//! DriftLog Storage Engine
//!
//! This crate implements the core of an append-only, segmented,
//! offset-addressed record log: the data structure underneath distributed
//! commit logs (message brokers, replicated state machines, change-data
//! pipelines). It persists a totally ordered sequence of opaque byte
//! records, assigns each a dense 64-bit offset, and serves point reads,
//! whole-log streaming, truncation of old data, and clean restart from
//! disk.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Log                                          │
//! │ - ordered segment list, one active (last)    │
//! │ - append routing + rollover                  │
//! │ - offset -> segment lookup                   │
//! │ - truncation, streaming reader, restart scan │
//! ├──────────────────────────────────────────────┤
//! │ Segment (one per base offset)                │
//! │ - absolute <-> relative offset translation   │
//! │ - size-cap probe for rollover                │
//! │ ├────────────────────┬─────────────────────┐ │
//! │ │ Store              │ Index               │ │
//! │ │ <base>.store       │ <base>.index        │ │
//! │ │ length-prefixed    │ mmap table of       │ │
//! │ │ records, buffered  │ 12-byte entries     │ │
//! │ │ appends            │ (rel off -> pos)    │ │
//! │ └────────────────────┴─────────────────────┘ │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! An append flows down: the active segment writes the payload to its
//! store, records `(relative offset, byte position)` in its index, and
//! hands back the absolute offset. A read flows the same path in reverse.
//!
//! Payloads are opaque. Whatever wire schema sits above this crate
//! serializes records to bytes before appending and gets the same bytes
//! back verbatim on read.
//!
//! ## Usage
//!
//! ```ignore
//! use driftlog::{Log, LogConfig};
//!
//! let log = Log::open("/var/lib/driftlog/orders", LogConfig::default())?;
//!
//! let offset = log.append(b"first record")?;
//! let payload = log.read(offset)?;
//! assert_eq!(&payload[..], b"first record");
//!
//! // Stream every store byte, e.g. for a snapshot.
//! let mut reader = log.reader();
//! let mut snapshot = Vec::new();
//! std::io::Read::read_to_end(&mut reader, &mut snapshot)?;
//!
//! log.close()?;
//! ```
//!
//! ## Durability Model
//!
//! Appends are buffered; reads flush, so within one process a record is
//! readable as soon as its append returns. Data reaches stable storage on
//! close (store flush, index map sync + file sync + truncate). There is no
//! per-append fsync, so a crash can lose buffered tail data. Crash
//! recovery beyond that is a caller concern.

pub mod config;
pub mod error;
pub mod index;
pub mod log;
pub mod reader;
pub mod segment;
pub mod store;

pub use config::{LogConfig, SegmentConfig};
pub use error::{Error, Result};
pub use index::Index;
pub use log::Log;
pub use reader::LogReader;
pub use segment::Segment;
pub use store::Store;
