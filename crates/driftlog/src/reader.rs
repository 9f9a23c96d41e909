//! Streaming Log Reader
//!
//! [`LogReader`] implements [`std::io::Read`] over the raw store bytes of
//! every segment in the log, concatenated in segment order. Consensus
//! snapshotting and log shipping read the log this way: one pass, wire
//! format intact, without disturbing any segment's append cursor.
//!
//! The reader is built from a snapshot of the segment list taken when
//! [`Log::reader`](crate::Log::reader) is called. It holds only weak
//! handles to the stores, so it never keeps a truncated segment's file
//! alive; a store that disappears mid-stream is skipped.

use std::io::{self, Read};
use std::sync::Weak;

use crate::store::Store;

/// Sequential reader over the concatenated stores of a log snapshot.
pub struct LogReader {
    stores: Vec<Weak<Store>>,
    current: usize,
    pos: u64,
}

impl LogReader {
    pub(crate) fn new(stores: Vec<Weak<Store>>) -> Self {
        Self {
            stores,
            current: 0,
            pos: 0,
        }
    }
}

impl Read for LogReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while let Some(weak) = self.stores.get(self.current) {
            let Some(store) = weak.upgrade() else {
                // Segment was removed after the snapshot; move on.
                self.current += 1;
                self.pos = 0;
                continue;
            };

            let n = store
                .read_at(buf, self.pos)
                .map_err(io::Error::other)?;
            if n == 0 {
                // This store is exhausted; the next one begins.
                self.current += 1;
                self.pos = 0;
                continue;
            }

            self.pos += n as u64;
            return Ok(n);
        }
        Ok(0)
    }
}
