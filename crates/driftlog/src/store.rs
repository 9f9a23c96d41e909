//! Record Store
//!
//! The store is the bottom layer of a segment: a single append-only file of
//! length-prefixed records. It knows nothing about offsets; callers address
//! it by byte position.
//!
//! ## File Format
//!
//! ```text
//! [Record 1][Record 2]...[Record N]
//!
//! Record:
//! ┌──────────────────────┬───────────────┐
//! │ Payload length       │ Payload       │
//! │ (8 bytes, BE u64)    │ (N bytes)     │
//! └──────────────────────┴───────────────┘
//! ```
//!
//! No header, no checksum, no trailer.
//!
//! ## Buffering
//!
//! Appends go through a `BufWriter` to keep small records from paying one
//! syscall each. The logical `size` tracks the append cursor including
//! buffered bytes; the file on disk may lag until the next flush. Every read
//! flushes first, so a record is readable the moment its append returns.
//!
//! ## Concurrency
//!
//! All methods take `&self`. An internal mutex guards the writer, the size
//! cursor, and the read path (reads flush, which mutates the writer). This
//! lets the log hand out shared handles to streaming readers while the
//! segment keeps appending.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::os::unix::fs::FileExt;
use std::path::Path;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::error::Result;

/// Width of the big-endian length prefix in front of every record.
pub const LEN_WIDTH: u64 = 8;

/// Append-only record file with a buffered writer and positional reads.
pub struct Store {
    inner: Mutex<Inner>,
}

struct Inner {
    buf: BufWriter<File>,
    size: u64,
}

impl Store {
    /// Opens the store file, creating it if missing. The logical size starts
    /// at the file's current length so reopening resumes where the last
    /// session stopped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            inner: Mutex::new(Inner {
                buf: BufWriter::new(file),
                size,
            }),
        })
    }

    /// Appends one record and returns `(bytes_written, position)`.
    ///
    /// `bytes_written` includes the 8-byte length prefix. `position` is the
    /// byte offset the record starts at; the segment stores it in the index
    /// entry for this record. The size cursor only advances on the success
    /// path, so a failed write leaves the in-memory state unchanged.
    pub fn append(&self, payload: &[u8]) -> Result<(u64, u64)> {
        let mut inner = self.inner.lock();
        let pos = inner.size;

        inner.buf.write_all(&(payload.len() as u64).to_be_bytes())?;
        inner.buf.write_all(payload)?;

        let written = LEN_WIDTH + payload.len() as u64;
        inner.size += written;
        Ok((written, pos))
    }

    /// Reads the record stored at the given position.
    ///
    /// Flushes the writer first, in case the record is still sitting in the
    /// buffer, then reads the length prefix and the payload it describes.
    pub fn read(&self, pos: u64) -> Result<Bytes> {
        let mut inner = self.inner.lock();
        inner.buf.flush()?;

        let mut len = [0u8; LEN_WIDTH as usize];
        inner.buf.get_ref().read_exact_at(&mut len, pos)?;

        let mut payload = vec![0u8; u64::from_be_bytes(len) as usize];
        inner.buf.get_ref().read_exact_at(&mut payload, pos + LEN_WIDTH)?;
        Ok(Bytes::from(payload))
    }

    /// Positional read into `buf` starting at `off`; returns the number of
    /// bytes read (0 at end of store). Flushes the writer first. The
    /// streaming log reader uses this to walk a store from position 0
    /// without touching the append cursor.
    pub fn read_at(&self, buf: &mut [u8], off: u64) -> Result<usize> {
        let mut inner = self.inner.lock();
        inner.buf.flush()?;
        Ok(inner.buf.get_ref().read_at(buf, off)?)
    }

    /// Logical size in bytes, counting buffered but unflushed appends.
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Flushes buffered appends through to the file. The file handle itself
    /// closes when the store is dropped.
    pub fn close(&self) -> Result<()> {
        self.inner.lock().buf.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn payloads() -> Vec<&'static [u8]> {
        vec![b"hello world", b"", b"x", b"a slightly longer payload"]
    }

    // ---------------------------------------------------------------
    // Append / read round trip
    // ---------------------------------------------------------------

    #[test]
    fn test_append_read() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("0.store")).unwrap();

        let mut positions = Vec::new();
        for payload in payloads() {
            let (written, pos) = store.append(payload).unwrap();
            assert_eq!(written, LEN_WIDTH + payload.len() as u64);
            positions.push(pos);
        }

        for (payload, pos) in payloads().into_iter().zip(positions) {
            assert_eq!(store.read(pos).unwrap(), Bytes::from(payload));
        }
    }

    #[test]
    fn test_positions_are_contiguous() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("0.store")).unwrap();

        let (w1, p1) = store.append(b"first").unwrap();
        let (_, p2) = store.append(b"second").unwrap();
        assert_eq!(p1, 0);
        assert_eq!(p2, w1);
        assert_eq!(store.size(), w1 + LEN_WIDTH + "second".len() as u64);
    }

    #[test]
    fn test_read_before_flush_sees_buffered_write() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("0.store")).unwrap();

        // No explicit flush between append and read.
        let (_, pos) = store.append(b"buffered").unwrap();
        assert_eq!(store.read(pos).unwrap(), Bytes::from_static(b"buffered"));
    }

    // ---------------------------------------------------------------
    // read_at
    // ---------------------------------------------------------------

    #[test]
    fn test_read_at_walks_whole_file() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("0.store")).unwrap();
        store.append(b"abc").unwrap();
        store.append(b"defg").unwrap();

        let mut all = Vec::new();
        let mut off = 0u64;
        let mut chunk = [0u8; 7];
        loop {
            let n = store.read_at(&mut chunk, off).unwrap();
            if n == 0 {
                break;
            }
            all.extend_from_slice(&chunk[..n]);
            off += n as u64;
        }
        assert_eq!(all.len() as u64, store.size());

        // First record decodes as [len][payload].
        let len = u64::from_be_bytes(all[..8].try_into().unwrap());
        assert_eq!(len, 3);
        assert_eq!(&all[8..11], b"abc");
    }

    // ---------------------------------------------------------------
    // Reopen
    // ---------------------------------------------------------------

    #[test]
    fn test_reopen_resumes_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0.store");

        let store = Store::open(&path).unwrap();
        let (_, pos) = store.append(b"durable").unwrap();
        let size = store.size();
        store.close().unwrap();
        drop(store);

        let store = Store::open(&path).unwrap();
        assert_eq!(store.size(), size);
        assert_eq!(store.read(pos).unwrap(), Bytes::from_static(b"durable"));

        // New appends land after the existing data.
        let (_, next_pos) = store.append(b"more").unwrap();
        assert_eq!(next_pos, size);
    }

    #[test]
    fn test_read_past_end_errors() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("0.store")).unwrap();
        store.append(b"only").unwrap();
        assert!(store.read(store.size()).is_err());
    }
}
