//! Offset Index
//!
//! The index is a fixed-width table over a memory-mapped file, mapping each
//! record's segment-relative offset to its byte position in the store.
//!
//! ## Entry Format
//!
//! ```text
//! [Entry 0][Entry 1]...[Entry N-1]
//!
//! Entry (12 bytes):
//! ┌──────────────────────────┬──────────────────────┐
//! │ Relative offset          │ Store position       │
//! │ (4 bytes, BE u32)        │ (8 bytes, BE u64)    │
//! └──────────────────────────┴──────────────────────┘
//! ```
//!
//! The constant width is what makes lookups O(1): entry *k* lives at byte
//! `12 * k`. Relative offsets are 32 bits on purpose. At any sane segment
//! size 2^32 entries is ample, and the narrower field keeps the index at
//! 12 bytes per record instead of 16.
//!
//! ## Preallocation
//!
//! Memory maps cannot grow in place, so the file is truncated up to
//! `max_index_bytes` before mapping and the logical `size` (the write
//! cursor) is tracked separately. On close the map is synced, the file is
//! synced, and the file is truncated back down to `size`, shedding the
//! zeroed tail. That final truncation is what lets a reopen recover the
//! entry count from the file length alone.

use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::MmapMut;

use crate::error::{Error, Result};

/// Width of the relative-offset field of an entry.
pub const OFF_WIDTH: u64 = 4;
/// Width of the position field of an entry.
pub const POS_WIDTH: u64 = 8;
/// Width of one index entry on disk.
pub const ENTRY_WIDTH: u64 = OFF_WIDTH + POS_WIDTH;

/// Fixed-width mmap table of `(relative offset, store position)` entries.
pub struct Index {
    file: File,
    mmap: MmapMut,
    size: u64,
}

impl Index {
    /// Opens the index file, creating it if missing, and maps it at its full
    /// configured extent.
    ///
    /// The file's length before preallocation becomes the logical size, so a
    /// cleanly closed index reopens with every entry it had. Growing the
    /// file must happen here: once mapped it cannot be resized.
    pub fn open(path: impl AsRef<Path>, max_index_bytes: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        let size = file.metadata()?.len();
        file.set_len(max_index_bytes)?;

        // SAFETY: the file is held open for the lifetime of the map and all
        // access stays within the mapped length. The log directory is
        // exclusive to this process.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self { file, mmap, size })
    }

    /// Appends one entry. Fails with `OutOfSpace` when the mapped extent
    /// cannot hold another entry; the log treats that segment as full.
    pub fn write(&mut self, rel_off: u32, pos: u64) -> Result<()> {
        if (self.mmap.len() as u64) < self.size + ENTRY_WIDTH {
            return Err(Error::OutOfSpace);
        }

        let at = self.size as usize;
        self.mmap[at..at + OFF_WIDTH as usize].copy_from_slice(&rel_off.to_be_bytes());
        self.mmap[at + OFF_WIDTH as usize..at + ENTRY_WIDTH as usize]
            .copy_from_slice(&pos.to_be_bytes());
        self.size += ENTRY_WIDTH;
        Ok(())
    }

    /// Reads entry `n`. Fails with `EndOfData` when the index is empty or
    /// `n` is past the last entry.
    pub fn read(&self, n: u32) -> Result<(u32, u64)> {
        self.entry(u64::from(n))
    }

    /// Reads the last entry. Fails with `EndOfData` on an empty index,
    /// which is how a segment detects that it starts at its base offset.
    pub fn read_last(&self) -> Result<(u32, u64)> {
        if self.size == 0 {
            return Err(Error::EndOfData);
        }
        self.entry(self.size / ENTRY_WIDTH - 1)
    }

    fn entry(&self, n: u64) -> Result<(u32, u64)> {
        if self.size == 0 {
            return Err(Error::EndOfData);
        }
        let at = n * ENTRY_WIDTH;
        if self.size < at + ENTRY_WIDTH {
            return Err(Error::EndOfData);
        }

        let at = at as usize;
        let rel_off = u32::from_be_bytes(
            self.mmap[at..at + OFF_WIDTH as usize].try_into().unwrap(),
        );
        let pos = u64::from_be_bytes(
            self.mmap[at + OFF_WIDTH as usize..at + ENTRY_WIDTH as usize]
                .try_into()
                .unwrap(),
        );
        Ok((rel_off, pos))
    }

    /// Logical size in bytes. Always a multiple of [`ENTRY_WIDTH`]; the
    /// entry count is `size() / ENTRY_WIDTH`.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Seals the index: syncs the map to the file, syncs the file to stable
    /// storage, then truncates the file to the logical size so only real
    /// entries remain on disk.
    pub fn close(self) -> Result<()> {
        let Self { file, mmap, size } = self;
        mmap.flush()?;
        file.sync_all()?;
        // Unmap before shrinking the file.
        drop(mmap);
        file.set_len(size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // ---------------------------------------------------------------
    // Empty index
    // ---------------------------------------------------------------

    #[test]
    fn test_empty_index_has_no_last_entry() {
        let dir = tempdir().unwrap();
        let index = Index::open(dir.path().join("0.index"), 1024).unwrap();
        assert!(matches!(index.read_last(), Err(Error::EndOfData)));
        assert!(matches!(index.read(0), Err(Error::EndOfData)));
        assert_eq!(index.size(), 0);
    }

    // ---------------------------------------------------------------
    // Write / read
    // ---------------------------------------------------------------

    #[test]
    fn test_write_read_entries() {
        let dir = tempdir().unwrap();
        let mut index = Index::open(dir.path().join("0.index"), 1024).unwrap();

        let entries = [(0u32, 0u64), (1, 10)];
        for (rel_off, pos) in entries {
            index.write(rel_off, pos).unwrap();
            assert_eq!(index.read(rel_off).unwrap(), (rel_off, pos));
        }

        // Probing past the last entry fails.
        assert!(matches!(
            index.read(entries.len() as u32),
            Err(Error::EndOfData)
        ));
        assert_eq!(index.size(), entries.len() as u64 * ENTRY_WIDTH);
    }

    #[test]
    fn test_write_fails_when_full() {
        let dir = tempdir().unwrap();
        // Room for exactly three entries.
        let mut index = Index::open(dir.path().join("0.index"), 3 * ENTRY_WIDTH).unwrap();

        for n in 0..3u32 {
            index.write(n, u64::from(n) * 100).unwrap();
        }
        assert!(matches!(index.write(3, 300), Err(Error::OutOfSpace)));
        // A failed write leaves the cursor where it was.
        assert_eq!(index.size(), 3 * ENTRY_WIDTH);
        assert_eq!(index.read_last().unwrap(), (2, 200));
    }

    // ---------------------------------------------------------------
    // Close / reopen
    // ---------------------------------------------------------------

    #[test]
    fn test_close_truncates_and_reopen_recovers_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0.index");

        let mut index = Index::open(&path, 1024).unwrap();
        index.write(0, 0).unwrap();
        index.write(1, 10).unwrap();
        index.close().unwrap();

        // The preallocated tail is gone after a clean close.
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            2 * ENTRY_WIDTH
        );

        let index = Index::open(&path, 1024).unwrap();
        assert_eq!(index.size(), 2 * ENTRY_WIDTH);
        assert_eq!(index.read_last().unwrap(), (1, 10));
        assert_eq!(index.read(0).unwrap(), (0, 0));
    }

    #[test]
    fn test_reopen_preallocates_again() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0.index");

        let mut index = Index::open(&path, 2 * ENTRY_WIDTH).unwrap();
        index.write(0, 0).unwrap();
        index.close().unwrap();

        // One entry used, so one slot is free again after reopening.
        let mut index = Index::open(&path, 2 * ENTRY_WIDTH).unwrap();
        index.write(1, 12).unwrap();
        assert!(matches!(index.write(2, 24), Err(Error::OutOfSpace)));
    }
}
