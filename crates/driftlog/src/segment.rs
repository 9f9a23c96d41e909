//! Log Segment
//!
//! A segment pairs one [`Store`] with one [`Index`] under a common base
//! offset and translates between the log's absolute offsets and the
//! segment-relative offsets the index stores. The two files are named
//! `<base_offset>.store` and `<base_offset>.index` in the log directory;
//! those names are the only durable metadata tying a pair together.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::config::SegmentConfig;
use crate::error::{Error, Result};
use crate::index::Index;
use crate::store::Store;

pub(crate) const STORE_EXT: &str = "store";
pub(crate) const INDEX_EXT: &str = "index";

/// One (store, index) pair covering the offsets
/// `[base_offset, next_offset)`.
pub struct Segment {
    store: Arc<Store>,
    index: Index,
    base_offset: u64,
    next_offset: u64,
    config: SegmentConfig,
    store_path: PathBuf,
    index_path: PathBuf,
}

impl Segment {
    /// Opens the segment rooted at `base_offset` inside `dir`, creating its
    /// files if they do not exist.
    ///
    /// `next_offset` is recovered by probing the index for its last entry:
    /// an empty index means the segment starts fresh at its base offset,
    /// otherwise the next record lands one past the last indexed one.
    pub fn open(dir: &Path, base_offset: u64, config: &SegmentConfig) -> Result<Self> {
        let store_path = dir.join(format!("{base_offset}.{STORE_EXT}"));
        let index_path = dir.join(format!("{base_offset}.{INDEX_EXT}"));

        let store = Arc::new(Store::open(&store_path)?);
        let index = Index::open(&index_path, config.max_index_bytes)?;

        let next_offset = match index.read_last() {
            Ok((last_rel_off, _)) => base_offset + u64::from(last_rel_off) + 1,
            Err(Error::EndOfData) => base_offset,
            Err(err) => return Err(err),
        };
        debug!(base_offset, next_offset, "opened segment");

        Ok(Self {
            store,
            index,
            base_offset,
            next_offset,
            config: config.clone(),
            store_path,
            index_path,
        })
    }

    /// Appends one record and returns its absolute offset.
    ///
    /// The store write happens first, then the index entry pointing at it.
    /// A failed index write propagates; the store keeps the unreferenced
    /// record bytes as an inert tail until the file is removed.
    pub fn append(&mut self, payload: &[u8]) -> Result<u64> {
        let off = self.next_offset;
        let (_, pos) = self.store.append(payload)?;
        self.index.write((off - self.base_offset) as u32, pos)?;
        self.next_offset += 1;
        Ok(off)
    }

    /// Reads the record at the given absolute offset.
    pub fn read(&self, off: u64) -> Result<Bytes> {
        let rel_off = off
            .checked_sub(self.base_offset)
            .ok_or(Error::OffsetOutOfRange(off))?;
        let (_, pos) = self.index.read(rel_off as u32)?;
        self.store.read(pos)
    }

    /// Whether this segment has reached either of its configured caps.
    ///
    /// Lots of small records fill the index first; a few large ones fill the
    /// store first. Checked after each append, so the record that crosses a
    /// cap still lands in this segment.
    pub fn is_maxed(&self) -> bool {
        self.store.size() >= self.config.max_store_bytes
            || self.index.size() >= self.config.max_index_bytes
    }

    /// First absolute offset of this segment, fixed at creation.
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// One past the last appended offset; equals `base_offset` while empty.
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Whether `off` falls inside this segment's offset range.
    pub fn contains(&self, off: u64) -> bool {
        self.base_offset <= off && off < self.next_offset
    }

    pub(crate) fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Closes the segment. The store flushes its buffered records before the
    /// index seals itself; the order matters for the durability hand-off.
    pub fn close(self) -> Result<()> {
        self.store.close()?;
        self.index.close()
    }

    /// Closes the segment and deletes both of its files.
    pub fn remove(self) -> Result<()> {
        let store_path = self.store_path.clone();
        let index_path = self.index_path.clone();
        debug!(base_offset = self.base_offset, "removing segment");
        self.close()?;
        fs::remove_file(index_path)?;
        fs::remove_file(store_path)?;
        Ok(())
    }
}
