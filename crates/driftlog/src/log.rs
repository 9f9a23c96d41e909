//! Log Coordinator
//!
//! The log is the public surface of the engine. It owns an ordered list of
//! segments covering a contiguous offset space, routes appends to the
//! active (last) segment, rolls a new segment when the active one fills,
//! locates the right segment for point reads, and reconstructs the whole
//! arrangement from the directory listing on startup.
//!
//! ## Startup
//!
//! A log directory contains `<base_offset>.store` / `<base_offset>.index`
//! pairs. Setup parses the base offsets out of the file names, deduplicates
//! them by value (each appears once per extension), opens a segment for
//! each in ascending order, and bootstraps a single empty segment at the
//! configured initial offset when the directory holds none. Files that do
//! not match the naming scheme are skipped with a warning rather than
//! failing the scan.
//!
//! ## Locking
//!
//! One reader/writer lock guards the segment list. Appends, truncation, and
//! lifecycle operations take the exclusive side. Point reads, the offset
//! accessors, and the streaming reader take the shared side; that is sound
//! because segments are append-only, each store serializes its own I/O
//! internally, and the list itself only changes under the exclusive lock.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::LogConfig;
use crate::error::{Error, Result};
use crate::reader::LogReader;
use crate::segment::{Segment, INDEX_EXT, STORE_EXT};

const DEFAULT_MAX_BYTES: u64 = 1024;

/// An append-only, segmented, offset-addressed record log rooted at a
/// directory.
pub struct Log {
    dir: PathBuf,
    config: LogConfig,
    segments: RwLock<Vec<Segment>>,
}

impl Log {
    /// Opens the log rooted at `dir`, creating the directory if needed and
    /// reconstructing any segments already on disk. Zero caps in the config
    /// resolve to the 1024-byte defaults.
    pub fn open(dir: impl AsRef<Path>, mut config: LogConfig) -> Result<Self> {
        if config.segment.max_store_bytes == 0 {
            config.segment.max_store_bytes = DEFAULT_MAX_BYTES;
        }
        if config.segment.max_index_bytes == 0 {
            config.segment.max_index_bytes = DEFAULT_MAX_BYTES;
        }

        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let log = Self {
            dir,
            config,
            segments: RwLock::new(Vec::new()),
        };
        log.setup()?;
        Ok(log)
    }

    /// Scans the directory and rebuilds the segment list, oldest first. The
    /// last segment becomes the active one.
    fn setup(&self) -> Result<()> {
        let mut base_offsets = BTreeSet::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            match parse_base_offset(&path) {
                Some(base_offset) => {
                    base_offsets.insert(base_offset);
                }
                None => {
                    warn!(path = %path.display(), "skipping file that is not a segment");
                }
            }
        }

        let mut segments = self.segments.write();
        for &base_offset in &base_offsets {
            segments.push(Segment::open(&self.dir, base_offset, &self.config.segment)?);
        }
        if segments.is_empty() {
            segments.push(Segment::open(
                &self.dir,
                self.config.segment.initial_offset,
                &self.config.segment,
            )?);
        }
        debug!(dir = %self.dir.display(), segments = segments.len(), "log ready");
        Ok(())
    }

    /// Appends a record and returns the absolute offset it was assigned.
    ///
    /// If the active segment is maxed after the append, a new active
    /// segment is rolled at the next offset; the triggering record stays in
    /// the old segment.
    pub fn append(&self, payload: &[u8]) -> Result<u64> {
        let mut segments = self.segments.write();
        let active = active_segment(&mut segments)?;
        let off = active.append(payload)?;

        if active.is_maxed() {
            debug!(
                base_offset = active.base_offset(),
                next_base = off + 1,
                "active segment maxed, rolling over"
            );
            let segment = Segment::open(&self.dir, off + 1, &self.config.segment)?;
            segments.push(segment);
        }
        Ok(off)
    }

    /// Reads the record stored at the given absolute offset.
    pub fn read(&self, off: u64) -> Result<Bytes> {
        let segments = self.segments.read();
        let segment = segments
            .iter()
            .find(|s| s.contains(off))
            .ok_or(Error::OffsetOutOfRange(off))?;
        segment.read(off)
    }

    /// Base offset of the oldest segment.
    pub fn lowest_offset(&self) -> Result<u64> {
        let segments = self.segments.read();
        let first = segments.first().ok_or_else(closed)?;
        Ok(first.base_offset())
    }

    /// Offset of the most recently appended record: one below the active
    /// segment's next offset, clamped to 0 for a log that has never been
    /// written.
    pub fn highest_offset(&self) -> Result<u64> {
        let segments = self.segments.read();
        let last = segments.last().ok_or_else(closed)?;
        let next_offset = last.next_offset();
        Ok(if next_offset > 0 { next_offset - 1 } else { 0 })
    }

    /// Drops every segment whose records all fall at or below `lowest`,
    /// deleting their files. Keeps segments in their original order.
    pub fn truncate(&self, lowest: u64) -> Result<()> {
        let mut segments = self.segments.write();
        let scanned = std::mem::take(&mut *segments);
        for segment in scanned {
            if segment.next_offset() <= lowest + 1 {
                debug!(
                    base_offset = segment.base_offset(),
                    lowest, "truncating segment"
                );
                segment.remove()?;
            } else {
                segments.push(segment);
            }
        }
        Ok(())
    }

    /// Returns a reader streaming the raw store bytes of every segment, in
    /// order, from a snapshot of the segment list taken now. Records
    /// appended after this call are not guaranteed to appear.
    pub fn reader(&self) -> LogReader {
        let segments = self.segments.read();
        LogReader::new(
            segments
                .iter()
                .map(|s| Arc::downgrade(s.store()))
                .collect(),
        )
    }

    /// Closes every segment in order. The log is empty afterwards; reopen
    /// the directory to resume.
    pub fn close(&self) -> Result<()> {
        let mut segments = self.segments.write();
        debug!(dir = %self.dir.display(), "closing log");
        for segment in segments.drain(..) {
            segment.close()?;
        }
        Ok(())
    }

    /// Closes the log and deletes its directory.
    pub fn remove(&self) -> Result<()> {
        self.close()?;
        fs::remove_dir_all(&self.dir)?;
        Ok(())
    }

    /// Removes the log and sets it up again: a single empty segment at the
    /// configured initial offset.
    pub fn reset(&self) -> Result<()> {
        self.remove()?;
        fs::create_dir_all(&self.dir)?;
        self.setup()
    }
}

fn active_segment(segments: &mut [Segment]) -> Result<&mut Segment> {
    segments.last_mut().ok_or_else(closed)
}

fn closed() -> Error {
    Error::Io(io::Error::other("log is closed"))
}

/// Parses `<base_offset>.store` / `<base_offset>.index` file names; anything
/// else yields `None`.
fn parse_base_offset(path: &Path) -> Option<u64> {
    let ext = path.extension()?.to_str()?;
    if ext != STORE_EXT && ext != INDEX_EXT {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_offset() {
        assert_eq!(parse_base_offset(Path::new("/log/0.store")), Some(0));
        assert_eq!(parse_base_offset(Path::new("/log/42.index")), Some(42));
        assert_eq!(parse_base_offset(Path::new("/log/42.tmp")), None);
        assert_eq!(parse_base_offset(Path::new("/log/notanumber.store")), None);
        assert_eq!(parse_base_offset(Path::new("/log/.hidden")), None);
    }
}
