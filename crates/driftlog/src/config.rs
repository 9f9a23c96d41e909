//! Log Configuration
//!
//! Controls how segments are sized and where the offset space starts:
//!
//! - **segment.max_store_bytes**: soft cap on a segment's store file; once a
//!   store reaches it the segment is considered maxed and the log rolls a
//!   new one (default: 1024)
//! - **segment.max_index_bytes**: hard cap on a segment's index file. The
//!   index is preallocated to this size when the segment opens, so it also
//!   bounds how many entries a segment can hold (default: 1024)
//! - **segment.initial_offset**: base offset of the first segment when the
//!   log directory is empty (default: 0)
//!
//! Both caps are soft ceilings in one respect: the segment is checked
//! *after* the append that crosses a cap, so the record that triggers a
//! rollover has already been written to the old segment. Size caps should
//! budget for that slack.
//!
//! ## Usage
//!
//! ```ignore
//! use driftlog::{LogConfig, SegmentConfig};
//!
//! // Small segments for testing rollover
//! let config = LogConfig {
//!     segment: SegmentConfig {
//!         max_store_bytes: 64,
//!         max_index_bytes: 36,
//!         initial_offset: 0,
//!     },
//! };
//!
//! // Or start from the defaults
//! let config = LogConfig::default();
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Segment sizing and placement.
    #[serde(default)]
    pub segment: SegmentConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Soft cap on the store file in bytes (default: 1024).
    #[serde(default = "default_max_store_bytes")]
    pub max_store_bytes: u64,

    /// Preallocated size of the index file in bytes (default: 1024).
    #[serde(default = "default_max_index_bytes")]
    pub max_index_bytes: u64,

    /// Base offset of the first segment in an empty directory (default: 0).
    #[serde(default)]
    pub initial_offset: u64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_store_bytes: default_max_store_bytes(),
            max_index_bytes: default_max_index_bytes(),
            initial_offset: 0,
        }
    }
}

fn default_max_store_bytes() -> u64 {
    1024
}

fn default_max_index_bytes() -> u64 {
    1024
}
