//! Segment Storage Layer
//!
//! The filesystem layout is the index: one folder per capture date,
//! one file per segment, named by time of day. The folder name doubles
//! as the retention key, so expiring old footage is a folder-age check
//! with no separate metadata store.

mod store;

pub use store::{DaySegments, SegmentFile, SegmentStore, StoreConfig};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Segment not found: {0}")]
    NotFound(String),
}
