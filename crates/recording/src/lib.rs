//! Segmented Recording
//!
//! Keeps a camera continuously recording while rotating output files on a
//! fixed cadence:
//! - IDLE/RECORDING state machine with single-writer discipline
//! - self-rearming rotation timer with cancellation on user stop
//! - finalized segments handed to the segment store for retention
//!
//! The platform media mux sits behind the `Encoder`/`SegmentWriter` seam.

pub mod config;
pub mod controller;
pub mod encoder;

pub use config::RecordingConfig;
pub use controller::{RecordingController, SegmentHandle};
pub use encoder::{Encoder, FileEncoder, SegmentWriter};

use thiserror::Error;

/// Recording error types
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Segment finalize failed: {0}")]
    Finalize(String),

    #[error("Storage error: {0}")]
    Storage(#[from] segment_store::StoreError),

    #[error("Recording state lock poisoned")]
    StatePoisoned,
}
