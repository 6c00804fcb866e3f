//! Pedestrian Detection Pipeline
//!
//! Real-time proximity hazard detection on the live camera feed:
//! - frame-rate throttling with at most one inference in flight
//! - pedestrian-class filtering of backend detections
//! - zone classification (left/center/right) from box geometry
//! - coarse distance estimation from relative box size
//! - alert emission to the configured sink

pub mod backend;
pub mod classify;
pub mod config;
pub mod pipeline;

pub use backend::{BoundingBox, Detection, DetectionBackend, Label, OnnxBackend};
pub use classify::{classify_zone, estimate_distance_m, relative_size};
pub use config::DetectionConfig;
pub use pipeline::DetectionPipeline;

use thiserror::Error;

/// Detection error types
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),
}
