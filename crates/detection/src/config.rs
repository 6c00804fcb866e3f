//! Detection configuration

use serde::{Deserialize, Serialize};

/// Detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum spacing between completed detection cycles (milliseconds)
    pub detection_interval_ms: u64,

    /// Box centers left of this frame-width fraction are in the left zone
    pub left_zone_end: f32,

    /// Box centers right of this frame-width fraction are in the right zone
    pub right_zone_start: f32,

    /// Minimum relative box size (fraction of frame area) before a
    /// detection raises an alert
    pub alert_size_threshold: f32,

    /// Labels treated as pedestrians (case-insensitive). Unlabeled
    /// detections also pass the filter.
    pub pedestrian_labels: Vec<String>,

    /// Backend confidence threshold
    pub confidence_threshold: f32,

    /// ONNX model path; without one the backend serves mock detections
    pub model_path: Option<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            detection_interval_ms: 500,
            left_zone_end: 0.33,
            right_zone_start: 0.67,
            alert_size_threshold: 0.15,
            pedestrian_labels: vec!["person".to_string(), "pedestrian".to_string()],
            confidence_threshold: 0.5,
            model_path: None,
        }
    }
}

impl DetectionConfig {
    /// More alerts: shorter throttle, smaller size gate
    pub fn sensitive() -> Self {
        Self {
            detection_interval_ms: 300,
            alert_size_threshold: 0.10,
            ..Default::default()
        }
    }

    /// Fewer alerts: longer throttle, larger size gate
    pub fn relaxed() -> Self {
        Self {
            detection_interval_ms: 1000,
            alert_size_threshold: 0.20,
            ..Default::default()
        }
    }
}
