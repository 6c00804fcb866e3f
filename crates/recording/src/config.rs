//! Recording configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Recording configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Length of one segment before rotation (seconds)
    pub segment_duration_secs: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            segment_duration_secs: 60,
        }
    }
}

impl RecordingConfig {
    /// Short segments for constrained storage
    pub fn short_segments() -> Self {
        Self {
            segment_duration_secs: 30,
        }
    }

    pub fn segment_duration(&self) -> Duration {
        Duration::from_secs(self.segment_duration_secs)
    }
}
