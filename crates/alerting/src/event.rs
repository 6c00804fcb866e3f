//! Alert event types and severity mapping

use serde::{Deserialize, Serialize};
use std::fmt;

/// How long a visual warning stays on screen before auto-clearing
pub const VISUAL_CLEAR_MS: u64 = 2000;

/// Haptic pulse length for a proximity warning
pub const HAPTIC_PULSE_MS: u64 = 300;

/// Horizontal screen-space zone of a detected pedestrian
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Left,
    Center,
    Right,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Left => f.write_str("left"),
            Zone::Center => f.write_str("center"),
            Zone::Right => f.write_str("right"),
        }
    }
}

/// Alert severity derived from estimated distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// One proximity warning emitted by a detection cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Where the pedestrian is relative to the vehicle heading
    pub zone: Zone,
    /// Coarse distance estimate (meters); a bucket, not a measurement
    pub distance_m: f32,
    /// Emission time (epoch milliseconds)
    pub timestamp_ms: i64,
}

impl AlertEvent {
    pub fn new(zone: Zone, distance_m: f32) -> Self {
        Self {
            zone,
            distance_m,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Map the distance bucket to a severity level
    pub fn severity(&self) -> Severity {
        if self.distance_m <= 1.0 {
            Severity::Critical
        } else if self.distance_m <= 2.0 {
            Severity::High
        } else if self.distance_m <= 3.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_levels() {
        assert_eq!(AlertEvent::new(Zone::Center, 1.0).severity(), Severity::Critical);
        assert_eq!(AlertEvent::new(Zone::Center, 2.0).severity(), Severity::High);
        assert_eq!(AlertEvent::new(Zone::Center, 3.0).severity(), Severity::Medium);
        assert_eq!(AlertEvent::new(Zone::Center, 4.0).severity(), Severity::Low);
        assert_eq!(AlertEvent::new(Zone::Center, 5.0).severity(), Severity::Low);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_zone_display() {
        assert_eq!(Zone::Left.to_string(), "left");
        assert_eq!(Zone::Right.to_string(), "right");
    }
}
