//! Zone and distance classification
//!
//! Pure geometry: thresholds are coarse, tunable constants, not derived
//! from camera calibration.

use alerting::Zone;

/// Classify the horizontal zone of a box center.
///
/// `center_ratio` is box-center-x divided by frame width. The boundaries
/// belong to the center zone: only `< left_end` is left and only
/// `> right_start` is right.
pub fn classify_zone(center_ratio: f32, left_end: f32, right_start: f32) -> Zone {
    if center_ratio < left_end {
        Zone::Left
    } else if center_ratio > right_start {
        Zone::Right
    } else {
        Zone::Center
    }
}

/// Fraction of the frame covered by a bounding box
pub fn relative_size(box_width: f32, box_height: f32, frame_width: f32, frame_height: f32) -> f32 {
    (box_width * box_height) / (frame_width * frame_height)
}

/// Estimate distance from relative box size (meters).
///
/// A monotone step table, smaller result = closer. Not a measurement:
/// it assumes a roughly adult-sized pedestrian and trades accuracy for
/// stability.
pub fn estimate_distance_m(relative_size: f32) -> f32 {
    if relative_size > 0.4 {
        1.0
    } else if relative_size > 0.3 {
        2.0
    } else if relative_size > 0.2 {
        3.0
    } else if relative_size > 0.15 {
        4.0
    } else {
        5.0
    }
}
