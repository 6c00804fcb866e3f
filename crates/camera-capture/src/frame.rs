//! Video frame type with release-guard semantics

use std::fmt;

/// Notifies the frame source when the consumer is done with a frame.
///
/// Sources that recycle capture buffers attach a permit to each frame;
/// the callback fires exactly once, when the frame is dropped. Skipped,
/// failed, and successfully processed frames all release through drop,
/// so no code path can leak a buffer or release it twice.
pub struct FramePermit {
    on_release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl FramePermit {
    /// Create a permit that runs `on_release` when the frame is dropped
    pub fn new(on_release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            on_release: Some(Box::new(on_release)),
        }
    }
}

impl Drop for FramePermit {
    fn drop(&mut self) {
        if let Some(release) = self.on_release.take() {
            release();
        }
    }
}

impl fmt::Debug for FramePermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FramePermit")
    }
}

/// One live camera frame
#[derive(Debug)]
pub struct CameraFrame {
    /// Raw pixel data (RGB, width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Sensor rotation (degrees)
    pub rotation_degrees: i32,
    /// Capture timestamp, monotonically increasing (milliseconds)
    pub timestamp_ms: u64,
    permit: Option<FramePermit>,
}

impl CameraFrame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        rotation_degrees: i32,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            data,
            width,
            height,
            rotation_degrees,
            timestamp_ms,
            permit: None,
        }
    }

    /// Attach a release permit from the frame source
    pub fn with_permit(mut self, permit: FramePermit) -> Self {
        self.permit = Some(permit);
        self
    }

    /// Frame area in pixels
    pub fn area(&self) -> f32 {
        self.width as f32 * self.height as f32
    }
}
