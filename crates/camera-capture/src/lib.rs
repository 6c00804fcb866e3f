//! Camera Capture Library for the DashCam Pipeline
//!
//! Provides the frame type shared by the detection and recording loops:
//! - `CameraFrame` with release-guard semantics (the source is notified
//!   exactly once when the pipeline is done with a frame)
//! - `CameraService` delivering frames over a bounded drop-latest channel
//!
//! The physical camera driver is an external collaborator; a synthetic
//! source stands in for it until platform integration.

pub mod frame;
pub mod service;

pub use frame::{CameraFrame, FramePermit};
pub use service::CameraService;

use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Camera or microphone permission denied")]
    PermissionDenied,

    #[error("Invalid capture configuration: {0}")]
    Config(String),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Camera not initialized")]
    NotInitialized,
}

/// Camera configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Device path (e.g., "/dev/video0"); `None` selects the synthetic source
    pub device: Option<String>,
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// Target FPS
    pub fps: u32,
    /// Sensor rotation relative to the vehicle (degrees)
    pub rotation_degrees: i32,
    /// Record the microphone alongside video
    pub enable_audio: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: None,
            width: 1920,
            height: 1080,
            fps: 30,
            rotation_degrees: 0,
            enable_audio: true,
        }
    }
}

impl CameraConfig {
    /// Full-HD road-facing dashcam config
    pub fn fhd() -> Self {
        Self::default()
    }

    /// Reduced-rate config for thermally constrained mounts
    pub fn low_power() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 15,
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CameraError> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::Config("frame dimensions must be nonzero".into()));
        }
        if self.fps == 0 {
            return Err(CameraError::Config("fps must be nonzero".into()));
        }
        Ok(())
    }
}
