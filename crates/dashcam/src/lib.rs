//! DashCam Service
//!
//! Wires the two independent loops against one camera:
//! - recording: continuous segmented capture with retention
//! - detection: throttled pedestrian proximity alerts
//!
//! The loops share only camera access; their state is disjoint, so
//! neither can block or starve the other.

use anyhow::{Context, Result};
use camera_capture::{CameraConfig, CameraService};
use detection::{DetectionConfig, DetectionPipeline, OnnxBackend};
use recording::{FileEncoder, RecordingConfig, RecordingController};
use segment_store::{SegmentStore, StoreConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Application configuration, layered from `dashcam.toml` and
/// `DASHCAM_*` environment variables over these defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory the segment store lives under
    pub storage_root: PathBuf,
    /// Days of footage to keep
    pub retention_days: i64,
    /// Segment length before rotation (seconds)
    pub segment_duration_secs: u64,
    /// Floor between detection cycles (milliseconds)
    pub detection_interval_ms: u64,
    /// ONNX detection model; mock detections without one
    pub model_path: Option<String>,
    /// Capture width
    pub camera_width: u32,
    /// Capture height
    pub camera_height: u32,
    /// Capture rate
    pub camera_fps: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("."),
            retention_days: 7,
            segment_duration_secs: 60,
            detection_interval_ms: 500,
            model_path: None,
            camera_width: 1920,
            camera_height: 1080,
            camera_fps: 30,
        }
    }
}

/// Load configuration from file and environment
pub fn load_config() -> Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("dashcam").required(false))
        .add_source(config::Environment::with_prefix("DASHCAM"))
        .build()
        .context("failed to read configuration")?;

    settings
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the dashcam until Ctrl-C.
///
/// Camera startup failure is fatal and surfaced to the caller; per-frame
/// detection failures are logged and silent.
pub async fn run(config: AppConfig) -> Result<()> {
    let store = Arc::new(
        SegmentStore::open(StoreConfig {
            root: config.storage_root.clone(),
            retention_days: config.retention_days,
            ..Default::default()
        })
        .context("failed to open segment store")?,
    );

    let controller = RecordingController::new(
        Arc::new(FileEncoder),
        Arc::clone(&store),
        RecordingConfig {
            segment_duration_secs: config.segment_duration_secs,
        },
    );

    let detection_config = DetectionConfig {
        detection_interval_ms: config.detection_interval_ms,
        model_path: config.model_path.clone(),
        ..Default::default()
    };
    let backend = Arc::new(
        OnnxBackend::new(&detection_config).context("failed to initialize detection backend")?,
    );
    let pipeline = DetectionPipeline::new(backend, Arc::new(alerting::LogSink), detection_config);

    let mut camera = CameraService::synthetic(CameraConfig {
        width: config.camera_width,
        height: config.camera_height,
        fps: config.camera_fps,
        ..Default::default()
    })
    .context("camera startup failed")?;

    controller.start().context("failed to start recording")?;
    info!("dashcam running: segmented recording + pedestrian watch");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            maybe_frame = camera.next() => {
                match maybe_frame {
                    Some(frame) => pipeline.submit(frame),
                    None => break,
                }
            }
        }
    }

    camera.shutdown();
    controller.stop().context("failed to finalize recording")?;
    pipeline.close().await;
    info!(
        total_usage_bytes = store.total_usage_bytes(),
        "dashcam stopped"
    );
    Ok(())
}
