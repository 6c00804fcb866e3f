//! Frame delivery service
//!
//! Bridges a capture thread to the async detection loop over a bounded
//! channel. The channel is intentionally shallow: when the consumer lags,
//! `try_send` fails and the frame is dropped on the spot (keep-only-latest
//! backpressure), so frames never queue up behind a slow detection cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::frame::CameraFrame;
use crate::{CameraConfig, CameraError};

/// Channel depth between the capture thread and the consumer
const FRAME_CHANNEL_DEPTH: usize = 2;

/// Async frame service backed by a capture thread
pub struct CameraService {
    receiver: mpsc::Receiver<CameraFrame>,
    shutdown: Arc<AtomicBool>,
}

impl CameraService {
    /// Spawn a synthetic frame source producing flat test-pattern frames
    /// at the configured rate. Stands in for the platform camera driver,
    /// which is integrated externally.
    pub fn synthetic(config: CameraConfig) -> Result<Self, CameraError> {
        config.validate()?;
        if config.device.is_some() {
            warn!("Physical camera devices are not wired up; using synthetic source");
        }

        let (tx, rx) = mpsc::channel::<CameraFrame>(FRAME_CHANNEL_DEPTH);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);

        info!(
            width = config.width,
            height = config.height,
            fps = config.fps,
            "starting synthetic frame source"
        );

        std::thread::spawn(move || {
            let interval = Duration::from_micros(1_000_000 / config.fps as u64);
            let frame_len = (config.width * config.height * 3) as usize;
            let started = Instant::now();
            let mut sequence: u64 = 0;

            while !shutdown_flag.load(Ordering::SeqCst) {
                let shade = (sequence % 256) as u8;
                let frame = CameraFrame::new(
                    vec![shade; frame_len],
                    config.width,
                    config.height,
                    config.rotation_degrees,
                    started.elapsed().as_millis() as u64,
                );
                sequence += 1;

                match tx.try_send(frame) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!("frame dropped: consumer behind");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!("frame receiver dropped");
                        break;
                    }
                }
                std::thread::sleep(interval);
            }
        });

        Ok(Self {
            receiver: rx,
            shutdown,
        })
    }

    /// Receive the next frame; `None` once the source has stopped
    pub async fn next(&mut self) -> Option<CameraFrame> {
        self.receiver.recv().await
    }

    /// Stop the capture thread
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

impl Drop for CameraService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
