//! Frame-throttled detection pipeline
//!
//! Inference is expensive relative to frame arrival, so the pipeline
//! enforces two gates before touching the backend: at most one call in
//! flight, and a floor on the spacing between completed cycles. Frames
//! that lose either gate are dropped, never queued, which bounds both
//! memory and thermal load.

use crate::backend::{Detection, DetectionBackend};
use crate::classify;
use crate::config::DetectionConfig;
use alerting::{AlertEvent, AlertSink};
use camera_capture::frame::CameraFrame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

struct Throttle {
    processing: AtomicBool,
    /// Completion time of the last successful cycle; failures do not
    /// advance it, so a failing backend is retried at the next frame.
    last_cycle: Mutex<Option<Instant>>,
}

/// Throttled detection pipeline
pub struct DetectionPipeline {
    backend: Arc<dyn DetectionBackend>,
    sink: Arc<dyn AlertSink>,
    config: DetectionConfig,
    throttle: Arc<Throttle>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl DetectionPipeline {
    pub fn new(
        backend: Arc<dyn DetectionBackend>,
        sink: Arc<dyn AlertSink>,
        config: DetectionConfig,
    ) -> Self {
        Self {
            backend,
            sink,
            config,
            throttle: Arc::new(Throttle {
                processing: AtomicBool::new(false),
                last_cycle: Mutex::new(None),
            }),
            in_flight: Mutex::new(None),
        }
    }

    /// Submit one camera frame. Never blocks: a frame arriving while a
    /// cycle is in flight or inside the throttle interval is dropped
    /// (and thereby released) on the spot. Must be called from within a
    /// tokio runtime.
    pub fn submit(&self, frame: CameraFrame) {
        if self.throttle.processing.load(Ordering::Acquire) {
            debug!("frame skipped: detection in flight");
            return;
        }

        let interval = Duration::from_millis(self.config.detection_interval_ms);
        let inside_interval = self
            .throttle
            .last_cycle
            .lock()
            .map(|last| last.map_or(false, |t| t.elapsed() < interval))
            .unwrap_or(false);
        if inside_interval {
            debug!("frame skipped: inside throttle interval");
            return;
        }

        if self
            .throttle
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let backend = Arc::clone(&self.backend);
        let sink = Arc::clone(&self.sink);
        let config = self.config.clone();
        let throttle = Arc::clone(&self.throttle);

        let handle = tokio::spawn(async move {
            match backend.detect(&frame).await {
                Ok(detections) => {
                    process_detections(&detections, &frame, &config, sink.as_ref());
                    if let Ok(mut last) = throttle.last_cycle.lock() {
                        *last = Some(Instant::now());
                    }
                }
                Err(e) => {
                    warn!("detection failed: {e}");
                }
            }
            throttle.processing.store(false, Ordering::Release);
            // frame dropped here; its release permit fires on every path
        });

        if let Ok(mut slot) = self.in_flight.lock() {
            *slot = Some(handle);
        }
    }

    /// Wait for any in-flight cycle to finish. After this returns no
    /// frame is held and the backend is quiescent.
    pub async fn close(&self) {
        let handle = self.in_flight.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("detection task join failed: {e}");
            }
        }
    }
}

/// Filter to pedestrians, classify, and emit alerts for close ones
fn process_detections(
    detections: &[Detection],
    frame: &CameraFrame,
    config: &DetectionConfig,
    sink: &dyn AlertSink,
) {
    let frame_width = frame.width as f32;
    let frame_height = frame.height as f32;

    for detection in detections {
        if !detection.is_pedestrian(&config.pedestrian_labels) {
            continue;
        }

        let rel = classify::relative_size(
            detection.bbox.width,
            detection.bbox.height,
            frame_width,
            frame_height,
        );
        if rel <= config.alert_size_threshold {
            continue;
        }

        let zone = classify::classify_zone(
            detection.bbox.center_x() / frame_width,
            config.left_zone_end,
            config.right_zone_start,
        );
        let distance_m = classify::estimate_distance_m(rel);
        debug!(%zone, distance_m, relative_size = rel, "pedestrian proximity");
        sink.on_alert(AlertEvent::new(zone, distance_m));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BoundingBox, Label};
    use crate::DetectionError;
    use alerting::{ChannelSink, Zone};
    use async_trait::async_trait;
    use camera_capture::frame::FramePermit;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    enum MockResponse {
        Detections(Vec<Detection>),
        Failure,
    }

    struct MockBackend {
        calls: AtomicUsize,
        delay: Duration,
        response: MockResponse,
    }

    impl MockBackend {
        fn ok(detections: Vec<Detection>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                response: MockResponse::Detections(detections),
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                response: MockResponse::Detections(vec![]),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                response: MockResponse::Failure,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DetectionBackend for MockBackend {
        async fn detect(&self, _frame: &CameraFrame) -> Result<Vec<Detection>, DetectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            match &self.response {
                MockResponse::Detections(detections) => Ok(detections.clone()),
                MockResponse::Failure => Err(DetectionError::Inference("mock failure".into())),
            }
        }
    }

    fn frame() -> CameraFrame {
        CameraFrame::new(vec![0; 12], 1000, 1000, 0, 0)
    }

    fn tracked_frame(released: &Arc<AtomicUsize>) -> CameraFrame {
        let counter = Arc::clone(released);
        frame().with_permit(FramePermit::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
    }

    fn detection(x: f32, y: f32, width: f32, height: f32, label: Option<&str>) -> Detection {
        Detection {
            bbox: BoundingBox { x, y, width, height },
            labels: label
                .map(|text| {
                    vec![Label {
                        text: text.to_string(),
                        confidence: 0.9,
                    }]
                })
                .unwrap_or_default(),
        }
    }

    fn pipeline(backend: Arc<MockBackend>) -> (DetectionPipeline, tokio::sync::mpsc::UnboundedReceiver<AlertEvent>) {
        let (sink, rx) = ChannelSink::new();
        (
            DetectionPipeline::new(backend, Arc::new(sink), DetectionConfig::default()),
            rx,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn frames_inside_interval_skip_the_backend() {
        let backend = MockBackend::ok(vec![]);
        let (pipeline, _rx) = pipeline(Arc::clone(&backend));

        pipeline.submit(frame());
        pipeline.close().await;
        assert_eq!(backend.calls(), 1);

        pipeline.submit(frame());
        assert_eq!(backend.calls(), 1);

        sleep(Duration::from_millis(501)).await;
        pipeline.submit(frame());
        pipeline.close().await;
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn frames_during_inflight_cycle_are_dropped_and_released() {
        let backend = MockBackend::slow(Duration::from_secs(10));
        let (pipeline, _rx) = pipeline(Arc::clone(&backend));
        let released = Arc::new(AtomicUsize::new(0));

        pipeline.submit(tracked_frame(&released));
        pipeline.submit(tracked_frame(&released));
        // The second frame never reaches the backend and releases at once
        assert_eq!(released.load(Ordering::SeqCst), 1);

        pipeline.close().await;
        assert_eq!(backend.calls(), 1);
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn throttled_frame_is_released_immediately() {
        let backend = MockBackend::ok(vec![]);
        let (pipeline, _rx) = pipeline(Arc::clone(&backend));
        let released = Arc::new(AtomicUsize::new(0));

        pipeline.submit(frame());
        pipeline.close().await;

        pipeline.submit(tracked_frame(&released));
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn alerts_carry_zone_and_distance() {
        let backend = MockBackend::ok(vec![
            // center 250/1000 -> left, relative size 0.25 -> 3.0 m
            detection(0.0, 0.0, 500.0, 500.0, None),
            // labeled vehicle: filtered regardless of size
            detection(0.0, 0.0, 800.0, 800.0, Some("car")),
            // center 500/1000 -> center, relative size 0.5 -> 1.0 m
            detection(0.0, 0.0, 1000.0, 500.0, Some("Person")),
            // pedestrian but too small for an alert
            detection(900.0, 0.0, 100.0, 100.0, Some("person")),
        ]);
        let (pipeline, mut rx) = pipeline(backend);

        pipeline.submit(frame());
        pipeline.close().await;

        let first = rx.try_recv().expect("first alert");
        assert_eq!(first.zone, Zone::Left);
        assert_eq!(first.distance_m, 3.0);

        let second = rx.try_recv().expect("second alert");
        assert_eq!(second.zone, Zone::Center);
        assert_eq!(second.distance_m, 1.0);

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn backend_failure_emits_nothing_and_does_not_advance_throttle() {
        let backend = MockBackend::failing();
        let (pipeline, mut rx) = pipeline(Arc::clone(&backend));

        pipeline.submit(frame());
        pipeline.close().await;
        assert!(rx.try_recv().is_err());
        assert_eq!(backend.calls(), 1);

        // Failures leave the throttle clock untouched: the very next
        // frame may retry without waiting out the interval
        pipeline.submit(frame());
        pipeline.close().await;
        assert_eq!(backend.calls(), 2);
    }
}
