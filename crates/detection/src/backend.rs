//! Detection backend seam and ONNX-backed implementation

use crate::config::DetectionConfig;
use crate::DetectionError;
use async_trait::async_trait;
use camera_capture::frame::CameraFrame;
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Axis-aligned box in source-frame pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Classification label with confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    pub confidence: f32,
}

/// One detected object in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub labels: Vec<Label>,
}

impl Detection {
    /// Whether this detection should be treated as a pedestrian.
    ///
    /// Unlabeled detections pass: the default model reports many objects
    /// without classification.
    pub fn is_pedestrian(&self, vocabulary: &[String]) -> bool {
        if self.labels.is_empty() {
            return true;
        }
        self.labels
            .iter()
            .any(|label| vocabulary.iter().any(|v| v.eq_ignore_ascii_case(&label.text)))
    }
}

/// Produces detections for one frame. At most one call is in flight per
/// pipeline; implementations need not handle overlap.
#[async_trait]
pub trait DetectionBackend: Send + Sync {
    async fn detect(&self, frame: &CameraFrame) -> Result<Vec<Detection>, DetectionError>;
}

/// Object detector backed by an ONNX model.
///
/// Without a configured model path the backend serves a fixed mock
/// detection, which keeps the rest of the pipeline exercisable on dev
/// machines with no accelerator.
pub struct OnnxBackend {
    session: Option<Session>,
    confidence_threshold: f32,
    input_size: u32,
    class_names: Vec<String>,
}

impl OnnxBackend {
    pub fn new(config: &DetectionConfig) -> Result<Self, DetectionError> {
        let session = if let Some(path) = &config.model_path {
            info!("Loading detection model from {}", path);
            let session = Session::builder()
                .and_then(|builder| builder.with_optimization_level(GraphOptimizationLevel::Level3))
                .and_then(|builder| builder.commit_from_file(path))
                .map_err(|e| {
                    error!("Failed to load detection model: {}", e);
                    DetectionError::ModelLoad(e.to_string())
                })?;
            Some(session)
        } else {
            warn!("No detection model configured. Using mock detections.");
            None
        };

        Ok(Self {
            session,
            confidence_threshold: config.confidence_threshold,
            input_size: 320,
            class_names: vec![
                "person".to_string(),
                "bicycle".to_string(),
                "car".to_string(),
                "motorcycle".to_string(),
            ],
        })
    }

    /// Resize to the model input square and normalize to a NCHW tensor
    fn preprocess(&self, frame: &CameraFrame) -> Result<Array4<f32>, DetectionError> {
        let size = self.input_size;
        let img = image::ImageBuffer::<image::Rgb<u8>, _>::from_raw(
            frame.width,
            frame.height,
            frame.data.as_slice(),
        )
        .ok_or_else(|| {
            DetectionError::ImageProcessing("frame buffer does not match dimensions".into())
        })?;

        let resized =
            image::imageops::resize(&img, size, size, image::imageops::FilterType::Triangle);

        let mut input = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }
        Ok(input)
    }

    /// Decode `(cx, cy, w, h, confidence, class)` rows from model space
    /// into source-frame pixel space
    fn decode(&self, rows: &[f32], frame: &CameraFrame) -> Vec<Detection> {
        let scale_x = frame.width as f32 / self.input_size as f32;
        let scale_y = frame.height as f32 / self.input_size as f32;

        let mut detections = Vec::new();
        for row in rows.chunks_exact(6) {
            let [cx, cy, w, h, confidence, class] = [row[0], row[1], row[2], row[3], row[4], row[5]];
            if confidence < self.confidence_threshold {
                continue;
            }
            let class_idx = class as usize;
            let text = self
                .class_names
                .get(class_idx)
                .cloned()
                .unwrap_or_else(|| format!("class{}", class_idx));

            detections.push(Detection {
                bbox: BoundingBox {
                    x: (cx - w / 2.0) * scale_x,
                    y: (cy - h / 2.0) * scale_y,
                    width: w * scale_x,
                    height: h * scale_y,
                },
                labels: vec![Label { text, confidence }],
            });
        }
        detections
    }

    fn mock_detection(&self, frame: &CameraFrame) -> Vec<Detection> {
        // One distant pedestrian ahead, below the alert size gate
        vec![Detection {
            bbox: BoundingBox {
                x: frame.width as f32 * 0.45,
                y: frame.height as f32 * 0.5,
                width: frame.width as f32 * 0.1,
                height: frame.height as f32 * 0.3,
            },
            labels: vec![Label {
                text: "person".to_string(),
                confidence: 0.9,
            }],
        }]
    }
}

#[async_trait]
impl DetectionBackend for OnnxBackend {
    async fn detect(&self, frame: &CameraFrame) -> Result<Vec<Detection>, DetectionError> {
        let Some(session) = &self.session else {
            return Ok(self.mock_detection(frame));
        };

        let input = self.preprocess(frame)?;
        let outputs = session
            .run(ort::inputs![input].map_err(|e| DetectionError::Inference(e.to_string()))?)
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        let output = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let rows: Vec<f32> = output.iter().copied().collect();
        Ok(self.decode(&rows, frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> Label {
        Label {
            text: text.to_string(),
            confidence: 0.8,
        }
    }

    fn vocabulary() -> Vec<String> {
        vec!["person".to_string(), "pedestrian".to_string()]
    }

    #[test]
    fn unlabeled_detection_counts_as_pedestrian() {
        let det = Detection {
            bbox: BoundingBox { x: 0.0, y: 0.0, width: 10.0, height: 10.0 },
            labels: vec![],
        };
        assert!(det.is_pedestrian(&vocabulary()));
    }

    #[test]
    fn label_match_is_case_insensitive() {
        let det = Detection {
            bbox: BoundingBox { x: 0.0, y: 0.0, width: 10.0, height: 10.0 },
            labels: vec![label("Person")],
        };
        assert!(det.is_pedestrian(&vocabulary()));
    }

    #[test]
    fn foreign_label_is_filtered() {
        let det = Detection {
            bbox: BoundingBox { x: 0.0, y: 0.0, width: 10.0, height: 10.0 },
            labels: vec![label("car"), label("truck")],
        };
        assert!(!det.is_pedestrian(&vocabulary()));
    }

    #[test]
    fn bounding_box_geometry() {
        let bbox = BoundingBox { x: 10.0, y: 20.0, width: 100.0, height: 50.0 };
        assert_eq!(bbox.center_x(), 60.0);
        assert_eq!(bbox.area(), 5000.0);
    }

    #[tokio::test]
    async fn mock_backend_reports_a_distant_pedestrian() {
        let backend = OnnxBackend::new(&DetectionConfig::default()).expect("backend");
        let frame = CameraFrame::new(vec![0; 1920 * 1080 * 3], 1920, 1080, 0, 0);

        let detections = backend.detect(&frame).await.expect("detections");
        assert_eq!(detections.len(), 1);
        assert!(detections[0].is_pedestrian(&vocabulary()));

        // Below the 0.15 alert gate: the mock must not spam warnings
        let rel = detections[0].bbox.area() / frame.area();
        assert!(rel < 0.15);
    }

    #[test]
    fn decode_scales_to_frame_space_and_filters_confidence() {
        let backend = OnnxBackend::new(&DetectionConfig::default()).expect("backend");
        let frame = CameraFrame::new(vec![0; 640 * 640 * 3], 640, 640, 0, 0);

        // input_size 320, frame 640: scale factor 2 on both axes
        let rows = [
            160.0, 160.0, 80.0, 120.0, 0.9, 0.0, // person, kept
            10.0, 10.0, 5.0, 5.0, 0.2, 2.0, // below confidence, dropped
        ];
        let detections = backend.decode(&rows, &frame);

        assert_eq!(detections.len(), 1);
        let det = &detections[0];
        assert_eq!(det.labels[0].text, "person");
        assert_eq!(det.bbox.width, 160.0);
        assert_eq!(det.bbox.height, 240.0);
        assert_eq!(det.bbox.center_x(), 320.0);
    }
}
