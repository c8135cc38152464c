use anyhow::Result;

use crate::detect::backend::WatchDetectorBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// Default confidence threshold. Low to tolerate degraded camera hardware.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.3;

/// Finds the watch-face bounding box in a frame.
///
/// Wraps the object-detection capability with the pipeline's configuration:
/// score threshold and a single (top-1) result. Zero above-threshold
/// detections is not an error; the caller maps `None` to `NoWatchFound`.
/// A backend failure propagates and is reported upward; there are no
/// retries.
pub struct WatchLocator {
    backend: Box<dyn WatchDetectorBackend>,
    score_threshold: f32,
}

impl WatchLocator {
    pub fn new(backend: Box<dyn WatchDetectorBackend>) -> Self {
        Self {
            backend,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }

    /// Override the default confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Locate the best watch-face detection, if any.
    ///
    /// The threshold and top-1 cap are re-applied here regardless of backend
    /// configuration, so a permissive backend cannot widen the contract.
    /// The returned box is unclamped; clamp it to the frame before cropping.
    pub fn locate(&mut self, frame: &Frame) -> Result<Option<Detection>> {
        let mut detections =
            self.backend
                .detect(frame.pixels(), frame.width(), frame.height())?;
        detections.retain(|d| d.score >= self.score_threshold);
        Ok(detections
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score)))
    }
}
