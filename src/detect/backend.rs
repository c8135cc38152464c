use anyhow::Result;

use crate::detect::result::Detection;
use crate::geometry::Point2D;

/// Object-detection capability: finds watch faces in a frame.
///
/// Implementations wrap an opaque inference provider. They are expensive to
/// construct (model load) and are built once at startup, then reused. They
/// are NOT guaranteed re-entrant; callers must serialize access to one
/// instance.
///
/// Implementations must treat the pixel slice as read-only and ephemeral,
/// and must not retain it beyond the call.
pub trait WatchDetectorBackend: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Run detection on an RGB8 frame.
    ///
    /// Returned boxes are in frame pixel coordinates and may arrive
    /// unclamped. Ordering is unspecified; the caller picks the best score.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;
}

/// Landmark capability: clock center and hand tips within a cropped watch
/// face, in single-image mode.
///
/// Same lifecycle and re-entrancy contract as `WatchDetectorBackend`.
pub trait HandLandmarkBackend: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Extract landmark points from an RGB8 crop.
    ///
    /// Points are normalized to `[0, 1]` relative to the given raster and
    /// are positional: index 0 is the clock center, 1 the hour-hand tip,
    /// 2 the minute-hand tip.
    fn landmarks(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Point2D>>;
}
