use crate::geometry::BoundingBox;

/// Single object detection from the watch-face detector.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Box in the pixel space of the frame that was searched. May exceed the
    /// frame extents (model padding); clamp before use.
    pub bbox: BoundingBox,
    /// Confidence in `[0, 1]`.
    pub score: f32,
}
