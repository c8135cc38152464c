//! Point, box and angle math shared by the pipeline stages.
//!
//! Everything here is pure: coordinates in, coordinates out. Points and boxes
//! carry pixel coordinates of whichever frame they were computed against;
//! callers are responsible for keeping coordinate spaces straight (captured
//! frame vs. crop vs. display surface).

/// 2D point in pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Point2D) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle in pixel coordinates.
///
/// Boxes reported by a detector may exceed the frame extents (model padding);
/// `clamp_to` must be applied before the box is used for cropping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Clamp every edge into `[0, width] x [0, height]`.
    ///
    /// For an edge-ordered input box the result satisfies
    /// `0 <= left <= right <= width` and `0 <= top <= bottom <= height`.
    pub fn clamp_to(&self, width: u32, height: u32) -> BoundingBox {
        let w = width as f32;
        let h = height as f32;
        BoundingBox {
            left: self.left.clamp(0.0, w),
            top: self.top.clamp(0.0, h),
            right: self.right.clamp(0.0, w),
            bottom: self.bottom.clamp(0.0, h),
        }
    }

    /// True when the box does not cover at least one whole pixel in each
    /// dimension. A detection that clamps to an empty box is unusable.
    pub fn is_empty(&self) -> bool {
        self.width() < 1.0 || self.height() < 1.0
    }

    /// Scale all edges, e.g. to project a captured-frame box onto a display
    /// surface with `sx = display_w / capture_w`, `sy = display_h / capture_h`.
    pub fn scaled(&self, sx: f32, sy: f32) -> BoundingBox {
        BoundingBox {
            left: self.left * sx,
            top: self.top * sy,
            right: self.right * sx,
            bottom: self.bottom * sy,
        }
    }
}

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_deg(angle: f32) -> f32 {
    ((angle % 360.0) + 360.0) % 360.0
}

/// Angle of `tip` around `center`, in degrees, measured clockwise from the
/// 12 o'clock position.
///
/// `atan2` gives the mathematical east-zero angle; adding 90 degrees moves
/// zero to 12 o'clock. Image y grows downward, which is what makes the +90
/// rotation map "up" to angle 0 and the sweep clockwise.
pub fn hand_angle_deg(center: Point2D, tip: Point2D) -> f32 {
    let dx = tip.x - center.x;
    let dy = tip.y - center.y;
    normalize_deg(dy.atan2(dx).to_degrees() + 90.0)
}
