use anyhow::Result;

use crate::clock::HandLandmarkSet;
use crate::detect::backend::HandLandmarkBackend;
use crate::frame::Frame;
use crate::geometry::Point2D;

/// Minimum landmark count for a usable result: center plus two hand tips.
pub const MIN_LANDMARKS: usize = 3;

/// Minimum denormalized distance between the center and each hand tip. A
/// tip that collapses onto the center carries no angle information.
pub const MIN_HAND_SPAN_PX: f32 = 1.0;

/// Extracts clock-center / hour-tip / minute-tip points from a cropped
/// watch face.
///
/// The landmark capability returns unlabeled points; the first three are
/// taken positionally (0 = center, 1 = hour tip, 2 = minute tip) and
/// denormalized against the crop's dimensions. Raw ordering is never
/// trusted blindly: a result with fewer than `MIN_LANDMARKS` points, or a
/// geometrically degenerate one, yields `None` (the caller maps it to
/// `HandsUnclear`). A backend failure propagates; there are no retries.
pub struct HandLandmarkExtractor {
    backend: Box<dyn HandLandmarkBackend>,
}

impl HandLandmarkExtractor {
    pub fn new(backend: Box<dyn HandLandmarkBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Extract hand landmarks from a crop, or `None` when the hands are
    /// unclear.
    pub fn extract(&mut self, crop: &Frame) -> Result<Option<HandLandmarkSet>> {
        let points = self
            .backend
            .landmarks(crop.pixels(), crop.width(), crop.height())?;
        if points.len() < MIN_LANDMARKS {
            log::debug!(
                "landmark result has {} point(s), need {}",
                points.len(),
                MIN_LANDMARKS
            );
            return Ok(None);
        }

        let w = crop.width() as f32;
        let h = crop.height() as f32;
        let denormalize = |p: Point2D| Point2D::new(p.x * w, p.y * h);
        let set = HandLandmarkSet {
            center: denormalize(points[0]),
            hour_tip: denormalize(points[1]),
            minute_tip: denormalize(points[2]),
        };

        if set.center.distance_to(set.hour_tip) < MIN_HAND_SPAN_PX
            || set.center.distance_to(set.minute_tip) < MIN_HAND_SPAN_PX
        {
            log::debug!("degenerate landmark set (hand tip on center), rejecting");
            return Ok(None);
        }

        Ok(Some(set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backends::StubHandsBackend;

    fn crop() -> Frame {
        Frame::new(vec![200; 100 * 50 * 3], 100, 50).unwrap()
    }

    fn extractor_with(points: Vec<Point2D>) -> HandLandmarkExtractor {
        let mut stub = StubHandsBackend::new();
        stub.push_result(points);
        HandLandmarkExtractor::new(Box::new(stub))
    }

    #[test]
    fn two_points_are_not_enough() {
        let mut extractor =
            extractor_with(vec![Point2D::new(0.5, 0.5), Point2D::new(0.5, 0.1)]);
        assert!(extractor.extract(&crop()).unwrap().is_none());
    }

    #[test]
    fn three_points_denormalize_against_the_crop() {
        let mut extractor = extractor_with(vec![
            Point2D::new(0.5, 0.5),
            Point2D::new(0.5, 0.0),
            Point2D::new(1.0, 0.5),
        ]);
        let set = extractor.extract(&crop()).unwrap().unwrap();
        // 100x50 crop: x scales by 100, y by 50.
        assert_eq!(set.center, Point2D::new(50.0, 25.0));
        assert_eq!(set.hour_tip, Point2D::new(50.0, 0.0));
        assert_eq!(set.minute_tip, Point2D::new(100.0, 25.0));
    }

    #[test]
    fn degenerate_set_is_rejected() {
        let mut extractor = extractor_with(vec![
            Point2D::new(0.5, 0.5),
            Point2D::new(0.5, 0.5),
            Point2D::new(0.9, 0.5),
        ]);
        assert!(extractor.extract(&crop()).unwrap().is_none());
    }
}
