use nalgebra::Point2;

use crate::enums::{LandmarkName, SkipReason};
use crate::face::geometry::{distance_2d, rotate_point};
use crate::face::landmark::LandmarkSnapshot;

#[derive(Clone, PartialEq, Debug)]
pub struct FrameNormalizer {
    // Head roll in radian. This is the angle of the line from the left outer
    // eye corner to the right one.
    pub roll: f64,
    // Distance between the outer eye corners. Every delta is divided by this
    // so that the result does not depend on the distance to the camera.
    pub reference_distance: f64,
    // Nose tip as the center of the roll correction.
    pub anchor: Point2<f64>,
}

impl FrameNormalizer {
    /// Normalize the frame of the snapshot.
    ///
    /// # Arguments
    /// * `snapshot` - Landmark snapshot.
    ///
    /// # Returns
    /// Frame normalizer of the snapshot.
    ///
    /// # Errors
    /// * `SkipReason::NotReady` - The snapshot is too short or lacks the eye
    /// corners or the nose tip.
    /// * `SkipReason::DegenerateGeometry` - The eye corners coincide or the
    /// geometry is not finite.
    pub fn new(snapshot: &LandmarkSnapshot) -> Result<Self, SkipReason> {
        if !snapshot.is_ready() {
            return Err(SkipReason::NotReady);
        }

        let (left_eye, right_eye, anchor) = match (
            snapshot.get_named(LandmarkName::LeftEyeOuter),
            snapshot.get_named(LandmarkName::RightEyeOuter),
            snapshot.get_named(LandmarkName::NoseTip),
        ) {
            (Some(left_eye), Some(right_eye), Some(anchor)) => (left_eye, right_eye, anchor),
            _ => return Err(SkipReason::NotReady),
        };

        let roll = (right_eye.y - left_eye.y).atan2(right_eye.x - left_eye.x);
        let reference_distance = distance_2d(&left_eye, &right_eye);
        if !roll.is_finite() || !reference_distance.is_finite() || (reference_distance <= 0.0) {
            return Err(SkipReason::DegenerateGeometry);
        }

        Ok(Self {
            roll,
            reference_distance,
            anchor,
        })
    }

    /// Undo the head roll of the point.
    ///
    /// # Arguments
    /// * `point` - Point in the image plane.
    ///
    /// # Returns
    /// Point rotated about the anchor by the negative roll.
    pub fn correct(&self, point: &Point2<f64>) -> Point2<f64> {
        rotate_point(point, &self.anchor, -self.roll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use nalgebra::point;
    use std::f64::consts::FRAC_PI_6;

    use crate::constants::NUM_LANDMARK;
    use crate::face::landmark::LandmarkPoint;

    const EPSILON: f64 = 1e-9;

    fn create_snapshot(left_eye: (f64, f64), right_eye: (f64, f64)) -> LandmarkSnapshot {
        let mut points = vec![LandmarkPoint::new(0.5, 0.5, 0.0); NUM_LANDMARK];
        points[LandmarkName::LeftEyeOuter.index()] = LandmarkPoint::new(left_eye.0, left_eye.1, 0.0);
        points[LandmarkName::RightEyeOuter.index()] =
            LandmarkPoint::new(right_eye.0, right_eye.1, 0.0);
        points[LandmarkName::NoseTip.index()] = LandmarkPoint::new(0.5, 0.6, 0.0);

        LandmarkSnapshot::new(points)
    }

    #[test]
    fn test_new() {
        let frame = FrameNormalizer::new(&create_snapshot((0.0, 0.0), (1.0, 0.0))).unwrap();

        assert_relative_eq!(frame.roll, 0.0, epsilon = EPSILON);
        assert_relative_eq!(frame.reference_distance, 1.0, epsilon = EPSILON);
        assert_eq!(frame.anchor, point![0.5, 0.6]);
    }

    #[test]
    fn test_new_roll() {
        let frame = FrameNormalizer::new(&create_snapshot(
            (0.0, 0.0),
            (2.0 * FRAC_PI_6.cos(), 2.0 * FRAC_PI_6.sin()),
        ))
        .unwrap();

        assert_relative_eq!(frame.roll, FRAC_PI_6, epsilon = EPSILON);
        assert_relative_eq!(frame.reference_distance, 2.0, epsilon = EPSILON);

        // The sign follows atan2()
        let frame = FrameNormalizer::new(&create_snapshot((0.0, 0.0), (1.0, -1.0))).unwrap();

        assert!(frame.roll < 0.0);
    }

    #[test]
    fn test_new_not_ready() {
        let snapshot = LandmarkSnapshot::new(vec![LandmarkPoint::default(); NUM_LANDMARK - 1]);

        assert_eq!(FrameNormalizer::new(&snapshot), Err(SkipReason::NotReady));

        let mut snapshot = create_snapshot((0.0, 0.0), (1.0, 0.0));
        snapshot.points[LandmarkName::NoseTip.index()].x = f64::NAN;

        assert_eq!(FrameNormalizer::new(&snapshot), Err(SkipReason::NotReady));
    }

    #[test]
    fn test_new_degenerate() {
        assert_eq!(
            FrameNormalizer::new(&create_snapshot((0.3, 0.3), (0.3, 0.3))),
            Err(SkipReason::DegenerateGeometry)
        );
        assert_eq!(
            FrameNormalizer::new(&create_snapshot((0.0, 0.0), (f64::INFINITY, 0.0))),
            Err(SkipReason::NotReady)
        );
        assert_eq!(
            FrameNormalizer::new(&create_snapshot((-1e308, 0.0), (1e308, 0.0))),
            Err(SkipReason::DegenerateGeometry)
        );
    }

    #[test]
    fn test_correct() {
        // Head tilts by 30 degree
        let frame = FrameNormalizer::new(&create_snapshot(
            (0.0, 0.0),
            (FRAC_PI_6.cos(), FRAC_PI_6.sin()),
        ))
        .unwrap();

        // A point on the tilted horizontal line through the anchor goes back
        // to the horizontal line.
        let tilted = point![0.5 + 0.2 * FRAC_PI_6.cos(), 0.6 + 0.2 * FRAC_PI_6.sin()];
        let corrected = frame.correct(&tilted);

        assert_relative_eq!(corrected.x, 0.7, epsilon = EPSILON);
        assert_relative_eq!(corrected.y, 0.6, epsilon = EPSILON);

        // The anchor does not move
        assert_eq!(frame.correct(&frame.anchor), frame.anchor);
    }

    #[test]
    fn test_correct_no_roll() {
        let frame = FrameNormalizer::new(&create_snapshot((0.0, 0.0), (1.0, 0.0))).unwrap();

        let corrected = frame.correct(&point![0.25, 0.75]);

        assert_relative_eq!(corrected.x, 0.25, epsilon = EPSILON);
        assert_relative_eq!(corrected.y, 0.75, epsilon = EPSILON);
    }
}
