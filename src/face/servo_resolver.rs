use crate::constants::{ROLL_CORRECTION_INTERCEPT, ROLL_CORRECTION_SLOPE};
use crate::enums::Axis;
use crate::face::frame_normalizer::FrameNormalizer;
use crate::face::geometry::{distance_2d, remap};
use crate::face::landmark::LandmarkSnapshot;
use crate::face::mapping::ServoMapping;

pub struct ServoResolver {
    // Linear correction of the normalized delta against the head roll.
    _slope: f64,
    _intercept: f64,
}

impl ServoResolver {
    /// Servo resolver to calculate the servo angle from the landmarks.
    ///
    /// # Notes
    /// The normalized delta is corrected by:
    ///
    /// corrected = delta / reference_distance - slope * roll + intercept
    ///
    /// and then mapped linearly from [domain_min, domain_max] to
    /// [closed, open] with the clipping at both ends.
    ///
    /// # Arguments
    /// * `slope` - Slope of the roll correction.
    /// * `intercept` - Intercept of the roll correction.
    ///
    /// # Returns
    /// A new ServoResolver object.
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self {
            _slope: slope,
            _intercept: intercept,
        }
    }

    /// Calculate the corrected and normalized delta of the mapping.
    ///
    /// # Arguments
    /// * `mapping` - Servo mapping.
    /// * `snapshot` - Landmark snapshot.
    /// * `frame` - Frame normalizer of the snapshot.
    ///
    /// # Returns
    /// Normalized delta. None if any of the two points is absent.
    pub fn normalized_delta(
        &self,
        mapping: &ServoMapping,
        snapshot: &LandmarkSnapshot,
        frame: &FrameNormalizer,
    ) -> Option<f64> {
        let point = frame.correct(&snapshot.get(mapping.point)?);
        let reference = frame.correct(&snapshot.get(mapping.reference)?);

        let delta_raw = match mapping.axis {
            Axis::X => (point.x - reference.x).abs(),
            Axis::Y => (point.y - reference.y).abs(),
            Axis::Distance => distance_2d(&point, &reference),
        };

        Some(delta_raw / frame.reference_distance - self._slope * frame.roll + self._intercept)
    }

    /// Resolve the servo angle of the mapping.
    ///
    /// # Arguments
    /// * `mapping` - Servo mapping.
    /// * `snapshot` - Landmark snapshot.
    /// * `frame` - Frame normalizer of the snapshot.
    ///
    /// # Returns
    /// Angle in degree between the closed and open angles. None if any of
    /// the two points is absent, or the delta or the angle is not finite.
    pub fn resolve(
        &self,
        mapping: &ServoMapping,
        snapshot: &LandmarkSnapshot,
        frame: &FrameNormalizer,
    ) -> Option<i32> {
        let delta = self.normalized_delta(mapping, snapshot, frame)?;
        if !delta.is_finite() {
            return None;
        }

        let angle = remap(
            delta,
            mapping.domain_min,
            mapping.domain_max,
            mapping.closed as f64,
            mapping.open as f64,
        );
        if !angle.is_finite() {
            return None;
        }

        // Round half up
        Some((angle + 0.5).floor() as i32)
    }
}

impl Default for ServoResolver {
    fn default() -> Self {
        Self::new(ROLL_CORRECTION_SLOPE, ROLL_CORRECTION_INTERCEPT)
    }
}
